//! Lottery fairness and determinism.
//!
//! Win frequencies over many draws must converge to each waiter's ticket
//! share, pinned draws must resolve by the documented insertion-order scan,
//! and the same seed must reproduce the same winners.

use std::collections::HashMap;

use raffle::test_utils::init_test_logging;
use raffle::util::DetRng;
use raffle::{assert_with_log, test_complete, test_phase};
use raffle::{EntityId, LotteryScheduler};

fn entity(n: u64) -> EntityId {
    EntityId::new(n)
}

/// Asserts an observed win count is within `tolerance` (absolute share) of
/// the expected ticket share.
fn assert_share(wins: u64, draws: u64, share: f64, tolerance: f64, label: &str) {
    #[allow(clippy::cast_precision_loss)]
    let observed = wins as f64 / draws as f64;
    assert!(
        (observed - share).abs() <= tolerance,
        "{label}: observed share {observed:.4}, expected {share:.4} ± {tolerance}"
    );
}

#[test]
fn pinned_draws_resolve_in_insertion_order() {
    init_test_logging();
    test_phase!("pinned_draws_resolve_in_insertion_order");

    let sched = LotteryScheduler::with_seed(1);
    let q = sched.create_queue(false);
    let (x, y) = (entity(1), entity(2));

    sched.set_base_priority(x, 3).unwrap();
    sched.set_base_priority(y, 7).unwrap();
    sched.wait_for_access(q, x).unwrap();
    sched.wait_for_access(q, y).unwrap();

    assert_with_log!(
        sched.ticket_sum(q).unwrap() == 10,
        "pot is 3 + 7",
        10u64,
        sched.ticket_sum(q).unwrap()
    );

    // Scan order is insertion order: x covers [1, 3], y covers [4, 10].
    assert_eq!(sched.winner_for_draw(q, 1).unwrap(), Some(x));
    assert_eq!(sched.winner_for_draw(q, 3).unwrap(), Some(x));
    assert_eq!(sched.winner_for_draw(q, 4).unwrap(), Some(y));
    assert_eq!(sched.winner_for_draw(q, 10).unwrap(), Some(y));
    assert_eq!(sched.winner_for_draw(q, 11).unwrap(), None);
    assert_eq!(sched.winner_for_draw(q, 0).unwrap(), None);

    test_complete!("pinned_draws_resolve_in_insertion_order");
}

#[test]
fn win_frequency_converges_to_ticket_share() {
    init_test_logging();
    test_phase!("win_frequency_converges_to_ticket_share");

    let sched = LotteryScheduler::with_seed(1);
    let q = sched.create_queue(false);
    let (x, y) = (entity(1), entity(2));
    sched.set_base_priority(x, 3).unwrap();
    sched.set_base_priority(y, 7).unwrap();
    sched.wait_for_access(q, x).unwrap();
    sched.wait_for_access(q, y).unwrap();

    const DRAWS: u64 = 100_000;
    let sum = sched.ticket_sum(q).unwrap();
    let mut rng = DetRng::new(0xFA1E);
    let mut wins: HashMap<EntityId, u64> = HashMap::new();
    for _ in 0..DRAWS {
        let winner = sched
            .winner_for_draw(q, rng.next_ticket(sum))
            .unwrap()
            .expect("in-range draw always has a winner");
        *wins.entry(winner).or_default() += 1;
    }

    assert_share(wins[&x], DRAWS, 0.3, 0.02, "x at 3/10");
    assert_share(wins[&y], DRAWS, 0.7, 0.02, "y at 7/10");
    test_complete!(
        "win_frequency_converges_to_ticket_share",
        x_wins = wins[&x],
        y_wins = wins[&y],
    );
}

#[test]
fn three_way_split_converges() {
    init_test_logging();
    test_phase!("three_way_split_converges");

    let sched = LotteryScheduler::with_seed(1);
    let q = sched.create_queue(false);
    let contributions = [(entity(1), 2u64), (entity(2), 3u64), (entity(3), 5u64)];
    for (e, base) in contributions {
        sched.set_base_priority(e, base).unwrap();
        sched.wait_for_access(q, e).unwrap();
    }

    const DRAWS: u64 = 100_000;
    let sum = sched.ticket_sum(q).unwrap();
    assert_eq!(sum, 10);
    let mut rng = DetRng::new(0xBEE5);
    let mut wins: HashMap<EntityId, u64> = HashMap::new();
    for _ in 0..DRAWS {
        let winner = sched
            .winner_for_draw(q, rng.next_ticket(sum))
            .unwrap()
            .expect("in-range draw always has a winner");
        *wins.entry(winner).or_default() += 1;
    }

    for (e, base) in contributions {
        #[allow(clippy::cast_precision_loss)]
        assert_share(wins[&e], DRAWS, base as f64 / 10.0, 0.02, "three-way share");
    }
    test_complete!("three_way_split_converges");
}

#[test]
fn full_lottery_path_respects_shares() {
    init_test_logging();
    test_phase!("full_lottery_path_respects_shares");

    // Drive next_thread itself: the winner becomes owner, is released, and
    // rejoins the pot, so the waiter set is identical before every draw.
    let sched = LotteryScheduler::with_seed(0x10AD);
    let q = sched.create_queue(false);
    let (x, y) = (entity(1), entity(2));
    sched.set_base_priority(x, 3).unwrap();
    sched.set_base_priority(y, 7).unwrap();
    sched.wait_for_access(q, x).unwrap();
    sched.wait_for_access(q, y).unwrap();

    const DRAWS: u64 = 10_000;
    let mut wins: HashMap<EntityId, u64> = HashMap::new();
    for _ in 0..DRAWS {
        let winner = sched
            .next_thread(q)
            .unwrap()
            .expect("non-empty pot has a winner");
        *wins.entry(winner).or_default() += 1;
        sched.release(q).unwrap();
        sched.wait_for_access(q, winner).unwrap();
    }

    assert_share(wins[&x], DRAWS, 0.3, 0.05, "x via next_thread");
    assert_share(wins[&y], DRAWS, 0.7, 0.05, "y via next_thread");
    sched.with_state(|state| state.check_invariants());
    test_complete!("full_lottery_path_respects_shares");
}

#[test]
fn same_seed_reproduces_the_same_winners() {
    init_test_logging();
    test_phase!("same_seed_reproduces_the_same_winners");

    let run = |seed: u64| -> Vec<EntityId> {
        let sched = LotteryScheduler::with_seed(seed);
        let q = sched.create_queue(false);
        for n in 1..=4 {
            let e = entity(n);
            sched.set_base_priority(e, n * 2).unwrap();
            sched.wait_for_access(q, e).unwrap();
        }
        let mut winners = Vec::new();
        for _ in 0..50 {
            let winner = sched.next_thread(q).unwrap().expect("pot is never empty");
            winners.push(winner);
            sched.release(q).unwrap();
            sched.wait_for_access(q, winner).unwrap();
        }
        winners
    };

    assert_eq!(run(42), run(42), "identical seeds, identical winners");
    assert_ne!(run(42), run(43), "different seeds diverge");
    test_complete!("same_seed_reproduces_the_same_winners");
}
