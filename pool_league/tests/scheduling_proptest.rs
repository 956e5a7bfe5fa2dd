/// Property-based tests for bracket seeding and round-robin pairing
///
/// These tests check the structural guarantees of the schedule generators
/// across a wide range of entrant counts.
use pool_league::tournament::MatchStatus;
use pool_league::tournament::bracket::BracketPlan;
use pool_league::tournament::round_robin::circle_pairings;
use pool_league::tournament::seeding::{bracket_size, round_count, seed_order};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

proptest! {
    #[test]
    fn seed_order_is_a_permutation(exp in 1u32..=7) {
        let size = 1usize << exp;
        let order = seed_order(size);

        prop_assert_eq!(order.len(), size);
        let unique: HashSet<_> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), size);
        prop_assert!(order.iter().all(|&s| s < size));
    }

    #[test]
    fn top_two_seeds_in_opposite_halves(exp in 1u32..=7) {
        let size = 1usize << exp;
        let order = seed_order(size);
        let half = size / 2;

        let pos0 = order.iter().position(|&s| s == 0).unwrap();
        let pos1 = order.iter().position(|&s| s == 1).unwrap();
        prop_assert!((pos0 < half) != (pos1 < half));
    }

    #[test]
    fn bracket_fits_entrants(n in 2usize..=200) {
        let size = bracket_size(n);
        prop_assert!(size >= n);
        prop_assert!(size < 2 * n);
        prop_assert_eq!(1usize << round_count(n), size);
    }

    #[test]
    fn bracket_plan_seats_everyone_once(n in 2usize..=64) {
        let entrants: Vec<i64> = (1..=n as i64).collect();
        let plan = BracketPlan::new(&entrants).unwrap();

        prop_assert_eq!(plan.matches().len(), bracket_size(n) - 1);

        let seated: Vec<i64> = plan
            .matches()
            .iter()
            .filter(|m| m.round == 1)
            .flat_map(|m| m.slots)
            .flatten()
            .collect();
        let unique: HashSet<_> = seated.iter().copied().collect();
        prop_assert_eq!(seated.len(), n);
        prop_assert_eq!(unique.len(), n);

        let byes = plan
            .matches()
            .iter()
            .filter(|m| m.round == 1 && m.status == MatchStatus::Completed)
            .count();
        prop_assert_eq!(byes, bracket_size(n) - n);
    }

    #[test]
    fn every_pair_meets_once_per_cycle(count in 2usize..=24, cycles in 1u32..=3) {
        let rounds = circle_pairings(count, cycles);
        let per_cycle = if count % 2 == 0 { count - 1 } else { count };
        prop_assert_eq!(rounds.len(), per_cycle * cycles as usize);

        let mut meetings: HashMap<(usize, usize), u32> = HashMap::new();
        for pairs in &rounds {
            let mut busy = HashSet::new();
            for &(a, b) in pairs {
                prop_assert!(a != b);
                prop_assert!(busy.insert(a), "{} plays twice in one round", a);
                prop_assert!(busy.insert(b), "{} plays twice in one round", b);
                *meetings.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }

        prop_assert_eq!(meetings.len(), count * (count - 1) / 2);
        prop_assert!(meetings.values().all(|&n| n == cycles));
    }
}
