//! Standard power-of-two bracket seeding.

use rand::Rng;
use rand::seq::SliceRandom;

/// Number of elimination rounds needed for `participants` entrants
pub fn round_count(participants: usize) -> u32 {
    participants.max(2).next_power_of_two().trailing_zeros()
}

/// Smallest power of two that holds `participants` entrants
pub fn bracket_size(participants: usize) -> usize {
    participants.max(2).next_power_of_two()
}

/// Round-one seed order for a bracket of `size` slots.
///
/// Returns 0-based seed indices; `order[2k]` plays `order[2k + 1]`. The top
/// seed always meets the bottom seed of its half, recursively, so seeds 1 and 2
/// can only meet in the final.
///
/// `size` must be a power of two; anything else is rounded up to one.
pub fn seed_order(size: usize) -> Vec<usize> {
    let size = size.max(2).next_power_of_two();
    if size == 2 {
        return vec![0, 1];
    }

    seed_order(size / 2)
        .into_iter()
        .flat_map(|seed| [seed, size - 1 - seed])
        .collect()
}

/// A uniformly random permutation of seeds `1..=count` (Fisher-Yates)
pub fn random_seeds<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u32> {
    let mut seeds: Vec<u32> = (1..=count as u32).collect();
    seeds.shuffle(rng);
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_seeds_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seeds = random_seeds(9, &mut rng);
        seeds.sort();
        assert_eq!(seeds, (1..=9).collect::<Vec<u32>>());
        assert!(random_seeds(0, &mut rng).is_empty());
    }

    #[test]
    fn test_seed_order_small_sizes() {
        assert_eq!(seed_order(2), vec![0, 1]);
        assert_eq!(seed_order(4), vec![0, 3, 1, 2]);
        assert_eq!(seed_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
    }

    #[test]
    fn test_round_one_pairs_sum_to_size_minus_one() {
        for size in [2usize, 4, 8, 16, 32] {
            let order = seed_order(size);
            for pair in order.chunks(2) {
                assert_eq!(pair[0] + pair[1], size - 1);
            }
        }
    }

    #[test]
    fn test_bracket_dimensions() {
        assert_eq!(bracket_size(2), 2);
        assert_eq!(bracket_size(5), 8);
        assert_eq!(bracket_size(8), 8);
        assert_eq!(bracket_size(9), 16);
        assert_eq!(round_count(2), 1);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(16), 4);
    }
}
