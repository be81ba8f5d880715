//! Uniform random selection primitives.
//!
//! All randomness in the crate flows through these two functions, and both
//! take the random source as an argument so callers can replay a fixed
//! sequence in tests.

use rand::Rng;

/// Remove and return one element chosen uniformly from an ordered
/// collection.
///
/// Returns `None` on an empty collection; callers treat that as a no-op,
/// never an error. The order of the remaining elements is preserved.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use reading_circle::balance::selection::take_random;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let mut items = vec!["a", "b", "c"];
/// let picked = take_random(&mut items, &mut rng);
/// assert!(picked.is_some());
/// assert_eq!(items.len(), 2);
/// ```
pub fn take_random<T, R: Rng>(items: &mut Vec<T>, rng: &mut R) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..items.len());
    Some(items.remove(index))
}

/// Return one index drawn uniformly from the indices where `predicate`
/// holds.
///
/// Returns `None` when nothing matches. Used to avoid deterministic bias
/// toward the first-occurring group when several groups tie at an extreme
/// size.
pub fn pick_matching_index<T, R, F>(items: &[T], predicate: F, rng: &mut R) -> Option<usize>
where
    R: Rng,
    F: Fn(&T) -> bool,
{
    let matches: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| predicate(item))
        .map(|(index, _)| index)
        .collect();
    if matches.is_empty() {
        return None;
    }
    matches.get(rng.gen_range(0..matches.len())).copied()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_take_random_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut items: Vec<u32> = vec![];
        assert_eq!(take_random(&mut items, &mut rng), None);
        assert!(items.is_empty());
    }

    #[test]
    fn test_take_random_single_element() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut items = vec![42];
        assert_eq!(take_random(&mut items, &mut rng), Some(42));
        assert!(items.is_empty());
    }

    #[test]
    fn test_take_random_drains_all_elements() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut items = vec![1, 2, 3, 4, 5];
        let mut drained = Vec::new();
        while let Some(item) = take_random(&mut items, &mut rng) {
            drained.push(item);
        }
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_take_random_is_deterministic_under_fixed_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut items = vec!["a", "b", "c", "d"];
            let mut order = Vec::new();
            while let Some(item) = take_random(&mut items, &mut rng) {
                order.push(item);
            }
            order
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_take_random_reaches_every_element() {
        // Every position must be selectable as the first pick.
        let mut first_picks = std::collections::HashSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut items = vec![0, 1, 2];
            first_picks.insert(take_random(&mut items, &mut rng).unwrap());
        }
        assert_eq!(first_picks.len(), 3);
    }

    #[test]
    fn test_pick_matching_index_no_match() {
        let mut rng = StdRng::seed_from_u64(0);
        let items = vec![1, 2, 3];
        assert_eq!(pick_matching_index(&items, |&n| n > 10, &mut rng), None);
    }

    #[test]
    fn test_pick_matching_index_single_match_any_seed() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let items = vec![5, 9, 5];
            assert_eq!(pick_matching_index(&items, |&n| n == 9, &mut rng), Some(1));
        }
    }

    #[test]
    fn test_pick_matching_index_stays_within_matches() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let items = vec![1, 7, 7, 2, 7];
            let index = pick_matching_index(&items, |&n| n == 7, &mut rng).unwrap();
            assert!(matches!(index, 1 | 2 | 4));
        }
    }

    #[test]
    fn test_pick_matching_index_covers_all_ties() {
        let mut seen = std::collections::HashSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let items = vec![7, 1, 7, 7];
            seen.insert(pick_matching_index(&items, |&n| n == 7, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}
