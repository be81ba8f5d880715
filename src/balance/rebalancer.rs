//! Iterative group size balancing.
//!
//! This module enforces the size constraints on a deduplicated group list:
//! groups below the floor are grown when the system has enough total
//! surplus, drained and dissolved when it does not, and groups over the
//! soft ceiling shed members while that can be done without starving
//! another group.
//!
//! The loop is an explicit iteration over an index-addressed `Vec` rather
//! than recursion on copied lists, so stack depth stays flat for large
//! polls. Each pass either grows the current smallest group by one, shrinks
//! it by one, or removes a group, so the loop terminates after at most one
//! pass per participant; there is no iteration cap anywhere.

use rand::Rng;
use tracing::{debug, warn};

use crate::balance::selection::{pick_matching_index, take_random};
use crate::error::Result;
use crate::model::group::{Group, SizeConstraints};

/// Rebalance groups until every surviving group satisfies the constraints
/// as far as achievable.
///
/// Terminal conditions, checked each pass in order:
///
/// 1. A lone group is returned unconditionally, whatever its size.
/// 2. If the smallest group meets the floor and no group exceeds the
///    ceiling, the configuration is acceptable.
/// 3. If only the ceiling is violated but every group already sits at or
///    above it, no transfer can relieve the excess and the configuration
///    is returned as-is (the ceiling is best-effort; the floor is not).
///
/// Otherwise one member moves and the loop repeats: when the aggregate
/// spare (`size - min` summed over all groups) is non-negative the floor is
/// still reachable, so a random member moves from the largest group into
/// the smallest; when it is negative the smallest group is drained into the
/// next-smallest until it dissolves. Ties at either extreme are broken
/// uniformly at random. Groups emptied by a transfer are removed, so no
/// group is ever returned empty.
pub fn rebalance<R: Rng>(
    groups: Vec<Group>,
    constraints: SizeConstraints,
    rng: &mut R,
) -> Result<Vec<Group>> {
    constraints.validate()?;
    let mut groups: Vec<Group> = groups.into_iter().filter(|g| !g.is_empty()).collect();

    loop {
        if groups.len() <= 1 {
            return Ok(groups);
        }

        let sizes: Vec<usize> = groups.iter().map(Group::size).collect();
        let smallest = sizes.iter().copied().min().unwrap_or(0);
        let largest = sizes.iter().copied().max().unwrap_or(0);

        let floor_ok = smallest >= constraints.min;
        let ceiling_ok = constraints.max.is_none_or(|max| largest <= max);
        if floor_ok && ceiling_ok {
            return Ok(groups);
        }

        // Ceiling-only violation with every group at or above the ceiling:
        // a transfer would just hand the excess to another group.
        if floor_ok && constraints.max.is_some_and(|max| smallest >= max) {
            debug!(smallest, largest, "ceiling unsatisfiable, keeping groups");
            return Ok(groups);
        }

        let spare: i64 = sizes
            .iter()
            .map(|&size| size as i64 - constraints.min as i64)
            .sum();

        let Some(smallest_index) = pick_matching_index(&sizes, |&s| s == smallest, rng) else {
            return Ok(groups);
        };

        if spare >= 0 {
            // Enough total surplus remains to lift every group to the
            // floor (or only the ceiling is violated): grow the smallest
            // group from the largest.
            let Some(largest_index) = pick_matching_index(&sizes, |&s| s == largest, rng) else {
                return Ok(groups);
            };
            debug!(spare, smallest, largest, "moving member from largest into smallest");
            transfer_member(&mut groups, largest_index, smallest_index, rng);
        } else {
            // The floor is unreachable without merging: drain the smallest
            // group into the next-smallest instead of futilely growing it.
            let indexed: Vec<(usize, usize)> = sizes.iter().copied().enumerate().collect();
            let next_smallest = indexed
                .iter()
                .filter(|(index, _)| *index != smallest_index)
                .map(|(_, size)| *size)
                .min();
            let Some(next_smallest) = next_smallest else {
                return Ok(groups);
            };
            let Some(target_index) = pick_matching_index(
                &indexed,
                |&(index, size)| index != smallest_index && size == next_smallest,
                rng,
            ) else {
                return Ok(groups);
            };
            debug!(spare, smallest, "draining smallest group toward dissolution");
            transfer_member(&mut groups, smallest_index, target_index, rng);
        }

        if let Some(emptied) = groups.iter().find(|group| group.is_empty()) {
            warn!(group = %emptied.title, "group dissolved during rebalancing");
        }
        groups.retain(|group| !group.is_empty());
    }
}

/// Move one randomly selected member from `from` to `to`.
///
/// An empty donor or out-of-range index leaves the groups untouched.
fn transfer_member<R: Rng>(groups: &mut [Group], from: usize, to: usize, rng: &mut R) {
    if from == to || to >= groups.len() {
        return;
    }
    let member = match groups.get_mut(from) {
        Some(donor) => take_random(&mut donor.members, rng),
        None => None,
    };
    if let Some(member) = member
        && let Some(receiver) = groups.get_mut(to)
    {
        receiver.members.push(member);
    }
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
    use crate::model::group::total_members;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn group_of(title: &str, ids: std::ops::Range<u32>) -> Group {
        Group::new(title, ids.map(|i| format!("u{i}")).collect())
    }

    fn sorted_sizes(groups: &[Group]) -> Vec<usize> {
        let mut sizes: Vec<usize> = groups.iter().map(Group::size).collect();
        sizes.sort_unstable();
        sizes
    }

    #[test]
    fn test_invalid_constraints_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let groups = vec![group_of("a", 0..3)];
        let result = rebalance(groups, SizeConstraints::bounded(5, 4), &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = rebalance(vec![], SizeConstraints::default(), &mut rng).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_memberless_groups_are_dropped() {
        let mut rng = StdRng::seed_from_u64(0);
        let groups = vec![Group::new("a", vec![]), Group::new("b", vec![])];
        let result = rebalance(groups, SizeConstraints::default(), &mut rng).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_lone_group_is_never_dissolved() {
        // Three members, floor of four: a lone group still survives.
        let groups = vec![group_of("a", 0..3)];
        let mut rng = StdRng::seed_from_u64(0);
        let result = rebalance(groups.clone(), SizeConstraints::at_least(4), &mut rng).unwrap();
        assert_eq!(result, groups);
    }

    #[test]
    fn test_lone_group_ignores_ceiling() {
        let groups = vec![group_of("a", 0..10)];
        let mut rng = StdRng::seed_from_u64(0);
        let result = rebalance(groups.clone(), SizeConstraints::bounded(1, 3), &mut rng).unwrap();
        assert_eq!(result, groups);
    }

    #[test]
    fn test_groups_merge_when_floor_unreachable() {
        // 3 + 4 members against a floor of 4: not enough spare to lift the
        // small group, so it drains into the other one.
        for seed in 0..16 {
            let groups = vec![group_of("a", 0..3), group_of("b", 3..7)];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::at_least(4), &mut rng).unwrap();
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].title, "b");
            assert_eq!(result[0].size(), 7);
            for i in 0..7 {
                assert!(result[0].contains(&format!("u{i}")));
            }
        }
    }

    #[test]
    fn test_surplus_is_redistributed_to_meet_floor() {
        // Sizes 1, 8, 3 with floor 4: spare is zero, so everything levels
        // out at exactly the floor.
        for seed in 0..16 {
            let groups = vec![
                group_of("a", 0..1),
                group_of("b", 1..9),
                group_of("c", 9..12),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::at_least(4), &mut rng).unwrap();
            assert_eq!(sorted_sizes(&result), vec![4, 4, 4]);
            assert_eq!(total_members(&result), 12);
        }
    }

    #[test]
    fn test_ceiling_excess_moves_to_smaller_group() {
        // Sizes 4 and 7 with floor 4, ceiling 6: one member moves over.
        for seed in 0..16 {
            let groups = vec![group_of("a", 0..4), group_of("b", 4..11)];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::bounded(4, 6), &mut rng).unwrap();
            assert_eq!(sorted_sizes(&result), vec![5, 6]);
            assert_eq!(total_members(&result), 11);
        }
    }

    #[test]
    fn test_ceiling_unsatisfiable_keeps_groups_as_is() {
        let groups = vec![group_of("a", 0..7), group_of("b", 7..14)];
        let mut rng = StdRng::seed_from_u64(0);
        let result =
            rebalance(groups.clone(), SizeConstraints::bounded(1, 5), &mut rng).unwrap();
        assert_eq!(result, groups);
    }

    #[test]
    fn test_zero_floor_is_inert() {
        let groups = vec![group_of("a", 0..1), group_of("b", 1..6)];
        let mut rng = StdRng::seed_from_u64(0);
        let result = rebalance(groups.clone(), SizeConstraints::at_least(0), &mut rng).unwrap();
        assert_eq!(result, groups);
    }

    #[test]
    fn test_zero_floor_still_enforces_ceiling() {
        for seed in 0..16 {
            let groups = vec![group_of("a", 0..1), group_of("b", 1..8)];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::bounded(0, 4), &mut rng).unwrap();
            assert_eq!(sorted_sizes(&result), vec![4, 4]);
        }
    }

    #[test]
    fn test_conservation_and_floor_across_seeds() {
        for seed in 0..32 {
            let groups = vec![
                group_of("a", 0..1),
                group_of("b", 1..3),
                group_of("c", 3..6),
                group_of("d", 6..10),
                group_of("e", 10..15),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::at_least(3), &mut rng).unwrap();
            assert_eq!(total_members(&result), 15);
            assert!(result.iter().all(|g| !g.is_empty()));
            if result.len() > 1 {
                assert!(result.iter().all(|g| g.size() >= 3));
            }
        }
    }

    #[test]
    fn test_idempotent_at_fixpoint() {
        for seed in 0..16 {
            let groups = vec![
                group_of("a", 0..2),
                group_of("b", 2..8),
                group_of("c", 8..11),
            ];
            let constraints = SizeConstraints::bounded(3, 6);
            let mut rng = StdRng::seed_from_u64(seed);
            let balanced = rebalance(groups, constraints, &mut rng).unwrap();

            let mut rerun_rng = StdRng::seed_from_u64(seed.wrapping_add(1000));
            let rerun = rebalance(balanced.clone(), constraints, &mut rerun_rng).unwrap();
            assert_eq!(rerun, balanced);
        }
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let run = |seed: u64| {
            let groups = vec![
                group_of("a", 0..2),
                group_of("b", 2..4),
                group_of("c", 4..12),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            rebalance(groups, SizeConstraints::at_least(4), &mut rng).unwrap()
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    fn test_tied_smallest_is_not_always_first() {
        // Two groups tied at the smallest size, neither able to reach the
        // floor: which one dissolves depends on the tie-break, so over many
        // seeds both titles must survive at least once.
        let mut survivors = std::collections::HashSet::new();
        for seed in 0..64 {
            let groups = vec![group_of("a", 0..3), group_of("b", 3..6)];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = rebalance(groups, SizeConstraints::at_least(4), &mut rng).unwrap();
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].size(), 6);
            survivors.insert(result[0].title.clone());
        }
        assert!(survivors.contains("a") && survivors.contains("b"));
    }
}
