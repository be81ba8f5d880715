//! Pure group balancing logic.
//!
//! This module turns raw per-option voter lists into groups that satisfy
//! the size constraints, without performing any I/O. It separates the
//! computation of "who ends up where" from everything around it.
//!
//! ## Module Structure
//!
//! - [`selection`]: uniform pick-and-remove and tie-break primitives
//! - [`dedup`]: resolves multi-option voters to a single group
//! - [`rebalancer`]: the iterative loop enforcing the size constraints

pub mod dedup;
pub mod rebalancer;
pub mod selection;

// Re-export commonly used functions
pub use dedup::resolve_multi_voters;
pub use rebalancer::rebalance;
pub use selection::{pick_matching_index, take_random};

use rand::Rng;

use crate::error::Result;
use crate::model::group::{Group, SizeConstraints};

/// Balance raw vote groups: validate constraints, resolve multi-option
/// voters, then rebalance sizes.
///
/// This is the single entry point the poll pipeline uses; the raw input
/// may repeat a participant across groups, the output never does.
pub fn balance_groups<R: Rng>(
    groups: Vec<Group>,
    constraints: SizeConstraints,
    rng: &mut R,
) -> Result<Vec<Group>> {
    constraints.validate()?;
    let deduped = resolve_multi_voters(&groups, constraints.min, rng);
    rebalance(deduped, constraints, rng)
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

    fn group(title: &str, members: &[&str]) -> Group {
        Group::new(title, members.iter().map(|m| m.to_string()).collect())
    }

    #[test]
    fn test_overlapping_votes_collapse_to_one_group() {
        // u1..u3 voted for both options; 7 distinct voters against a floor
        // of 4 cannot sustain two groups, so everything merges.
        for seed in 0..16 {
            let groups = vec![
                group("a", &["u1", "u2", "u3"]),
                group("b", &["u1", "u2", "u3", "u4", "u5", "u6", "u7"]),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = balance_groups(groups, SizeConstraints::at_least(4), &mut rng).unwrap();
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].size(), 7);
            for id in ["u1", "u2", "u3", "u4", "u5", "u6", "u7"] {
                assert!(result[0].contains(id));
            }
        }
    }

    #[test]
    fn test_invalid_constraints_rejected_before_any_work() {
        let mut rng = StdRng::seed_from_u64(0);
        let groups = vec![group("a", &["u1"])];
        assert!(balance_groups(groups, SizeConstraints::bounded(3, 2), &mut rng).is_err());
    }

    #[test]
    fn test_conservation_of_distinct_voters() {
        for seed in 0..16 {
            let groups = vec![
                group("a", &["u1", "u2", "u3", "u4"]),
                group("b", &["u3", "u4", "u5", "u6"]),
                group("c", &["u6", "u7"]),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = balance_groups(groups, SizeConstraints::at_least(2), &mut rng).unwrap();
            // 7 distinct voters, each in exactly one output group.
            assert_eq!(total_members(&result), 7);
            for id in ["u1", "u2", "u3", "u4", "u5", "u6", "u7"] {
                assert_eq!(result.iter().filter(|g| g.contains(id)).count(), 1);
            }
        }
    }
}
