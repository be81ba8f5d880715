//! Multi-vote resolution.
//!
//! A voter may legitimately react to several options. Before sizes can be
//! balanced, every voter must belong to exactly one group; this module
//! resolves each multi-option voter to a single candidate group and filters
//! the group lists accordingly. The input is never mutated.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::debug;

use crate::model::group::{Group, ParticipantId};

/// Resolve every participant to at most one group.
///
/// A participant with one candidate group is assigned there. A participant
/// with several candidates is assigned to one of them: uniformly among the
/// candidates whose raw member count is at least `min` when any qualify
/// (keeping groups that already have enough votes intact), otherwise
/// uniformly among all candidates. Repeats of a participant within a single
/// group collapse to one occurrence.
///
/// Participants are processed in first-appearance order, so a fixed random
/// sequence yields a fixed assignment.
pub fn resolve_multi_voters<R: Rng>(groups: &[Group], min: usize, rng: &mut R) -> Vec<Group> {
    // participant -> candidate group indices, first-appearance order kept
    // separately since map iteration order is unspecified
    let mut order: Vec<ParticipantId> = Vec::new();
    let mut candidates: HashMap<ParticipantId, Vec<usize>> = HashMap::new();
    for (index, group) in groups.iter().enumerate() {
        for member in &group.members {
            let entry = candidates.entry(member.clone()).or_insert_with(|| {
                order.push(member.clone());
                Vec::new()
            });
            if !entry.contains(&index) {
                entry.push(index);
            }
        }
    }

    let mut assigned: HashMap<ParticipantId, usize> = HashMap::with_capacity(order.len());
    let mut multi_voters = 0usize;
    for participant in &order {
        let Some(indices) = candidates.get(participant) else {
            continue;
        };
        let chosen = match indices.as_slice() {
            [] => continue,
            [only] => *only,
            [first, ..] => {
                multi_voters += 1;
                pick_candidate(indices, groups, min, rng).unwrap_or(*first)
            }
        };
        assigned.insert(participant.clone(), chosen);
    }
    if multi_voters > 0 {
        debug!(multi_voters, "resolved multi-option voters");
    }

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let mut seen: HashSet<&str> = HashSet::new();
            let members = group
                .members
                .iter()
                .filter(|member| assigned.get(member.as_str()) == Some(&index))
                .filter(|member| seen.insert(member.as_str()))
                .cloned()
                .collect();
            Group::new(group.title.clone(), members)
        })
        .collect()
}

/// Draw one candidate index, preferring groups whose raw size already
/// meets `min`.
fn pick_candidate<R: Rng>(
    indices: &[usize],
    groups: &[Group],
    min: usize,
    rng: &mut R,
) -> Option<usize> {
    let qualifying: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&index| groups.get(index).is_some_and(|group| group.size() >= min))
        .collect();
    let pool: &[usize] = if qualifying.is_empty() {
        indices
    } else {
        &qualifying
    };
    pool.get(rng.gen_range(0..pool.len())).copied()
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

    fn group(title: &str, members: &[&str]) -> Group {
        Group::new(title, members.iter().map(|m| m.to_string()).collect())
    }

    fn occurrences(groups: &[Group], id: &str) -> usize {
        groups.iter().filter(|g| g.contains(id)).count()
    }

    #[test]
    fn test_disjoint_groups_pass_through() {
        let groups = vec![group("a", &["u1", "u2"]), group("b", &["u3"])];
        let mut rng = StdRng::seed_from_u64(0);
        let resolved = resolve_multi_voters(&groups, 1, &mut rng);
        assert_eq!(resolved, groups);
    }

    #[test]
    fn test_multi_voter_lands_in_exactly_one_group() {
        // u1 voted for both options; the losing group shrinks by one.
        let groups = vec![group("a", &["u1", "u2"]), group("b", &["u1", "u3", "u4"])];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_multi_voters(&groups, 1, &mut rng);
            assert_eq!(occurrences(&resolved, "u1"), 1);
            let (in_a, in_b) = (resolved[0].contains("u1"), resolved[1].contains("u1"));
            if in_a {
                assert_eq!(resolved[0].size(), 2);
                assert_eq!(resolved[1].size(), 2);
            } else {
                assert!(in_b);
                assert_eq!(resolved[0].size(), 1);
                assert_eq!(resolved[1].size(), 3);
            }
        }
    }

    #[test]
    fn test_prefers_qualifying_candidate() {
        // Only "a" already has min raw votes, so u1 must stay there.
        let groups = vec![
            group("a", &["u1", "u2", "u3", "u4"]),
            group("b", &["u1", "u5"]),
        ];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_multi_voters(&groups, 4, &mut rng);
            assert!(resolved[0].contains("u1"));
            assert!(!resolved[1].contains("u1"));
        }
    }

    #[test]
    fn test_falls_back_to_uniform_when_none_qualify() {
        let groups = vec![group("a", &["u1", "u2"]), group("b", &["u1", "u3"])];
        let mut landed_a = false;
        let mut landed_b = false;
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_multi_voters(&groups, 10, &mut rng);
            landed_a |= resolved[0].contains("u1");
            landed_b |= resolved[1].contains("u1");
        }
        assert!(landed_a && landed_b);
    }

    #[test]
    fn test_repeats_within_group_collapse() {
        let groups = vec![group("a", &["u1", "u1", "u2"])];
        let mut rng = StdRng::seed_from_u64(0);
        let resolved = resolve_multi_voters(&groups, 1, &mut rng);
        assert_eq!(resolved[0].members, vec!["u1", "u2"]);
    }

    #[test]
    fn test_no_participant_in_two_groups_after_resolution() {
        let groups = vec![
            group("a", &["u1", "u2", "u3"]),
            group("b", &["u2", "u3", "u4"]),
            group("c", &["u3", "u4", "u5"]),
        ];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = resolve_multi_voters(&groups, 2, &mut rng);
            for id in ["u1", "u2", "u3", "u4", "u5"] {
                assert_eq!(occurrences(&resolved, id), 1, "{id} duplicated");
            }
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let groups = vec![group("a", &["u1"]), group("b", &["u1"])];
        let snapshot = groups.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let _ = resolve_multi_voters(&groups, 1, &mut rng);
        assert_eq!(groups, snapshot);
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let groups = vec![
            group("a", &["u1", "u2", "u3"]),
            group("b", &["u1", "u2", "u4"]),
        ];
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            resolve_multi_voters(&groups, 2, &mut rng)
        };
        assert_eq!(run(9), run(9));
    }
}
