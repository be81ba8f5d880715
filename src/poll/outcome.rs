//! Poll outcome composition.
//!
//! The pure pipeline from fetched reaction payloads to announced groups:
//! bot filtering, vote extraction, duplicate resolution, size balancing,
//! option-order sorting, and announcement rendering. The surrounding
//! handler fetches the reactions beforehand and sends the messages
//! afterwards; nothing here performs I/O.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::balance::balance_groups;
use crate::error::Result;
use crate::model::group::{Group, ParticipantId, SizeConstraints, total_members};
use crate::poll::messages;
use crate::poll::reactions::{self, MessageReaction};

/// Result of closing a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Surviving groups, ordered by their option's position in the poll.
    pub groups: Vec<Group>,
    /// One announcement per surviving group, same order.
    pub announcements: Vec<String>,
    /// Total participants across all groups.
    pub total_participants: usize,
}

impl PollOutcome {
    /// Check if nobody voted.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Summary line for the whole poll.
    pub fn summary(&self) -> String {
        messages::poll_summary(self.total_participants, self.groups.len())
    }
}

/// Close a poll: extract votes, resolve duplicates, balance sizes, and
/// render announcements.
///
/// Zero votes (or votes only from known bots) yield an empty outcome,
/// never an error.
pub fn resolve_poll<R: Rng>(
    reactions: &[MessageReaction],
    titles: &[String],
    constraints: SizeConstraints,
    bot_ids: &HashSet<ParticipantId>,
    rng: &mut R,
) -> Result<PollOutcome> {
    let filtered = reactions::without_bots(reactions, bot_ids);
    let raw = reactions::raw_groups(&filtered, titles);
    if total_members(&raw) == 0 {
        debug!("poll closed with no votes");
        return Ok(PollOutcome {
            groups: vec![],
            announcements: vec![],
            total_participants: 0,
        });
    }

    let mut groups = balance_groups(raw, constraints, rng)?;
    sort_by_option_order(&mut groups, titles);

    let announcements = groups
        .iter()
        .map(|group| messages::group_announcement(group, &constraints))
        .collect();
    let total_participants = total_members(&groups);
    info!(
        total_participants,
        groups = groups.len(),
        "poll resolved into balanced groups"
    );
    Ok(PollOutcome {
        groups,
        announcements,
        total_participants,
    })
}

/// Order surviving groups by their option's position in the poll.
fn sort_by_option_order(groups: &mut [Group], titles: &[String]) {
    groups.sort_by_key(|group| {
        titles
            .iter()
            .position(|title| title == &group.title)
            .unwrap_or(usize::MAX)
    });
}

/// Display ordering for a group's member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberOrder {
    /// Keep assignment order.
    #[default]
    Original,
    /// Alphabetical by participant ID.
    Alphabetical,
    /// Shuffled with the injected random source.
    Shuffled,
}

/// Copy of a group with its members ordered for display.
pub fn order_members<R: Rng>(group: &Group, order: MemberOrder, rng: &mut R) -> Group {
    let mut members = group.members.clone();
    match order {
        MemberOrder::Original => {}
        MemberOrder::Alphabetical => members.sort_unstable(),
        MemberOrder::Shuffled => members.shuffle(rng),
    }
    Group::new(group.title.clone(), members)
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

    fn reaction(name: &str, users: &[&str]) -> MessageReaction {
        MessageReaction {
            name: name.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            count: users.len(),
        }
    }

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn no_bots() -> HashSet<ParticipantId> {
        HashSet::new()
    }

    #[test]
    fn test_no_votes_yields_empty_outcome() {
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = resolve_poll(
            &[],
            &titles(&["Dune"]),
            SizeConstraints::default(),
            &no_bots(),
            &mut rng,
        )
        .unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.total_participants, 0);
    }

    #[test]
    fn test_bot_only_votes_yield_empty_outcome() {
        let mut rng = StdRng::seed_from_u64(0);
        let bots: HashSet<ParticipantId> = ["bot1".to_string()].into_iter().collect();
        let outcome = resolve_poll(
            &[reaction("one", &["bot1"])],
            &titles(&["Dune"]),
            SizeConstraints::default(),
            &bots,
            &mut rng,
        )
        .unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_groups_follow_option_order() {
        let reactions = vec![
            reaction("two", &["u3", "u4"]),
            reaction("one", &["u1", "u2"]),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = resolve_poll(
            &reactions,
            &titles(&["Dune", "Solaris"]),
            SizeConstraints::at_least(2),
            &no_bots(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(outcome.groups[0].title, "Dune");
        assert_eq!(outcome.groups[1].title, "Solaris");
        assert_eq!(outcome.total_participants, 4);
        assert!(outcome.announcements[0].contains("*Dune*"));
        assert!(outcome.announcements[1].contains("*Solaris*"));
    }

    #[test]
    fn test_order_survives_a_merge() {
        // The middle option cannot reach the floor and dissolves; the
        // remaining groups keep poll order.
        for seed in 0..16 {
            let reactions = vec![
                reaction("one", &["u1", "u2", "u3", "u4"]),
                reaction("two", &["u5"]),
                reaction("three", &["u6", "u7", "u8", "u9"]),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = resolve_poll(
                &reactions,
                &titles(&["Dune", "Solaris", "Ubik"]),
                SizeConstraints::at_least(4),
                &no_bots(),
                &mut rng,
            )
            .unwrap();
            assert_eq!(outcome.total_participants, 9);
            let positions: Vec<usize> = outcome
                .groups
                .iter()
                .map(|g| {
                    ["Dune", "Solaris", "Ubik"]
                        .iter()
                        .position(|t| *t == g.title)
                        .unwrap()
                })
                .collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(positions, sorted);
        }
    }

    #[test]
    fn test_outcome_respects_floor_invariant() {
        for seed in 0..16 {
            let reactions = vec![
                reaction("one", &["u1", "u2", "u3", "u4", "u5", "u6"]),
                reaction("two", &["u7"]),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = resolve_poll(
                &reactions,
                &titles(&["Dune", "Solaris"]),
                SizeConstraints::at_least(3),
                &no_bots(),
                &mut rng,
            )
            .unwrap();
            assert_eq!(outcome.total_participants, 7);
            if outcome.groups.len() > 1 {
                assert!(outcome.groups.iter().all(|g| g.size() >= 3));
            }
        }
    }

    #[test]
    fn test_bot_votes_are_excluded_from_groups() {
        let reactions = vec![reaction("one", &["u1", "bot1", "u2"])];
        let bots: HashSet<ParticipantId> = ["bot1".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = resolve_poll(
            &reactions,
            &titles(&["Dune"]),
            SizeConstraints::default(),
            &bots,
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.total_participants, 2);
        assert!(!outcome.groups[0].contains("bot1"));
    }

    #[test]
    fn test_summary_reflects_outcome() {
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = resolve_poll(
            &[reaction("one", &["u1", "u2"])],
            &titles(&["Dune"]),
            SizeConstraints::default(),
            &no_bots(),
            &mut rng,
        )
        .unwrap();
        let summary = outcome.summary();
        assert!(summary.contains("2 members voted"));
        assert!(summary.contains("1 groups"));
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let run = |seed: u64| {
            let reactions = vec![
                reaction("one", &["u1", "u2", "u3"]),
                reaction("two", &["u1", "u4", "u5"]),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            resolve_poll(
                &reactions,
                &titles(&["Dune", "Solaris"]),
                SizeConstraints::at_least(3),
                &no_bots(),
                &mut rng,
            )
            .unwrap()
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn test_order_members_alphabetical() {
        let group = Group::new(
            "Dune",
            vec!["u3".to_string(), "u1".to_string(), "u2".to_string()],
        );
        let mut rng = StdRng::seed_from_u64(0);
        let ordered = order_members(&group, MemberOrder::Alphabetical, &mut rng);
        assert_eq!(ordered.members, vec!["u1", "u2", "u3"]);
        // Input untouched.
        assert_eq!(group.members, vec!["u3", "u1", "u2"]);
    }

    #[test]
    fn test_order_members_shuffled_conserves_members() {
        let group = Group::new(
            "Dune",
            (0..8).map(|i| format!("u{i}")).collect::<Vec<_>>(),
        );
        let mut rng = StdRng::seed_from_u64(1);
        let shuffled = order_members(&group, MemberOrder::Shuffled, &mut rng);
        let mut sorted = shuffled.members.clone();
        sorted.sort_unstable();
        let mut expected = group.members.clone();
        expected.sort_unstable();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_order_members_original_is_identity() {
        let group = Group::new("Dune", vec!["u2".to_string(), "u1".to_string()]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(order_members(&group, MemberOrder::Original, &mut rng), group);
    }
}
