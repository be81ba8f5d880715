//! Presenter selection.
//!
//! After groups are announced, each group picks one presenter: members who
//! volunteered on the recruitment message are preferred; otherwise anyone
//! in the group may be drawn.

use rand::Rng;

use crate::model::group::ParticipantId;

/// Reaction name members leave on the recruitment message to volunteer.
pub const VOLUNTEER_REACTION: &str = "o";

/// A selected presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterPick {
    /// The chosen member.
    pub presenter: ParticipantId,
    /// Whether they volunteered rather than being drawn from the whole
    /// group.
    pub volunteered: bool,
}

/// Draw one presenter for a group.
///
/// `volunteers` is intersected with the group's members first: a reaction
/// from someone outside the group does not count. If any member
/// volunteered, one of them is drawn uniformly; otherwise one member is
/// drawn uniformly. Returns `None` for a memberless group.
pub fn select_presenter<R: Rng>(
    members: &[ParticipantId],
    volunteers: &[ParticipantId],
    rng: &mut R,
) -> Option<PresenterPick> {
    if members.is_empty() {
        return None;
    }
    let eligible: Vec<&ParticipantId> = volunteers
        .iter()
        .filter(|volunteer| members.iter().any(|member| member == *volunteer))
        .collect();

    let (pool, volunteered) = if eligible.is_empty() {
        (members.iter().collect::<Vec<_>>(), false)
    } else {
        (eligible, true)
    };
    let pick = pool.get(rng.gen_range(0..pool.len()))?;
    Some(PresenterPick {
        presenter: (*pick).clone(),
        volunteered,
    })
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

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_group_has_no_presenter() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(select_presenter(&[], &ids(&["u1"]), &mut rng), None);
    }

    #[test]
    fn test_single_member_is_always_picked() {
        let mut rng = StdRng::seed_from_u64(0);
        let pick = select_presenter(&ids(&["u1"]), &[], &mut rng).unwrap();
        assert_eq!(pick.presenter, "u1");
        assert!(!pick.volunteered);
    }

    #[test]
    fn test_volunteer_is_preferred() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick =
                select_presenter(&ids(&["u1", "u2", "u3"]), &ids(&["u2"]), &mut rng).unwrap();
            assert_eq!(pick.presenter, "u2");
            assert!(pick.volunteered);
        }
    }

    #[test]
    fn test_outside_volunteer_does_not_count() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick =
                select_presenter(&ids(&["u1", "u2"]), &ids(&["stranger"]), &mut rng).unwrap();
            assert!(!pick.volunteered);
            assert!(pick.presenter == "u1" || pick.presenter == "u2");
        }
    }

    #[test]
    fn test_random_draw_reaches_every_member() {
        let mut picked = std::collections::HashSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = select_presenter(&ids(&["u1", "u2", "u3"]), &[], &mut rng).unwrap();
            picked.insert(pick.presenter);
        }
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            select_presenter(&ids(&["u1", "u2", "u3"]), &ids(&["u1", "u3"]), &mut rng)
        };
        assert_eq!(run(5), run(5));
    }
}
