//! Core group and constraint types.
//!
//! A [`Group`] is a named bucket of participants corresponding to one poll
//! option. [`SizeConstraints`] carries the size bounds the rebalancer
//! enforces.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies a participant by their opaque chat user ID.
pub type ParticipantId = String;

/// Default minimum group size when the caller leaves it unset.
pub const DEFAULT_MIN: usize = 1;

/// A named group of participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Option title; stable, unique key across a poll.
    pub title: String,
    /// Participant IDs assigned to this group.
    pub members: Vec<ParticipantId>,
}

impl Group {
    /// Create a new group.
    pub fn new(title: impl Into<String>, members: Vec<ParticipantId>) -> Self {
        Self {
            title: title.into(),
            members,
        }
    }

    /// Number of members in this group.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Check if this group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a participant is a member of this group.
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.members.len())
    }
}

/// Total members across a list of groups.
pub fn total_members(groups: &[Group]) -> usize {
    groups.iter().map(Group::size).sum()
}

/// Size bounds for surviving groups.
///
/// `min` is a hard floor: groups that cannot reach it through
/// redistribution are dissolved and their members absorbed elsewhere.
/// `max` is a soft ceiling the rebalancer relieves when it can do so
/// without starving another group below `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraints {
    /// Minimum acceptable group size.
    pub min: usize,
    /// Maximum acceptable group size, unbounded when `None`.
    pub max: Option<usize>,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: None,
        }
    }
}

impl SizeConstraints {
    /// Constraints with a floor only.
    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Constraints with both a floor and a ceiling.
    pub fn bounded(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Validate the constraint combination.
    ///
    /// `min` is unsigned, so a negative floor is unrepresentable; the live
    /// checks are a zero ceiling and a ceiling below the floor. Invalid
    /// combinations are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max {
            if max == 0 {
                return Err(Error::Validation(
                    "max group size must be at least 1".to_string(),
                ));
            }
            if max < self.min {
                return Err(Error::Validation(format!(
                    "max group size {} is below min group size {}",
                    max, self.min
                )));
            }
        }
        Ok(())
    }

    /// Check if a size satisfies both bounds.
    pub fn within(&self, size: usize) -> bool {
        size >= self.min && self.max.is_none_or(|max| size <= max)
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

    #[test]
    fn test_group_size_and_contains() {
        let group = Group::new("Dune", vec!["u1".to_string(), "u2".to_string()]);
        assert_eq!(group.size(), 2);
        assert!(group.contains("u1"));
        assert!(!group.contains("u3"));
        assert!(!group.is_empty());
    }

    #[test]
    fn test_group_display() {
        let group = Group::new("Dune", vec!["u1".to_string()]);
        assert_eq!(format!("{}", group), "Dune (1)");
    }

    #[test]
    fn test_total_members() {
        let groups = vec![
            Group::new("a", vec!["u1".to_string(), "u2".to_string()]),
            Group::new("b", vec!["u3".to_string()]),
        ];
        assert_eq!(total_members(&groups), 3);
        assert_eq!(total_members(&[]), 0);
    }

    #[test]
    fn test_constraints_default() {
        let constraints = SizeConstraints::default();
        assert_eq!(constraints.min, DEFAULT_MIN);
        assert_eq!(constraints.max, None);
        assert!(constraints.validate().is_ok());
    }

    #[test]
    fn test_constraints_valid_bounds() {
        assert!(SizeConstraints::at_least(0).validate().is_ok());
        assert!(SizeConstraints::bounded(3, 3).validate().is_ok());
        assert!(SizeConstraints::bounded(3, 8).validate().is_ok());
    }

    #[test]
    fn test_constraints_max_below_min_rejected() {
        let result = SizeConstraints::bounded(5, 4).validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("below min"));
    }

    #[test]
    fn test_constraints_zero_max_rejected() {
        assert!(SizeConstraints::bounded(0, 0).validate().is_err());
    }

    #[test]
    fn test_constraints_within() {
        let constraints = SizeConstraints::bounded(4, 6);
        assert!(!constraints.within(3));
        assert!(constraints.within(4));
        assert!(constraints.within(6));
        assert!(!constraints.within(7));

        let unbounded = SizeConstraints::at_least(2);
        assert!(unbounded.within(100));
    }
}
