//! Message composition for poll results.
//!
//! Formatting only: nothing here calls the chat API, and nothing reads
//! the clock; dates are passed in by the caller.

use jiff::ToSpan;
use jiff::civil::Date;

use crate::model::group::{Group, ParticipantId, SizeConstraints};
use crate::poll::presenter::VOLUNTEER_REACTION;

/// Chat mention for a participant.
pub fn mention(id: &str) -> String {
    format!("<@{id}>")
}

fn mention_list(ids: &[ParticipantId]) -> String {
    ids.iter()
        .map(|id| mention(id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Announcement for one surviving group: title, member count, and a
/// mention per member.
pub fn group_announcement(group: &Group, constraints: &SizeConstraints) -> String {
    let count = match constraints.max {
        Some(max) => format!("{}/{}", group.size(), max),
        None => format!("{} members", group.size()),
    };
    format!(
        "\u{1f4da} *{}* ({})\n{}",
        group.title,
        count,
        mention_list(&group.members)
    )
}

/// The calendar date `days` after `start`, saturating at the calendar
/// bounds.
pub fn deadline_after_days(start: Date, days: i64) -> Date {
    start.saturating_add(days.days())
}

/// Recruitment message asking group members to volunteer as presenter.
pub fn presenter_call(title: &str, deadline: Date) -> String {
    format!(
        "\u{1f4dd} *Presenter wanted for {title}*\n\
         \u{2022} Want to present {title}? React to this message with :{VOLUNTEER_REACTION}: by {deadline}.\n\
         \u{2022} If nobody volunteers, a presenter is drawn at random from the group!"
    )
}

/// Summary line posted once per closed poll.
pub fn poll_summary(total_participants: usize, group_count: usize) -> String {
    format!(
        "\u{1f4ca} *Poll results*\n{total_participants} members voted and {group_count} groups were formed."
    )
}

/// Reminder mentioning everyone who has not voted yet.
pub fn encouragement(non_voters: &[ParticipantId]) -> String {
    format!(
        "A reminder for everyone who has not voted yet!\n{}",
        mention_list(non_voters)
    )
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
    use jiff::civil::date;

    #[test]
    fn test_mention_format() {
        assert_eq!(mention("u1"), "<@u1>");
    }

    #[test]
    fn test_group_announcement_with_ceiling() {
        let group = Group::new("Dune", vec!["u1".to_string(), "u2".to_string()]);
        let text = group_announcement(&group, &SizeConstraints::bounded(1, 6));
        assert!(text.contains("*Dune*"));
        assert!(text.contains("(2/6)"));
        assert!(text.contains("<@u1> <@u2>"));
    }

    #[test]
    fn test_group_announcement_without_ceiling() {
        let group = Group::new("Dune", vec!["u1".to_string()]);
        let text = group_announcement(&group, &SizeConstraints::at_least(1));
        assert!(text.contains("(1 members)"));
    }

    #[test]
    fn test_deadline_after_days_crosses_month_boundary() {
        assert_eq!(
            deadline_after_days(date(2026, 1, 30), 3),
            date(2026, 2, 2)
        );
    }

    #[test]
    fn test_presenter_call_names_title_and_deadline() {
        let text = presenter_call("Dune", date(2026, 8, 12));
        assert!(text.contains("Dune"));
        assert!(text.contains("2026-08-12"));
        assert!(text.contains(":o:"));
    }

    #[test]
    fn test_poll_summary_counts() {
        let text = poll_summary(12, 3);
        assert!(text.contains("12 members voted"));
        assert!(text.contains("3 groups"));
    }

    #[test]
    fn test_encouragement_mentions_holdouts() {
        let text = encouragement(&["u1".to_string(), "u2".to_string()]);
        assert!(text.contains("<@u1> <@u2>"));
    }
}
