//! Reaction payload processing.
//!
//! The pure half of vote extraction: fetching reactions from the chat API
//! happens outside this crate; these functions turn already-fetched
//! reaction payloads into raw per-option groups and voter sets.
//!
//! Raw output may legitimately repeat a participant across groups: a
//! voter who reacted to several options appears under each of them until
//! the balancing core resolves the duplicates.

use std::collections::HashSet;

use serde::Deserialize;

use crate::model::group::{Group, ParticipantId};

/// A numbered reaction symbol marking one poll option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSymbol {
    /// Reaction name as delivered by the chat API.
    pub reaction: &'static str,
    /// Display emoji for message composition.
    pub display: &'static str,
}

/// Numbered reaction symbols in option order. Polls are capped at ten
/// options by the available number emoji.
pub static OPTION_SYMBOLS: [OptionSymbol; 10] = [
    OptionSymbol { reaction: "one", display: "1\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "two", display: "2\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "three", display: "3\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "four", display: "4\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "five", display: "5\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "six", display: "6\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "seven", display: "7\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "eight", display: "8\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "nine", display: "9\u{fe0f}\u{20e3}" },
    OptionSymbol { reaction: "keycap_ten", display: "\u{1f51f}" },
];

/// The symbol marking a given option index, if within range.
pub fn option_symbol(index: usize) -> Option<&'static OptionSymbol> {
    OPTION_SYMBOLS.get(index)
}

/// One reaction on the poll message, as fetched from the chat API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageReaction {
    /// Reaction name.
    pub name: String,
    /// Users who left this reaction.
    #[serde(default)]
    pub users: Vec<ParticipantId>,
    /// Reaction count as reported by the API.
    #[serde(default)]
    pub count: usize,
}

/// Copy of the reactions with known bot accounts removed and counts
/// recomputed from the surviving users.
pub fn without_bots(
    reactions: &[MessageReaction],
    bot_ids: &HashSet<ParticipantId>,
) -> Vec<MessageReaction> {
    reactions
        .iter()
        .map(|reaction| {
            let users: Vec<ParticipantId> = reaction
                .users
                .iter()
                .filter(|user| !bot_ids.contains(*user))
                .cloned()
                .collect();
            MessageReaction {
                name: reaction.name.clone(),
                count: users.len(),
                users,
            }
        })
        .collect()
}

/// Build raw per-option groups from reaction payloads.
///
/// Each title is paired with its numbered symbol; titles beyond the symbol
/// table and reactions that match no symbol are ignored. Options nobody
/// reacted to yield empty groups; the rebalancer drops those.
pub fn raw_groups(reactions: &[MessageReaction], titles: &[String]) -> Vec<Group> {
    titles
        .iter()
        .zip(OPTION_SYMBOLS.iter())
        .map(|(title, symbol)| {
            let members = reactions
                .iter()
                .find(|reaction| reaction.name == symbol.reaction)
                .map(|reaction| reaction.users.clone())
                .unwrap_or_default();
            Group::new(title.clone(), members)
        })
        .collect()
}

/// Unique voters across the numbered reactions, first-seen order.
///
/// Reactions that are not option markers (someone leaving a stray emoji on
/// the poll message) do not count as votes.
pub fn distinct_voters(reactions: &[MessageReaction]) -> Vec<ParticipantId> {
    let option_names: HashSet<&str> = OPTION_SYMBOLS.iter().map(|s| s.reaction).collect();
    let mut seen = HashSet::new();
    let mut voters = Vec::new();
    for reaction in reactions {
        if !option_names.contains(reaction.name.as_str()) {
            continue;
        }
        for user in &reaction.users {
            if seen.insert(user.clone()) {
                voters.push(user.clone());
            }
        }
    }
    voters
}

/// Channel members who have not voted, channel order preserved.
pub fn non_voters(
    channel_members: &[ParticipantId],
    voters: &[ParticipantId],
) -> Vec<ParticipantId> {
    let voted: HashSet<&str> = voters.iter().map(String::as_str).collect();
    channel_members
        .iter()
        .filter(|member| !voted.contains(member.as_str()))
        .cloned()
        .collect()
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

    #[test]
    fn test_option_symbol_lookup() {
        assert_eq!(option_symbol(0).unwrap().reaction, "one");
        assert_eq!(option_symbol(9).unwrap().reaction, "keycap_ten");
        assert!(option_symbol(10).is_none());
    }

    #[test]
    fn test_raw_groups_maps_reactions_to_titles() {
        let reactions = vec![reaction("one", &["u1", "u2"]), reaction("two", &["u3"])];
        let groups = raw_groups(&reactions, &titles(&["Dune", "Solaris"]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Dune");
        assert_eq!(groups[0].members, vec!["u1", "u2"]);
        assert_eq!(groups[1].title, "Solaris");
        assert_eq!(groups[1].members, vec!["u3"]);
    }

    #[test]
    fn test_raw_groups_option_without_reaction_is_empty() {
        let reactions = vec![reaction("two", &["u1"])];
        let groups = raw_groups(&reactions, &titles(&["Dune", "Solaris"]));
        assert!(groups[0].is_empty());
        assert_eq!(groups[1].members, vec!["u1"]);
    }

    #[test]
    fn test_raw_groups_ignores_unknown_reactions() {
        let reactions = vec![reaction("thumbsup", &["u1"]), reaction("one", &["u2"])];
        let groups = raw_groups(&reactions, &titles(&["Dune"]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec!["u2"]);
    }

    #[test]
    fn test_raw_groups_ignores_titles_beyond_symbol_table() {
        let names: Vec<String> = (0..12).map(|i| format!("Book {i}")).collect();
        let groups = raw_groups(&[], &names);
        assert_eq!(groups.len(), 10);
    }

    #[test]
    fn test_raw_groups_keeps_multi_option_voters() {
        let reactions = vec![reaction("one", &["u1"]), reaction("two", &["u1", "u2"])];
        let groups = raw_groups(&reactions, &titles(&["Dune", "Solaris"]));
        assert!(groups[0].contains("u1"));
        assert!(groups[1].contains("u1"));
    }

    #[test]
    fn test_without_bots_filters_and_recounts() {
        let reactions = vec![reaction("one", &["u1", "bot1", "u2"])];
        let bots: HashSet<ParticipantId> = ["bot1".to_string()].into_iter().collect();
        let filtered = without_bots(&reactions, &bots);
        assert_eq!(filtered[0].users, vec!["u1", "u2"]);
        assert_eq!(filtered[0].count, 2);
    }

    #[test]
    fn test_distinct_voters_dedupes_across_options() {
        let reactions = vec![
            reaction("one", &["u1", "u2"]),
            reaction("two", &["u2", "u3"]),
            reaction("thumbsup", &["u9"]),
        ];
        assert_eq!(distinct_voters(&reactions), vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_non_voters_preserves_channel_order() {
        let members = titles(&["u1", "u2", "u3", "u4"]);
        let voters = titles(&["u3", "u1"]);
        assert_eq!(non_voters(&members, &voters), vec!["u2", "u4"]);
    }

    #[test]
    fn test_non_voters_empty_when_everyone_voted() {
        let members = titles(&["u1"]);
        let voters = titles(&["u1"]);
        assert!(non_voters(&members, &voters).is_empty());
    }
}
