//! Persisted group records.
//!
//! Groups are handed to a later invocation (presenter selection reads back
//! the groups the vote produced) as a JSON array of records. This module
//! validates record shape on both decode and encode: field presence and
//! types only; the semantic invariants (no duplicates across groups, no
//! empty groups) are the balancing core's responsibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::group::{Group, ParticipantId};

/// Persisted form of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Option title.
    pub title: String,
    /// Comma-joined member IDs.
    pub members: String,
    /// Timestamp of the announcement message thread.
    pub thread_ts: String,
    /// Timestamp of the presenter recruitment message, if one was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter_message_ts: Option<String>,
}

impl GroupRecord {
    /// Build a record from a balanced group and its announcement thread.
    pub fn from_group(group: &Group, thread_ts: impl Into<String>) -> Self {
        Self {
            title: group.title.clone(),
            members: group.members.join(","),
            thread_ts: thread_ts.into(),
            presenter_message_ts: None,
        }
    }

    /// Member IDs parsed back out of the comma-joined field.
    pub fn member_ids(&self) -> Vec<ParticipantId> {
        self.members
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Reconstruct the in-memory group.
    pub fn to_group(&self) -> Group {
        Group::new(self.title.clone(), self.member_ids())
    }

    /// Check field contents.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation(
                "record title must be a non-empty string".to_string(),
            ));
        }
        if self.thread_ts.trim().is_empty() {
            return Err(Error::Validation(
                "record thread_ts must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a record from a decoded JSON value, checking presence and
    /// types field by field.
    fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("record must be an object".to_string()))?;

        let title = require_string(object, "title")?;
        let members = require_string(object, "members")?;
        let thread_ts = require_string(object, "thread_ts")?;
        let presenter_message_ts = match object.get("presenter_message_ts") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::Validation(
                            "field 'presenter_message_ts' must be a string".to_string(),
                        )
                    })?,
            ),
        };

        let record = Self {
            title,
            members,
            thread_ts,
            presenter_message_ts,
        };
        record.validate()?;
        Ok(record)
    }
}

fn require_string(object: &serde_json::Map<String, Value>, field: &str) -> Result<String> {
    let value = object
        .get(field)
        .ok_or_else(|| Error::MissingField(field.to_string()))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("field '{}' must be a string", field)))
}

/// Decode a JSON array of group records, validating each.
pub fn parse_group_records(json: &str) -> Result<Vec<GroupRecord>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    values.iter().map(GroupRecord::from_value).collect()
}

/// Encode group records as a JSON array, validating each first.
pub fn encode_group_records(records: &[GroupRecord]) -> Result<String> {
    for record in records {
        record.validate()?;
    }
    Ok(serde_json::to_string(records)?)
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

    fn sample_record() -> GroupRecord {
        GroupRecord {
            title: "Dune".to_string(),
            members: "u1,u2,u3".to_string(),
            thread_ts: "1720000000.000100".to_string(),
            presenter_message_ts: None,
        }
    }

    #[test]
    fn test_from_group_joins_members() {
        let group = Group::new("Dune", vec!["u1".to_string(), "u2".to_string()]);
        let record = GroupRecord::from_group(&group, "1720000000.000100");
        assert_eq!(record.members, "u1,u2");
        assert_eq!(record.thread_ts, "1720000000.000100");
        assert_eq!(record.presenter_message_ts, None);
    }

    #[test]
    fn test_member_ids_trims_and_skips_blanks() {
        let mut record = sample_record();
        record.members = " u1, u2 ,,u3 ".to_string();
        assert_eq!(record.member_ids(), vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_to_group_round_trip() {
        let group = Group::new("Dune", vec!["u1".to_string(), "u2".to_string()]);
        let record = GroupRecord::from_group(&group, "ts");
        assert_eq!(record.to_group(), group);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let records = vec![sample_record()];
        let json = encode_group_records(&records).unwrap();
        let decoded = parse_group_records(&json).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_parse_missing_field() {
        let json = r#"[{"title":"Dune","thread_ts":"1"}]"#;
        let err = parse_group_records(json).unwrap_err();
        assert!(matches!(err, Error::MissingField(field) if field == "members"));
    }

    #[test]
    fn test_parse_wrong_type() {
        let json = r#"[{"title":"Dune","members":["u1"],"thread_ts":"1"}]"#;
        let err = parse_group_records(json).unwrap_err();
        assert!(err.to_string().contains("'members' must be a string"));
    }

    #[test]
    fn test_parse_empty_title_rejected() {
        let json = r#"[{"title":"  ","members":"u1","thread_ts":"1"}]"#;
        assert!(parse_group_records(json).is_err());
    }

    #[test]
    fn test_parse_not_an_array() {
        let err = parse_group_records(r#"{"title":"Dune"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_parse_optional_presenter_ts() {
        let json = r#"[{"title":"Dune","members":"u1","thread_ts":"1","presenter_message_ts":"2"}]"#;
        let records = parse_group_records(json).unwrap();
        assert_eq!(records[0].presenter_message_ts.as_deref(), Some("2"));

        let json = r#"[{"title":"Dune","members":"u1","thread_ts":"1","presenter_message_ts":null}]"#;
        let records = parse_group_records(json).unwrap();
        assert_eq!(records[0].presenter_message_ts, None);
    }

    #[test]
    fn test_encode_rejects_blank_thread_ts() {
        let mut record = sample_record();
        record.thread_ts = String::new();
        assert!(encode_group_records(&[record]).is_err());
    }

    #[test]
    fn test_parse_empty_array() {
        assert_eq!(parse_group_records("[]").unwrap(), vec![]);
    }
}
