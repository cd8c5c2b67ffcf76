//! Snapshot content parsing and validation
//!
//! A snapshot file is a JSON document of the shape
//!
//! ```json
//! { "name": "Display Name",
//!   "members": [ { "steamid": "7656...", "name": "Alice", "online": 1 } ] }
//! ```
//!
//! Parsing is all-or-nothing: a single bad member entry, an online flag
//! other than `0`/`1`, or a duplicated id rejects the whole snapshot.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::error::Category;

use super::errors::SnapshotError;
use super::group::{Group, Member};
use super::newtypes::MemberId;

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    name: String,
    members: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    steamid: String,
    name: String,
    online: u8,
}

/// A validated, complete listing of one group's members
///
/// Member order is preserved as it appeared in the source so that
/// announcements list members the way the source lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    display_name: String,
    members: Vec<(MemberId, Member)>,
}

impl Snapshot {
    /// Builds a snapshot from already-typed members
    ///
    /// # Errors
    /// Returns [`SnapshotError::DuplicateMember`] if an id appears twice.
    pub fn new(
        display_name: impl Into<String>,
        members: impl IntoIterator<Item = (MemberId, Member)>,
    ) -> Result<Self, SnapshotError> {
        let members: Vec<(MemberId, Member)> = members.into_iter().collect();
        let mut seen = HashSet::with_capacity(members.len());
        for (id, _) in &members {
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateMember(id.to_string()));
            }
        }
        Ok(Self {
            display_name: display_name.into(),
            members,
        })
    }

    /// Parses snapshot JSON text
    ///
    /// # Errors
    /// - [`SnapshotError::InvalidJson`] for syntax errors or truncated input
    /// - [`SnapshotError::Malformed`] for missing fields, wrong types, empty
    ///   ids, or an online flag other than `0`/`1`
    /// - [`SnapshotError::DuplicateMember`] for repeated ids
    pub fn parse(content: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(content).map_err(|e| match e.classify() {
            Category::Syntax | Category::Eof | Category::Io => {
                SnapshotError::InvalidJson(e.to_string())
            }
            Category::Data => SnapshotError::Malformed(e.to_string()),
        })?;

        let mut members = Vec::with_capacity(raw.members.len());
        for (index, m) in raw.members.into_iter().enumerate() {
            let id = MemberId::new(m.steamid).map_err(|e| {
                SnapshotError::Malformed(format!("members[{index}]: {e}"))
            })?;
            let online = match m.online {
                0 => false,
                1 => true,
                other => {
                    return Err(SnapshotError::Malformed(format!(
                        "members[{index}]: online flag must be 0 or 1, got {other}"
                    )))
                }
            };
            members.push((id, Member::new(m.name, online)));
        }

        Self::new(raw.name, members)
    }

    /// Human-readable group name carried by the snapshot
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Members in source order
    pub fn members(&self) -> &[(MemberId, Member)] {
        &self.members
    }

    /// Member display names in source order
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|(_, m)| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Converts the listing into an id-keyed [`Group`]
    pub fn to_group(&self) -> Group {
        self.members.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "name": "The Alphas",
        "members": [
            { "steamid": "2", "name": "Bob", "online": 0 },
            { "steamid": "1", "name": "Alice", "online": 1 }
        ]
    }"#;

    #[test]
    fn test_parse_valid_snapshot() {
        let snapshot = Snapshot::parse(VALID).unwrap();
        assert_eq!(snapshot.display_name(), "The Alphas");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.member_names(), vec!["Bob", "Alice"]);

        let group = snapshot.to_group();
        let alice = group.get(&MemberId::new("1").unwrap()).unwrap();
        assert!(alice.online);
        let bob = group.get(&MemberId::new("2").unwrap()).unwrap();
        assert!(!bob.online);
    }

    #[test]
    fn test_parse_empty_member_list() {
        let snapshot = Snapshot::parse(r#"{"name": "Empty", "members": []}"#).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let json = r#"{"name": "X", "tag": "x", "members": [
            {"steamid": "1", "name": "A", "online": 1, "level": 30}
        ]}"#;
        assert_eq!(Snapshot::parse(json).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = Snapshot::parse("{\"name\": ").unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_members_rejected() {
        let err = Snapshot::parse(r#"{"name": "X"}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn test_members_not_an_array_rejected() {
        let err = Snapshot::parse(r#"{"name": "X", "members": {}}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn test_missing_member_field_rejected() {
        let json = r#"{"name": "X", "members": [{"steamid": "1", "online": 1}]}"#;
        let err = Snapshot::parse(json).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn test_bad_online_flag_rejected() {
        let json = r#"{"name": "X", "members": [{"steamid": "1", "name": "A", "online": 2}]}"#;
        let err = Snapshot::parse(json).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::Malformed("members[0]: online flag must be 0 or 1, got 2".into())
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        let json = r#"{"name": "X", "members": [{"steamid": "", "name": "A", "online": 1}]}"#;
        let err = Snapshot::parse(json).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"name": "X", "members": [
            {"steamid": "1", "name": "A", "online": 1},
            {"steamid": "1", "name": "A again", "online": 0}
        ]}"#;
        let err = Snapshot::parse(json).unwrap_err();
        assert_eq!(err, SnapshotError::DuplicateMember("1".into()));
    }
}
