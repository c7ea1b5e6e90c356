//! Identity extraction for loosely shaped connection and directory records.
//!
//! The upstream API is inconsistent about where it puts "the other party" of a
//! connection, so every lookup goes through the fallback chains defined here.

use serde_json::Value;

/// Identifier of the other party of a connection, tagged with the field it
/// was recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionIdentifier {
    /// Explicit `alumniId` field.
    AlumniId(String),
    /// Populated `alumni` object, read through its `_id`.
    NestedAlumni(String),
    UserId(String),
    /// The connection record's own `_id`. The API sometimes hands this back
    /// in place of a person id.
    RecordId(String),
}

impl ConnectionIdentifier {
    /// Normalize a connection-like record. Fallback order:
    /// `alumniId`, `alumni._id`, `userId`, `_id`.
    pub fn from_loose_record(record: &Value) -> Option<Self> {
        if let Some(id) = record.get("alumniId").and_then(loose_id) {
            return Some(Self::AlumniId(id));
        }
        if let Some(id) = record
            .get("alumni")
            .filter(|a| a.is_object())
            .and_then(|a| a.get("_id"))
            .and_then(loose_id)
        {
            return Some(Self::NestedAlumni(id));
        }
        if let Some(id) = record.get("userId").and_then(loose_id) {
            return Some(Self::UserId(id));
        }
        record.get("_id").and_then(loose_id).map(Self::RecordId)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AlumniId(id) | Self::NestedAlumni(id) | Self::UserId(id) | Self::RecordId(id) => {
                id
            }
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::AlumniId(id) | Self::NestedAlumni(id) | Self::UserId(id) | Self::RecordId(id) => {
                id
            }
        }
    }
}

/// Fields a directory entry may carry its id under, in priority order.
const DIRECTORY_ID_FIELDS: &[&str] = &["_id", "id", "userId", "alumniId"];

/// All usable ids of a directory entry, deduplicated, in field priority order.
pub fn candidate_ids(entry: &Value) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for field in DIRECTORY_ID_FIELDS {
        if let Some(id) = entry.get(*field).and_then(loose_id)
            && !ids.contains(&id)
        {
            ids.push(id);
        }
    }
    ids
}

/// Read an id out of a loose value: a non-empty string, an integer, an object
/// carrying `_id`, or an extended-JSON ObjectId (`{"$oid": ...}`).
pub fn loose_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .or_else(|| map.get("_id"))
            .and_then(loose_id),
        _ => None,
    }
}

/// How two id strings are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Equal, or one contains the other. Compatibility shim for the API
    /// returning connection-record ids where person ids are expected; can
    /// produce false positives between unrelated ids.
    #[default]
    Lenient,
    Exact,
}

pub fn ids_match(a: &str, b: &str, policy: MatchPolicy) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match policy {
        MatchPolicy::Exact => a == b,
        MatchPolicy::Lenient => a == b || a.contains(b) || b.contains(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_prefers_alumni_id() {
        let rec = json!({"alumniId": "A", "alumni": {"_id": "B"}, "userId": "C", "_id": "D"});
        assert_eq!(
            ConnectionIdentifier::from_loose_record(&rec),
            Some(ConnectionIdentifier::AlumniId("A".into()))
        );
    }

    #[test]
    fn test_fallback_nested_alumni_only() {
        let rec = json!({"alumni": {"_id": "X"}});
        let id = ConnectionIdentifier::from_loose_record(&rec).unwrap();
        assert_eq!(id, ConnectionIdentifier::NestedAlumni("X".into()));
        assert_eq!(id.as_str(), "X");
    }

    #[test]
    fn test_fallback_record_id_only() {
        let rec = json!({"_id": "Y"});
        assert_eq!(
            ConnectionIdentifier::from_loose_record(&rec).map(ConnectionIdentifier::into_string),
            Some("Y".to_string())
        );
    }

    #[test]
    fn test_fallback_skips_null_and_empty() {
        let rec = json!({"alumniId": null, "alumni": "not-an-object", "userId": "  ", "_id": "Z"});
        assert_eq!(
            ConnectionIdentifier::from_loose_record(&rec),
            Some(ConnectionIdentifier::RecordId("Z".into()))
        );
    }

    #[test]
    fn test_unreconcilable_record() {
        assert!(ConnectionIdentifier::from_loose_record(&json!({"status": "accepted"})).is_none());
        assert!(ConnectionIdentifier::from_loose_record(&json!("bare")).is_none());
    }

    #[test]
    fn test_alumni_id_may_be_populated_object() {
        let rec = json!({"alumniId": {"_id": {"$oid": "65f0c0ffee"}}});
        assert_eq!(
            ConnectionIdentifier::from_loose_record(&rec),
            Some(ConnectionIdentifier::AlumniId("65f0c0ffee".into()))
        );
    }

    #[test]
    fn test_candidate_ids_keeps_all_distinct() {
        let entry = json!({"_id": "1", "id": "1", "userId": 42, "alumniId": "a-9", "name": "x"});
        assert_eq!(candidate_ids(&entry), vec!["1", "42", "a-9"]);
        assert!(candidate_ids(&json!({"name": "nobody"})).is_empty());
    }

    #[test]
    fn test_ids_match_substring() {
        assert!(ids_match("abc123", "abc123def", MatchPolicy::Lenient));
        assert!(ids_match("abc123def", "abc123", MatchPolicy::Lenient));
        assert!(ids_match("abc123", "abc123", MatchPolicy::Lenient));
        assert!(!ids_match("abc123", "xyz", MatchPolicy::Lenient));
        assert!(!ids_match("", "abc", MatchPolicy::Lenient));
    }

    #[test]
    fn test_ids_match_exact() {
        assert!(ids_match("abc123", "abc123", MatchPolicy::Exact));
        assert!(!ids_match("abc123", "abc123def", MatchPolicy::Exact));
    }
}
