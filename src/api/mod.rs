pub mod http;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity;

/// Which directory roster to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Alumni,
    Mentors,
}

impl DirectoryKind {
    pub fn path(self) -> &'static str {
        match self {
            DirectoryKind::Alumni => "/alumni",
            DirectoryKind::Mentors => "/mentors",
        }
    }
}

/// A roster member as the API returns it. The shape is kept loose; ids are
/// read through [`identity::candidate_ids`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryEntry(pub Value);

impl DirectoryEntry {
    pub fn candidate_ids(&self) -> Vec<String> {
        identity::candidate_ids(&self.0)
    }

    /// First candidate id, used for display and for connect requests.
    pub fn primary_id(&self) -> Option<String> {
        self.candidate_ids().into_iter().next()
    }

    pub fn display_name(&self) -> String {
        let field = |k: &str| self.0.get(k).and_then(Value::as_str).map(str::trim);
        if let Some(name) = field("name").filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let full = [field("firstName"), field("lastName")]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        field("email").unwrap_or("-").to_string()
    }

    pub fn headline(&self) -> Option<String> {
        ["currentRole", "position", "company", "department"]
            .iter()
            .find_map(|k| self.0.get(*k).and_then(Value::as_str))
            .map(String::from)
    }
}

/// Answer to `POST /connections/request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResponse {
    pub status: u16,
    pub message: Option<String>,
}

impl ConnectionResponse {
    pub fn is_created(&self) -> bool {
        self.status == 201
    }

    pub fn says_already_connected(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("already connected"))
    }
}

#[async_trait]
pub trait ConnectionsApi: Send + Sync {
    /// Connection-like records of the current viewer, shape unspecified.
    async fn fetch_connections(&self) -> anyhow::Result<Vec<Value>>;
    async fn fetch_directory(&self, kind: DirectoryKind) -> anyhow::Result<Vec<DirectoryEntry>>;
    /// Only transport failures are errors; any HTTP status is returned.
    async fn request_connection(
        &self,
        alumni_id: &str,
        message: &str,
    ) -> anyhow::Result<ConnectionResponse>;
}

/// Array field names the API has been seen to wrap list responses in.
const LIST_WRAPPERS: &[&str] = &["connections", "data", "alumni", "mentors", "results"];

/// Accept a bare array, or an object wrapping one under a known key.
pub fn unwrap_list(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => LIST_WRAPPERS.iter().find_map(|k| match map.remove(*k) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_list_shapes() {
        assert_eq!(unwrap_list(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(unwrap_list(json!({"connections": [1]})).unwrap().len(), 1);
        assert_eq!(unwrap_list(json!({"data": [1, 2, 3]})).unwrap().len(), 3);
        assert!(unwrap_list(json!({"message": "nope"})).is_none());
        assert!(unwrap_list(json!("text")).is_none());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let e = DirectoryEntry(json!({"_id": "1", "name": "Ada Lovelace"}));
        assert_eq!(e.display_name(), "Ada Lovelace");
        let e = DirectoryEntry(json!({"_id": "2", "firstName": "Alan", "lastName": "Turing"}));
        assert_eq!(e.display_name(), "Alan Turing");
        let e = DirectoryEntry(json!({"_id": "3", "email": "g@h.edu"}));
        assert_eq!(e.display_name(), "g@h.edu");
        assert_eq!(DirectoryEntry(json!({})).display_name(), "-");
    }

    #[test]
    fn test_already_connected_message() {
        let r = ConnectionResponse {
            status: 400,
            message: Some("Already connected".into()),
        };
        assert!(r.says_already_connected());
        assert!(!r.is_created());
    }
}
