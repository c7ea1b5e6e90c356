use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use serde::Serialize;

pub const LEGACY_PAIR: &[&str] = &["sender", "recipient"];
pub const CURRENT_PAIR: &[&str] = &["student", "alumni"];
pub const CURRENT_PAIR_INDEX: &str = "student_1_alumni_1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    /// Same key set, regardless of order.
    pub fn covers(&self, fields: &[&str]) -> bool {
        self.keys.len() == fields.len() && fields.iter().all(|f| self.keys.iter().any(|k| k == f))
    }
}

/// Access to the persisted connection collection.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn list_indexes(&self) -> anyhow::Result<Vec<IndexSpec>>;
    async fn drop_index(&self, name: &str) -> anyhow::Result<()>;
    async fn create_unique_index(&self, name: &str, keys: &[&str]) -> anyhow::Result<()>;
    /// Documents whose `student` or `alumni` is null or missing.
    async fn find_malformed(&self) -> anyhow::Result<Vec<Document>>;
    /// Every document, oldest first.
    async fn find_all(&self) -> anyhow::Result<Vec<Document>>;
    async fn set_pair(&self, id: &Bson, student: &Bson, alumni: &Bson) -> anyhow::Result<()>;
    async fn delete(&self, id: &Bson) -> anyhow::Result<()>;
}

fn present(doc: &Document, field: &str) -> Option<Bson> {
    match doc.get(field) {
        None | Some(Bson::Null) => None,
        Some(v) => Some(v.clone()),
    }
}

pub fn is_well_formed(doc: &Document) -> bool {
    present(doc, "student").is_some() && present(doc, "alumni").is_some()
}

/// `(student, alumni)` for a legacy record tagged Student -> Alumni. Any other
/// tagging cannot be mapped without guessing.
pub fn legacy_pair(doc: &Document) -> Option<(Bson, Bson)> {
    let sender = present(doc, "sender")?;
    let recipient = present(doc, "recipient")?;
    let sender_model = doc.get_str("senderModel").ok()?;
    let recipient_model = doc.get_str("recipientModel").ok()?;
    (sender_model == "Student" && recipient_model == "Alumni").then_some((sender, recipient))
}

/// Key used to group documents sharing a `(student, alumni)` pair.
pub fn pair_key(student: &Bson, alumni: &Bson) -> String {
    format!("{student}\u{1f}{alumni}")
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed(&doc! {"student": "S1", "alumni": "A1"}));
        assert!(!is_well_formed(&doc! {"student": "S1", "alumni": Bson::Null}));
        assert!(!is_well_formed(&doc! {"alumni": "A1"}));
    }

    #[test]
    fn test_legacy_pair_requires_student_to_alumni() {
        let ok = doc! {"sender": "S1", "recipient": "A1", "senderModel": "Student", "recipientModel": "Alumni"};
        assert_eq!(
            legacy_pair(&ok),
            Some((Bson::String("S1".into()), Bson::String("A1".into())))
        );

        let reversed = doc! {"sender": "A1", "recipient": "S1", "senderModel": "Alumni", "recipientModel": "Student"};
        assert!(legacy_pair(&reversed).is_none());

        let untagged = doc! {"sender": "S1", "recipient": "A1"};
        assert!(legacy_pair(&untagged).is_none());

        let no_recipient = doc! {"sender": "S1", "recipient": Bson::Null, "senderModel": "Student", "recipientModel": "Alumni"};
        assert!(legacy_pair(&no_recipient).is_none());
    }

    #[test]
    fn test_index_covers_ignores_order() {
        let idx = IndexSpec {
            name: "recipient_1_sender_1".into(),
            keys: vec!["recipient".into(), "sender".into()],
            unique: true,
        };
        assert!(idx.covers(LEGACY_PAIR));
        assert!(!idx.covers(CURRENT_PAIR));
        assert!(!idx.covers(&["sender"]));
    }
}
