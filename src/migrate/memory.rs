use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::store::{ConnectionStore, IndexSpec, is_well_formed, pair_key};

/// Collection held in memory. Enforces unique indexes the way the server
/// would, so index creation fails over duplicate pairs.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<Document>>,
    indexes: Mutex<Vec<IndexSpec>>,
    pub fail_set_pair: AtomicBool,
    pub fail_drop_index: AtomicBool,
    /// Ids whose delete is refused.
    pub fail_delete: Mutex<Vec<Bson>>,
}

impl MemoryStore {
    pub fn new(docs: Vec<Document>, indexes: Vec<IndexSpec>) -> Self {
        Self {
            docs: Mutex::new(docs),
            indexes: Mutex::new(indexes),
            fail_set_pair: AtomicBool::new(false),
            fail_drop_index: AtomicBool::new(false),
            fail_delete: Mutex::new(Vec::new()),
        }
    }

    pub fn docs(&self) -> Vec<Document> {
        self.docs.lock().unwrap().clone()
    }

    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes.lock().unwrap().clone()
    }

    fn has_duplicate_pairs(docs: &[Document]) -> bool {
        let mut seen = std::collections::HashSet::new();
        docs.iter()
            .filter(|d| is_well_formed(d))
            .filter_map(|d| Some(pair_key(d.get("student")?, d.get("alumni")?)))
            .any(|k| !seen.insert(k))
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn list_indexes(&self) -> anyhow::Result<Vec<IndexSpec>> {
        Ok(self.indexes())
    }

    async fn drop_index(&self, name: &str) -> anyhow::Result<()> {
        if self.fail_drop_index.load(Ordering::SeqCst) {
            anyhow::bail!("not authorized to drop index {name}");
        }
        let mut indexes = self.indexes.lock().unwrap();
        let before = indexes.len();
        indexes.retain(|i| i.name != name);
        if indexes.len() == before {
            anyhow::bail!("index not found with name [{name}]");
        }
        Ok(())
    }

    async fn create_unique_index(&self, name: &str, keys: &[&str]) -> anyhow::Result<()> {
        if Self::has_duplicate_pairs(&self.docs.lock().unwrap()) {
            anyhow::bail!("E11000 duplicate key error building index {name}");
        }
        self.indexes.lock().unwrap().push(IndexSpec {
            name: name.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            unique: true,
        });
        Ok(())
    }

    async fn find_malformed(&self) -> anyhow::Result<Vec<Document>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| !is_well_formed(d))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Document>> {
        Ok(self.docs())
    }

    async fn set_pair(&self, id: &Bson, student: &Bson, alumni: &Bson) -> anyhow::Result<()> {
        if self.fail_set_pair.load(Ordering::SeqCst) {
            anyhow::bail!("write concern timeout");
        }
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.get("_id") == Some(id))
            .ok_or_else(|| anyhow::anyhow!("no document with _id {id}"))?;
        doc.insert("student", student.clone());
        doc.insert("alumni", alumni.clone());
        Ok(())
    }

    async fn delete(&self, id: &Bson) -> anyhow::Result<()> {
        if self.fail_delete.lock().unwrap().contains(id) {
            anyhow::bail!("write conflict deleting {id}");
        }
        self.docs.lock().unwrap().retain(|d| d.get("_id") != Some(id));
        Ok(())
    }
}
