use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

/// One recorded run of `alunet migrate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRun {
    pub id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub migrated: i64,
    pub deleted: i64,
    pub error_count: i64,
    pub report_json: String,
}
