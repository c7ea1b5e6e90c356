//! One-shot repair of the connection collection.
//!
//! Phases run in order and each is safe to re-run:
//! 1. drop any index over the legacy `(sender, recipient)` pair
//! 2. find records missing `student` or `alumni`
//! 3. rewrite Student -> Alumni legacy records in place
//! 4. delete the malformed records that could not be rewritten
//! 5. delete duplicate `(student, alumni)` pairs, keeping the oldest
//! 6. ensure a unique index over `(student, alumni)`
//!
//! Failures on individual documents are recorded and the pass goes on.

#[cfg(test)]
pub mod memory;
pub mod mongo;
pub mod store;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::Serialize;

use store::{
    CURRENT_PAIR, CURRENT_PAIR_INDEX, ConnectionStore, LEGACY_PAIR, is_well_formed, legacy_pair,
    pair_key,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    /// Report what would change without writing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub dropped_indexes: Vec<String>,
    pub malformed_found: usize,
    pub migrated: usize,
    pub deleted: usize,
    pub duplicates_removed: usize,
    pub unique_index_created: bool,
    pub errors: Vec<String>,
}

impl MigrationReport {
    pub fn begin(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            dry_run,
            dropped_indexes: Vec::new(),
            malformed_found: 0,
            migrated: 0,
            deleted: 0,
            duplicates_removed: 0,
            unique_index_created: false,
            errors: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// True when the run changed (or would change) nothing.
    pub fn is_noop(&self) -> bool {
        self.dropped_indexes.is_empty()
            && self.migrated == 0
            && self.deleted == 0
            && self.duplicates_removed == 0
            && !self.unique_index_created
    }

    fn error(&mut self, msg: String) {
        tracing::error!("{msg}");
        self.errors.push(msg);
    }
}

fn id_key(id: &Bson) -> String {
    id.to_string()
}

pub async fn migrate(store: &dyn ConnectionStore, options: MigrationOptions) -> MigrationReport {
    let mut report = MigrationReport::begin(options.dry_run);

    drop_legacy_indexes(store, options, &mut report).await;

    let malformed = match store.find_malformed().await {
        Ok(docs) => docs,
        Err(e) => {
            report.error(format!("Listing malformed connections failed: {e}"));
            Vec::new()
        }
    };
    report.malformed_found = malformed.len();
    tracing::info!("Found {} malformed connection record(s)", malformed.len());

    // Pairs written in phase 3 and ids removed so far. A dry run never
    // touches the store, so later phases read these instead.
    let mut rewritten: HashMap<String, (Bson, Bson)> = HashMap::new();
    let mut removed: HashSet<String> = HashSet::new();

    let migrated_ids =
        migrate_legacy(store, options, &malformed, &mut rewritten, &mut report).await;
    delete_unmigrated(store, options, &malformed, &migrated_ids, &mut removed, &mut report).await;
    remove_duplicate_pairs(store, options, &rewritten, &mut removed, &mut report).await;
    ensure_unique_index(store, options, &mut report).await;

    report.finish();
    tracing::info!(
        "Connection repair finished: {} migrated, {} deleted, {} duplicate(s) removed, {} error(s)",
        report.migrated,
        report.deleted,
        report.duplicates_removed,
        report.errors.len()
    );
    report
}

async fn drop_legacy_indexes(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    report: &mut MigrationReport,
) {
    let indexes = match store.list_indexes().await {
        Ok(indexes) => indexes,
        Err(e) => {
            tracing::warn!("Could not list indexes, skipping legacy index removal: {e}");
            return;
        }
    };

    for index in indexes.iter().filter(|i| i.covers(LEGACY_PAIR)) {
        if options.dry_run {
            report.dropped_indexes.push(index.name.clone());
            continue;
        }
        match store.drop_index(&index.name).await {
            Ok(()) => {
                tracing::info!("Dropped legacy index {}", index.name);
                report.dropped_indexes.push(index.name.clone());
            }
            Err(e) => tracing::warn!("Dropping index {} failed, ignoring: {e}", index.name),
        }
    }
}

async fn migrate_legacy(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    malformed: &[Document],
    rewritten: &mut HashMap<String, (Bson, Bson)>,
    report: &mut MigrationReport,
) -> HashSet<String> {
    let mut migrated = HashSet::new();

    for doc in malformed {
        let Some(id) = doc.get("_id") else {
            continue;
        };
        let Some((student, alumni)) = legacy_pair(doc) else {
            continue;
        };

        if !options.dry_run
            && let Err(e) = store.set_pair(id, &student, &alumni).await
        {
            report.error(format!("Migrating connection {id} failed: {e}"));
            continue;
        }

        tracing::debug!("Migrated connection {id}: student={student} alumni={alumni}");
        migrated.insert(id_key(id));
        rewritten.insert(id_key(id), (student, alumni));
        report.migrated += 1;
    }

    migrated
}

async fn delete_unmigrated(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    malformed: &[Document],
    migrated: &HashSet<String>,
    removed: &mut HashSet<String>,
    report: &mut MigrationReport,
) {
    // Ids already tried once; a failed delete is reported only once.
    let mut attempted = HashSet::new();
    for doc in malformed {
        let Some(id) = doc.get("_id") else {
            report.error(format!("Malformed connection without _id cannot be removed: {doc}"));
            continue;
        };
        let key = id_key(id);
        if migrated.contains(&key) {
            continue;
        }
        attempted.insert(key);
        if delete_one(store, options, id, "malformed", removed, report).await {
            report.deleted += 1;
        }
    }

    if options.dry_run {
        return;
    }

    // Anything still malformed, e.g. written while the pass was running.
    let remaining = match store.find_malformed().await {
        Ok(docs) => docs,
        Err(e) => {
            report.error(format!("Re-checking malformed connections failed: {e}"));
            return;
        }
    };
    for doc in remaining {
        let Some(id) = doc.get("_id") else {
            continue;
        };
        if attempted.contains(&id_key(id)) {
            continue;
        }
        if delete_one(store, options, id, "remaining malformed", removed, report).await {
            report.deleted += 1;
        }
    }
}

async fn remove_duplicate_pairs(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    rewritten: &HashMap<String, (Bson, Bson)>,
    removed: &mut HashSet<String>,
    report: &mut MigrationReport,
) {
    let docs = match store.find_all().await {
        Ok(docs) => docs,
        Err(e) => {
            report.error(format!("Listing connections for duplicate check failed: {e}"));
            return;
        }
    };

    let mut seen = HashSet::new();
    for doc in &docs {
        let Some(id) = doc.get("_id") else {
            continue;
        };
        let key = id_key(id);
        if removed.contains(&key) {
            continue;
        }
        let pair = match rewritten.get(&key) {
            Some((student, alumni)) => pair_key(student, alumni),
            None if is_well_formed(doc) => match (doc.get("student"), doc.get("alumni")) {
                (Some(student), Some(alumni)) => pair_key(student, alumni),
                _ => continue,
            },
            None => continue,
        };
        if seen.insert(pair) {
            continue;
        }
        if delete_one(store, options, id, "duplicate", removed, report).await {
            report.duplicates_removed += 1;
        }
    }
}

async fn ensure_unique_index(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    report: &mut MigrationReport,
) {
    let indexes = match store.list_indexes().await {
        Ok(indexes) => indexes,
        Err(e) => {
            report.error(format!(
                "Could not list indexes before creating {CURRENT_PAIR_INDEX}: {e}"
            ));
            return;
        }
    };

    let existing: Vec<_> = indexes.iter().filter(|i| i.covers(CURRENT_PAIR)).collect();
    if existing.iter().any(|i| i.unique) {
        tracing::debug!("Unique (student, alumni) index already present");
        return;
    }
    if options.dry_run {
        report.dropped_indexes.extend(existing.iter().map(|i| i.name.clone()));
        report.unique_index_created = true;
        return;
    }

    // A non-unique index over the same keys blocks creation.
    for index in existing {
        match store.drop_index(&index.name).await {
            Ok(()) => report.dropped_indexes.push(index.name.clone()),
            Err(e) => tracing::warn!("Dropping index {} failed, ignoring: {e}", index.name),
        }
    }

    match store.create_unique_index(CURRENT_PAIR_INDEX, CURRENT_PAIR).await {
        Ok(()) => {
            tracing::info!("Created unique index {CURRENT_PAIR_INDEX}");
            report.unique_index_created = true;
        }
        Err(e) => report.error(format!("Creating index {CURRENT_PAIR_INDEX} failed: {e}")),
    }
}

async fn delete_one(
    store: &dyn ConnectionStore,
    options: MigrationOptions,
    id: &Bson,
    reason: &str,
    removed: &mut HashSet<String>,
    report: &mut MigrationReport,
) -> bool {
    let key = id_key(id);
    if removed.contains(&key) {
        return false;
    }
    if !options.dry_run
        && let Err(e) = store.delete(id).await
    {
        report.error(format!("Deleting {reason} connection {id} failed: {e}"));
        return false;
    }
    tracing::debug!("Deleted {reason} connection {id}");
    removed.insert(key)
}
