use rusqlite::params;

use super::Database;
use super::models::{CacheEntry, MigrationRun};
use crate::migrate::MigrationReport;

impl Database {
    // --- Cache Entries ---

    pub fn set_cache_entry(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cache_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_cache_entry(&self, key: &str) -> anyhow::Result<Option<CacheEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM cache_entries WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| {
            Ok(CacheEntry {
                key: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Returns whether an entry was removed.
    pub fn delete_cache_entry(&self, key: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    // --- Migration Runs ---

    pub fn record_migration_run(&self, report: &MigrationReport) -> anyhow::Result<i64> {
        let report_json = serde_json::to_string(report)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO migration_runs (started_at, finished_at, dry_run, migrated, deleted, error_count, report_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                report.dry_run,
                report.migrated as i64,
                (report.deleted + report.duplicates_removed) as i64,
                report.errors.len() as i64,
                report_json,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_migration_runs(&self, limit: usize) -> anyhow::Result<Vec<MigrationRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, started_at, finished_at, dry_run, migrated, deleted, error_count, report_json
             FROM migration_runs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::map_run_row)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    fn map_run_row(row: &rusqlite::Row) -> rusqlite::Result<MigrationRun> {
        Ok(MigrationRun {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            dry_run: row.get(3)?,
            migrated: row.get(4)?,
            deleted: row.get(5)?,
            error_count: row.get(6)?,
            report_json: row.get(7)?,
        })
    }
}
