use rusqlite::Connection;

/// A schema step. `version` is what `_migrations` records once it is applied.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "cache_entries",
        sql: "CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    },
    Migration {
        version: 2,
        name: "migration_runs",
        sql: "CREATE TABLE IF NOT EXISTS migration_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            dry_run INTEGER NOT NULL,
            migrated INTEGER NOT NULL,
            deleted INTEGER NOT NULL,
            error_count INTEGER NOT NULL,
            report_json TEXT NOT NULL
        );",
    },
];

/// Applies every step newer than the recorded version, one transaction each.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")?;

    let applied: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )?;

    for step in MIGRATIONS.iter().filter(|m| m.version > applied) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute("INSERT INTO _migrations (version) VALUES (?1)", [step.version])?;
        tx.commit()?;
        tracing::info!("Created table {} (schema version {})", step.name, step.version);
    }

    Ok(())
}
