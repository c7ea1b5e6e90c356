use crate::config::StoreConfig;
use crate::db::Database;
use crate::migrate::mongo::MongoStore;
use crate::migrate::{MigrationOptions, migrate};
use crate::report::{self, ReportFormat};

pub async fn run(
    db: &Database,
    dry_run: bool,
    format: &str,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let config = StoreConfig::from_env();
    let store = MongoStore::connect(&config).await?;

    let report = migrate(&store, MigrationOptions { dry_run }).await;

    if let Err(e) = db.record_migration_run(&report) {
        tracing::warn!("Could not record repair run locally: {e}");
    }

    let rendered = report::render(&report, ReportFormat::parse(format))?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            println!("Report written to {path}");
        }
        None => println!("{rendered}"),
    }

    if !report.errors.is_empty() {
        anyhow::bail!(
            "{} error(s) during repair; rerun to retry the affected records",
            report.errors.len()
        );
    }
    Ok(())
}

pub fn history(db: &Database, limit: usize, format: &str) -> anyhow::Result<()> {
    let runs = db.list_migration_runs(limit)?;
    print!("{}", report::render_history(&runs, ReportFormat::parse(format))?);
    Ok(())
}
