use crate::db::models::MigrationRun;
use crate::migrate::MigrationReport;

pub fn render(report: &MigrationReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_history(runs: &[MigrationRun]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(runs)?)
}
