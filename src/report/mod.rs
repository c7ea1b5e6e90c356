pub mod json;
pub mod terminal;

use crate::db::models::MigrationRun;
use crate::migrate::MigrationReport;

pub enum ReportFormat {
    Terminal,
    Json,
}

impl ReportFormat {
    pub fn parse(format: &str) -> Self {
        match format {
            "json" => ReportFormat::Json,
            _ => ReportFormat::Terminal,
        }
    }
}

pub fn render(report: &MigrationReport, format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Terminal => terminal::render(report),
        ReportFormat::Json => json::render(report),
    }
}

pub fn render_history(runs: &[MigrationRun], format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Terminal => terminal::render_history(runs),
        ReportFormat::Json => json::render_history(runs),
    }
}
