use comfy_table::{Cell, Table};

use crate::db::models::MigrationRun;
use crate::migrate::MigrationReport;

pub fn render(report: &MigrationReport) -> anyhow::Result<String> {
    let mut output = String::new();

    let mode = if report.dry_run { " [DRY RUN]" } else { "" };
    output.push_str(&format!(
        "=== Connection Repair{mode} ({}) ===\n\n",
        report.finished_at.to_rfc3339()
    ));

    let elapsed = report.finished_at - report.started_at;
    let mut table = Table::new();
    table.set_header(vec!["Phase", "Result"]);
    table.add_row(vec![
        Cell::new("Legacy indexes dropped"),
        Cell::new(if report.dropped_indexes.is_empty() {
            "-".to_string()
        } else {
            report.dropped_indexes.join(", ")
        }),
    ]);
    table.add_row(vec![
        Cell::new("Malformed records"),
        Cell::new(report.malformed_found),
    ]);
    table.add_row(vec![Cell::new("Migrated"), Cell::new(report.migrated)]);
    table.add_row(vec![Cell::new("Deleted"), Cell::new(report.deleted)]);
    table.add_row(vec![
        Cell::new("Duplicates removed"),
        Cell::new(report.duplicates_removed),
    ]);
    table.add_row(vec![
        Cell::new("Unique (student, alumni) index"),
        Cell::new(if report.unique_index_created {
            "created"
        } else {
            "unchanged"
        }),
    ]);
    table.add_row(vec![
        Cell::new("Elapsed"),
        Cell::new(format!("{} ms", elapsed.num_milliseconds())),
    ]);
    output.push_str(&table.to_string());
    output.push('\n');

    if report.is_noop() && report.errors.is_empty() {
        output.push_str("\nNothing to repair.\n");
    }

    if !report.errors.is_empty() {
        output.push_str(&format!("\n--- Errors ({}) ---\n", report.errors.len()));
        for e in &report.errors {
            output.push_str(&format!("  {e}\n"));
        }
    }

    Ok(output)
}

pub fn render_history(runs: &[MigrationRun]) -> anyhow::Result<String> {
    if runs.is_empty() {
        return Ok("No repair runs recorded.\n".to_string());
    }

    let mut table = Table::new();
    table.set_header(vec!["Run", "Started", "Mode", "Migrated", "Deleted", "Errors"]);
    for run in runs {
        table.add_row(vec![
            Cell::new(run.id),
            Cell::new(&run.started_at),
            Cell::new(if run.dry_run { "dry run" } else { "applied" }),
            Cell::new(run.migrated),
            Cell::new(run.deleted),
            Cell::new(run.error_count),
        ]);
    }
    Ok(format!("{table}\n"))
}
