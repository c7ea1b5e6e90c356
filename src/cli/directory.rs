use comfy_table::{Cell, Table};

use crate::api::{ConnectionsApi, DirectoryEntry, DirectoryKind};
use crate::db::Database;
use crate::identity::MatchPolicy;
use crate::reconcile::Reconciler;

pub async fn directory(
    db: &Database,
    api: &dyn ConnectionsApi,
    kind: DirectoryKind,
    policy: MatchPolicy,
) -> anyhow::Result<()> {
    let mut reconciler = Reconciler::new(api, db, policy);
    let result = reconciler.reconcile_directory(kind).await?;

    if !result.refresh.remote_ok {
        println!("Could not reach the API for your connections; using cached ids only.");
    }

    if result.visible.is_empty() {
        println!("You are connected to everyone in this directory.");
        return Ok(());
    }

    println!("{}", entry_table(&result.visible));
    println!(
        "\n{} not yet connected, {} connected.",
        result.visible.len(),
        result.connected.len()
    );
    Ok(())
}

pub async fn connected(
    db: &Database,
    api: &dyn ConnectionsApi,
    kind: DirectoryKind,
    policy: MatchPolicy,
) -> anyhow::Result<()> {
    let mut reconciler = Reconciler::new(api, db, policy);
    let result = reconciler.reconcile_directory(kind).await?;

    if !result.refresh.remote_ok {
        println!("Could not reach the API for your connections; using cached ids only.");
    }

    if result.connected.is_empty() {
        println!("No connections in this directory yet. Use `alunet connect <id>` to reach out.");
        return Ok(());
    }

    println!("{}", entry_table(&result.connected));
    Ok(())
}

fn entry_table(entries: &[DirectoryEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Role"]);
    for e in entries {
        table.add_row(vec![
            Cell::new(e.primary_id().unwrap_or_else(|| "-".into())),
            Cell::new(e.display_name()),
            Cell::new(e.headline().unwrap_or_else(|| "-".into())),
        ]);
    }
    table
}
