use crate::api::ConnectionsApi;
use crate::db::Database;
use crate::identity::MatchPolicy;
use crate::reconcile::{ConnectOutcome, Reconciler};

pub async fn connect(
    db: &Database,
    api: &dyn ConnectionsApi,
    id: &str,
    message: &str,
    policy: MatchPolicy,
) -> anyhow::Result<()> {
    let mut reconciler = Reconciler::new(api, db, policy);

    println!("Sending connection request to {id}...");
    match reconciler.connect(id, message).await {
        ConnectOutcome::Created => println!("  Request sent."),
        ConnectOutcome::AlreadyConnected => println!("  Already connected."),
        ConnectOutcome::Rejected { status, message } => {
            println!(
                "  Server answered HTTP {status}{}; treating {id} as connected.",
                message.map(|m| format!(" ({m})")).unwrap_or_default()
            );
        }
        ConnectOutcome::Failed(e) => anyhow::bail!("Connection request failed: {e}"),
    }
    Ok(())
}
