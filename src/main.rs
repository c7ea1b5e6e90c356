mod api;
mod cli;
mod config;
mod db;
mod error;
mod identity;
mod migrate;
mod reconcile;
mod report;

use clap::Parser;
use cli::{CacheCommand, Cli, Command};

use crate::api::DirectoryKind;
use crate::api::http::HttpApi;
use crate::config::ApiConfig;
use crate::identity::MatchPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Open local cache database
    let db_path = config::db_path()?;
    let db = db::Database::open(&db_path)?;

    let policy = if cli.exact {
        MatchPolicy::Exact
    } else {
        MatchPolicy::Lenient
    };
    let kind = |mentors: bool| {
        if mentors {
            DirectoryKind::Mentors
        } else {
            DirectoryKind::Alumni
        }
    };

    match cli.command {
        Command::Directory { mentors } => {
            let api = HttpApi::new(&ApiConfig::from_env()?)?;
            cli::directory::directory(&db, &api, kind(mentors), policy).await?;
        }
        Command::Connected { mentors } => {
            let api = HttpApi::new(&ApiConfig::from_env()?)?;
            cli::directory::connected(&db, &api, kind(mentors), policy).await?;
        }
        Command::Connect { id, message } => {
            let api = HttpApi::new(&ApiConfig::from_env()?)?;
            cli::connect::connect(&db, &api, &id, &message, policy).await?;
        }
        Command::Cache { command } => match command {
            CacheCommand::Show => cli::cache::show(&db)?,
            CacheCommand::Forget { id } => cli::cache::forget(&db, &id)?,
            CacheCommand::Clear => cli::cache::clear(&db)?,
        },
        Command::Migrate {
            dry_run,
            format,
            output,
        } => {
            cli::migrate::run(&db, dry_run, &format, output.as_deref()).await?;
        }
        Command::History { limit, format } => {
            cli::migrate::history(&db, limit, &format)?;
        }
    }

    Ok(())
}
