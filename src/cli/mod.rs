pub mod cache;
pub mod connect;
pub mod directory;
pub mod migrate;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "alunet",
    version,
    about = "AluNet connection tools: reconcile your alumni connections and repair the connection store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only treat identical ids as the same person
    #[arg(long, global = true)]
    pub exact: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List directory entries you are not yet connected to
    Directory {
        /// Show the mentor directory instead of the alumni directory
        #[arg(long)]
        mentors: bool,
    },
    /// List directory entries you are already connected to
    Connected {
        /// Show connected mentors instead of alumni
        #[arg(long)]
        mentors: bool,
    },
    /// Send a connection request
    Connect {
        /// Id of the alumnus or mentor
        id: String,
        /// Message sent with the request
        #[arg(long, short, default_value = "I'd like to connect with you.")]
        message: String,
    },
    /// Inspect or edit the local known-connections cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Repair the connection collection (legacy fields, malformed records, indexes)
    Migrate {
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Output format
        #[arg(long, default_value = "terminal", value_parser = ["terminal", "json"])]
        format: String,
        /// Output file path (stdout if not specified)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show previous repair runs
    History {
        /// Number of runs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Output format
        #[arg(long, default_value = "terminal", value_parser = ["terminal", "json"])]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Print cached connection ids
    Show,
    /// Remove one id from the cache
    Forget {
        /// Connection id to drop
        id: String,
    },
    /// Delete the whole cache entry
    Clear,
}
