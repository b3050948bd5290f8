use crate::domain::ListingStatus;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "auto-market")]
#[command(about = "Check, export and normalize vehicle marketplace records")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to ./auto-market.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load a snapshot, validate every record and report broken references
    Check {
        /// Snapshot file (defaults to storage.data_dir/storage.snapshot_file)
        snapshot: Option<String>,

        /// Report dangling references as warnings instead of errors
        #[arg(long)]
        lenient: bool,
    },

    /// Write a zip bundle with one CSV per record kind
    Export {
        snapshot: Option<String>,

        /// Output directory (defaults to export.output_path)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Change the status of one listing and save the snapshot
    Listing {
        #[arg(value_enum)]
        action: ListingAction,

        /// Listing id
        id: String,

        #[arg(short, long)]
        snapshot: Option<String>,
    },

    /// Rewrite JSON Lines of one record kind (legacy or partial) into canonical form
    Normalize {
        #[arg(value_enum)]
        kind: RecordKind,

        input: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListingAction {
    MarkSold,
    Expire,
    Reactivate,
}

impl ListingAction {
    pub fn target_status(self) -> ListingStatus {
        match self {
            ListingAction::MarkSold => ListingStatus::Sold,
            ListingAction::Expire => ListingStatus::Expired,
            ListingAction::Reactivate => ListingStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    User,
    Vehicle,
    Listing,
    Message,
    History,
}
