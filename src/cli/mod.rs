//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// crmsync - local cache of extracted CRM records
#[derive(Parser, Debug)]
#[command(name = "crmsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.crmsync/data/crmsync.db)
    #[arg(long, global = true, env = "CRMSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only counts or ids (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Preview changes without writing to the database
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the local cache database
    Init {
        /// Recreate the database even if it exists (drops cached records)
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Extract the current batch of records and merge it into the cache
    Sync(SyncArgs),

    /// Merge every collection of an exported JSON snapshot into the cache
    Import {
        /// Path to a JSON export (`crmsync export json`)
        file: PathBuf,
    },

    /// List the cached records of one kind
    List {
        /// Object kind (leads, contacts, accounts, opportunities, tasks)
        kind: String,
    },

    /// Show one cached record
    Show {
        /// Object kind
        kind: String,
        /// Record id
        id: String,
    },

    /// Show record counts and last sync times
    Status,

    /// Delete one cached record
    Delete {
        /// Object kind
        kind: String,
        /// Record id
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all cached records
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the cache to files
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Print a summary whenever the cache changes
    Watch {
        /// Poll interval in milliseconds (default: 2000, or `pollIntervalMs`)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Exit after this many printed updates
        #[arg(long)]
        max_updates: Option<usize>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Extractor selection for `sync`.
///
/// Without any of these, the extractor configured in
/// `~/.crmsync/config.json` is used.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Read a captured extractor response from a JSON file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["command", "url"])]
    pub from: Option<PathBuf>,

    /// Run a bridge program that prints the extractor response
    #[arg(long, value_name = "CMD", conflicts_with = "url")]
    pub command: Option<String>,

    /// Argument passed to the bridge program (repeatable)
    #[arg(long = "arg", value_name = "ARG", requires = "command", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Fetch the extractor response from a bridge URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Write the full snapshot as JSON
    Json {
        /// Output file (default: crm_data.json in the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write one CSV file per kind
    Csv {
        /// Only export this kind (default: all kinds)
        #[arg(short, long)]
        kind: Option<String>,

        /// Output directory (default: the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
