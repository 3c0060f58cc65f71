use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "A personal logbook for civic service requests")]
pub struct Cli {
    /// Path to the store file (defaults to ~/.civiclog/store.json)
    #[clap(long)]
    pub file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log a new service request
    Add {
        /// What was reported (at least 10 characters)
        #[clap(long)]
        description: Option<String>,

        /// Civic category, e.g. "Pothole Repair"
        #[clap(long)]
        category: Option<String>,

        /// Ticket or reference number provided by the city
        #[clap(long)]
        reference: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Add a status update to an existing request
    Update {
        /// Request ID (UUID or unique prefix); prompts when omitted
        id: Option<String>,

        /// New status: submitted, in-progress, completed, rejected
        #[clap(long)]
        status: Option<String>,

        /// Notes for the update
        #[clap(long)]
        notes: Option<String>,
    },

    /// List requests with optional filter and sort
    List {
        /// Filter by status (or "all")
        #[clap(long, default_value = "all")]
        status: String,

        /// Sort key: date or status
        #[clap(long, default_value = "date")]
        sort: String,

        /// Sort ascending (default is newest first)
        #[clap(long)]
        asc: bool,
    },

    /// Show a single request with its full update history
    Show {
        /// Request ID (UUID or unique prefix)
        id: String,
    },

    /// Export the full collection as pretty-printed JSON
    Export {
        /// Output path (defaults to civiclog_export_<date>.json)
        #[clap(long)]
        output: Option<PathBuf>,
    },
}
