//! CLI argument definitions for the backlog tool.

use crate::models::Column;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Backlog - a prioritized work-item list for the command line.
///
/// Entries carry a score and a duration; `score / duration` ranks them.
/// Run `blg list` to see the table, `blg add` to put work on it.
#[derive(Parser, Debug)]
#[command(name = "blg")]
#[command(author, about = "A CLI tool for managing a prioritized backlog of work items", long_about = None)]
#[command(version, long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("BLG_GIT_COMMIT"), ", built ", env!("BLG_BUILD_TIMESTAMP"), ")"
))]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if blg was started in <path> instead of the current
    /// directory. Each workspace directory keeps its own backlog.
    /// Can also be set via the BLG_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "BLG_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new entry to the backlog
    Add {
        /// Entry title (must be unique once lowercased with spaces as underscores)
        title: String,

        /// Score of the entry
        score: f64,

        /// Duration of the entry (non-zero; priority is score / duration)
        duration: f64,
    },

    /// Edit an entry, overwriting title, score, and duration
    ///
    /// All three fields must be given; pass the current value for fields
    /// you don't intend to change. Renaming re-keys the entry under its
    /// new normalized title.
    Edit {
        /// Id of the entry to edit (e.g. write_report)
        id: String,

        /// New title
        title: String,

        /// New score
        score: f64,

        /// New duration (non-zero)
        duration: f64,
    },

    /// Delete entries by id
    Delete {
        /// Ids of the entries to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show a single entry by id
    Show {
        /// Entry id (e.g. write_report)
        id: String,
    },

    /// List all entries in the current sort order (default command)
    List,

    /// Sort by a column; repeating the current column reverses the order
    Sort {
        /// Column to sort by
        #[arg(value_enum)]
        column: Column,
    },

    /// Show or change the backlog name
    Name {
        /// New name; omit to show the current one
        new_name: Option<String>,
    },

    /// Set the display range priorities are rescaled onto
    Scale {
        /// Lower bound of the display range
        min: f64,

        /// Upper bound of the display range (must exceed min)
        max: f64,
    },

    /// Show the observed raw priority range
    Limits,

    /// Export the backlog to a .json or .csv file
    Export {
        /// Destination path; the extension selects the format
        path: PathBuf,
    },

    /// Import a backlog from a .json or .csv file, replacing the current one
    Import {
        /// Source path; the extension selects the format
        path: PathBuf,
    },
}
