//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Browse the International Classification of Diseases: ICD-10, ICD-10-CM and ICD-11 as a searchable tree
#[derive(Parser, Debug)]
#[command(name = "icd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Revision to load: 10, 10-CM or 11 (default from config)
    #[arg(short, long, global = true)]
    pub revision: Option<String>,

    /// Release to load (default from config or the revision's latest known)
    #[arg(long, global = true)]
    pub release: Option<String>,

    /// Source file to load instead of the data directory layout
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Show progress bars while loading
    #[arg(long, global = true)]
    pub progress: bool,

    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the codex, or the subtree below a code, as a tree
    Tree {
        /// Code of the subtree root (default: whole codex)
        code: Option<String>,
        /// Number of levels to print below the start entry
        #[arg(long)]
        depth: Option<usize>,
    },

    /// List all entries whose code contains CODE
    Search {
        /// Full or partial code, with or without the dot
        code: String,
        /// Only look at entries shallower than this depth
        #[arg(long)]
        maxdepth: Option<usize>,
    },

    /// Show the first entry matching CODE
    Get {
        /// Full or partial code, with or without the dot
        code: String,
        /// Entry kind to look for: chapter, block or category
        #[arg(short, long, default_value = "category")]
        kind: String,
        /// Only look at entries shallower than this depth
        #[arg(long)]
        maxdepth: Option<usize>,
    },

    /// Exit with success if any entry matches CODE
    Exists {
        /// Full or partial code, with or without the dot
        code: String,
    },

    /// Print the path from the root to the entry matching CODE
    Ancestry {
        /// Full or partial code, with or without the dot
        code: String,
    },

    /// List the leaves below an entry
    Leaves {
        /// Code of the start entry (default: root)
        code: Option<String>,
    },

    /// Show revision, release and size of the loaded codex
    Info,

    /// List source files found in the data directory
    Releases,

    /// Print the API request describing the entry matching CODE
    Request {
        /// Full or partial code, with or without the dot
        code: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
