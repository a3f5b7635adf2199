//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prismic content graph builder
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: prismic.toml)
    #[arg(short = 'C', long, default_value = "prismic.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Derive types from the schemas and normalize every document
    Build {
        /// Clean output directory completely before building
        #[arg(long)]
        clean: bool,

        /// Documents requested per page (1-100)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Normalize one draft document the way a preview page would
    Preview {
        /// Preview URL or query string carrying `token` and `documentId`
        #[arg(long)]
        location: String,

        /// Static data to merge the preview into
        #[arg(long = "static")]
        static_data: Option<PathBuf>,

        /// Exported type-path file (default: the one the last build wrote)
        #[arg(long)]
        type_paths: Option<PathBuf>,
    },

    /// Merge preview data into static data
    Merge {
        /// Static data JSON file
        #[arg(long = "static")]
        static_data: Option<PathBuf>,

        /// Preview data JSON file
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
}
