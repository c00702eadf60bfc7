//! View Builder Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Materializes entity-keyed source records into a relational view database, one dataset at a
//! time.
//!
//! # Overview
//!
//! - **Normalization**: identity and date checks on each source record ([`normalizer`])
//! - **Resolution**: natural-key lookups with the broken-relationship policy ([`resolver`])
//! - **Mapping**: per-dataset mapper variants selected through a registry ([`dataset`])
//! - **Orchestration**: stream, map and commit a build atomically ([`orchestrator`])
//! - **Storage**: SQLite view database and an in-memory store ([`storage`])
//!
//! # Example
//!
//! ```no_run
//! use view_builder::{BuildOptions, CsvSource, DatasetRegistry, SqliteViewStore, ViewBuilder};
//!
//! # async fn run() -> view_builder::Result<()> {
//! let registry = DatasetRegistry::standard();
//! let store = SqliteViewStore::open("sqlite:view_model.db").await?;
//! let builder = ViewBuilder::new(&registry, &store, BuildOptions::default());
//!
//! let records = CsvSource::open("developer-agreement-type.csv")?;
//! let result = builder.build("developer-agreement-type", records, None).await?;
//! println!("{} rows committed", result.rows);
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod organisation;
pub mod progress;
pub mod reference;
pub mod resolver;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use config::BuildConfig;
pub use dataset::{DatasetKind, DatasetModel, DatasetRegistry};
pub use error::{BuildError, Result};
pub use orchestrator::{BuildOptions, BuildResult, ViewBuilder};
pub use reference::{Lookup, ReferenceStore, ViewSink};
pub use source::{CsvSource, SourceRecord};
pub use storage::{MemoryStore, SqliteViewStore};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build relational view databases from dataset CSV files
#[derive(Parser, Debug)]
#[command(name = "view-builder")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the view schema in a database
    Init {
        /// View database path (defaults to VIEW_DATABASE_URL)
        database: Option<String>,
    },

    /// Build one dataset into the view database
    Build {
        /// Dataset name, e.g. brownfield-land
        dataset: String,

        /// Dataset CSV file
        input: PathBuf,

        /// View database path (defaults to VIEW_DATABASE_URL)
        database: Option<String>,

        /// Omit joins whose reference is missing instead of failing
        #[arg(long)]
        allow_broken_relationships: bool,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,

        /// Print the build result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the organisation register
    LoadOrganisations {
        /// Organisation CSV file
        input: PathBuf,

        /// View database path (defaults to VIEW_DATABASE_URL)
        database: Option<String>,
    },

    /// List the datasets that can be built
    Datasets,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "view-builder",
            "build",
            "development-policy",
            "development-policy.csv",
            "view_model.db",
            "--allow-broken-relationships",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                dataset,
                input,
                database,
                allow_broken_relationships,
                no_progress,
                json,
            } => {
                assert_eq!(dataset, "development-policy");
                assert_eq!(input, PathBuf::from("development-policy.csv"));
                assert_eq!(database.as_deref(), Some("view_model.db"));
                assert!(allow_broken_relationships);
                assert!(!no_progress);
                assert!(!json);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_database_is_optional() {
        let cli = Cli::try_parse_from(["view-builder", "-v", "init"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Init { database: None }));
    }

    #[test]
    fn test_build_requires_input() {
        assert!(Cli::try_parse_from(["view-builder", "build", "parish"]).is_err());
    }
}
