//! View Builder - Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing::error;
use view_builder::{commands, BuildConfig, Cli, Commands, DatasetRegistry};
use view_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("view-builder")
        .filter_directives("sqlx=warn")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        },
    };

    if let Err(e) = execute_command(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: Cli) -> Result<()> {
    let config = BuildConfig::load().context("Failed to load configuration")?;
    let registry = DatasetRegistry::standard();

    match cli.command {
        Commands::Init { database } => {
            let url = commands::database_url(&config, database.as_deref());
            commands::init(&url).await?;
            println!("Initialised view database {url}");
        },
        Commands::Build {
            dataset,
            input,
            database,
            allow_broken_relationships,
            no_progress,
            json,
        } => {
            let config = BuildConfig {
                database_url: commands::database_url(&config, database.as_deref()),
                allow_broken_relationships: allow_broken_relationships
                    || config.allow_broken_relationships,
                ..config
            };
            config.validate()?;

            let result = commands::build(&config, &registry, &dataset, &input, !no_progress)
                .await
                .with_context(|| format!("Build of {dataset} from {} failed", input.display()))?;
            if json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!(
                    "{}: {} records, {} rows committed, {} broken relationships",
                    result.dataset, result.records, result.rows, result.broken_relationships
                );
            }
        },
        Commands::LoadOrganisations { input, database } => {
            let url = commands::database_url(&config, database.as_deref());
            let config = config.with_database_url(url);
            let loaded = commands::load_organisation_register(&config, &input).await?;
            println!("Loaded {loaded} organisations");
        },
        Commands::Datasets => {
            for (name, kind) in commands::datasets(&registry) {
                println!("{name}\t{kind}");
            }
        },
    }

    Ok(())
}
