// ABOUTME: CLI entry point for catalog-single-store-migrator
// ABOUTME: Parses commands and routes to appropriate handlers

use catalog_single_store_migrator::commands::{self, MigrateOptions};
use catalog_single_store_migrator::config::{
    load_config_from_file, ConfigOverrides, MigrationConfig,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "catalog-single-store-migrator")]
#[command(
    about = "Collapse store-scoped catalog attribute values onto the default store",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct SettingsArgs {
    /// Path to a migration TOML config file
    #[arg(long = "config")]
    config_path: Option<String>,
    /// Store id values are collapsed onto (default: 0)
    #[arg(long)]
    default_store_id: Option<i64>,
    /// Prefix prepended to every catalog table name
    #[arg(long)]
    table_prefix: Option<String>,
    /// Entity link column: row_id (content staging) or entity_id
    #[arg(long)]
    link_field: Option<String>,
    /// Roll back and report failures instead of exiting with an error
    #[arg(long)]
    best_effort: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Move a store's catalog values onto the default store in one transaction
    Migrate {
        /// Catalog database URL (postgresql://... or sqlite://path)
        #[arg(long)]
        target: String,
        /// Store being collapsed into the default store
        #[arg(long)]
        store_id: i64,
        #[command(flatten)]
        settings: SettingsArgs,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Print a JSON summary on stdout
        #[arg(long)]
        json: bool,
    },
    /// Show what a migration would change without writing anything
    Plan {
        /// Catalog database URL (postgresql://... or sqlite://path)
        #[arg(long)]
        target: String,
        /// Store being collapsed into the default store
        #[arg(long)]
        store_id: i64,
        #[command(flatten)]
        settings: SettingsArgs,
        /// Print the plan as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// List the catalog tables a migration touches, in order
    Tables {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            target,
            store_id,
            settings,
            yes,
            json,
        } => {
            let config = build_config(&settings)?;
            let options = MigrateOptions {
                skip_confirmation: yes,
                json,
            };
            commands::migrate(&target, store_id, &config, options).await
        }
        Commands::Plan {
            target,
            store_id,
            settings,
            json,
        } => {
            let config = build_config(&settings)?;
            commands::plan(&target, store_id, &config, json).await
        }
        Commands::Tables { settings } => {
            let config = build_config(&settings)?;
            commands::tables(&config)
        }
    }
}

fn build_config(args: &SettingsArgs) -> anyhow::Result<MigrationConfig> {
    let mut config = match &args.config_path {
        Some(path) => load_config_from_file(path)?,
        None => MigrationConfig::default(),
    };
    config.apply_overrides(&ConfigOverrides {
        default_store_id: args.default_store_id,
        table_prefix: args.table_prefix.clone(),
        link_field: args.link_field.clone(),
        best_effort: args.best_effort,
    });
    config.validate()?;
    Ok(config)
}
