use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod display;
mod manifest;

use commands::KeyOverride;

#[derive(Parser)]
#[command(name = "ncloud")]
#[command(about = "Manage NAVER Cloud Platform resources from a TOML manifest", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by NCLOUD_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API access key
    #[arg(long, global = true, env = "NCLOUD_ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// API secret key
    #[arg(long, global = true, env = "NCLOUD_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest without contacting the platform
    Validate {
        /// Path to the manifest
        #[arg(default_value = "ncloud.toml")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the manifest
        #[arg(default_value = "ncloud.toml")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the manifest
        #[arg(default_value = "ncloud.toml")]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Destroy every resource recorded in the state
    Destroy {
        /// Path to the manifest
        #[arg(default_value = "ncloud.toml")]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Evaluate the manifest's data sources and print the results
    Query {
        /// Path to the manifest
        #[arg(default_value = "ncloud.toml")]
        file: PathBuf,
    },
    /// Adopt an existing remote resource declared in the manifest
    Import {
        /// Manifest address, <type>.<name>
        address: String,

        /// Platform identifier (policy number, NAT gateway number, project id)
        identifier: String,

        /// Path to the manifest
        #[arg(long, short, default_value = "ncloud.toml")]
        file: PathBuf,
    },
    /// Remove a state lock left behind by an interrupted run
    ForceUnlock {
        /// Lock ID shown in the "State is locked" error
        lock_id: String,

        /// Path to the manifest
        #[arg(long, short, default_value = "ncloud.toml")]
        file: PathBuf,
    },
    /// Print resource and data source schemas
    Schema {
        /// Only this resource or data source type
        type_name: Option<String>,
    },
}

fn init_logger(verbose: bool) {
    let filter = EnvFilter::try_from_env("NCLOUD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let keys = KeyOverride {
        access_key: cli.access_key,
        secret_key: cli.secret_key,
    };

    let result = match cli.command {
        Commands::Validate { file } => commands::run_validate(&file),
        Commands::Plan { file } => commands::run_plan(&file, &keys).await,
        Commands::Apply { file, auto_approve } => {
            commands::run_apply(&file, auto_approve, &keys).await
        }
        Commands::Destroy { file, auto_approve } => {
            commands::run_destroy(&file, auto_approve, &keys).await
        }
        Commands::Query { file } => commands::run_query(&file, &keys).await,
        Commands::Import {
            address,
            identifier,
            file,
        } => commands::run_import(&file, &address, &identifier, &keys).await,
        Commands::ForceUnlock { lock_id, file } => {
            commands::run_force_unlock(&file, &lock_id).await
        }
        Commands::Schema { type_name } => commands::run_schema(type_name.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
