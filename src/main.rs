use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use testdeps::commands::{self, OutputFormat};
use testdeps::config::{self, CommonArgs, ConfigInput, MongoArgs, NatsArgs, PostgresArgs};
use testdeps::docker::{self, Container};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to $TESTDEPS_CONFIG or testdeps.yaml)
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a MongoDB container
    Mongo {
        #[command(flatten)]
        args: MongoArgs,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a NATS container
    Nats {
        #[command(flatten)]
        args: NatsArgs,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a PostgreSQL container
    Postgres {
        #[command(flatten)]
        args: PostgresArgs,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

enum Backend {
    Mongo,
    Nats,
    Postgres,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    let result = tokio::select! {
        result = run_main(cli) => result,
        _ = wait_for_shutdown_signal() => {
            info!("Received shutdown signal during startup, cleaning up...");
            Ok(None)
        }
    };

    if let Ok(Some(container)) = &result {
        wait_for_shutdown_signal().await;
        info!("Received shutdown signal, cleaning up...");
        if let Err(e) = container.terminate().await {
            eprintln!("Warning: Failed to remove container {}: {}", container.name(), e);
        }
    }

    if let Err(e) = docker::cleanup_all_containers().await {
        eprintln!("Warning: Failed to cleanup Docker containers: {}", e);
    }

    result.map(|_| ())
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Start the requested container and return it once it is running.
async fn run_main(cli: Cli) -> Result<Option<Container>> {
    let config_path = cli.config_file.clone().unwrap_or_else(config::config_path);
    let file_config = config::load_config(&config_path)?;

    let (backend, cli_config, format) = match cli.command {
        Commands::Mongo {
            args,
            common,
            format,
        } => (
            Backend::Mongo,
            ConfigInput {
                mongo: Some(args.into()),
                ..ConfigInput::from(common)
            },
            format,
        ),
        Commands::Nats {
            args,
            common,
            format,
        } => (
            Backend::Nats,
            ConfigInput {
                nats: Some(args.into()),
                ..ConfigInput::from(common)
            },
            format,
        ),
        Commands::Postgres {
            args,
            common,
            format,
        } => (
            Backend::Postgres,
            ConfigInput {
                postgres: Some(args.into()),
                ..ConfigInput::from(common)
            },
            format,
        ),
    };

    let config = config::ConfigBuilder::new()
        .with_file(file_config)
        .with_env(ConfigInput::from_env()?)
        .with_cli_args(cli_config)
        .resolve()?;
    config::set_global(config.clone());

    let container = match backend {
        Backend::Mongo => {
            info!("Starting MongoDB container");
            commands::cmd_mongo(&config, format).await?
        }
        Backend::Nats => {
            info!("Starting NATS container");
            commands::cmd_nats(&config, format).await?
        }
        Backend::Postgres => {
            info!("Starting PostgreSQL container");
            commands::cmd_postgres(&config, format).await?
        }
    };

    Ok(Some(container))
}
