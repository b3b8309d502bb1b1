//! Multisig coordination server entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qash_multisig::api::server::MultisigServer;
use qash_multisig::core::config::ServiceConfig;

#[derive(Parser)]
#[command(name = "multisig_server")]
#[command(about = "Multisig proposal and signature coordination server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coordination server
    Server {
        /// Port to bind the server to
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    info!("Starting multisig coordination server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}. Using defaults", e);
        ServiceConfig::default()
    });

    // environment overrides
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        config.storage.database_url = database_url;
    }
    if let Ok(collaborator_url) = std::env::var("COLLABORATOR_URL") {
        config.collaborator.base_url = collaborator_url;
    }

    if let Some(Commands::Server { port: Some(port) }) = args.command {
        config.server.port = port;
    }

    let server = MultisigServer::new(config).await?;
    server.start().await?;

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,h2=info"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config() -> Result<ServiceConfig> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let content = fs::read_to_string(&config_path)?;
    let config = toml::from_str(&content)?;
    info!("Loaded configuration from {}", config_path);
    Ok(config)
}
