//! Wharf — HTTP gateway for MCP tool servers.
//!
//! One subcommand:
//! - `wharf serve`: start the gateway HTTP server in front of the configured
//!   upstream tool servers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wharf::{Gateway, GatewayConfig};

/// Wharf — HTTP gateway for MCP tool servers.
#[derive(Parser)]
#[command(
    name = "wharf",
    version,
    about = "Wharf — HTTP gateway for MCP tool servers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway HTTP server
    Serve {
        /// Path to wharf.toml config file [default: ./wharf.toml or ~/.config/wharf/wharf.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated name:address list, e.g. "github:http://localhost:9001"
        #[arg(long, env = "MCP_SERVERS")]
        servers: Option<String>,
        /// HTTP port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            servers,
            port,
            host,
        } => {
            let config = load_config(config, servers).await?;
            run_serve(config, host, port).await?;
        }
    }

    Ok(())
}

/// Start the gateway HTTP server.
///
/// Builds the Gateway, runs one synchronous refresh cycle so the first
/// listing reflects real upstream status, spawns the periodic probe loop,
/// then serves the axum router until ctrl-c.
async fn run_serve(config: GatewayConfig, host: String, port: u16) -> Result<()> {
    let gateway = Arc::new(
        Gateway::from_config(config)
            .map_err(|e| anyhow::anyhow!("Failed to build gateway: {}", e))?,
    );

    tracing::info!(servers = gateway.server_count(), "running startup probe cycle");
    gateway.refresh_all().await;

    gateway.spawn_probe_loop();

    // Ctrl-C handler — cancels the gateway's root token for graceful shutdown
    let gateway_for_signal = gateway.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down Wharf...");
        gateway_for_signal.shutdown();
    });

    let app = wharf::router(gateway.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "Wharf gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(gateway.cancel_token().cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("Wharf HTTP server error: {}", e))?;

    tracing::info!("Wharf gateway stopped");
    Ok(())
}

/// Resolve and load config: optional wharf.toml merged with the env-style
/// server list. Neither source is required — with both absent the gateway
/// starts with an empty registry.
async fn load_config(explicit: Option<PathBuf>, servers: Option<String>) -> Result<GatewayConfig> {
    let mut config = match resolve_config(explicit) {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", path, e))?
        }
        None => GatewayConfig::default(),
    };

    if let Some(spec_list) = servers {
        config.merge_specs(&spec_list);
    }

    Ok(config)
}

/// Resolve config file path: explicit flag → ./wharf.toml → ~/.config/wharf/wharf.toml.
fn resolve_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }

    let local = Path::new("wharf.toml");
    if local.exists() {
        return Some(local.to_path_buf());
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join("wharf").join("wharf.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }

    None
}
