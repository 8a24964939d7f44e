//! Save-and-publish API entry point.

use std::net::IpAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use classic_api::api::{create_router, AppState};
use classic_api::config::Config;
use classic_api::metrics;
use classic_api::utils::shutdown_signal;
use classic_api::vcs::GitCli;

/// Save-and-publish API for The Classic.
#[derive(Parser, Debug)]
#[command(name = "classic-api")]
#[command(about = "Saves tournament data, commits it to git, and proxies the weather feed")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Listen address (overrides HOST).
    #[arg(long, global = true)]
    host: Option<IpAddr>,

    /// Listen port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so RUST_LOG from .env applies
    let loaded = Config::load();

    // Initialize logging
    let directives = match &loaded {
        Ok(config) => config.log_directives(args.verbose),
        Err(_) => "info",
    };
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(loaded),
        Some(Command::Serve) | None => cmd_serve(loaded, args.host, args.port).await,
    }
}

/// Validate loaded configuration, logging the outcome.
fn load_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<Config> {
    info!("Loading configuration...");
    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CLASSIC API - CONFIGURATION CHECK");
    println!("======================================================================");

    let config = load_config(loaded)?;

    println!("Configuration Summary:");
    println!(
        "  Credential: {}",
        match (&config.save_password, &config.save_password_hash) {
            (Some(_), Some(_)) => "raw secret + SHA-256 hash",
            (Some(_), None) => "raw secret",
            _ => "SHA-256 hash",
        }
    );
    println!("  Repository copy: {}", config.repo_data_path().display());
    println!("  Web copy: {}", config.web_data_path().display());
    println!("  Push: {} {}", config.git_remote, config.push_refspec());

    for (label, dir) in [("Repository", &config.repo_dir), ("Web root", &config.web_dir)] {
        if !dir.is_dir() {
            println!("  WARNING: {} directory {} does not exist", label, dir.display());
        }
    }
    if !config.repo_dir.join(".git").exists() {
        println!("  WARNING: {} is not a git working tree", config.repo_dir.display());
    }

    println!(
        "  Weather: {} ({}, {})",
        if config.weather_api_key.is_some() { "Enabled" } else { "No API key" },
        config.weather_location,
        config.weather_units
    );
    println!("  Allowed origin: {}", config.allowed_origin);
    println!("  Listen: {}", config.listen_addr());
    println!("  Max body: {} bytes", config.max_body_bytes);
    println!("  Log filter: {}", config.rust_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until shutdown.
async fn cmd_serve(
    loaded: Result<Config, envy::Error>,
    host: Option<IpAddr>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = load_config(loaded)?;

    // Override with CLI args if provided
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    info!("Configuration loaded successfully");
    info!("Repository copy: {}", config.repo_data_path().display());
    info!("Web copy: {}", config.web_data_path().display());
    info!("Push target: {} {}", config.git_remote, config.push_refspec());
    if config.weather_api_key.is_none() {
        warn!("WEATHER_API_KEY not set, /weather will return 500");
    }

    // Initialize metrics
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::init_metrics();

    let vcs = Arc::new(GitCli::from_config(&config));
    let addr = config.listen_addr();
    let app_state = AppState::new(config, vcs)?.with_metrics(handle);

    let listener = TcpListener::bind(addr).await?;
    info!("Save API running on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn listen_flags_work_before_and_after_subcommand() {
        let after = Args::try_parse_from(["classic-api", "serve", "--port", "4000"]).unwrap();
        assert!(matches!(after.command, Some(Command::Serve)));
        assert_eq!(after.port, Some(4000));

        let before =
            Args::try_parse_from(["classic-api", "--host", "0.0.0.0", "-p", "4001", "serve"])
                .unwrap();
        assert_eq!(before.port, Some(4001));
        assert_eq!(before.host, Some(IpAddr::from([0, 0, 0, 0])));

        let bare = Args::try_parse_from(["classic-api", "--port", "4002"]).unwrap();
        assert!(bare.command.is_none());
        assert_eq!(bare.port, Some(4002));
    }
}
