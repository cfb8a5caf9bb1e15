//! Parking LPR CLI server
//!
//! Headless REST server that reconciles OCR plate readings with
//! registered vehicles and tracks their parking sessions.
//!
//! ```sh
//! # Run with default config (~/.config/parking-lpr/config.toml)
//! parking-lpr
//!
//! # Custom config path
//! parking-lpr --config /etc/parking-lpr/config.toml
//!
//! # Throwaway instance without a database
//! parking-lpr --in-memory --api-port 9090
//!
//! # Validate config without starting
//! parking-lpr --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use parking_lpr::config::AppConfig;
use parking_lpr::server::{init_tracing, ServerHandle, ServerOptions};

/// Parking LPR: check-in/check-out tracking from license-plate readings.
#[derive(Parser, Debug)]
#[command(
    name = "parking-lpr",
    version,
    about = "Parking check-in/check-out tracker driven by license-plate recognition",
    long_about = "Parking LPR REST API server.\n\n\
                  Default config: ~/.config/parking-lpr/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Keep vehicles and sessions in memory instead of the database.
    #[arg(long)]
    in_memory: bool,
}

/// Command line values win over the config file.
fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(parking_lpr::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    apply_overrides(&cli, &mut config);

    // Tracing is installed once, after overrides, so --log-level applies.
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.api_address());
        println!("   Database    : {}", config.database.connection_url());
        println!("   Strategy    : {:?}", config.matching.default_strategy);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        run_migrations: !cli.no_migrate,
        in_memory: cli.in_memory,
    })
    .await?;

    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from(["parking-lpr", "--log-level", "debug", "--api-port", "9191"]);
        let mut config = AppConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.api_port, 9191);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::parse_from(["parking-lpr", "--in-memory"]);
        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.server.api_port, AppConfig::default().server.api_port);
        assert!(cli.in_memory);
    }
}
