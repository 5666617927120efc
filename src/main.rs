//! DMS API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────────────┐
//!                 │                         API GATEWAY                            │
//!                 │                                                                │
//!   Client ──────▶│ cors → security → correlator → envelope → dispatcher          │
//!                 │                                                │               │
//!                 │                                                ▼               │
//!                 │                        facade (AuthService, ClubService, ...)  │
//!                 │                                                │               │
//!                 │                                                ▼               │
//!                 │         registry (Consul) ──▶ strategy ──▶ service client ─────┼──▶ Backend
//!                 │                                                                │    instance
//!                 │  ┌────────────────────────────────────────────────────────┐   │
//!                 │  │ config │ domain logs │ tracing │ metrics │ lifecycle    │   │
//!                 │  └────────────────────────────────────────────────────────┘   │
//!                 └───────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_gateway::config::load_config;
use api_gateway::lifecycle::bootstrap;
use api_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "DMS API gateway", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; required settings come from the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), |name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(e) => {
            // The subscriber is configured from the config we failed to load.
            eprintln!("api-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Flushes exported spans when main returns.
    let _telemetry = match logging::init_logging(&config.observability, &config.tracing) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("api-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        discovery = %config.discovery.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = match bootstrap(config).await {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        tracing::error!(error = %e, "Gateway stopped with an error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
