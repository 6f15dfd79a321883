//! Weather API Server
//!
//! Backend for the weather dashboard: tracked cities and cached current
//! conditions from OpenWeatherMap.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use weather_api::config::DashboardConfig;
use weather_api::routes::build_router;
use weather_api::state::AppState;

/// Weather API Server
#[derive(Parser, Debug)]
#[command(name = "weather-api")]
#[command(about = "Weather dashboard backend: tracked cities and cached current conditions")]
struct Args {
    /// Listen address (overrides --port)
    #[arg(short, long, env = "WEATHER_API_LISTEN_ADDR")]
    listen: Option<String>,

    /// Listen port on all interfaces
    #[arg(short, long, default_value_t = 5000, env = "PORT")]
    port: u16,

    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/weather-api.yaml", env = "WEATHER_API_CONFIG")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "WEATHER_API_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting weather API server");

    let mut config = DashboardConfig::load(&args.config)?;
    config.apply_env();

    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?
        .with_prometheus(prometheus_handle);

    let app = build_router(Arc::new(state));

    // Parse listen address
    let addr: SocketAddr = match &args.listen {
        Some(listen) => listen
            .parse()
            .with_context(|| format!("Invalid listen address: {}", listen))?,
        None => SocketAddr::from(([0, 0, 0, 0], args.port)),
    };

    info!("Weather API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
