//! podwhoami: pod identity reporter.
//!
//! This is the application entry point. It initializes tracing, reads the
//! listening port from the environment, registers the health metrics, builds
//! the Axum router and serves until the listener fails or a shutdown signal
//! arrives.

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podwhoami::config::{Env, EnvKey, DEFAULT_LOG_FILTER};
use podwhoami::http::start_server;
use podwhoami::routes::create_router;
use podwhoami::state::AppState;

/// podwhoami: reports pod identity, liveness and Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "podwhoami", version, about)]
struct Args {
    /// Log level filter (e.g., "podwhoami=debug,axum=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let subscriber =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    match args.log_format {
        LogFormat::Text => subscriber.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    if let Err(e) = run(Env::process()).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn run(env: Env) -> Result<(), Box<dyn std::error::Error>> {
    let addr = env.listen_addr()?;

    // Create application state (registers health metrics)
    let state = AppState::new(env.clone())?;
    tracing::debug!(env = ?env, "Loaded environment");

    // Create router
    let app = create_router(state);

    tracing::info!(
        port = addr.port(),
        pod = %env.value(EnvKey::PodName),
        environment = %env.value(EnvKey::Environment),
        "Server started"
    );

    start_server(app, addr).await?;

    tracing::info!("Server stopped");
    Ok(())
}
