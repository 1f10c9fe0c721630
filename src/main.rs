// phishlens - AI-delegated phishing triage and training service

use anyhow::Result;
use clap::Parser;
use phishlens::cli::Args;
use phishlens::config::AppConfig;
use phishlens::gemini::GeminiClient;
use phishlens::geo::GeoClient;
use phishlens::server::create_router;
use phishlens::utils::logging;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load()?;

    // Phase 2: Build the runtime with the configured worker count
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    // Phase 3: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting phishlens v{}", env!("CARGO_PKG_VERSION"));

    // Phase 4: Construct upstream clients
    let gemini = GeminiClient::new(&config.gemini)?;
    let geo = GeoClient::new(&config.geo)?;

    // Phase 4.5: Handle --check flag (connectivity probe)
    if args.check {
        let latency = gemini.check_connectivity().await?;
        info!("Model endpoint reachable in {:?}", latency);
        return Ok(());
    }

    // Phase 5: Build and start HTTP server
    let app = create_router(config.clone(), gemini, geo)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
