//! Gcloud Quota Exporter
//!
//! Entry point. Startup flow:
//!
//! 1. Initialize tracing
//! 2. Load configuration (flags over environment)
//! 3. Install the Prometheus metrics recorder
//! 4. Spawn the service-account token manager (bounded startup timeout)
//! 5. Build the Compute API client
//! 6. Run one full fetch-and-publish cycle, so the first scrape is never
//!    empty
//! 7. Start the HTTP server (scrape + health endpoints)
//! 8. Spawn the quota poller on a child cancellation token
//! 9. Wait for a shutdown signal or a fatal poller error
//!
//! Any startup failure and any fetch failure is fatal; the process exits
//! nonzero and the surrounding supervisor restarts it.

use clap::Parser;
use quota_exporter::auth::{spawn_token_manager, ServiceAccountKey, TokenManagerConfig};
use quota_exporter::cli::Cli;
use quota_exporter::config::Config;
use quota_exporter::errors::ExporterError;
use quota_exporter::observability::{init_metrics_recorder, HealthState};
use quota_exporter::publisher::QuotaRegistry;
use quota_exporter::routes::build_routes;
use quota_exporter::services::ComputeClient;
use quota_exporter::tasks::{fetch_and_publish, run_quota_poller};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timeout for the initial token acquisition at startup.
const TOKEN_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period for in-flight work after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quota_exporter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gcloud Quota Exporter");

    // Load configuration
    let cli = Cli::parse();
    let config = Config::load(&cli).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        metrics_listen_address = %config.metrics_listen_address,
        metrics_path = %config.metrics_path,
        projects = ?config.projects,
        regions = ?config.regions,
        fetch_interval_seconds = config.fetch_interval_seconds,
        "Configuration loaded successfully"
    );

    // Install the Prometheus metrics recorder before anything records
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    // Spawn the token manager; failure to acquire the first token is fatal
    let key = ServiceAccountKey::from_file(&config.credentials_file).map_err(|e| {
        error!(error = %e, credentials_file = %config.credentials_file, "Failed to load credentials");
        ExporterError::TokenAcquisition(e)
    })?;

    info!(client_email = %key.client_email, "Spawning token manager...");
    let (token_task_handle, token_receiver) = tokio::time::timeout(
        TOKEN_ACQUISITION_TIMEOUT,
        spawn_token_manager(TokenManagerConfig::new(key)),
    )
    .await
    .map_err(|_| {
        error!(
            timeout_secs = TOKEN_ACQUISITION_TIMEOUT.as_secs(),
            "Token acquisition timed out - token endpoint may be unreachable"
        );
        ExporterError::TokenAcquisitionTimeout
    })?
    .map_err(|e| {
        error!(error = %e, "Failed to acquire initial token");
        ExporterError::TokenAcquisition(e)
    })?;
    info!("Token manager spawned, initial token acquired");

    // Build the Compute API client
    let client = ComputeClient::new(config.compute_api_base_url.clone(), token_receiver)
        .map_err(|e| {
            error!(error = %e, "Failed to build Compute API client");
            e
        })?;

    let registry = Arc::new(QuotaRegistry::new());
    let health_state = Arc::new(HealthState::new());

    // Fetch once before the serving endpoint starts, so the first scrape
    // is never empty. A failure here is fatal before we ever serve.
    fetch_and_publish(&client, &registry, &config.projects, &config.regions)
        .await
        .map_err(|e| {
            error!(error = %e, "Initial quota fetch failed");
            e
        })?;
    health_state.set_ready();

    // Bind the listener before spawning to fail fast on bind errors
    let addr: SocketAddr = config.metrics_listen_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.metrics_listen_address, "Invalid metrics listen address");
        ExporterError::Serve(format!("invalid listen address: {e}"))
    })?;

    let app = build_routes(
        &config.metrics_path,
        prometheus_handle,
        Arc::clone(&health_state),
    );

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind metrics listener");
        ExporterError::Serve(format!("failed to bind {addr}: {e}"))
    })?;
    info!(addr = %addr, path = %config.metrics_path, "Serving Prometheus metrics");

    let shutdown_token = CancellationToken::new();

    // Spawn HTTP server task
    let server_shutdown_token = shutdown_token.child_token();
    let server_handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            server_shutdown_token.cancelled().await;
            info!("Metrics server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Metrics server failed");
        }
    });

    // Spawn the quota poller on its own child token
    let poller_token = shutdown_token.child_token();
    let mut poller_handle = tokio::spawn(run_quota_poller(
        client,
        Arc::clone(&registry),
        config.projects.clone(),
        config.regions.clone(),
        config.fetch_interval_seconds,
        poller_token,
    ));
    info!("Quota poller started");

    let mut poller_result = None;
    tokio::select! {
        () = shutdown_signal() => {
            info!("Shutdown signal received, initiating graceful shutdown...");

            // Stop advertising readiness; the in-flight cycle, if any,
            // still completes below.
            health_state.set_not_ready();
            shutdown_token.cancel();
        }
        result = &mut poller_handle => {
            poller_result = Some(result);
        }
    }

    let exit: Result<(), ExporterError> = match poller_result {
        // Poller won the race: it only returns early on a fatal error.
        Some(Ok(Ok(()))) => {
            info!("Quota poller exited");
            Ok(())
        }
        Some(Ok(Err(e))) => {
            error!(error = %e, "Quota poller failed");
            Err(e)
        }
        Some(Err(e)) => {
            error!(error = %e, "Quota poller task panicked");
            Err(ExporterError::Serve(format!("poller task failed: {e}")))
        }
        // Signal path: wait for the poller to finish its in-flight cycle.
        None => {
            match poller_handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Final quota cycle failed during shutdown"),
                Err(e) => error!(error = %e, "Quota poller task panicked during shutdown"),
            }
            tokio::time::sleep(SHUTDOWN_GRACE).await;
            Ok(())
        }
    };

    // Stop the background token refresh and the HTTP server
    token_task_handle.abort();
    shutdown_token.cancel();
    server_handle.abort();

    info!("Gcloud Quota Exporter shutdown complete");
    exit.map_err(Into::into)
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
