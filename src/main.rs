// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use ionos_webhook::{
    config::Config,
    constants::SHUTDOWN_GRACE_PERIOD_SECS,
    ionos::create_dns_service,
    provider::Provider,
    webhook::{health_router, webhook_router, WebhookState},
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("ionos-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

fn init_tracing() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    init_tracing();

    let config = Config::parse();
    config.validate().context("invalid configuration")?;
    let domain_filter = config
        .domain_filter()
        .context("invalid domain filter configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        domain_filter = %domain_filter,
        "Starting IONOS webhook"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    let service = create_dns_service(&config.ionos).context("failed to create DNS API client")?;
    let provider = Provider::new(service, domain_filter, config.ionos.dry_run, &shutdown)
        .await
        .context("failed to initialize provider")?;
    debug!("Provider initialized");

    let state = Arc::new(WebhookState::new(
        Arc::new(provider),
        shutdown.clone(),
        config.request_timeout(),
    ));

    let webhook_addr = config.server_addr();
    let webhook_listener = TcpListener::bind(&webhook_addr)
        .await
        .with_context(|| format!("failed to bind webhook server to {webhook_addr}"))?;
    let metrics_addr = config.metrics_addr();
    let metrics_listener = TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics server to {metrics_addr}"))?;

    info!(address = %webhook_listener.local_addr()?, "Webhook server listening");
    info!(address = %metrics_listener.local_addr()?, "Health and metrics server listening");

    let webhook_server = axum::serve(webhook_listener, webhook_router(state))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let metrics_server = axum::serve(metrics_listener, health_router())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    let grace_period = async {
        shutdown.cancelled().await;
        tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;
    };

    tokio::select! {
        result = async { tokio::try_join!(webhook_server, metrics_server) } => {
            result.context("server exited with error")?;
            info!("Servers stopped");
        }
        () = grace_period => {
            warn!(
                grace_period_secs = SHUTDOWN_GRACE_PERIOD_SECS,
                "Grace period elapsed, exiting with requests in flight"
            );
        }
    }

    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn wait_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, cancelling in-flight requests");
    shutdown.cancel();
}
