//! Courier Server - S3-compatible gateway over a chunked blob transport.
//!
//! The binary wires the in-memory metadata store and transport sessions into
//! the S3 HTTP service, seeds the configured user, and serves HTTP/1.1 and
//! HTTP/2 connections until interrupted.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:8000 ACCESS_KEY=test SECRET_KEY=test courier-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8000` | Bind address |
//! | `ACCESS_KEY` / `SECRET_KEY` | `test` / `test` | Credentials of the seeded user |
//! | `DISPLAY_NAME` | `courier` | Display name of the seeded user |
//! | `SKIP_SIGNATURE_VALIDATION` | `false` | Trust access keys without verifying signatures |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! See [`CourierConfig::from_env`] for the remaining knobs.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use courier_s3_core::{CourierConfig, CourierS3, spawn_upload_reaper};
use courier_s3_http::service::{S3HttpConfig, S3HttpService};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::CourierHandler;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`S3HttpConfig`] from the gateway configuration.
///
/// Signatures are verified against the users in the provider's metadata store.
fn build_s3_http_config(config: &CourierConfig, provider: &CourierS3) -> S3HttpConfig {
    S3HttpConfig {
        skip_signature_validation: config.skip_signature_validation,
        max_body_size: config.max_body_size,
        body_read_timeout: config.body_read_timeout(),
        credential_provider: Some(Arc::new(provider.credential_provider())),
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: S3HttpService<CourierHandler>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running gateway.
///
/// Succeeds when the gateway answers `200 OK`.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n",
        courier_s3_http::service::HEALTH_CHECK_PATH
    );
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.starts_with("HTTP/1.1 200") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// The seeded user's display name, if one is configured.
fn seeded_display_name(config: &CourierConfig) -> Option<String> {
    let name = config.display_name.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CourierConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    info!(
        home_datacenter = config.home_datacenter,
        datacenters = config.datacenters,
        skip_signature_validation = config.skip_signature_validation,
        "initializing Courier gateway",
    );

    let provider = Arc::new(CourierS3::in_memory(config.clone()));
    provider
        .seed_user(
            config.access_key.clone(),
            config.secret_key.clone(),
            seeded_display_name(&config),
        )
        .await
        .context("failed to seed the configured user")?;

    let reaper = spawn_upload_reaper(Arc::clone(&provider));

    let http_config = build_s3_http_config(&config, &provider);
    let service = S3HttpService::new(CourierHandler(Arc::clone(&provider)), http_config);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting Courier Server");

    let result = serve(listener, service).await;
    reaper.abort();
    result
}
