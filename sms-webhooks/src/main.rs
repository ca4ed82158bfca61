//! SMS Webhook Server - inbound SMS and delivery receipt receiver.
//!
//! This binary provides a thin web server that:
//! - Receives inbound SMS and delivery receipt webhooks
//! - Verifies inbound SMS signatures when a secret is configured
//! - Logs each accepted payload
//! - Answers with an empty 204, 401 or 500

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smshooks::{build_router, Config, DeliveryReceipt, InboundSms};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        signature_secret_configured = config.pipeline_config().secret().is_some(),
        signature_method = %config.signature_method,
        invoke_next = config.invoke_next,
        inbound_sms_path = %config.inbound_sms_path,
        delivery_receipt_path = %config.delivery_receipt_path,
        max_body_bytes = config.max_body_bytes,
        "config_loaded"
    );

    // Build the router
    let app = build_router(&config, log_inbound_sms, log_delivery_receipt)
        .layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

fn log_inbound_sms(sms: InboundSms) -> Result<()> {
    info!(
        from = %sms.msisdn,
        to = %sms.to,
        message_id = sms.message_id.as_deref().unwrap_or(""),
        message_type = ?sms.message_type,
        text_length = sms.text.len(),
        concat = sms.concat.unwrap_or(false),
        "inbound_sms_received"
    );
    Ok(())
}

fn log_delivery_receipt(receipt: DeliveryReceipt) -> Result<()> {
    info!(
        msisdn = %receipt.msisdn,
        message_id = %receipt.message_id,
        status = %receipt.status,
        err_code = receipt.err_code.unwrap_or(0),
        client_ref = receipt.client_ref.as_deref().unwrap_or(""),
        "delivery_receipt_received"
    );
    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
