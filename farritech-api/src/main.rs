//! FarriTech API server.
//!
//! One axum server hosts the SMS webhook and every JSON endpoint. Vendor
//! clients are built once at startup from the environment; endpoints whose
//! credentials are missing answer with a configuration error instead of
//! failing the whole process.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use farritech::web::is_signature_verification_enabled;
use farritech::{router, AppState, Config};

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
        firestore_configured = config.firebase_api_key.is_some(),
        twilio_configured = config.twilio_account_sid.is_some() && config.twilio_auth_token.is_some(),
        signature_verification = is_signature_verification_enabled(
            config.twilio_auth_token.as_deref(),
            config.twilio_webhook_url.as_deref(),
        ),
        authorize_net_configured = config.authorize_net_login_id.is_some(),
        authorize_net_sandbox = config.authorize_net_sandbox,
        authnet_env = %config.authnet_env,
        resend_configured = config.resend_api_key.is_some(),
        google_configured = config.google_client_id.is_some(),
        trial_days = config.trial_days,
        "config_loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .context("Failed to build HTTP client")?;

    let port = config.port;
    let state = AppState::from_config(config, client);
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
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
