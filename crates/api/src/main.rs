use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use guildhall_core::forum::InMemoryPostRepository;
use guildhall_core::rate_limit::AdmissionController;
use guildhall_core::roles::Role;
use guildhall_core::users::InMemoryUserDirectory;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guildhall_api::app::build_app;
use guildhall_api::auth::password::hash_password;
use guildhall_api::background;
use guildhall_api::config::ServerConfig;
use guildhall_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guildhall_api=debug,guildhall_core=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = ?config.environment,
        "Loaded server configuration"
    );

    // --- Accounts ---
    let users = Arc::new(InMemoryUserDirectory::new());
    if let Some(admin) = &config.bootstrap_admin {
        let hash = hash_password(&admin.password)
            .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap admin password: {e}"))?;
        let record = users.insert(&admin.username, hash, Role::Admin.as_str()).await?;
        tracing::info!(user_id = record.id, username = %record.username, "Bootstrap admin created");
    }

    // --- Admission control ---
    let policy = config.rate_limit_policy();
    let limiter = AdmissionController::in_memory(policy);
    tracing::info!(?policy, "Rate limits configured");

    let sweep_cancel = CancellationToken::new();
    let sweep_handle = tokio::spawn(background::limiter_sweep::run(
        limiter.clone(),
        Duration::from_secs(config.rate_limit_sweep_secs.max(1)),
        sweep_cancel.clone(),
    ));

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    let state = AppState {
        config: Arc::new(config),
        limiter,
        users,
        posts: Arc::new(InMemoryPostRepository::new()),
    };

    let app = build_app(state)?;

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    // Connect info feeds the per-address limiter subjects.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Graceful shutdown complete");

    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
