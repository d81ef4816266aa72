//! Clubdesk server entry point.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use clubdesk_api::{AppState, app};
use clubdesk_common::{Config, LocalStorage};
use clubdesk_core::{LogMailer, Mailer, SmtpMailer};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing() {
    let json = std::env::var("CLUBDESK_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clubdesk=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>, Box<dyn std::error::Error>> {
    if config.email.enabled {
        info!(host = %config.email.smtp_host, port = config.email.smtp_port, "Sending email over SMTP");
        Ok(Arc::new(SmtpMailer::new(&config.email)?))
    } else {
        info!("Email disabled, notifications will be logged");
        Ok(Arc::new(LogMailer))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting clubdesk server...");

    let config = Config::load()?;

    let db = clubdesk_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    clubdesk_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = Arc::new(LocalStorage::new(config.storage.base_path.clone()));
    info!(path = %config.storage.base_path.display(), "Using local attachment storage");

    let mailer = build_mailer(&config)?;
    let state = AppState::new(Arc::new(db), storage, mailer, &config);

    let router = app(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            config.storage.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, url = %config.server.url, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
