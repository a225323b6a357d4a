//! API server entry point.

use api::config::Config;
use api::mailer::SmtpMailer;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: Store>(
    store: S,
    mailer: SmtpMailer,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    let addr = config.addr();
    let state = api::create_state(store, mailer, config);
    let app = api::create_app(state, metrics_handle);

    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build the mailer (log-only when no SMTP relay is configured)
    let mailer = SmtpMailer::from_config(&config).expect("invalid mail configuration");

    // 4. Pick the store and run
    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(&url)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            serve(store, mailer, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set; running on the in-memory store");
            serve(MemoryStore::new(), mailer, config, metrics_handle).await;
        }
    }
}
