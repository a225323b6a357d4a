//! Creates the admin account if none exists.
//!
//! Reads `ADMIN_USERNAME`, `ADMIN_EMAIL`, and `ADMIN_PASSWORD` from the
//! environment (with defaults) and exits cleanly when an admin is already
//! on record.

use api::config::Config;
use domain::AccountService;
use store::PostgresStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(url) = config.database_url.as_deref() else {
        tracing::error!("DATABASE_URL must be set to seed the admin account");
        std::process::exit(1);
    };

    let store = PostgresStore::connect(url)
        .await
        .expect("failed to connect to database");
    store
        .run_migrations()
        .await
        .expect("failed to run migrations");

    let accounts = AccountService::new(store);
    match accounts
        .seed_admin(
            &config.admin_username,
            &config.admin_email,
            &config.admin_password,
        )
        .await
    {
        Ok(Some(admin)) => {
            tracing::info!(username = %admin.username, "admin account created");
        }
        Ok(None) => {
            tracing::info!("admin account already exists, nothing to do");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to seed admin account");
            std::process::exit(1);
        }
    }
}
