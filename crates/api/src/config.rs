//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `4000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `JWT_SECRET` — token signing secret (default: `"dev-secret"`)
/// - `TOKEN_TTL_HOURS` — bearer token lifetime (default: `24`)
/// - `SMTP_RELAY`, `SMTP_USERNAME`, `SMTP_PASSWORD` — mail transport;
///   unset logs outbound mail instead of sending
/// - `MAIL_FROM` — sender mailbox (default: `OPERATOR_EMAIL`)
/// - `OPERATOR_EMAIL` — recipient of order notices and contact mail
///   (default: `"admin@example.com"`)
/// - `ADMIN_USERNAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD` — used by the
///   `seed-admin` binary
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub smtp_relay: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: Option<String>,
    pub operator_email: String,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string()),
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            smtp_relay: std::env::var("SMTP_RELAY").ok(),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            mail_from: std::env::var("MAIL_FROM").ok(),
            operator_email: std::env::var("OPERATOR_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_username: std::env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            log_level: "info".to_string(),
            database_url: None,
            jwt_secret: "dev-secret".to_string(),
            token_ttl_hours: 24,
            smtp_relay: None,
            smtp_username: None,
            smtp_password: None,
            mail_from: None,
            operator_email: "admin@example.com".to_string(),
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}
