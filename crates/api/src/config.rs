use std::path::PathBuf;

use tourdesk_core::documents::DEFAULT_MAX_UPLOAD_BYTES;
use tourdesk_core::prerequisites::{
    RecencyPolicy, DEFAULT_BACKGROUND_CHECK_WINDOW_DAYS, DEFAULT_CODE_OF_CONDUCT_WINDOW_DAYS,
    DEFAULT_CONSENT_WINDOW_DAYS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the database pool to close after the listener
    /// stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Base URL of the web client, used to build invitation links.
    pub public_base_url: String,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Lookback windows for consent, code of conduct and background checks.
    pub eligibility: RecencyPolicy,
    pub documents: DocumentConfig,
}

/// Upload storage and scanning.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Root directory of the local document store.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// `host:port` of a clamd daemon.
    pub clamd_addr: String,
    /// Skip scanning entirely. Uploads are then rejected and flagged, the
    /// same as a scanner outage.
    pub virus_scan_disabled: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                       |
    /// | `PUBLIC_BASE_URL`              | `http://localhost:5173`    |
    /// | `CONSENT_WINDOW_DAYS`          | `60`                       |
    /// | `CODE_OF_CONDUCT_WINDOW_DAYS`  | `180`                      |
    /// | `BACKGROUND_CHECK_WINDOW_DAYS` | `180`                      |
    /// | `UPLOAD_DIR`                   | `./uploads`                |
    /// | `MAX_UPLOAD_BYTES`             | `10485760`                 |
    /// | `CLAMD_ADDR`                   | `127.0.0.1:3310`           |
    /// | `VIRUS_SCAN_DISABLED`          | `false`                    |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values so misconfiguration fails at start-up.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let eligibility = RecencyPolicy {
            consent_days: env_or("CONSENT_WINDOW_DAYS", DEFAULT_CONSENT_WINDOW_DAYS),
            code_of_conduct_days: env_or(
                "CODE_OF_CONDUCT_WINDOW_DAYS",
                DEFAULT_CODE_OF_CONDUCT_WINDOW_DAYS,
            ),
            background_check_days: env_or(
                "BACKGROUND_CHECK_WINDOW_DAYS",
                DEFAULT_BACKGROUND_CHECK_WINDOW_DAYS,
            ),
        };

        let documents = DocumentConfig {
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()),
            ),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            clamd_addr: std::env::var("CLAMD_ADDR").unwrap_or_else(|_| "127.0.0.1:3310".into()),
            virus_scan_disabled: env_or("VIRUS_SCAN_DISABLED", false),
        };

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            public_base_url,
            jwt: JwtConfig::from_env(),
            eligibility,
            documents,
        }
    }

    /// Largest request body accepted: two ID images plus form overhead.
    pub fn max_body_bytes(&self) -> usize {
        self.documents.max_upload_bytes * 2 + 64 * 1024
    }
}
