use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Backend";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DB_FILE_NAME: &str = "clinic.db";

/// Get the application data directory
/// ~/ClinicBackend/, falling back to the working directory without a home
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ClinicBackend")
}

/// Default SQLite database location
pub fn default_db_path() -> PathBuf {
    app_data_dir().join(DB_FILE_NAME)
}

/// Filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "info,clinic_backend=debug,tower_http=info"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address {value:?}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Read `CLINIC_DB_PATH` and `CLINIC_BIND_ADDR`, defaulting each.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var("CLINIC_DB_PATH").ok(),
            std::env::var("CLINIC_BIND_ADDR").ok(),
        )
    }

    fn from_values(db_path: Option<String>, bind_addr: Option<String>) -> Result<Self, ConfigError> {
        let db_path = db_path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let raw = bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddr {
                value: raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { db_path, bind_addr })
    }
}
