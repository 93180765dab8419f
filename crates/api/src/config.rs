use std::path::PathBuf;
use std::time::Duration;

use seedpool_core::coordinator::{
    CoordinatorConfig, DEFAULT_CANCEL_GRACE_PERIOD_SECS, DEFAULT_HEARTBEAT_TIMEOUT_SECS,
    DEFAULT_WORKER_ACTIVE_WINDOW_SECS,
};

/// Credentials for the admin listing endpoints (HTTP basic auth).
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `7799`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum request body size, which bounds mii image uploads (default: 10 MiB).
    pub max_upload_bytes: usize,
    /// Directory holding completed movables (default: `movables`).
    pub artifact_dir: PathBuf,
    /// Admin basic-auth credentials.
    pub admin: AdminCredentials,
    /// Liveness and retention windows for the job coordinator.
    pub coordinator: CoordinatorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `127.0.0.1`             |
    /// | `PORT`                       | `7799`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:7799` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `MAX_UPLOAD_BYTES`           | `10485760`              |
    /// | `ARTIFACT_DIR`               | `movables`              |
    /// | `ADMIN_USER`                 | `admin`                 |
    /// | `ADMIN_PASS`                 | `INSECURE`              |
    /// | `JOB_HEARTBEAT_TIMEOUT_SECS` | `300`                   |
    /// | `CANCEL_GRACE_PERIOD_SECS`   | `300`                   |
    /// | `MINER_ACTIVE_WINDOW_SECS`   | `300`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "7799".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:7799".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);
        let max_upload_bytes: usize = env_parse("MAX_UPLOAD_BYTES", 10 * 1024 * 1024);

        let artifact_dir = std::env::var("ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("movables"));

        let admin = AdminCredentials {
            username: std::env::var("ADMIN_USER").unwrap_or_else(|_| "admin".into()),
            password: std::env::var("ADMIN_PASS").unwrap_or_else(|_| "INSECURE".into()),
        };

        let coordinator = CoordinatorConfig {
            heartbeat_timeout: Duration::from_secs(env_parse(
                "JOB_HEARTBEAT_TIMEOUT_SECS",
                DEFAULT_HEARTBEAT_TIMEOUT_SECS,
            )),
            cancel_grace_period: Duration::from_secs(env_parse(
                "CANCEL_GRACE_PERIOD_SECS",
                DEFAULT_CANCEL_GRACE_PERIOD_SECS,
            )),
            worker_active_window: Duration::from_secs(env_parse(
                "MINER_ACTIVE_WINDOW_SECS",
                DEFAULT_WORKER_ACTIVE_WINDOW_SECS,
            )),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            artifact_dir,
            admin,
            coordinator,
        }
    }
}

/// Read a numeric env var, falling back to `default` when unset.
///
/// Panics on a set-but-unparseable value so misconfiguration fails fast.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got '{raw}'")),
        Err(_) => default,
    }
}
