use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors (seed files named by config)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse seed file {path}: {source}")]
    SeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create work directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | directory holding the redb file |
/// | DB_FILE | dispense.redb | redb file name inside WORK_DIR |
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | HOSPITAL_ID | default | hospital stamped on new episodes |
/// | CATALOG_SEED | - | JSON array of valid item codes |
/// | DEPARTMENT_SEED | - | JSON object: display name → department code |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | - | rolling log file directory |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout (ms) |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/dispense HTTP_PORT=8080 CATALOG_SEED=catalog.json cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub db_file: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub hospital_id: String,
    pub catalog_seed: Option<PathBuf>,
    pub department_seed: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "dispense.redb".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            hospital_id: std::env::var("HOSPITAL_ID").unwrap_or_else(|_| "default".into()),
            catalog_seed: env_path("CATALOG_SEED"),
            department_seed: env_path("DEPARTMENT_SEED"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_path("LOG_DIR"),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
        }
    }

    /// Override the work directory and port
    ///
    /// Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Full path of the redb file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    /// Create the work directory if missing
    pub fn ensure_work_dir(&self) -> Result<(), ConfigError> {
        let path = PathBuf::from(&self.work_dir);
        std::fs::create_dir_all(&path).map_err(|source| ConfigError::WorkDir { path, source })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
