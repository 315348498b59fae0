use crate::core::ConfigError;
use crate::reconcile::ManagerError;
use thiserror::Error;

/// Startup and serving errors
///
/// Request-level failures never reach this type; handlers answer them with
/// [`AppError`](shared::error::AppError).
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage initialisation failed: {0}")]
    Storage(#[from] ManagerError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
