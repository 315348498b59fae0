//! Server Implementation
//!
//! Plain HTTP listener with graceful shutdown on Ctrl-C.

use crate::api::build_app;
use crate::core::{Config, Result, ServerError, ServerState};
use std::net::SocketAddr;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(self) -> Result<()> {
        let state = match self.state {
            Some(s) => s,
            None => {
                let config = self.config.clone();
                tokio::task::spawn_blocking(move || ServerState::initialize(&config))
                    .await
                    .map_err(|e| ServerError::Serve(std::io::Error::other(e)))??
            }
        };

        let app = build_app(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, environment = %self.config.environment, "Dispense server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(ServerError::Serve)?;

        Ok(())
    }
}
