//! # RELOG API Server
//!
//! HTTP front end for the resource log. Records expire after their TTL and
//! disappear from every lookup immediately; a background reaper frees their
//! storage.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness and record count
//! - `POST /add_resource` - Log `{id, resource, ttl?}`
//! - `GET /get_resources/:user_id` - Live records for an owner
//! - `GET /get_by_timestamp/:timestamp` - Live records created at an exact time
//! - `GET /resources` - All live records
//! - `POST /cleanup` - Reclaim expired records now
//! - `GET /stats` - Store statistics
//!
//! ## Example
//!
//! ```rust,ignore
//! use relog_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::from_config(ApiConfig::from_env()).await?;
//! server.run(([0, 0, 0, 0], 5000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod state;
mod dto;
mod error;

pub use routes::create_router;
pub use state::{AppState, ApiConfig};
pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use relog_core::error::Result;
use relog_store::Reaper;

/// API server for RELOG.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server with the store described by `config`.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        Ok(Self::with_state(Arc::new(AppState::from_config(config).await?)))
    }

    /// Creates a server around existing state.
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
    }

    /// Runs the server until Ctrl-C, then stops the reaper and flushes the store.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let reaper = match self.state.config.reap_interval_secs {
            0 => None,
            secs => Some(Reaper::spawn(
                self.state.store.clone(),
                Duration::from_secs(secs),
            )),
        };

        info!("RELOG API server listening on {}", addr);

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(reaper) = reaper {
            reaper.shutdown().await;
        }
        if let Err(e) = self.state.store.flush().await {
            error!(error = %e, "Failed to flush store on shutdown");
        }

        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Starts the API server with configuration from the environment.
pub async fn start_server(port: u16) -> std::io::Result<()> {
    let server = ApiServer::from_config(ApiConfig::from_env())
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    server.run(([0, 0, 0, 0], port)).await
}
