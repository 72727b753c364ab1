//! TSDB Admin Service Library
//!
//! Administration and remote-write surface for an embedded time-series
//! engine: snapshots, tombstone cleanup, series deletion and streaming
//! ingestion, plus the HTTP handlers exposing them.

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod matchers;
pub mod metrics;
pub mod remote_write;

// Re-export commonly used types
pub use admin::{Admin, AdminService};
pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use metrics::AdminMetrics;
pub use remote_write::{RemoteWriter, WriteSummary};

use std::sync::Arc;
use tsdb_core::EngineHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<AdminService>,
    pub engine: EngineHandle,
    pub metrics: AdminMetrics,
    pub config: Arc<AdminConfig>,
}

impl AppState {
    /// Wire the service together from configuration and an engine handle
    pub fn new(config: Arc<AdminConfig>, engine: EngineHandle, metrics: AdminMetrics) -> Self {
        let writer = RemoteWriter::new(
            config.ingestion.commit_chunk_size,
            metrics.remote_write.clone(),
        );
        let admin = AdminService::new(config.admin.enable_admin, engine.clone(), writer);

        Self {
            admin: Arc::new(admin),
            engine,
            metrics,
            config,
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> axum::Router {
    use crate::handlers::*;
    use axum::routing::{get, post};
    use tower::ServiceBuilder;
    use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

    // Unary admin requests are size-capped; the write stream is not, since
    // its body is read incrementally and can run for a long time
    let admin_routes = axum::Router::new()
        .route("/api/v2/admin/tsdb/snapshot", post(snapshot_handler))
        .route(
            "/api/v2/admin/tsdb/clean_tombstones",
            post(clean_tombstones_handler),
        )
        .route(
            "/api/v2/admin/tsdb/delete_series",
            post(delete_series_handler),
        )
        .layer(RequestBodyLimitLayer::new(
            state.config.ingestion.max_request_size,
        ));

    axum::Router::new()
        // Health and monitoring endpoints
        .route(&state.config.health.health_path, get(health_handler))
        .route(&state.config.metrics.metrics_path, get(metrics_handler))
        // Administration endpoints
        .merge(admin_routes)
        // Streaming remote write, one JSON request per line
        .route("/api/v2/write", post(remote_write_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
