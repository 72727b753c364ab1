//! Administrative operations and the enable/disable gate
//!
//! [`Admin`] performs snapshot, tombstone cleanup, series deletion and
//! remote write against the engine. [`AdminService`] is what the transport
//! layer talks to; it is fixed at startup to either route to an `Admin` or
//! refuse every call.

use chrono::Utc;
use futures::Stream;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tsdb_core::{Engine, EngineHandle, TimeRange};

use crate::api::{DeleteSeriesRequest, SnapshotRequest, SnapshotResponse, WriteRequest};
use crate::error::{AdminError, AdminResult};
use crate::matchers;
use crate::remote_write::{RemoteWriter, WriteSummary};

/// Subdirectory of the engine data directory holding snapshots
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Administration interface to the storage engine
#[derive(Debug, Clone)]
pub struct Admin {
    engine: EngineHandle,
    writer: RemoteWriter,
}

impl Admin {
    pub fn new(engine: EngineHandle, writer: RemoteWriter) -> Self {
        Self { engine, writer }
    }

    fn engine(&self) -> AdminResult<Arc<dyn Engine>> {
        self.engine.get().ok_or(AdminError::NotReady)
    }

    /// Snapshot the engine into a fresh directory below `<data_dir>/snapshots`
    /// and return the directory name.
    pub fn snapshot(&self, request: &SnapshotRequest) -> AdminResult<SnapshotResponse> {
        let engine = self.engine()?;

        let name = snapshot_name();
        let dir: PathBuf = engine.data_dir().join(SNAPSHOTS_DIR).join(&name);

        std::fs::create_dir_all(&dir).map_err(|e| {
            AdminError::internal(format!("create snapshot directory: {}", e))
        })?;
        engine
            .snapshot(&dir, !request.skip_head)
            .map_err(|e| AdminError::engine("create snapshot", e))?;

        info!("Created snapshot {} (skip_head={})", name, request.skip_head);
        Ok(SnapshotResponse { name })
    }

    /// Remove data covered by deletion markers
    pub fn clean_tombstones(&self) -> AdminResult<()> {
        let engine = self.engine()?;

        engine
            .clean_tombstones()
            .map_err(|e| AdminError::engine("clean tombstones", e))?;

        info!("Cleaned tombstones");
        Ok(())
    }

    /// Delete samples in the requested time range from every series accepted
    /// by all matchers. Input is validated before the engine is touched.
    pub fn delete_series(&self, request: &DeleteSeriesRequest) -> AdminResult<()> {
        let range = TimeRange::resolve(request.min_time, request.max_time)
            .map_err(|e| AdminError::invalid_argument(time_range_message(e)))?;
        let selector = matchers::translate_all(&request.matchers)?;

        let engine = self.engine()?;
        engine
            .delete(range.min, range.max, &selector)
            .map_err(|e| AdminError::internal(e.to_string()))?;

        info!(
            "Deleted series in [{}, {}] matching {} matchers",
            range.min,
            range.max,
            selector.len()
        );
        Ok(())
    }

    /// Ingest a stream of write requests through one appender
    pub async fn remote_write<S>(&self, stream: S) -> AdminResult<WriteSummary>
    where
        S: Stream<Item = AdminResult<WriteRequest>> + Unpin,
    {
        let engine = self.engine()?;
        self.writer.write_stream(engine, stream).await
    }
}

/// Admin interface as seen by the transport layer.
///
/// The variant is chosen once when the service is built.
#[derive(Debug, Clone)]
pub enum AdminService {
    Enabled(Admin),
    /// Every operation answers [`AdminError::Disabled`] without doing any work
    Disabled,
}

impl AdminService {
    /// Build the service from the administration switch
    pub fn new(enable_admin: bool, engine: EngineHandle, writer: RemoteWriter) -> Self {
        if enable_admin {
            AdminService::Enabled(Admin::new(engine, writer))
        } else {
            warn!("Admin APIs are disabled");
            AdminService::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AdminService::Enabled(_))
    }

    fn admin(&self) -> AdminResult<&Admin> {
        match self {
            AdminService::Enabled(admin) => Ok(admin),
            AdminService::Disabled => Err(AdminError::Disabled),
        }
    }

    pub fn snapshot(&self, request: &SnapshotRequest) -> AdminResult<SnapshotResponse> {
        self.admin()?.snapshot(request)
    }

    pub fn clean_tombstones(&self) -> AdminResult<()> {
        self.admin()?.clean_tombstones()
    }

    pub fn delete_series(&self, request: &DeleteSeriesRequest) -> AdminResult<()> {
        self.admin()?.delete_series(request)
    }

    /// Remote write; when disabled the stream is dropped without being read
    pub async fn remote_write<S>(&self, stream: S) -> AdminResult<WriteSummary>
    where
        S: Stream<Item = AdminResult<WriteRequest>> + Unpin,
    {
        self.admin()?.remote_write(stream).await
    }
}

/// `<UTC time>-<random hex>`, e.g. `20240102T150405Z-1a2b3c4d5e6f7a8b`
fn snapshot_name() -> String {
    format!(
        "{}-{:x}",
        Utc::now().format("%Y%m%dT%H%M%SZ"),
        rand::random::<u64>()
    )
}

fn time_range_message(err: tsdb_core::TsdbError) -> String {
    match err {
        tsdb_core::TsdbError::TimeRange(msg) => msg,
        other => other.to_string(),
    }
}
