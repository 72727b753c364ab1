//! Storage engine interface
//!
//! The admin service only talks to the storage engine through these traits.
//! All calls are synchronous; concurrency control inside the engine is the
//! engine's own business.

use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::TsdbResult;
use crate::labels::Labels;
use crate::matcher::Matcher;

/// Opaque handle the engine assigns to a series on first append.
///
/// Valid only for the appender that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesRef(u64);

impl SeriesRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SeriesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transactional append context.
///
/// Samples added through an appender become visible on `commit` and are
/// discarded on `rollback`. Both calls checkpoint the appender: it can keep
/// accepting samples afterwards.
pub trait Appender: Send {
    /// Append a sample for the series identified by `labels`.
    /// `labels` must be in canonical (name-sorted) order.
    fn add(&mut self, labels: &Labels, timestamp: i64, value: f64) -> TsdbResult<SeriesRef>;

    /// Append a sample for a series already resolved by [`Appender::add`]
    fn add_fast(&mut self, series: SeriesRef, timestamp: i64, value: f64) -> TsdbResult<()>;

    /// Make all pending samples durable and visible
    fn commit(&mut self) -> TsdbResult<()>;

    /// Discard all pending samples
    fn rollback(&mut self) -> TsdbResult<()>;
}

/// Operations the admin service needs from a storage engine
pub trait Engine: Send + Sync {
    /// Open a new append context
    fn appender(&self) -> Box<dyn Appender>;

    /// Write a consistent copy of the engine state into `dir`.
    /// `with_head` controls whether the in-memory head block is included.
    fn snapshot(&self, dir: &Path, with_head: bool) -> TsdbResult<()>;

    /// Physically remove data covered by deletion markers
    fn clean_tombstones(&self) -> TsdbResult<()>;

    /// Mark samples in `[mint, maxt]` of every series accepted by all
    /// `matchers` as deleted
    fn delete(&self, mint: i64, maxt: i64, matchers: &[Matcher]) -> TsdbResult<()>;

    /// Root directory of the engine's on-disk data
    fn data_dir(&self) -> PathBuf;
}

/// Lazily-resolved reference to the storage engine.
///
/// The engine is usually opened after the service starts; until then
/// `get()` returns `None` and callers report the engine as not ready.
#[derive(Clone, Default)]
pub struct EngineHandle {
    inner: Arc<RwLock<Option<Arc<dyn Engine>>>>,
}

impl EngineHandle {
    /// Create a handle with no engine attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is already ready
    pub fn ready(engine: Arc<dyn Engine>) -> Self {
        let handle = Self::new();
        handle.set(engine);
        handle
    }

    /// Attach the engine, replacing any previous one
    pub fn set(&self, engine: Arc<dyn Engine>) {
        *self.inner.write() = Some(engine);
    }

    /// Detach the engine
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Current engine, if ready
    pub fn get(&self) -> Option<Arc<dyn Engine>> {
        self.inner.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}
