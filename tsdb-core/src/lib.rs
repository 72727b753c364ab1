//! # TSDB Core Library
//!
//! Shared types and the storage engine interface used by the admin service.
//!
//! ## Features
//!
//! - **Labels**: canonical label sets identifying series
//! - **Matchers**: equality, regex and negated label predicates
//! - **Time ranges**: bound resolution against engine-wide limits
//! - **Engine**: the transactional appender and control interface, plus a
//!   lazily-resolved handle
//! - **Memory engine**: an in-memory implementation for local use and tests

pub mod engine;
pub mod error;
pub mod labels;
pub mod matcher;
pub mod memory;
pub mod sample;
pub mod time;

// Re-export commonly used types
pub use engine::{Appender, Engine, EngineHandle, SeriesRef};
pub use error::{TsdbError, TsdbResult};
pub use labels::{Label, Labels};
pub use matcher::Matcher;
pub use memory::MemoryEngine;
pub use sample::Sample;
pub use time::{TimeRange, MAX_TIME_MS, MIN_TIME_MS};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
