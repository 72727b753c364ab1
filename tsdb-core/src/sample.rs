//! Timestamped sample values

use serde::{Deserialize, Serialize};

/// A single `(timestamp, value)` observation. Timestamps are milliseconds
/// since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}
