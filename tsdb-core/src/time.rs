//! Time range resolution for engine-wide operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TsdbError, TsdbResult};

/// Smallest timestamp the engine can represent, in milliseconds
pub const MIN_TIME_MS: i64 = i64::MIN;

/// Largest timestamp the engine can represent, in milliseconds
pub const MAX_TIME_MS: i64 = i64::MAX;

/// Closed millisecond interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

impl TimeRange {
    /// Range covering every representable timestamp
    pub const ALL: TimeRange = TimeRange {
        min: MIN_TIME_MS,
        max: MAX_TIME_MS,
    };

    /// Resolve optional bounds, defaulting a missing endpoint to the engine's
    /// representable minimum or maximum.
    pub fn resolve(min: Option<DateTime<Utc>>, max: Option<DateTime<Utc>>) -> TsdbResult<Self> {
        Self::from_millis(
            min.map(|t| t.timestamp_millis()),
            max.map(|t| t.timestamp_millis()),
        )
    }

    /// Same as [`TimeRange::resolve`] for raw millisecond bounds
    pub fn from_millis(min: Option<i64>, max: Option<i64>) -> TsdbResult<Self> {
        let min = min.unwrap_or(MIN_TIME_MS);
        let max = max.unwrap_or(MAX_TIME_MS);

        if min > max {
            return Err(TsdbError::time_range(
                "min time must be before or equal to max time",
            ));
        }

        Ok(Self { min, max })
    }

    /// Check if a timestamp falls within this range (both ends inclusive)
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.min && timestamp <= self.max
    }
}
