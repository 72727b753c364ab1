//! In-memory storage engine
//!
//! Keeps every series in a single head block guarded by one lock. Appenders
//! buffer samples privately and publish them on commit. Deletions are
//! recorded as tombstones and only purged by `clean_tombstones`.

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::engine::{Appender, Engine, SeriesRef};
use crate::error::{TsdbError, TsdbResult};
use crate::labels::Labels;
use crate::matcher::{matches_all, Matcher};
use crate::sample::Sample;
use crate::time::TimeRange;

/// One series held in memory
#[derive(Debug)]
struct MemSeries {
    labels: Labels,
    /// Committed samples, strictly increasing by timestamp
    samples: Vec<Sample>,
    tombstones: Vec<TimeRange>,
}

impl MemSeries {
    fn new(labels: Labels) -> Self {
        Self {
            labels,
            samples: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    fn is_deleted(&self, timestamp: i64) -> bool {
        self.tombstones.iter().any(|t| t.contains(timestamp))
    }

    fn visible_samples(&self) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| !self.is_deleted(s.timestamp))
            .copied()
            .collect()
    }

    fn last(&self) -> Option<Sample> {
        self.samples.last().copied()
    }
}

#[derive(Debug)]
struct MemState {
    series: HashMap<u64, MemSeries>,
    by_labels: HashMap<Labels, u64>,
    next_ref: u64,
}

impl Default for MemState {
    fn default() -> Self {
        Self {
            series: HashMap::new(),
            by_labels: HashMap::new(),
            // Refs start at 1 so a zero id is never handed out
            next_ref: 1,
        }
    }
}

impl MemState {
    fn get_or_create(&mut self, labels: &Labels) -> u64 {
        if let Some(id) = self.by_labels.get(labels) {
            return *id;
        }
        let id = self.next_ref;
        self.next_ref += 1;
        self.series.insert(id, MemSeries::new(labels.clone()));
        self.by_labels.insert(labels.clone(), id);
        trace!("Created series {} for {}", id, labels);
        id
    }
}

/// A series as seen by readers: labels plus non-deleted samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub labels: Labels,
    pub samples: Vec<Sample>,
}

/// Counters describing the engine contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub series: usize,
    pub samples: usize,
    pub tombstones: usize,
}

#[derive(Serialize)]
struct SnapshotMeta {
    created: String,
    with_head: bool,
    stats: MemoryStats,
}

/// In-memory engine with a data directory used for snapshots
pub struct MemoryEngine {
    dir: PathBuf,
    state: Arc<RwLock<MemState>>,
}

impl MemoryEngine {
    /// Open an engine rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> TsdbResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Opened in-memory engine at {}", dir.display());

        Ok(Self {
            dir,
            state: Arc::new(RwLock::new(MemState::default())),
        })
    }

    /// Return series accepted by all matchers, with deleted samples hidden.
    /// Series without visible samples are skipped.
    pub fn select(&self, matchers: &[Matcher]) -> Vec<SeriesData> {
        let state = self.state.read();
        let mut result: Vec<SeriesData> = state
            .series
            .values()
            .filter(|s| matches_all(matchers, &s.labels))
            .map(|s| SeriesData {
                labels: s.labels.clone(),
                samples: s.visible_samples(),
            })
            .filter(|s| !s.samples.is_empty())
            .collect();
        result.sort_by(|a, b| a.labels.to_string().cmp(&b.labels.to_string()));
        result
    }

    pub fn stats(&self) -> MemoryStats {
        let state = self.state.read();
        MemoryStats {
            series: state.series.len(),
            samples: state.series.values().map(|s| s.samples.len()).sum(),
            tombstones: state.series.values().map(|s| s.tombstones.len()).sum(),
        }
    }
}

impl Engine for MemoryEngine {
    fn appender(&self) -> Box<dyn Appender> {
        Box::new(MemoryAppender {
            state: self.state.clone(),
            pending: Vec::new(),
            pending_last: HashMap::new(),
        })
    }

    fn snapshot(&self, dir: &Path, with_head: bool) -> TsdbResult<()> {
        fs::create_dir_all(dir)?;

        let meta = SnapshotMeta {
            created: Utc::now().to_rfc3339(),
            with_head,
            stats: self.stats(),
        };
        fs::write(dir.join("meta.json"), serde_json::to_vec_pretty(&meta)?)?;

        // Everything lives in the head block, so without it only metadata is written
        if with_head {
            let series = self.select(&[]);
            fs::write(dir.join("head.json"), serde_json::to_vec(&series)?)?;
        }

        info!(
            "Wrote snapshot to {} (with_head={})",
            dir.display(),
            with_head
        );
        Ok(())
    }

    fn clean_tombstones(&self) -> TsdbResult<()> {
        let mut state = self.state.write();
        let mut purged = 0usize;
        // Only series emptied here are dropped; an appender may hold a ref
        // to a series that has no committed samples yet
        let mut empty: Vec<u64> = Vec::new();

        for (id, series) in state.series.iter_mut() {
            if series.tombstones.is_empty() {
                continue;
            }
            let before = series.samples.len();
            let tombstones = std::mem::take(&mut series.tombstones);
            series
                .samples
                .retain(|s| !tombstones.iter().any(|t| t.contains(s.timestamp)));
            purged += before - series.samples.len();

            if before > 0 && series.samples.is_empty() {
                empty.push(*id);
            }
        }

        for id in &empty {
            if let Some(series) = state.series.remove(id) {
                state.by_labels.remove(&series.labels);
            }
        }

        info!(
            "Cleaned tombstones: purged {} samples, dropped {} empty series",
            purged,
            empty.len()
        );
        Ok(())
    }

    fn delete(&self, mint: i64, maxt: i64, matchers: &[Matcher]) -> TsdbResult<()> {
        let range = TimeRange::from_millis(Some(mint), Some(maxt))?;
        let mut state = self.state.write();
        let mut marked = 0usize;

        for series in state.series.values_mut() {
            if matches_all(matchers, &series.labels) {
                series.tombstones.push(range);
                marked += 1;
            }
        }

        debug!(
            "Marked {} series deleted in [{}, {}]",
            marked, range.min, range.max
        );
        Ok(())
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.clone()
    }
}

/// Appender buffering samples until commit
struct MemoryAppender {
    state: Arc<RwLock<MemState>>,
    pending: Vec<(u64, Sample)>,
    /// Newest pending sample per series, for ordering checks
    pending_last: HashMap<u64, Sample>,
}

impl MemoryAppender {
    fn check_order(last: Option<Sample>, sample: Sample) -> TsdbResult<bool> {
        match last {
            Some(prev) if sample.timestamp < prev.timestamp => Err(TsdbError::OutOfOrder),
            Some(prev) if sample.timestamp == prev.timestamp => {
                if prev.value.to_bits() == sample.value.to_bits() {
                    // Exact resend of an existing sample
                    Ok(false)
                } else {
                    Err(TsdbError::DuplicateSample)
                }
            }
            _ => Ok(true),
        }
    }

    fn append(&mut self, id: u64, committed_last: Option<Sample>, sample: Sample) -> TsdbResult<()> {
        let last = match (committed_last, self.pending_last.get(&id).copied()) {
            (Some(c), Some(p)) if c.timestamp > p.timestamp => Some(c),
            (_, Some(p)) => Some(p),
            (c, None) => c,
        };
        if Self::check_order(last, sample)? {
            self.pending.push((id, sample));
            self.pending_last.insert(id, sample);
        }
        Ok(())
    }
}

impl Appender for MemoryAppender {
    fn add(&mut self, labels: &Labels, timestamp: i64, value: f64) -> TsdbResult<SeriesRef> {
        if labels.is_empty() {
            return Err(TsdbError::invalid_labels("empty label set"));
        }
        if !labels.is_canonical() {
            return Err(TsdbError::invalid_labels("labels are not sorted by name"));
        }
        if labels.has_duplicate_names() {
            return Err(TsdbError::invalid_labels(format!(
                "duplicate label name in {}",
                labels
            )));
        }

        let (id, committed_last) = {
            let mut state = self.state.write();
            let id = state.get_or_create(labels);
            (id, state.series.get(&id).and_then(MemSeries::last))
        };

        self.append(id, committed_last, Sample::new(timestamp, value))?;
        Ok(SeriesRef::new(id))
    }

    fn add_fast(&mut self, series: SeriesRef, timestamp: i64, value: f64) -> TsdbResult<()> {
        let committed_last = {
            let state = self.state.read();
            match state.series.get(&series.id()) {
                Some(s) => s.last(),
                None => return Err(TsdbError::UnknownSeriesRef(series.id())),
            }
        };

        self.append(series.id(), committed_last, Sample::new(timestamp, value))
    }

    fn commit(&mut self) -> TsdbResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();

        // Re-check against committed data first: another appender may have
        // published newer samples, or the series may be gone. Nothing is
        // applied unless every pending sample still fits.
        let mut last: HashMap<u64, Option<Sample>> = HashMap::new();
        let mut accepted: Vec<usize> = Vec::with_capacity(self.pending.len());
        for (i, (id, sample)) in self.pending.iter().enumerate() {
            let prev = match last.get(id) {
                Some(prev) => *prev,
                None => match state.series.get(id) {
                    Some(series) => series.last(),
                    None => return Err(TsdbError::UnknownSeriesRef(*id)),
                },
            };
            if Self::check_order(prev, *sample)? {
                accepted.push(i);
                last.insert(*id, Some(*sample));
            } else {
                last.insert(*id, prev);
            }
        }

        for i in &accepted {
            let (id, sample) = self.pending[*i];
            if let Some(series) = state.series.get_mut(&id) {
                series.samples.push(sample);
            }
        }
        self.pending.clear();
        self.pending_last.clear();

        trace!("Committed {} samples", accepted.len());
        Ok(())
    }

    fn rollback(&mut self) -> TsdbResult<()> {
        trace!("Rolled back {} samples", self.pending.len());
        self.pending.clear();
        self.pending_last.clear();
        Ok(())
    }
}
