//! Shared fixtures for admin service tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::ThreadId;
use tsdb_admin::{
    api::{TimeSeries, WriteRequest},
    AdminMetrics, AdminService, RemoteWriter,
};
use tsdb_core::{
    Appender, Engine, EngineHandle, Label, Labels, Matcher, Sample, SeriesRef, TsdbError,
    TsdbResult,
};

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Appender,
    Add { labels: Labels, timestamp: i64 },
    AddFast { series: SeriesRef, timestamp: i64 },
    Commit,
    Rollback,
    Snapshot { dir: PathBuf, with_head: bool },
    CleanTombstones,
    Delete { mint: i64, maxt: i64, matchers: usize },
    DataDir,
}

/// Failures to inject, by 1-based call number per kind
#[derive(Debug, Default)]
pub struct Faults {
    pub fail_add: HashSet<usize>,
    pub fail_add_fast: HashSet<usize>,
    pub fail_commit: HashSet<usize>,
    pub fail_rollback: bool,
    pub fail_snapshot: bool,
    pub fail_clean_tombstones: bool,
    pub fail_delete: bool,
}

#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
    /// Thread each call ran on, parallel to `calls`
    threads: Vec<ThreadId>,
    refs: HashMap<Labels, u64>,
}

impl Recorder {
    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

/// Call-counting engine with injectable failures
#[derive(Clone)]
pub struct FakeEngine {
    dir: PathBuf,
    recorder: Arc<Mutex<Recorder>>,
    faults: Arc<Mutex<Faults>>,
}

impl FakeEngine {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            recorder: Arc::new(Mutex::new(Recorder::default())),
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    pub fn with_faults(self, faults: Faults) -> Self {
        *self.faults.lock() = faults;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.recorder.lock().calls.clone()
    }

    /// Threads that issued appender calls
    pub fn appender_threads(&self) -> HashSet<ThreadId> {
        let recorder = self.recorder.lock();
        recorder
            .calls
            .iter()
            .zip(&recorder.threads)
            .filter(|(c, _)| {
                matches!(
                    c,
                    Call::Add { .. } | Call::AddFast { .. } | Call::Commit | Call::Rollback
                )
            })
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.recorder.lock().calls.len()
    }

    pub fn adds(&self) -> usize {
        self.recorder.lock().count(|c| matches!(c, Call::Add { .. }))
    }

    pub fn add_fasts(&self) -> usize {
        self.recorder.lock().count(|c| matches!(c, Call::AddFast { .. }))
    }

    pub fn commits(&self) -> usize {
        self.recorder.lock().count(|c| matches!(c, Call::Commit))
    }

    pub fn rollbacks(&self) -> usize {
        self.recorder.lock().count(|c| matches!(c, Call::Rollback))
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle::ready(Arc::new(self.clone()))
    }

    fn record(&self, call: Call) -> usize {
        let mut recorder = self.recorder.lock();
        let kind = std::mem::discriminant(&call);
        recorder.calls.push(call);
        recorder.threads.push(std::thread::current().id());
        recorder
            .calls
            .iter()
            .filter(|c| std::mem::discriminant(*c) == kind)
            .count()
    }
}

impl Engine for FakeEngine {
    fn appender(&self) -> Box<dyn Appender> {
        self.record(Call::Appender);
        Box::new(FakeAppender {
            engine: self.clone(),
        })
    }

    fn snapshot(&self, dir: &Path, with_head: bool) -> TsdbResult<()> {
        self.record(Call::Snapshot {
            dir: dir.to_path_buf(),
            with_head,
        });
        if self.faults.lock().fail_snapshot {
            return Err(TsdbError::Snapshot("disk full".to_string()));
        }
        Ok(())
    }

    fn clean_tombstones(&self) -> TsdbResult<()> {
        self.record(Call::CleanTombstones);
        if self.faults.lock().fail_clean_tombstones {
            return Err(TsdbError::internal("compaction failed"));
        }
        Ok(())
    }

    fn delete(&self, mint: i64, maxt: i64, matchers: &[Matcher]) -> TsdbResult<()> {
        self.record(Call::Delete {
            mint,
            maxt,
            matchers: matchers.len(),
        });
        if self.faults.lock().fail_delete {
            return Err(TsdbError::internal("tombstone write failed"));
        }
        Ok(())
    }

    fn data_dir(&self) -> PathBuf {
        self.record(Call::DataDir);
        self.dir.clone()
    }
}

struct FakeAppender {
    engine: FakeEngine,
}

impl Appender for FakeAppender {
    fn add(&mut self, labels: &Labels, timestamp: i64, _value: f64) -> TsdbResult<SeriesRef> {
        let n = self.engine.record(Call::Add {
            labels: labels.clone(),
            timestamp,
        });
        if self.engine.faults.lock().fail_add.contains(&n) {
            return Err(TsdbError::invalid_labels("rejected"));
        }
        let mut recorder = self.engine.recorder.lock();
        let next = recorder.refs.len() as u64 + 1;
        let id = *recorder.refs.entry(labels.clone()).or_insert(next);
        Ok(SeriesRef::new(id))
    }

    fn add_fast(&mut self, series: SeriesRef, timestamp: i64, _value: f64) -> TsdbResult<()> {
        let n = self.engine.record(Call::AddFast { series, timestamp });
        if self.engine.faults.lock().fail_add_fast.contains(&n) {
            return Err(TsdbError::OutOfOrder);
        }
        Ok(())
    }

    fn commit(&mut self) -> TsdbResult<()> {
        let n = self.engine.record(Call::Commit);
        if self.engine.faults.lock().fail_commit.contains(&n) {
            return Err(TsdbError::internal("commit refused"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> TsdbResult<()> {
        self.engine.record(Call::Rollback);
        if self.engine.faults.lock().fail_rollback {
            return Err(TsdbError::internal("rollback refused"));
        }
        Ok(())
    }
}

/// Enabled admin service over `engine`
pub fn enabled_service(engine: EngineHandle, commit_chunk_size: usize) -> (AdminService, AdminMetrics) {
    let metrics = AdminMetrics::new().unwrap();
    let writer = RemoteWriter::new(commit_chunk_size, metrics.remote_write.clone());
    (AdminService::new(true, engine, writer), metrics)
}

/// A series with one label per pair and samples at the given timestamps
pub fn series(pairs: &[(&str, &str)], timestamps: &[i64]) -> TimeSeries {
    TimeSeries {
        labels: pairs.iter().map(|(n, v)| Label::new(*n, *v)).collect(),
        samples: timestamps
            .iter()
            .map(|t| Sample::new(*t, *t as f64))
            .collect(),
    }
}

/// `count` distinct single-sample series starting at `offset`
pub fn distinct_series(offset: usize, count: usize) -> Vec<TimeSeries> {
    (offset..offset + count)
        .map(|i| series(&[("__name__", "up"), ("instance", &format!("host-{}", i))], &[1000]))
        .collect()
}

pub fn request(timeseries: Vec<TimeSeries>) -> WriteRequest {
    WriteRequest { timeseries }
}
