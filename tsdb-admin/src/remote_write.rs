//! Streaming remote-write ingestion
//!
//! One call to [`RemoteWriter::write_stream`] is one ingestion pass: a single
//! appender is opened for the whole stream and checkpointed every
//! `commit_chunk_size` series. The pass runs on a blocking task. Individual
//! sample failures are counted in the metrics and never abort the pass. A
//! failed commit does: the appender is rolled back, dropped, and the pass ends
//! with an internal error.

use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, trace};
use tsdb_core::{Appender, Engine, Labels, SeriesRef};

use crate::api::{TimeSeries, WriteRequest};
use crate::error::{AdminError, AdminResult};
use crate::metrics::RemoteWriteMetrics;

/// Default number of series between checkpoint commits
pub const DEFAULT_COMMIT_CHUNK_SIZE: usize = 500;

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub requests: u64,
    pub series: u64,
    pub samples_appended: u64,
    pub samples_failed: u64,
    pub commits: u64,
}

/// Appends remote-write streams into the engine
#[derive(Debug, Clone)]
pub struct RemoteWriter {
    commit_chunk_size: usize,
    metrics: RemoteWriteMetrics,
}

impl RemoteWriter {
    pub fn new(commit_chunk_size: usize, metrics: RemoteWriteMetrics) -> Self {
        Self {
            commit_chunk_size: commit_chunk_size.max(1),
            metrics,
        }
    }

    pub fn commit_chunk_size(&self) -> usize {
        self.commit_chunk_size
    }

    /// Consume `stream` until it ends, appending every series it carries.
    ///
    /// Engine calls block, so the pass runs on a blocking task and is fed one
    /// request at a time. Requests are processed strictly in order. A stream
    /// error stops the pass, but the samples appended so far are still
    /// committed before the error is returned. Dropping the returned future
    /// does the same.
    pub async fn write_stream<S>(&self, engine: Arc<dyn Engine>, mut stream: S) -> AdminResult<WriteSummary>
    where
        S: Stream<Item = AdminResult<WriteRequest>> + Unpin,
    {
        let (tx, rx) = mpsc::channel::<WriteRequest>(1);
        let commit_chunk_size = self.commit_chunk_size;
        let metrics = self.metrics.clone();

        let worker = tokio::task::spawn_blocking(move || {
            let pass = WritePass::new(engine.appender(), commit_chunk_size, &metrics);
            pass.run(rx)
        });

        let mut read_error = None;
        while let Some(next) = stream.next().await {
            match next {
                Ok(request) => {
                    // The pass stopped early; its result explains why
                    if tx.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Read from remote write stream failed: {}", e);
                    read_error = Some(e);
                    break;
                }
            }
        }
        drop(tx);

        let result = worker.await.map_err(|e| {
            error!("Remote write task failed: {}", e);
            AdminError::internal(format!("remote write task failed: {}", e))
        })?;

        match read_error {
            // Keep what was appended; the read error takes precedence
            Some(e) => {
                if let Err(commit_err) = result {
                    debug!("Final commit after stream error failed: {}", commit_err);
                }
                Err(e)
            }
            None => result,
        }
    }
}

/// State of one ingestion pass.
///
/// Holds the pass's appender until `finish`. If the pass is dropped while
/// the appender is still open, pending samples are committed.
struct WritePass<'a> {
    appender: Option<Box<dyn Appender>>,
    commit_chunk_size: usize,
    metrics: &'a RemoteWriteMetrics,
    /// Series seen so far across all requests of the pass
    series_index: usize,
    summary: WriteSummary,
}

impl<'a> WritePass<'a> {
    fn new(appender: Box<dyn Appender>, commit_chunk_size: usize, metrics: &'a RemoteWriteMetrics) -> Self {
        Self {
            appender: Some(appender),
            commit_chunk_size,
            metrics,
            series_index: 0,
            summary: WriteSummary::default(),
        }
    }

    /// Append every request received until the sender goes away, then
    /// make the final commit.
    fn run(mut self, mut requests: mpsc::Receiver<WriteRequest>) -> AdminResult<WriteSummary> {
        while let Some(request) = requests.blocking_recv() {
            self.write_request(&request)?;
        }
        self.finish()
    }

    fn write_request(&mut self, request: &WriteRequest) -> AdminResult<()> {
        self.summary.requests += 1;

        for series in &request.timeseries {
            if self.series_index % self.commit_chunk_size == 0 {
                self.commit()?;
            }
            self.series_index += 1;
            self.write_series(series)?;
        }

        Ok(())
    }

    fn write_series(&mut self, series: &TimeSeries) -> AdminResult<()> {
        let appender = self.appender.as_mut().ok_or_else(closed)?;
        let labels = Labels::new(series.labels.clone()).canonical();
        let mut series_ref: Option<SeriesRef> = None;

        for sample in &series.samples {
            let result = match series_ref {
                Some(r) => appender.add_fast(r, sample.timestamp, sample.value),
                // Until an add succeeds there is no ref; retry the label path
                None => appender
                    .add(&labels, sample.timestamp, sample.value)
                    .map(|r| series_ref = Some(r)),
            };

            match result {
                Ok(()) => {
                    self.metrics.samples_appended.inc();
                    self.summary.samples_appended += 1;
                }
                Err(e) => {
                    trace!("Failed to append sample for {}: {}", labels, e);
                    self.metrics.record_append_failure(e.reason());
                    self.summary.samples_failed += 1;
                }
            }
        }

        self.summary.series += 1;
        Ok(())
    }

    /// Commit pending samples. On failure the appender is rolled back and
    /// abandoned, so the pass cannot append through it again.
    fn commit(&mut self) -> AdminResult<()> {
        let appender = self.appender.as_mut().ok_or_else(closed)?;

        match appender.commit() {
            Ok(()) => {
                self.metrics.commits.inc();
                self.summary.commits += 1;
                Ok(())
            }
            Err(e) => {
                self.metrics.commit_failures.inc();
                error!("Failure trying to commit write to store: {}", e);

                self.metrics.rollbacks.inc();
                if let Err(rollback_err) = appender.rollback() {
                    error!("Failure trying to rollback write to store: {}", rollback_err);
                }
                self.appender = None;

                Err(AdminError::engine("commit", e))
            }
        }
    }

    fn finish(mut self) -> AdminResult<WriteSummary> {
        self.commit()?;
        self.appender = None;

        debug!(
            "Remote write pass done: {} requests, {} series, {} samples appended, {} failed, {} commits",
            self.summary.requests,
            self.summary.series,
            self.summary.samples_appended,
            self.summary.samples_failed,
            self.summary.commits
        );
        Ok(self.summary)
    }
}

impl Drop for WritePass<'_> {
    fn drop(&mut self) {
        if self.appender.is_some() {
            debug!("Remote write pass dropped with an open appender, committing");
            if let Err(e) = self.commit() {
                debug!("Commit on drop failed: {}", e);
            }
        }
    }
}

fn closed() -> AdminError {
    AdminError::internal("remote write transaction already closed")
}
