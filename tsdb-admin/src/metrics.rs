//! Metrics for the remote-write pipeline
//!
//! All collectors live in a registry owned by [`AdminMetrics`], which is
//! created once per service and handed to the components that record into it.

use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters recorded by the ingestion pipeline
#[derive(Debug, Clone)]
pub struct RemoteWriteMetrics {
    /// Samples that failed to append, by normalized reason
    pub append_failures: IntCounterVec,
    /// Samples accepted by the appender
    pub samples_appended: IntCounter,
    /// Successful commits, checkpoint and final
    pub commits: IntCounter,
    /// Failed commits
    pub commit_failures: IntCounter,
    /// Rollbacks issued after a failed commit
    pub rollbacks: IntCounter,
}

impl RemoteWriteMetrics {
    /// Create the counters and register them with `registry`
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let append_failures = IntCounterVec::new(
            Opts::new(
                "tsdb_remote_write_append_failures_total",
                "How many samples failed to append to the TSDB from remote write requests",
            ),
            &["reason"],
        )?;
        let samples_appended = IntCounter::new(
            "tsdb_remote_write_samples_appended_total",
            "Total number of samples appended from remote write requests",
        )?;
        let commits = IntCounter::new(
            "tsdb_remote_write_commits_total",
            "Total number of successful remote write commits",
        )?;
        let commit_failures = IntCounter::new(
            "tsdb_remote_write_commit_failures_total",
            "Total number of failed remote write commits",
        )?;
        let rollbacks = IntCounter::new(
            "tsdb_remote_write_rollbacks_total",
            "Total number of rollbacks after a failed commit",
        )?;

        registry.register(Box::new(append_failures.clone()))?;
        registry.register(Box::new(samples_appended.clone()))?;
        registry.register(Box::new(commits.clone()))?;
        registry.register(Box::new(commit_failures.clone()))?;
        registry.register(Box::new(rollbacks.clone()))?;

        Ok(Self {
            append_failures,
            samples_appended,
            commits,
            commit_failures,
            rollbacks,
        })
    }

    /// Record one failed sample
    pub fn record_append_failure(&self, reason: &str) {
        self.append_failures.with_label_values(&[reason]).inc();
    }

    /// Current failure count for a reason
    pub fn append_failure_count(&self, reason: &str) -> u64 {
        self.append_failures.with_label_values(&[reason]).get()
    }
}

/// Metrics owned by one service instance
#[derive(Clone)]
pub struct AdminMetrics {
    registry: Registry,
    pub remote_write: RemoteWriteMetrics,
}

impl AdminMetrics {
    /// Create a fresh registry with all service collectors
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let remote_write = RemoteWriteMetrics::register(&registry)?;
        Ok(Self {
            registry,
            remote_write,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all collectors in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
