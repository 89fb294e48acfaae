/// Best-effort audit trail of generation calls.
///
/// Every stage invocation produces an [`AuditRecord`]. Delivery is tried
/// once, retried once on failure, then the record is dropped with a
/// warning. A sink can never affect a generation result.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Records kept by [`MemoryAuditLog`] before the oldest is discarded.
pub const DEFAULT_AUDIT_CAPACITY: usize = 50;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
    #[error("audit record rejected: {0}")]
    Rejected(String),
}

/// Which pipeline stage produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idea,
    Acts,
    BlocksOverview,
    RegenerateOverview,
    ExpandOverview,
    BlockDetail,
    ExpandDetail,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Acts => "acts",
            Self::BlocksOverview => "blocks_overview",
            Self::RegenerateOverview => "regenerate_overview",
            Self::ExpandOverview => "expand_overview",
            Self::BlockDetail => "block_detail",
            Self::ExpandDetail => "expand_detail",
        }
    }
}

/// Where generation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// In-process template generators.
    #[default]
    Mock,
    /// A remote backend. Not available in this crate.
    Server,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Server => "server",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub stage: Stage,
    pub mode: GenerationMode,
    pub seed: Option<u32>,
    pub block_index: Option<u8>,
    /// RON rendering of the request, e.g. the compacted form.
    pub input: Option<String>,
    pub response_chars: usize,
    pub latency_ms: u64,
    pub ok: bool,
    pub error: Option<String>,
    pub recorded_at: u64,
}

impl AuditRecord {
    pub fn new(stage: Stage, mode: GenerationMode, recorded_at: u64) -> Self {
        Self {
            stage,
            mode,
            seed: None,
            block_index: None,
            input: None,
            response_chars: 0,
            latency_ms: 0,
            ok: true,
            error: None,
            recorded_at,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_block(mut self, index: u8) -> Self {
        self.block_index = Some(index);
        self
    }

    pub fn with_input(mut self, input: String) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn succeeded(mut self, response_chars: usize) -> Self {
        self.ok = true;
        self.response_chars = response_chars;
        self
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.ok = false;
        self.error = Some(error.to_string());
        self
    }
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Ring buffer of the most recent records.
#[derive(Debug)]
pub struct MemoryAuditLog {
    capacity: usize,
    records: Mutex<VecDeque<AuditRecord>>,
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl MemoryAuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<S> {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}

/// Deliver a record, retrying once. Returns whether it was delivered.
pub fn dispatch_best_effort(sink: &dyn AuditSink, record: &AuditRecord) -> bool {
    let first = match sink.record(record) {
        Ok(()) => return true,
        Err(e) => e,
    };
    tracing::warn!(stage = record.stage.as_str(), "failed to send audit record: {first}");
    match sink.record(record) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(stage = record.stage.as_str(), "retry failed, audit record dropped: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl AuditSink for Flaky {
        fn record(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(AuditError::Unavailable("down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn record(stage: Stage) -> AuditRecord {
        AuditRecord::new(stage, GenerationMode::Mock, 0)
    }

    #[test]
    fn ring_buffer_keeps_most_recent() {
        let log = MemoryAuditLog::with_capacity(3);
        for seed in 0..5 {
            log.record(&record(Stage::Idea).with_seed(seed)).unwrap();
        }
        let seeds: Vec<Option<u32>> = log.snapshot().iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn len_tracks_records() {
        let log = MemoryAuditLog::with_capacity(2);
        assert!(log.is_empty());
        log.record(&record(Stage::Idea)).unwrap();
        assert_eq!(log.len(), 1);
        log.record(&record(Stage::Acts)).unwrap();
        log.record(&record(Stage::BlockDetail)).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn default_capacity_is_fifty() {
        let log = MemoryAuditLog::default();
        for _ in 0..60 {
            log.record(&record(Stage::Acts)).unwrap();
        }
        assert_eq!(log.len(), DEFAULT_AUDIT_CAPACITY);
    }

    #[test]
    fn retries_once() {
        let sink = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        assert!(dispatch_best_effort(&sink, &record(Stage::BlockDetail)));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn drops_after_second_failure() {
        let sink = Flaky {
            failures: 5,
            calls: AtomicUsize::new(0),
        };
        assert!(!dispatch_best_effort(&sink, &record(Stage::BlockDetail)));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_record_carries_error() {
        let r = record(Stage::Idea).failed("boom");
        assert!(!r.ok);
        assert_eq!(r.error.as_deref(), Some("boom"));
        let text = ron::to_string(&r).unwrap();
        assert!(text.contains("idea"));
        assert!(text.contains("mock"));
    }
}
