use std::sync::{Arc, Mutex};

use crate::{Result, timing::TimingRecord};

/// Destination of [`TimingRecord`]s.
///
/// Called synchronously on the thread that ran the intercepted operation, once per
/// call. Failures are the sink's own business: errors and panics are swallowed by the
/// interceptor and never reach the caller of the operation.
pub trait TimingSink: Send + Sync + 'static {
    fn record(&self, record: &TimingRecord) -> Result<()>;
}

impl<S: TimingSink> TimingSink for Arc<S> {
    fn record(&self, record: &TimingRecord) -> Result<()> {
        self.as_ref().record(record)
    }
}

/// Logs every record at `INFO` level through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TimingSink for TracingSink {
    fn record(&self, record: &TimingRecord) -> Result<()> {
        let call = record.target;
        let elapsed_ms = record.elapsed_millis();
        if record.interrupted {
            tracing::info!(
                invocation = %record.invocation,
                component = call.component(),
                operation = call.operation(),
                elapsed_ms,
                interrupted = true,
                "Execution of {call} was interrupted after {elapsed_ms}ms"
            );
        } else {
            tracing::info!(
                invocation = %record.invocation,
                component = call.component(),
                operation = call.operation(),
                elapsed_ms,
                "Execution of {call} took {elapsed_ms}ms"
            );
        }
        Ok(())
    }
}

/// Keeps every record in memory.
///
/// Share it with the interceptor through an `Arc` and inspect it afterwards:
///
/// ```ignore
/// let sink = Arc::new(CollectingSink::default());
/// let log_time = Arc::new(LogTimeInterceptor::with_sink(sink.clone()));
/// // ... calls ...
/// assert_eq!(sink.records().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<TimingRecord>>,
}

impl CollectingSink {
    /// Snapshot of the records collected so far, oldest first.
    pub fn records(&self) -> Vec<TimingRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl TimingSink for CollectingSink {
    fn record(&self, record: &TimingRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|e| crate::Error::Sink(e.to_string().into()))?
            .push(record.clone());
        Ok(())
    }
}
