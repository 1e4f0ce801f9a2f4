use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::time::Instant;

use crate::{
    InvocationId, Target,
    timing::{TimingRecord, TimingSink},
};

/// Measures one call and reports it to a sink exactly once.
///
/// If the stopwatch is dropped without [`stop`](Self::stop) (the call panicked, or the
/// future running it was dropped) the partial duration is reported as interrupted.
pub(crate) struct Stopwatch<'a, S: TimingSink> {
    invocation: InvocationId,
    target: Target,
    started: Instant,
    sink: &'a S,
    reported: bool,
}

impl<'a, S: TimingSink> Stopwatch<'a, S> {
    pub fn start(invocation: InvocationId, target: Target, sink: &'a S) -> Self {
        Self {
            invocation,
            target,
            started: Instant::now(),
            sink,
            reported: false,
        }
    }

    pub fn stop(mut self) {
        self.report(false);
    }

    fn report(&mut self, interrupted: bool) {
        if self.reported {
            return;
        }
        self.reported = true;

        let record = TimingRecord {
            invocation: self.invocation,
            target: self.target,
            elapsed: Instant::now().saturating_duration_since(self.started),
            interrupted,
        };

        match catch_unwind(AssertUnwindSafe(|| self.sink.record(&record))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(operation = %self.target, error = %e, "timing sink failed");
            }
            Err(_) => {
                tracing::debug!(operation = %self.target, "timing sink panicked");
            }
        }
    }
}

impl<S: TimingSink> Drop for Stopwatch<'_, S> {
    fn drop(&mut self) {
        self.report(true);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Error, Result, timing::CollectingSink};

    const TARGET: Target = Target::new("TodoService", "create");

    struct FailingSink;
    impl TimingSink for FailingSink {
        fn record(&self, _record: &TimingRecord) -> Result<()> {
            Err(Error::Sink("disk full".into()))
        }
    }

    struct PanickingSink;
    impl TimingSink for PanickingSink {
        fn record(&self, _record: &TimingRecord) -> Result<()> {
            panic!("sink exploded");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_elapsed_time_once() {
        let sink = CollectingSink::default();
        let watch = Stopwatch::start(7, TARGET, &sink);
        tokio::time::sleep(Duration::from_millis(5)).await;
        watch.stop();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].invocation, 7);
        assert_eq!(records[0].target, TARGET);
        assert_eq!(records[0].elapsed_millis(), 5);
        assert!(!records[0].interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_elapsed_is_still_reported() {
        let sink = CollectingSink::default();
        Stopwatch::start(1, TARGET, &sink).stop();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].elapsed, Duration::ZERO);
    }

    #[test]
    fn dropping_reports_interrupted() {
        let sink = CollectingSink::default();
        drop(Stopwatch::start(1, TARGET, &sink));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].interrupted);
    }

    #[test]
    fn sink_failures_are_swallowed() {
        Stopwatch::start(1, TARGET, &FailingSink).stop();
        Stopwatch::start(2, TARGET, &PanickingSink).stop();
    }
}
