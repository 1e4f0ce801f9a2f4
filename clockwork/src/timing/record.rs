use std::time::Duration;

use crate::{InvocationId, Target};

/// How long one call to an intercepted operation took.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimingRecord {
    pub invocation: InvocationId,
    pub target: Target,
    /// Never negative; clock anomalies are reported as zero.
    pub elapsed: Duration,
    /// `true` when the call didn't return normally: it panicked, or its future was
    /// dropped before completion. `elapsed` then covers the part that ran.
    pub interrupted: bool,
}

impl TimingRecord {
    /// Elapsed time in whole milliseconds, truncated.
    #[inline]
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }
}
