use async_trait::async_trait;

use crate::{
    AsyncInterceptor, AsyncInvocation, Interceptor, Invocation, Result,
    timing::{Stopwatch, TimingSink, TracingSink},
};

/// Interceptor measuring the execution time of every call it wraps.
///
/// For each call it starts a stopwatch on the monotonic clock, proceeds exactly once,
/// reports a [`TimingRecord`](crate::TimingRecord) to its sink and returns what
/// `proceed` returned. The record is reported whether the operation succeeded or
/// failed; a failing sink never affects the call.
///
/// Implements both [`Interceptor`] and [`AsyncInterceptor`], so one instance can be
/// bound for both flavors of operations.
#[derive(Debug)]
pub struct LogTimeInterceptor<S: TimingSink = TracingSink> {
    sink: S,
}

impl LogTimeInterceptor {
    /// Interceptor logging through [`TracingSink`].
    pub fn new() -> Self {
        Self { sink: TracingSink }
    }
}

impl Default for LogTimeInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimingSink> LogTimeInterceptor<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: TimingSink> Interceptor for LogTimeInterceptor<S> {
    fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<()> {
        let watch = Stopwatch::start(invocation.id(), invocation.target(), &self.sink);
        let result = invocation.proceed();
        watch.stop();
        result
    }
}

#[async_trait]
impl<S: TimingSink> AsyncInterceptor for LogTimeInterceptor<S> {
    async fn intercept(&self, invocation: &mut AsyncInvocation<'_>) -> Result<()> {
        let watch = Stopwatch::start(invocation.id(), invocation.target(), &self.sink);
        let result = invocation.proceed().await;
        watch.stop();
        result
    }
}
