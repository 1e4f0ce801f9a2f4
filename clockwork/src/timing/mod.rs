//! Execution-time instrumentation.
//!
//! [`LogTimeInterceptor`] is the interceptor behind the [`LogTime`](crate::LogTime)
//! marker. It measures each call on the monotonic clock and hands a [`TimingRecord`] to
//! a [`TimingSink`].
//!
//! # Available Sinks
//!
//! - [`TracingSink`] - Logs records via the `tracing` crate (default)
//! - [`CollectingSink`] - Keeps records in memory, mostly for tests
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use clockwork::{LogTime, Registry, timing::LogTimeInterceptor};
//!
//! let log_time = Arc::new(LogTimeInterceptor::new());
//! let registry = Registry::builder()
//!     .bind::<LogTime>(log_time.clone())?
//!     .bind_async::<LogTime>(log_time)?
//!     .build()?;
//! ```

mod log_time;
mod record;
mod sink;
mod stopwatch;

pub use log_time::LogTimeInterceptor;
pub use record::TimingRecord;
pub use sink::{CollectingSink, TimingSink, TracingSink};
pub(crate) use stopwatch::Stopwatch;
