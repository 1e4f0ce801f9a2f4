//! Clockwork - declarative call interception
//!
//! Attach a marker to a component (or to a single operation) and every call to it is
//! routed through the interceptors bound to that marker, without the business code
//! knowing about it. The crate ships one marker, [`LogTime`], whose interceptor measures
//! and logs how long each call took.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clockwork::{Dispatcher, Intercepted, LogTime, LogTimeInterceptor, Registry, intercept};
//!
//! #[derive(Intercepted)]
//! struct Greeter {
//!     dispatcher: Dispatcher,
//! }
//!
//! #[intercept(LogTime)]
//! impl Greeter {
//!     fn greet(&self, name: &str) -> String {
//!         format!("Hello, {name}!")
//!     }
//! }
//!
//! let log_time = Arc::new(LogTimeInterceptor::new());
//! let registry = Registry::builder()
//!     .bind::<LogTime>(log_time.clone())?
//!     .bind_async::<LogTime>(log_time)?
//!     .declare::<Greeter>()
//!     .build()?;
//!
//! let greeter = Greeter { dispatcher: Dispatcher::new(registry) };
//! greeter.greet("World"); // logs "Execution of Greeter.greet took 0ms"
//! ```
//!
//! Marked operations may return any type. What the caller gets when the interceptor
//! chain fails (or never lets the operation run) depends on that type; see [`outcome`].

// Generated code refers to `::clockwork`, which has to resolve inside this crate too.
extern crate self as clockwork;

mod dispatcher;
mod error;
mod interceptor;
mod invocation;
mod marker;
mod registry;
mod target;

pub mod outcome;
pub mod timing;

pub use dispatcher::{Dispatcher, Intercepted};
pub use error::Error;
pub use interceptor::{AsyncInterceptor, Interceptor};
pub use invocation::{AsyncInvocation, Invocation};
pub use marker::{LogTime, Marker, MarkerKey};
pub use registry::{Declared, Registry, RegistryBuilder};
pub use target::{Declaration, Flavor, Parameter, Target};
pub use timing::{LogTimeInterceptor, TimingRecord, TimingSink, TracingSink};

#[cfg(feature = "macros")]
pub use clockwork_macros::{Intercepted, Marker, intercept};

pub type Result<T = ()> = std::result::Result<T, Error>;
pub type InvocationId = u128;
