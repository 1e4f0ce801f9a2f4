//! Todo CRUD service over HTTP.
//!
//! Both the HTTP resource and the service are marked with [`LogTime`], so every request
//! logs how long the handler took, and how much of that went to the service call.

use std::sync::Arc;

use axum::Router;
use clockwork::{Dispatcher, LogTime, LogTimeInterceptor, Registry, TimingSink};

mod config;
mod domain;
mod error;
mod repository;
mod resource;
mod service;

pub use config::Config;
pub use domain::{Todo, TodoBase};
pub use error::{ApiError, ConfigError, TodoError};
pub use repository::{MemoryTodoRepository, TodoRepository};
pub use resource::{TodoResource, router};
pub use service::TodoService;

/// Builds the interception registry: `LogTime` reports to `sink`, and every timed
/// component is checked for unbound markers.
pub fn wire<S: TimingSink>(sink: S) -> clockwork::Result<Dispatcher> {
    let log_time = Arc::new(LogTimeInterceptor::with_sink(sink));
    let registry = Registry::builder()
        .bind::<LogTime>(log_time.clone())?
        .bind_async::<LogTime>(log_time)?
        .declare::<TodoService>()
        .declare::<TodoResource>()
        .build()?;

    for declaration in registry.declarations() {
        tracing::debug!(
            component = declaration.target.component(),
            operation = declaration.target.operation(),
            flavor = %declaration.flavor,
            "operation intercepted"
        );
    }

    Ok(Dispatcher::new(registry))
}

/// The complete HTTP application on top of `repository`.
pub fn app(dispatcher: Dispatcher, repository: Arc<dyn TodoRepository>) -> Router {
    let service = Arc::new(TodoService::new(dispatcher.clone(), repository));
    let resource = Arc::new(TodoResource::new(dispatcher, service));
    router(resource)
}
