use async_trait::async_trait;

use crate::{AsyncInvocation, Invocation, Result};

/// Wraps calls to blocking operations carrying the marker it is bound to.
///
/// An interceptor is shared by every concurrent call, so it must not keep per-call
/// mutable state. Everything call-scoped lives in the [`Invocation`].
///
/// The implementation decides when (and whether) the real operation runs by calling
/// [`Invocation::proceed`]. Whatever the operation returns is handed to the caller by
/// the dispatcher, not by the interceptor, so an interceptor cannot alter it.
/// Returning `Err` replaces the caller's result with the error (see
/// [`outcome`](crate::outcome)).
pub trait Interceptor: Send + Sync + 'static {
    fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<()>;
}

/// Async counterpart of [`Interceptor`], used for `async fn` operations.
///
/// [`AsyncInvocation::proceed`] returns a future that must be awaited before any
/// post-processing runs.
#[async_trait]
pub trait AsyncInterceptor: Send + Sync + 'static {
    async fn intercept(&self, invocation: &mut AsyncInvocation<'_>) -> Result<()>;
}
