use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::{Error, InvocationId, Parameter, Result, Target};

pub(crate) type Next<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;
pub(crate) type AsyncNext<'a> = BoxFuture<'a, Result<()>>;

/// One in-flight call to a blocking operation, as seen by an [`Interceptor`](crate::Interceptor).
///
/// Created by the dispatcher for a single call and borrowed by the interceptor for
/// the duration of `intercept`. It can't outlive the call.
pub struct Invocation<'a> {
    id: InvocationId,
    target: Target,
    parameters: &'static [Parameter],
    next: Option<Next<'a>>,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        id: InvocationId,
        target: Target,
        parameters: &'static [Parameter],
        next: Next<'a>,
    ) -> Self {
        Self {
            id,
            target,
            parameters,
            next: Some(next),
        }
    }

    /// Run the next link of the chain: another interceptor or the real operation.
    ///
    /// Can be called once. A second call returns [`Error::ProceedMisuse`] without
    /// running anything.
    pub fn proceed(&mut self) -> Result<()> {
        match self.next.take() {
            Some(next) => next(),
            None => {
                tracing::error!(operation = %self.target, "proceed() called twice");
                Err(Error::ProceedMisuse(self.target))
            }
        }
    }

    /// Whether `proceed` has been called already.
    #[inline]
    pub fn has_proceeded(&self) -> bool {
        self.next.is_none()
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Arguments of the operation, in declaration order.
    #[inline]
    pub fn parameters(&self) -> &'static [Parameter] {
        self.parameters
    }

    /// Unique per call; shared by every interceptor in the chain.
    #[inline]
    pub fn id(&self) -> InvocationId {
        self.id
    }
}

/// One in-flight call to an `async fn` operation, as seen by an
/// [`AsyncInterceptor`](crate::AsyncInterceptor).
pub struct AsyncInvocation<'a> {
    id: InvocationId,
    target: Target,
    parameters: &'static [Parameter],
    next: Option<AsyncNext<'a>>,
}

impl<'a> AsyncInvocation<'a> {
    pub(crate) fn new(
        id: InvocationId,
        target: Target,
        parameters: &'static [Parameter],
        next: AsyncNext<'a>,
    ) -> Self {
        Self {
            id,
            target,
            parameters,
            next: Some(next),
        }
    }

    /// Run the next link of the chain and wait for it to complete.
    ///
    /// Nothing runs until the returned future is awaited. Can be called once; a second
    /// call returns [`Error::ProceedMisuse`].
    pub async fn proceed(&mut self) -> Result<()> {
        match self.next.take() {
            Some(next) => next.await,
            None => {
                tracing::error!(operation = %self.target, "proceed() called twice");
                Err(Error::ProceedMisuse(self.target))
            }
        }
    }

    #[inline]
    pub fn has_proceeded(&self) -> bool {
        self.next.is_none()
    }

    #[inline]
    pub fn target(&self) -> Target {
        self.target
    }

    #[inline]
    pub fn parameters(&self) -> &'static [Parameter] {
        self.parameters
    }

    #[inline]
    pub fn id(&self) -> InvocationId {
        self.id
    }
}

pub(crate) fn next_id() -> InvocationId {
    Uuid::new_v4().as_u128()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const TARGET: Target = Target::new("Counter", "bump");

    #[test]
    fn proceed_runs_continuation_once() {
        let calls = Cell::new(0);
        let mut invocation = Invocation::new(
            next_id(),
            TARGET,
            &[],
            Box::new(|| {
                calls.set(calls.get() + 1);
                Ok(())
            }),
        );

        assert!(!invocation.has_proceeded());
        invocation.proceed().unwrap();
        assert!(invocation.has_proceeded());

        let err = invocation.proceed().unwrap_err();
        assert!(matches!(err, Error::ProceedMisuse(t) if t == TARGET));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn proceed_forwards_chain_errors() {
        let mut invocation = Invocation::new(
            next_id(),
            TARGET,
            &[],
            Box::new(|| Err(Error::NotProceeded(TARGET))),
        );
        assert!(matches!(invocation.proceed(), Err(Error::NotProceeded(_))));
    }

    #[tokio::test]
    async fn async_continuation_is_lazy_and_single_use() {
        let ran = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let r = ran.clone();
        let mut invocation = AsyncInvocation::new(
            next_id(),
            TARGET,
            &[],
            Box::pin(async move {
                r.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            }),
        );

        assert_eq!(ran.load(std::sync::atomic::Ordering::SeqCst), 0);
        invocation.proceed().await.unwrap();
        assert!(matches!(
            invocation.proceed().await,
            Err(Error::ProceedMisuse(_))
        ));
        assert_eq!(ran.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(next_id(), next_id());
    }
}
