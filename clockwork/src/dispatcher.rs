use std::{future::Future, sync::Arc};

use crate::{
    AsyncInterceptor, AsyncInvocation, Declaration, Error, Interceptor, Invocation, InvocationId,
    Registry, Result, Target,
    invocation::{AsyncNext, Next, next_id},
};

/// Components whose marked operations are routed through a [`Dispatcher`].
///
/// Usually derived: `#[derive(Intercepted)]` picks the field marked `#[dispatcher]`,
/// or the field named `dispatcher`.
pub trait Intercepted {
    fn dispatcher(&self) -> &Dispatcher;
}

/// Runs marked operations through the interceptors bound in a [`Registry`].
///
/// Cheap to clone; all clones share the same registry. Methods generated by
/// `#[intercept]` call [`dispatch`](Self::dispatch) or
/// [`dispatch_async`](Self::dispatch_async) with the original body as the operation,
/// and turn a chain failure into their own return type as described in
/// [`outcome`](crate::outcome).
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run a blocking operation through its interceptor chain.
    ///
    /// The first marker of the declaration is the outermost interceptor, the operation
    /// itself the innermost link. Returns exactly what the operation returned, or the
    /// chain failure: an unbound marker, an interceptor's `Err`, or
    /// [`Error::NotProceeded`] when no interceptor let the operation run. An
    /// interceptor's `Err` wins over a value the operation already produced.
    pub fn dispatch<R, F>(&self, declaration: &'static Declaration, operation: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        let chain = self.registry.chain(declaration).inspect_err(|e| {
            tracing::error!(operation = %declaration.target, error = %e, "can't dispatch");
        })?;

        let mut slot = None;
        let status = {
            let terminal: Next<'_> = Box::new(|| {
                slot = Some(operation());
                Ok(())
            });
            link(&chain, next_id(), declaration, terminal)()
        };
        settle(declaration.target, status, slot)
    }

    /// Run an async operation through its interceptor chain.
    ///
    /// The operation future is not polled before the innermost interceptor proceeds.
    /// Failures are reported as in [`dispatch`](Self::dispatch).
    pub async fn dispatch_async<R, F>(
        &self,
        declaration: &'static Declaration,
        operation: F,
    ) -> Result<R>
    where
        R: Send,
        F: Future<Output = R> + Send,
    {
        let chain = self.registry.async_chain(declaration).inspect_err(|e| {
            tracing::error!(operation = %declaration.target, error = %e, "can't dispatch");
        })?;

        let mut slot = None;
        let status = {
            let terminal: AsyncNext<'_> = Box::pin(async {
                slot = Some(operation.await);
                Ok(())
            });
            link_async(&chain, next_id(), declaration, terminal).await
        };
        settle(declaration.target, status, slot)
    }
}

fn link<'a>(
    chain: &'a [Arc<dyn Interceptor>],
    id: InvocationId,
    declaration: &'static Declaration,
    terminal: Next<'a>,
) -> Next<'a> {
    match chain.split_first() {
        None => terminal,
        Some((head, rest)) => {
            let next = link(rest, id, declaration, terminal);
            Box::new(move || {
                let mut invocation =
                    Invocation::new(id, declaration.target, declaration.parameters, next);
                head.intercept(&mut invocation)
            })
        }
    }
}

fn link_async<'a>(
    chain: &'a [Arc<dyn AsyncInterceptor>],
    id: InvocationId,
    declaration: &'static Declaration,
    terminal: AsyncNext<'a>,
) -> AsyncNext<'a> {
    match chain.split_first() {
        None => terminal,
        Some((head, rest)) => {
            let next = link_async(rest, id, declaration, terminal);
            Box::pin(async move {
                let mut invocation =
                    AsyncInvocation::new(id, declaration.target, declaration.parameters, next);
                head.intercept(&mut invocation).await
            })
        }
    }
}

fn settle<R>(target: Target, status: Result<()>, slot: Option<R>) -> Result<R> {
    match (status, slot) {
        (Ok(()), Some(value)) => Ok(value),
        (Ok(()), None) => {
            tracing::debug!(operation = %target, "operation suppressed by interceptor");
            Err(Error::NotProceeded(target))
        }
        (Err(e), _) => {
            tracing::warn!(operation = %target, error = %e, "interceptor failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{Flavor, Marker, MarkerKey, Parameter};

    struct First;
    impl Marker for First {
        const NAME: &'static str = "First";
    }

    struct Second;
    impl Marker for Second {
        const NAME: &'static str = "Second";
    }

    static ADD: Declaration = Declaration {
        target: Target::new("Calculator", "add"),
        markers: &[MarkerKey::of::<First>(), MarkerKey::of::<Second>()],
        parameters: &[Parameter::new("a", "i32"), Parameter::new("b", "i32")],
        flavor: Flavor::Blocking,
    };

    static SQRT: Declaration = Declaration {
        target: Target::new("Calculator", "sqrt"),
        markers: &[MarkerKey::of::<First>()],
        parameters: &[Parameter::new("x", "f64")],
        flavor: Flavor::Async,
    };

    /// Records the order in which interceptors run.
    struct Journal {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Journal {
        fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<()> {
            self.log.lock().unwrap().push(format!("{} before", self.name));
            let result = invocation.proceed();
            self.log.lock().unwrap().push(format!("{} after", self.name));
            result
        }
    }

    #[async_trait::async_trait]
    impl AsyncInterceptor for Journal {
        async fn intercept(&self, invocation: &mut AsyncInvocation<'_>) -> Result<()> {
            self.log.lock().unwrap().push(format!("{} before", self.name));
            let result = invocation.proceed().await;
            self.log.lock().unwrap().push(format!("{} after", self.name));
            result
        }
    }

    struct Skip;
    impl Interceptor for Skip {
        fn intercept(&self, _invocation: &mut Invocation<'_>) -> Result<()> {
            Ok(())
        }
    }

    struct Veto;
    impl Interceptor for Veto {
        fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<()> {
            invocation.proceed()?;
            Err(Error::External("vetoed".into()))
        }
    }

    fn journal(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Journal> {
        Arc::new(Journal {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn first_marker_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::builder()
            .bind::<First>(journal("first", &log))
            .unwrap()
            .bind::<Second>(journal("second", &log))
            .unwrap()
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let inner_log = log.clone();
        let sum = dispatcher.dispatch(&ADD, || {
            inner_log.lock().unwrap().push("operation".into());
            2 + 3
        });

        assert_eq!(sum.unwrap(), 5);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first before",
                "second before",
                "operation",
                "second after",
                "first after"
            ]
        );
    }

    #[test]
    fn not_proceeding_suppresses_the_operation() {
        let registry = Registry::builder()
            .bind::<First>(Arc::new(Skip))
            .unwrap()
            .bind::<Second>(Arc::new(Skip))
            .unwrap()
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let mut ran = false;
        let result = dispatcher.dispatch(&ADD, || {
            ran = true;
            5
        });

        assert!(!ran);
        assert!(matches!(result, Err(Error::NotProceeded(t)) if t == ADD.target));
    }

    #[test]
    fn interceptor_error_replaces_the_result() {
        let registry = Registry::builder()
            .bind::<First>(Arc::new(Veto))
            .unwrap()
            .bind::<Second>(Arc::new(Veto))
            .unwrap()
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let mut ran = false;
        let result = dispatcher.dispatch(&ADD, || ran = true);
        assert!(ran);
        assert!(matches!(result, Err(Error::External(msg)) if &*msg == "vetoed"));
    }

    #[test]
    fn unbound_marker_at_call_time_is_reported() {
        let dispatcher = Dispatcher::new(Registry::builder().build().unwrap());

        let mut ran = false;
        let result = dispatcher.dispatch(&ADD, || ran = true);
        assert!(!ran);
        assert!(matches!(
            result,
            Err(Error::UnboundMarker { marker: "First", .. })
        ));
    }

    #[tokio::test]
    async fn async_dispatch_wraps_the_future() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::builder()
            .bind_async::<First>(journal("first", &log))
            .unwrap()
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let inner_log = log.clone();
        let root = dispatcher
            .dispatch_async(&SQRT, async move {
                tokio::task::yield_now().await;
                inner_log.lock().unwrap().push("operation".into());
                16f64.sqrt()
            })
            .await;

        assert_eq!(root.unwrap(), 4.0);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first before", "operation", "first after"]
        );
    }
}
