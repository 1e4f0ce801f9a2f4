use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    AsyncInterceptor, Declaration, Error, Flavor, Interceptor, Marker, MarkerKey, Result, Target,
};

/// Static table of the marked operations of a component.
///
/// Implemented by `#[intercept]` for the annotated impl block. Pass the component to
/// [`RegistryBuilder::declare`] so its markers are checked at startup.
pub trait Declared {
    const DECLARATIONS: &'static [Declaration];
}

#[derive(Default)]
struct Binding {
    blocking: Option<Arc<dyn Interceptor>>,
    asynchronous: Option<Arc<dyn AsyncInterceptor>>,
}

/// Process-wide mapping from markers to interceptors.
///
/// Built once at startup with [`Registry::builder`] and read-only afterwards, so it can
/// be shared between threads without locking. There is no way to add or remove bindings
/// after [`RegistryBuilder::build`].
pub struct Registry {
    bindings: HashMap<MarkerKey, Binding>,
    declarations: Vec<&'static Declaration>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub(crate) fn resolve(&self, marker: MarkerKey, target: Target) -> Result<Arc<dyn Interceptor>> {
        self.bindings
            .get(&marker)
            .and_then(|b| b.blocking.clone())
            .ok_or(Error::UnboundMarker {
                marker: marker.name(),
                target,
                flavor: Flavor::Blocking,
            })
    }

    pub(crate) fn resolve_async(
        &self,
        marker: MarkerKey,
        target: Target,
    ) -> Result<Arc<dyn AsyncInterceptor>> {
        self.bindings
            .get(&marker)
            .and_then(|b| b.asynchronous.clone())
            .ok_or(Error::UnboundMarker {
                marker: marker.name(),
                target,
                flavor: Flavor::Async,
            })
    }

    /// Interceptors for a blocking operation, outermost first.
    pub(crate) fn chain(&self, declaration: &Declaration) -> Result<Vec<Arc<dyn Interceptor>>> {
        declaration
            .markers
            .iter()
            .map(|m| self.resolve(*m, declaration.target))
            .collect()
    }

    /// Interceptors for an async operation, outermost first.
    pub(crate) fn async_chain(
        &self,
        declaration: &Declaration,
    ) -> Result<Vec<Arc<dyn AsyncInterceptor>>> {
        declaration
            .markers
            .iter()
            .map(|m| self.resolve_async(*m, declaration.target))
            .collect()
    }

    /// Operations validated against this registry at startup.
    pub fn declarations(&self) -> impl Iterator<Item = &'static Declaration> + '_ {
        self.declarations.iter().copied()
    }
}

/// Collects bindings and declarations, then validates them in [`build`](Self::build).
#[derive(Default)]
pub struct RegistryBuilder {
    bindings: HashMap<MarkerKey, Binding>,
    components: HashSet<TypeId>,
    declarations: Vec<&'static Declaration>,
}

impl RegistryBuilder {
    /// Bind the interceptor for blocking operations marked with `M`.
    ///
    /// Binding the same `Arc` twice is a no-op. Binding a different interceptor for a
    /// marker that already has one fails with [`Error::DuplicateBinding`].
    pub fn bind<M: Marker>(mut self, interceptor: Arc<dyn Interceptor>) -> Result<Self> {
        let binding = self.bindings.entry(MarkerKey::of::<M>()).or_default();
        if let Some(existing) = &binding.blocking {
            if !same_instance(existing, &interceptor) {
                return Err(Error::DuplicateBinding {
                    marker: M::NAME,
                    flavor: Flavor::Blocking,
                });
            }
        }
        binding.blocking = Some(interceptor);
        Ok(self)
    }

    /// Bind the interceptor for `async fn` operations marked with `M`.
    pub fn bind_async<M: Marker>(mut self, interceptor: Arc<dyn AsyncInterceptor>) -> Result<Self> {
        let binding = self.bindings.entry(MarkerKey::of::<M>()).or_default();
        if let Some(existing) = &binding.asynchronous {
            if !same_instance(existing, &interceptor) {
                return Err(Error::DuplicateBinding {
                    marker: M::NAME,
                    flavor: Flavor::Async,
                });
            }
        }
        binding.asynchronous = Some(interceptor);
        Ok(self)
    }

    /// Register the marked operations of `T` for startup validation.
    ///
    /// Declaring the same component twice has no effect. Components are told apart by
    /// type, so two components sharing a name in different modules are both validated.
    pub fn declare<T: Declared + 'static>(mut self) -> Self {
        if self.components.insert(TypeId::of::<T>()) {
            self.declarations.extend(T::DECLARATIONS);
        }
        self
    }

    /// Validate that every declared marker has an interceptor of the right flavor.
    ///
    /// Fails with [`Error::UnboundMarker`] on the first operation that couldn't be
    /// dispatched.
    pub fn build(self) -> Result<Registry> {
        for declaration in &self.declarations {
            for marker in declaration.markers {
                let binding = self.bindings.get(marker);
                let bound = match declaration.flavor {
                    Flavor::Blocking => binding.is_some_and(|b| b.blocking.is_some()),
                    Flavor::Async => binding.is_some_and(|b| b.asynchronous.is_some()),
                };
                if !bound {
                    return Err(Error::UnboundMarker {
                        marker: marker.name(),
                        target: declaration.target,
                        flavor: declaration.flavor,
                    });
                }
            }
        }

        tracing::debug!(
            bindings = self.bindings.len(),
            operations = self.declarations.len(),
            "interceptor registry built"
        );

        Ok(Registry {
            bindings: self.bindings,
            declarations: self.declarations,
        })
    }
}

fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsyncInvocation, Invocation, LogTime, Parameter};

    struct Passthrough;

    impl Interceptor for Passthrough {
        fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<()> {
            invocation.proceed()
        }
    }

    #[async_trait::async_trait]
    impl AsyncInterceptor for Passthrough {
        async fn intercept(&self, invocation: &mut AsyncInvocation<'_>) -> Result<()> {
            invocation.proceed().await
        }
    }

    struct Audited;
    impl Marker for Audited {
        const NAME: &'static str = "Audited";
    }

    struct Ledger;
    impl Declared for Ledger {
        const DECLARATIONS: &'static [Declaration] = &[
            Declaration {
                target: Target::new("Ledger", "post"),
                markers: &[MarkerKey::of::<LogTime>()],
                parameters: &[Parameter::new("amount", "u64")],
                flavor: Flavor::Blocking,
            },
            Declaration {
                target: Target::new("Ledger", "sync"),
                markers: &[MarkerKey::of::<LogTime>(), MarkerKey::of::<Audited>()],
                parameters: &[],
                flavor: Flavor::Async,
            },
        ];
    }

    #[test]
    fn rebinding_the_same_instance_is_idempotent() {
        let interceptor = Arc::new(Passthrough);
        let builder = Registry::builder()
            .bind::<LogTime>(interceptor.clone())
            .unwrap()
            .bind::<LogTime>(interceptor)
            .unwrap();
        assert!(builder.build().is_ok());
    }

    #[test]
    fn binding_another_interceptor_fails() {
        let err = Registry::builder()
            .bind::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .bind::<LogTime>(Arc::new(Passthrough))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::DuplicateBinding {
                marker: "LogTime",
                flavor: Flavor::Blocking
            }
        ));
        assert!(err.is_startup_error());
    }

    #[test]
    fn blocking_and_async_bindings_are_independent() {
        let result = Registry::builder()
            .bind::<LogTime>(Arc::new(Passthrough))
            .and_then(|b| b.bind_async::<LogTime>(Arc::new(Passthrough)));
        assert!(result.is_ok());
    }

    #[test]
    fn build_rejects_unbound_marker() {
        let err = Registry::builder()
            .bind::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .bind_async::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .declare::<Ledger>()
            .build()
            .err()
            .unwrap();
        match err {
            Error::UnboundMarker {
                marker,
                target,
                flavor,
            } => {
                assert_eq!(marker, "Audited");
                assert_eq!(target, Target::new("Ledger", "sync"));
                assert_eq!(flavor, Flavor::Async);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_rejects_marker_bound_for_the_other_flavor() {
        let err = Registry::builder()
            .bind_async::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .bind_async::<Audited>(Arc::new(Passthrough))
            .unwrap()
            .declare::<Ledger>()
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::UnboundMarker {
                flavor: Flavor::Blocking,
                ..
            }
        ));
    }

    #[test]
    fn resolves_chain_in_declaration_order() {
        let outer: Arc<Passthrough> = Arc::new(Passthrough);
        let inner: Arc<Passthrough> = Arc::new(Passthrough);
        let registry = Registry::builder()
            .bind::<LogTime>(outer.clone())
            .unwrap()
            .bind_async::<LogTime>(outer.clone())
            .unwrap()
            .bind_async::<Audited>(inner.clone())
            .unwrap()
            .declare::<Ledger>()
            .declare::<Ledger>()
            .build()
            .unwrap();

        assert_eq!(registry.declarations().count(), 2);

        let chain = registry.async_chain(&Ledger::DECLARATIONS[1]).unwrap();
        assert_eq!(chain.len(), 2);
        let outer_dyn: Arc<dyn AsyncInterceptor> = outer;
        let inner_dyn: Arc<dyn AsyncInterceptor> = inner;
        assert!(same_instance(&chain[0], &outer_dyn));
        assert!(same_instance(&chain[1], &inner_dyn));
    }

    mod north {
        use super::*;

        pub struct Depot;
        impl Declared for Depot {
            const DECLARATIONS: &'static [Declaration] = &[Declaration {
                target: Target::new("Depot", "restock"),
                markers: &[MarkerKey::of::<LogTime>()],
                parameters: &[],
                flavor: Flavor::Blocking,
            }];
        }
    }

    mod south {
        use super::*;

        pub struct Depot;
        impl Declared for Depot {
            const DECLARATIONS: &'static [Declaration] = &[Declaration {
                target: Target::new("Depot", "restock"),
                markers: &[MarkerKey::of::<Audited>()],
                parameters: &[],
                flavor: Flavor::Blocking,
            }];
        }
    }

    #[test]
    fn same_named_components_are_validated_separately() {
        let builder = Registry::builder()
            .bind::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .declare::<north::Depot>()
            .declare::<south::Depot>();

        let err = builder.build().err().unwrap();
        assert!(matches!(
            err,
            Error::UnboundMarker {
                marker: "Audited",
                flavor: Flavor::Blocking,
                ..
            }
        ));

        let registry = Registry::builder()
            .bind::<LogTime>(Arc::new(Passthrough))
            .unwrap()
            .bind::<Audited>(Arc::new(Passthrough))
            .unwrap()
            .declare::<north::Depot>()
            .declare::<south::Depot>()
            .declare::<north::Depot>()
            .build()
            .unwrap();
        assert_eq!(registry.declarations().count(), 2);
    }

    #[test]
    fn resolve_reports_unbound_marker() {
        let registry = Registry::builder().build().unwrap();
        let err = registry
            .resolve(MarkerKey::of::<Audited>(), Target::new("Ledger", "post"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnboundMarker { marker: "Audited", .. }));
    }
}
