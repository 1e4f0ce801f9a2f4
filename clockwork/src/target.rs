use std::fmt;

use crate::MarkerKey;

/// Identity of an intercepted operation: the declaring component and the operation name.
///
/// Displayed as `Component.operation`, e.g. `TodoService.create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Target {
    component: &'static str,
    operation: &'static str,
}

impl Target {
    pub const fn new(component: &'static str, operation: &'static str) -> Self {
        Self {
            component,
            operation,
        }
    }

    /// Simple name of the declaring type.
    #[inline]
    pub fn component(&self) -> &'static str {
        self.component
    }

    #[inline]
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.operation)
    }
}

/// Whether an operation blocks the calling thread or returns a future.
///
/// Blocking operations are dispatched through [`Interceptor`](crate::Interceptor)s,
/// async ones through [`AsyncInterceptor`](crate::AsyncInterceptor)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Flavor {
    Blocking,
    Async,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Blocking => f.write_str("blocking"),
            Flavor::Async => f.write_str("async"),
        }
    }
}

/// Compile-time description of one argument of an intercepted operation.
///
/// The argument values themselves are never seen by interceptors; they are moved
/// straight into the real operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Parameter {
    name: &'static str,
    type_name: &'static str,
}

impl Parameter {
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self { name, type_name }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The argument type as written in the signature.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A marked operation, as emitted by `#[intercept]`.
///
/// Markers are listed in chain order: the first one is the outermost interceptor.
#[derive(Debug)]
pub struct Declaration {
    pub target: Target,
    pub markers: &'static [MarkerKey],
    pub parameters: &'static [Parameter],
    pub flavor: Flavor,
}
