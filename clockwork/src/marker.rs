use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// A declarative tag opting operations into interception.
///
/// Markers carry no state and no behavior; they only name an intent. Derive it on a
/// unit struct:
///
/// ```rust,ignore
/// #[derive(clockwork::Marker)]
/// pub struct Audited;
/// ```
///
/// and attach it with `#[intercept(Audited)]`. What happens on a marked call is decided
/// by the interceptor bound to the marker in the [`Registry`](crate::Registry).
pub trait Marker: 'static {
    /// Human-readable name used in logs and errors.
    const NAME: &'static str;
}

/// Runtime identity of a [`Marker`] type.
///
/// Built in `const` context by the generated declaration tables, hence the function
/// pointer instead of a stored `TypeId`.
#[derive(Clone, Copy)]
pub struct MarkerKey {
    id: fn() -> TypeId,
    name: &'static str,
}

impl MarkerKey {
    pub const fn of<M: Marker>() -> Self {
        Self {
            id: TypeId::of::<M>,
            name: M::NAME,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MarkerKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for MarkerKey {}

impl Hash for MarkerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id().hash(state);
    }
}

impl fmt::Debug for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MarkerKey").field(&self.name).finish()
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Measure and log the execution time of the marked operations.
///
/// Bind it to a [`LogTimeInterceptor`](crate::LogTimeInterceptor).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTime;

impl Marker for LogTime {
    const NAME: &'static str = "LogTime";
}
