use std::sync::Arc;

use crate::{Flavor, Target};

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Marker '{marker}' declared on {target} has no {flavor} interceptor bound")]
    UnboundMarker {
        marker: &'static str,
        target: Target,
        flavor: Flavor,
    },

    #[error("Marker '{marker}' is already bound to a different {flavor} interceptor")]
    DuplicateBinding {
        marker: &'static str,
        flavor: Flavor,
    },

    #[error("proceed() called more than once while intercepting {0}")]
    ProceedMisuse(Target),

    #[error("Interceptor chain for {0} completed without proceeding")]
    NotProceeded(Target),

    #[error("Timing sink failed: {0}")]
    Sink(Arc<str>),

    #[error("Error external to clockwork occurred: {0}")]
    External(Arc<str>),
}

impl Error {
    /// Whether this error can only be raised while the registry is being built.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Error::UnboundMarker { .. } | Error::DuplicateBinding { .. }
        )
    }
}
