//! How a failed interceptor chain reaches the caller of an `#[intercept]` method.
//!
//! [`Dispatcher::dispatch`](crate::Dispatcher::dispatch) reports chain failures as
//! `Err(clockwork::Error)`. A generated method has to return its declared type instead,
//! so it hands the error to [`Surface`], which picks the first rule that fits that type:
//!
//! | return type                             | chain failure                    | operation not proceeded          |
//! |-----------------------------------------|----------------------------------|----------------------------------|
//! | `Result<T, E>` with `E: From<Error>`    | `Err(E::from(error))`            | `Err(E::from(NotProceeded))`     |
//! | any other `R: Default`                  | panics with the error            | `R::default()`                   |
//! | anything else                           | panics with the error            | panics with `NotProceeded`       |
//!
//! Panics carry the [`Error`] itself as payload, so it can be recovered with
//! `catch_unwind` and `downcast_ref::<clockwork::Error>()`.
//!
//! The rule is chosen from the concrete return type. A return type that is a generic
//! parameter of the method always panics.

use std::marker::PhantomData;

use crate::Error;

pub struct Surface<R>(PhantomData<fn() -> R>);

impl<R> Surface<R> {
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Surface(PhantomData)
    }
}

/// `Result` whose error type can hold a [`Error`].
pub trait ReturnErr {
    type Output;
    fn surface(&self, error: Error) -> Self::Output;
}

impl<T, E: From<Error>> ReturnErr for &&Surface<Result<T, E>> {
    type Output = Result<T, E>;

    fn surface(&self, error: Error) -> Self::Output {
        Err(E::from(error))
    }
}

/// Types with a natural empty value for suppressed calls.
pub trait ReturnDefault {
    type Output;
    fn surface(&self, error: Error) -> Self::Output;
}

impl<R: Default> ReturnDefault for &Surface<R> {
    type Output = R;

    fn surface(&self, error: Error) -> R {
        match error {
            Error::NotProceeded(target) => {
                tracing::debug!(operation = %target, "suppressed call returns a default value");
                R::default()
            }
            other => unwind(other),
        }
    }
}

/// Everything else.
pub trait Unwind {
    type Output;
    fn surface(&self, error: Error) -> Self::Output;
}

impl<R> Unwind for Surface<R> {
    type Output = R;

    fn surface(&self, error: Error) -> R {
        unwind(error)
    }
}

fn unwind(error: Error) -> ! {
    tracing::error!(error = %error, "interception failed, unwinding");
    std::panic::panic_any(error)
}
