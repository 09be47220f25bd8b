//! Error taxonomy.
//!
//! Settlement contention hands the rejected payload back to the loser, it is
//! never dropped on the floor. A timed-out wait is a normal bounded-wait
//! outcome, distinct from failure of the underlying computation (which
//! travels through the `Err` arm of the settled result itself).

use core::fmt;
use thiserror::Error;

/// Returned to a `complete` or `fail` caller that lost the settlement race.
///
/// Carries the payload the promise refused, so the caller can recover it:
///
/// ```
/// use promise_cell::Promise;
///
/// let promise = Promise::<u32>::new();
/// promise.complete(1).unwrap();
///
/// let rejected = promise.complete(2).unwrap_err();
/// assert_eq!(rejected.into_inner(), 2);
/// ```
///
/// `Debug` and `Display` are implemented by hand and do not require (or
/// expose) the payload, following `std::sync::mpsc::SendError`.
pub struct AlreadyCompleted<T>(pub T);

impl<T> AlreadyCompleted<T> {
    /// Recover the payload the promise rejected.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for AlreadyCompleted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("AlreadyCompleted(..)")
    }
}

impl<T> fmt::Display for AlreadyCompleted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("promise already completed")
    }
}

impl<T> std::error::Error for AlreadyCompleted<T> {}

/// A bounded wait reached its deadline before the promise settled.
///
/// The promise itself is untouched: it is still pending for every other
/// waiter and the timed-out caller may wait again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out before the promise completed")]
pub struct TimedOut;
