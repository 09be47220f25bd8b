#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::cargo,
)]
#![allow(
    clippy::cargo_common_metadata,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions
)]

#[macro_use]
mod macros;
pub mod consts;
mod error;
mod park;
mod waiters;

pub use error::{AlreadyCompleted, TimedOut};

use core::cell::UnsafeCell;
use core::convert::Infallible;
use core::fmt::{self, Debug, Display, Formatter};
use core::mem::MaybeUninit;
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

use crate::park::Parker;
use crate::waiters::WaiterStack;

/// # Completion State
///
/// The observable half of the per-promise state machine:
/// `Pending --settle--> Completed`, terminal. A settlement in flight (the
/// producer has claimed exclusivity but not yet published) is still reported
/// as `Pending`, because the outcome is not yet readable.
///
/// # Example
///
/// ```
/// use promise_cell::{Promise, State};
/// let promise = Promise::<u32>::new();
///
/// assert!(promise.state().is_pending());
/// promise.complete(7).unwrap();
/// assert!(promise.state().is_completed());
/// ```
pub enum State {
    Pending,
    Completed,
}

impl State {
    /// Fold a raw state byte (see [`consts`]) into the observable state.
    #[inline]
    #[must_use]
    pub const fn from_raw(state: u8) -> Self {
        if state == state_const!(COMPLETE) {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    /// Returns true if the promise had not settled when the [`State`] was
    /// constructed.
    #[inline]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the promise had settled when the [`State`] was
    /// constructed.
    #[inline]
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

macro_rules! __state_format {
    ($state:ident, $formatter:ident) => {
        match $state {
            Self::Pending => $formatter.write_str("pending"),
            Self::Completed => $formatter.write_str("completed"),
        }
    };
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        __state_format!(self, f)
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        __state_format!(self, f)
    }
}

/// # Promise Cell
///
/// A single-assignment slot that threads can block on. Created pending,
/// settled exactly once with [`complete`] (a value) or [`fail`] (an error),
/// readable without blocking via [`try_get`] and with blocking via [`wait`]
/// and its timed variants. Share it by reference, typically through an `Arc`.
///
/// There is no lock: settlement is a claim CAS plus a release store of the
/// completion flag, and waiters live in a lock-free linked stack of
/// park/unpark handles that the settling thread drains with one traversal.
///
/// # Basic Example
///
/// ```
/// use promise_cell::Promise;
/// use std::sync::Arc;
/// use std::thread;
///
/// let promise = Arc::new(Promise::<u32>::new());
///
/// let p = promise.clone();
/// let producer = thread::spawn(move || p.complete(42).unwrap());
///
/// assert_eq!(*promise.wait().unwrap(), 42);
/// producer.join().unwrap();
/// ```
///
/// # Failure Path
///
/// The error side is a first-class settlement, not an afterthought: `fail`
/// uses the identical single-assignment claim and wake protocol, and every
/// waiter observes the same `Err`.
///
/// ```
/// use promise_cell::Promise;
///
/// let promise = Promise::<u32, String>::new();
/// promise.fail("computation exploded".to_owned()).unwrap();
///
/// assert_eq!(promise.wait().unwrap_err(), "computation exploded");
/// ```
///
/// # Timeouts
///
/// A deadline bounds the *wait*, not the promise. Timing out registers no
/// claim on the cell; the promise may still settle later and the timed-out
/// thread may simply wait again.
///
/// [`complete`]: Promise::complete
/// [`fail`]: Promise::fail
/// [`try_get`]: Promise::try_get
/// [`wait`]: Promise::wait
pub struct Promise<V, E = Infallible> {
    state: CachePadded<atomic!(AtomicU8, ty)>,
    outcome: UnsafeCell<MaybeUninit<Result<V, E>>>,
    waiters: WaiterStack,
}

// The UnsafeCell suppresses the auto impls. The outcome is written once by
// the claim winner and read-only afterwards, so sharing the promise shares
// `&V` / `&E` across threads (hence the Sync bounds), and dropping it drops
// a value that may have been written on another thread (hence Send).
unsafe impl<V: Send, E: Send> Send for Promise<V, E> {}
unsafe impl<V: Send + Sync, E: Send + Sync> Sync for Promise<V, E> {}

impl<V, E> Default for Promise<V, E> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> Promise<V, E> {
    /// Create a pending promise with an empty waiter registry.
    #[cfg(not(loom))]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CachePadded::new(atomic!(u8, state_const!(PENDING))),
            outcome: UnsafeCell::new(MaybeUninit::uninit()),
            waiters: WaiterStack::new(),
        }
    }

    #[cfg(loom)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CachePadded::new(atomic!(u8, state_const!(PENDING))),
            outcome: UnsafeCell::new(MaybeUninit::uninit()),
            waiters: WaiterStack::new(),
        }
    }

    /// # Raw Completion State
    ///
    /// Returns the raw state byte, one of the [`consts`] values.
    ///
    /// # Example
    ///
    /// ```
    /// # use promise_cell::{consts, Promise};
    /// # let promise = Promise::<u32>::new();
    /// assert_eq!(promise.raw_state(), consts::PENDING);
    ///
    /// promise.complete(1).unwrap();
    /// assert_eq!(promise.raw_state(), consts::COMPLETE);
    /// ```
    #[inline]
    #[must_use]
    pub fn raw_state(&self) -> u8 {
        self.state.load(ordering!(Acquire))
    }

    /// The observable [`State`] at the time of the call.
    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        State::from_raw(self.raw_state())
    }

    /// Returns true if the promise has settled.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state().is_completed()
    }

    /// Returns true if the promise has not settled.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    /// # Waiter Count
    ///
    /// Advisory snapshot of the number of registered waiters. Registrations
    /// racing with the call may or may not be counted; useful for
    /// introspection and tests, not for synchronization.
    #[inline]
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// # Non-Blocking Read
    ///
    /// `None` until settlement is visible, then the settled outcome: the
    /// same one on every subsequent call, from every thread. Never blocks,
    /// never errors.
    ///
    /// # Example
    ///
    /// ```
    /// # use promise_cell::Promise;
    /// let promise = Promise::<u32>::new();
    /// assert!(promise.try_get().is_none());
    ///
    /// promise.complete(7).unwrap();
    /// assert_eq!(promise.try_get(), Some(Ok(&7)));
    /// assert_eq!(promise.try_get(), Some(Ok(&7)));
    /// ```
    #[inline]
    #[must_use]
    pub fn try_get(&self) -> Option<Result<&V, &E>> {
        if self.raw_state() == state_const!(COMPLETE) {
            // SAFETY: COMPLETE was observed with acquire ordering, pairing
            // with the release store that published the outcome.
            Some(unsafe { self.outcome_ref() })
        } else {
            None
        }
    }

    /// # Complete With a Value
    ///
    /// Settles the promise with `Ok(value)`, then wakes every registered
    /// waiter. Never blocks. Concurrent settlement attempts race for
    /// exclusivity; exactly one wins.
    ///
    /// # Errors
    ///
    /// If the promise already settled (or another settlement is in flight),
    /// the value is handed back inside [`AlreadyCompleted`].
    ///
    /// # Example
    ///
    /// ```
    /// # use promise_cell::Promise;
    /// let promise = Promise::<&str>::new();
    ///
    /// assert!(promise.complete("first").is_ok());
    /// let rejected = promise.complete("second").unwrap_err();
    /// assert_eq!(rejected.into_inner(), "second");
    ///
    /// assert_eq!(promise.try_get(), Some(Ok(&"first")));
    /// ```
    pub fn complete(&self, value: V) -> Result<(), AlreadyCompleted<V>> {
        if !self.try_claim() {
            return Err(AlreadyCompleted(value));
        }
        self.publish(Ok(value));
        Ok(())
    }

    /// # Complete With an Error
    ///
    /// The failure half of settlement: identical single-assignment claim,
    /// identical wake protocol, an `Err` payload instead of a value.
    ///
    /// # Errors
    ///
    /// If the promise already settled, the error payload is handed back
    /// inside [`AlreadyCompleted`].
    pub fn fail(&self, error: E) -> Result<(), AlreadyCompleted<E>> {
        if !self.try_claim() {
            return Err(AlreadyCompleted(error));
        }
        self.publish(Err(error));
        Ok(())
    }

    /// # Blocking Wait
    ///
    /// Returns immediately if the promise has settled; otherwise registers
    /// this thread in the waiter stack and parks until settlement. Every
    /// resumption, woken or spurious, re-checks the completion state before
    /// concluding anything.
    ///
    /// # Errors
    ///
    /// The `Err` arm is the producer's failure payload, delivered identically
    /// to every waiter.
    pub fn wait(&self) -> Result<&V, &E> {
        if let Some(outcome) = self.try_get() {
            return outcome;
        }

        let parker = Parker::new();
        self.waiters.push(parker.unparker().clone());

        loop {
            // SeqCst pairs with the settle path; see WaiterStack::push.
            if self.state.load(ordering!(SeqCst)) == state_const!(COMPLETE) {
                // SAFETY: COMPLETE observed, outcome published before it.
                return unsafe { self.outcome_ref() };
            }
            parker.park();
        }
    }

    /// # Bounded Wait
    ///
    /// Like [`wait`], but gives up once `timeout` has elapsed. "Timed out"
    /// is decided by the clock plus a fresh completion check, never by the
    /// park call returning, so spurious wakeups and stale unpark tokens only
    /// cost a loop iteration.
    ///
    /// Each call that actually blocks pushes one waiter node; nodes are
    /// reclaimed when the promise is dropped, so a promise polled with many
    /// timed waits holds memory proportional to those waits until then.
    ///
    /// # Errors
    ///
    /// [`TimedOut`] if the deadline passed without settlement. That is a
    /// normal outcome: the promise is untouched and may still settle later.
    /// A settled `Err` is delivered as `Ok(Err(&e))`.
    ///
    /// # Example
    ///
    /// ```
    /// # use promise_cell::{Promise, TimedOut};
    /// # use std::time::Duration;
    /// let promise = Promise::<u32>::new();
    ///
    /// assert_eq!(promise.wait_timeout(Duration::ZERO), Err(TimedOut));
    ///
    /// promise.complete(3).unwrap();
    /// assert_eq!(promise.wait_timeout(Duration::ZERO), Ok(Ok(&3)));
    /// ```
    ///
    /// [`wait`]: Promise::wait
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Result<&V, &E>, TimedOut> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_deadline(deadline),
            // Timeout too large to represent as a deadline: wait forever.
            None => Ok(self.wait()),
        }
    }

    /// # Deadline Wait
    ///
    /// The deadline form [`wait_timeout`] delegates to.
    ///
    /// # Errors
    ///
    /// [`TimedOut`] once `deadline` has passed without settlement. A deadline
    /// already in the past still performs the non-blocking completion check
    /// first and registers no waiter on the miss.
    ///
    /// [`wait_timeout`]: Promise::wait_timeout
    pub fn wait_deadline(&self, deadline: Instant) -> Result<Result<&V, &E>, TimedOut> {
        if let Some(outcome) = self.try_get() {
            return Ok(outcome);
        }
        if Instant::now() >= deadline {
            return Err(TimedOut);
        }

        let parker = Parker::new();
        self.waiters.push(parker.unparker().clone());

        loop {
            if self.state.load(ordering!(SeqCst)) == state_const!(COMPLETE) {
                // SAFETY: COMPLETE observed, outcome published before it.
                return Ok(unsafe { self.outcome_ref() });
            }
            if Instant::now() >= deadline {
                return Err(TimedOut);
            }
            parker.park_deadline(deadline);
        }
    }

    /// Claim settlement exclusivity. At most one caller per promise ever
    /// sees `true`. Strong CAS: a spurious failure here would mis-report
    /// an `AlreadyCompleted` on a pending promise.
    fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(
                state_const!(PENDING),
                state_const!(COMPLETING),
                ordering!(SeqCst),
                ordering!(SeqCst),
            )
            .is_ok()
    }

    /// Write the outcome, make it visible, wake everyone. Only ever reached
    /// by the thread that won [`try_claim`].
    ///
    /// [`try_claim`]: Promise::try_claim
    fn publish(&self, outcome: Result<V, E>) {
        // SAFETY: the claim CAS granted exclusive write access to the slot,
        // and no reader dereferences it before observing COMPLETE below.
        unsafe { self.outcome.get().write(MaybeUninit::new(outcome)) };
        self.state.store(state_const!(COMPLETE), ordering!(SeqCst));
        self.waiters.wake_all();
    }

    /// # Safety
    ///
    /// The caller must have observed `COMPLETE` with at least acquire
    /// ordering on this thread.
    unsafe fn outcome_ref(&self) -> Result<&V, &E> {
        (*self.outcome.get()).assume_init_ref().as_ref()
    }
}

impl<V, E> Drop for Promise<V, E> {
    fn drop(&mut self) {
        if self.state.load(ordering!(Acquire)) == state_const!(COMPLETE) {
            // SAFETY: COMPLETE means the slot was initialized exactly once
            // and nobody can read it again (we hold exclusive access).
            unsafe { (*self.outcome.get()).assume_init_drop() };
        }
    }
}

impl<V, E> Debug for Promise<V, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .field("waiters", &self.waiters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_get_empty_then_settled() {
        let promise = Promise::<u32>::new();
        assert!(promise.try_get().is_none());
        assert!(promise.is_pending());

        promise.complete(11).unwrap();
        assert_eq!(promise.try_get(), Some(Ok(&11)));
        assert_eq!(promise.try_get(), Some(Ok(&11)));
        assert!(promise.is_completed());
    }

    #[test]
    fn second_completion_rejected_with_payload() {
        let promise = Promise::<String>::new();
        promise.complete("winner".to_owned()).unwrap();

        let rejected = promise.complete("loser".to_owned()).unwrap_err();
        assert_eq!(rejected.into_inner(), "loser");
        assert_eq!(promise.try_get(), Some(Ok(&"winner".to_owned())));
    }

    #[test]
    fn fail_is_a_first_class_settlement() {
        let promise = Promise::<u32, String>::new();
        promise.fail("boom".to_owned()).unwrap();

        assert_eq!(promise.try_get(), Some(Err(&"boom".to_owned())));
        assert_eq!(promise.wait().unwrap_err(), "boom");

        let rejected = promise.complete(1).unwrap_err();
        assert_eq!(rejected.into_inner(), 1);
        let rejected = promise.fail("late".to_owned()).unwrap_err();
        assert_eq!(rejected.into_inner(), "late");
    }

    #[test]
    fn zero_timeout_never_registers() {
        let promise = Promise::<u32>::new();
        assert_eq!(promise.wait_timeout(Duration::ZERO), Err(TimedOut));
        assert_eq!(promise.waiter_count(), 0);
    }

    #[test]
    fn post_completion_wait_returns_without_registering() {
        let promise = Promise::<u32>::new();
        promise.complete(5).unwrap();

        let start = Instant::now();
        assert_eq!(*promise.wait().unwrap(), 5);
        assert_eq!(
            promise.wait_timeout(Duration::from_secs(10)),
            Ok(Ok(&5))
        );
        // fast path only: no parking, no node pushed
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(promise.waiter_count(), 0);
    }

    #[test]
    fn timed_out_waiter_can_wait_again() {
        let promise = Arc::new(Promise::<u32>::new());
        assert_eq!(
            promise.wait_timeout(Duration::from_millis(10)),
            Err(TimedOut)
        );

        let p = promise.clone();
        let producer = thread::spawn(move || p.complete(9).unwrap());
        assert_eq!(*promise.wait().unwrap(), 9);
        producer.join().unwrap();
    }

    #[test]
    fn state_readers() {
        let promise = Promise::<u32>::new();
        assert_eq!(promise.raw_state(), consts::PENDING);
        assert!(promise.state().is_pending());
        assert!(!promise.state().is_completed());

        promise.complete(0).unwrap();
        assert_eq!(promise.raw_state(), consts::COMPLETE);
        assert!(promise.state().is_completed());
    }

    #[test]
    fn state_enum_from_raw() {
        assert!(State::from_raw(consts::PENDING).is_pending());
        assert!(State::from_raw(consts::COMPLETING).is_pending());
        assert!(State::from_raw(consts::COMPLETE).is_completed());
    }

    #[test]
    fn debug_and_display() {
        let promise = Promise::<u32>::new();
        assert_eq!(format!("{}", promise.state()), "pending");
        assert!(format!("{promise:?}").contains("pending"));

        promise.complete(1).unwrap();
        assert_eq!(format!("{}", promise.state()), "completed");
        assert_eq!(format!("{}", TimedOut), "timed out before the promise completed");
        assert_eq!(
            format!("{}", AlreadyCompleted(())),
            "promise already completed"
        );
    }
}
