//! Completion State Constants

/// The promise has not been settled and no settlement is in flight.
pub const PENDING: u8 = 0;
/// A producer won the settlement race and is writing the outcome. Observers
/// treat this as "not yet done"; only the winner ever moves past it.
pub const COMPLETING: u8 = 1;
/// The outcome is written and visible to any thread that observes this value
/// with acquire ordering (or stronger).
pub const COMPLETE: u8 = 2;
