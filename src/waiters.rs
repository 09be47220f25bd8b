//! Lock-free waiter registry.
//!
//! A Treiber-style stack of parked threads. Consumers push themselves on
//! with a CAS retry loop before suspending; the one thread that settles the
//! promise drains the stack with a single traversal, unparking every node.
//! Nodes are never unlinked individually; the registry belongs to a single
//! settlement event and the whole list is freed when the owning promise is
//! dropped.

use crate::park::Unparker;
use core::fmt;
use crossbeam_utils::CachePadded;

/// One registered waiter.
///
/// `next` is written by the pushing thread before the publishing CAS and
/// never again afterwards, so traversal needs no synchronization beyond the
/// acquire on the head load.
pub(crate) struct WaiterNode {
    unparker: Unparker,
    next: *mut WaiterNode,
}

/// Stack of waiters, insertion order deliberately uncontracted: every waiter
/// is woken by the same settlement, so ordering among them carries nothing.
pub(crate) struct WaiterStack {
    head: CachePadded<atomic!(AtomicPtr<WaiterNode>, ty)>,
}

// The raw node pointers suppress the auto impls. Nodes are owned by the
// stack once published and only ever read through shared references; the
// unparker inside them is Send + Sync.
unsafe impl Send for WaiterStack {}
unsafe impl Sync for WaiterStack {}

impl WaiterStack {
    #[cfg(not(loom))]
    pub(crate) const fn new() -> Self {
        Self {
            head: CachePadded::new(atomic!(ptr, WaiterNode)),
        }
    }

    #[cfg(loom)]
    pub(crate) fn new() -> Self {
        Self {
            head: CachePadded::new(atomic!(ptr, WaiterNode)),
        }
    }

    /// Publish a waiter. Unbounded CAS retries; a failed attempt means
    /// another waiter won the head, so re-read and try again after a brief
    /// spin. The SeqCst success ordering pairs with the SeqCst completion
    /// store and head load in the settle path: either the settling thread's
    /// traversal sees this node, or this waiter's next state load sees
    /// `COMPLETE`. There is no interleaving where both miss.
    pub(crate) fn push(&self, unparker: Unparker) {
        let node = Box::into_raw(Box::new(WaiterNode {
            unparker,
            next: core::ptr::null_mut(),
        }));

        let mut head = self.head.load(ordering!(Relaxed));
        let mut attempts: usize = 0;
        loop {
            // Sole owner until the CAS below publishes the node.
            unsafe { (*node).next = head };
            match self
                .head
                .compare_exchange_weak(head, node, ordering!(SeqCst), ordering!(Relaxed))
            {
                Ok(_) => return,
                Err(current) => {
                    head = current;
                    slight_spin!(attempts);
                    attempts = attempts.wrapping_add(1);
                }
            }
        }
    }

    /// Wake every registered waiter, visiting each node exactly once.
    ///
    /// Called by the settling thread strictly after the `COMPLETE` store.
    /// Pushes racing with this traversal either land before the head load
    /// (and are visited) or their owners observe completion on re-check, so
    /// a single walk from the head suffices.
    pub(crate) fn wake_all(&self) {
        let mut node = self.head.load(ordering!(SeqCst));
        while !node.is_null() {
            let waiter = unsafe { &*node };
            waiter.unparker.unpark();
            node = waiter.next;
        }
    }

    /// Advisory snapshot of the number of registered waiters. Racing pushes
    /// may or may not be counted.
    pub(crate) fn len(&self) -> usize {
        let mut count = 0;
        let mut node = self.head.load(ordering!(Acquire));
        while !node.is_null() {
            count += 1;
            node = unsafe { (*node).next };
        }
        count
    }
}

impl Drop for WaiterStack {
    fn drop(&mut self) {
        // Exclusive access: no waiter can be parked while the promise is
        // being dropped, since waiting borrows it.
        let mut node = self.head.load(ordering!(Relaxed));
        while !node.is_null() {
            let boxed = unsafe { Box::from_raw(node) };
            node = boxed.next;
        }
    }
}

impl fmt::Debug for WaiterStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaiterStack")
            .field("waiters", &self.len())
            .finish()
    }
}
