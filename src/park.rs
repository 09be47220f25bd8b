//! Thread suspension seam.
//!
//! Real builds park with [`crossbeam_utils::sync::Parker`], which gives us
//! token semantics (an unpark delivered before the park makes the park return
//! immediately) plus timed and deadline parking. Under `cfg(loom)` the same
//! surface is modeled with a loom mutex + condvar permit, since loom does not
//! model the OS parker. Loom models never take the timed paths; the model
//! shim parks untimed regardless of deadline.

#[cfg(not(loom))]
pub(crate) use crossbeam_utils::sync::{Parker, Unparker};

#[cfg(loom)]
pub(crate) use shim::{Parker, Unparker};

#[cfg(loom)]
mod shim {
    use loom::sync::{Arc, Condvar, Mutex};
    use std::time::Instant;

    struct Inner {
        permit: Mutex<bool>,
        cvar: Condvar,
    }

    pub(crate) struct Parker {
        unparker: Unparker,
    }

    #[derive(Clone)]
    pub(crate) struct Unparker {
        inner: Arc<Inner>,
    }

    impl Parker {
        pub(crate) fn new() -> Self {
            Self {
                unparker: Unparker {
                    inner: Arc::new(Inner {
                        permit: Mutex::new(false),
                        cvar: Condvar::new(),
                    }),
                },
            }
        }

        pub(crate) fn park(&self) {
            let inner = &self.unparker.inner;
            let mut permit = inner.permit.lock().unwrap();
            while !*permit {
                permit = inner.cvar.wait(permit).unwrap();
            }
            *permit = false;
        }

        /// Loom has no clock; models only exercise untimed waits, so the
        /// deadline is ignored and this parks like [`Parker::park`].
        pub(crate) fn park_deadline(&self, _deadline: Instant) {
            self.park();
        }

        pub(crate) fn unparker(&self) -> &Unparker {
            &self.unparker
        }
    }

    impl Unparker {
        pub(crate) fn unpark(&self) {
            *self.inner.permit.lock().unwrap() = true;
            self.inner.cvar.notify_all();
        }
    }
}
