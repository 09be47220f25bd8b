#[cfg(loom)]
macro_rules! ordering {
    (ty) => {
        ::loom::sync::atomic::Ordering
    };
    ($order:ident) => {
        ::loom::sync::atomic::Ordering::$order
    };
}

#[cfg(not(loom))]
macro_rules! ordering {
    (ty) => {
        ::core::sync::atomic::Ordering
    };
    ($order:ident) => {
        ::core::sync::atomic::Ordering::$order
    };
}

#[cfg(loom)]
macro_rules! atomic {
    (u8, $value:expr) => {
        ::loom::sync::atomic::AtomicU8::new($value)
    };
    (ptr, $t:ty) => {
        ::loom::sync::atomic::AtomicPtr::<$t>::new(::core::ptr::null_mut())
    };
    (AtomicU8, ty) => {
        ::loom::sync::atomic::AtomicU8
    };
    (AtomicPtr<$t:ty>, ty) => {
        ::loom::sync::atomic::AtomicPtr<$t>
    };
}

#[cfg(not(loom))]
macro_rules! atomic {
    (u8, $value:expr) => {
        ::core::sync::atomic::AtomicU8::new($value)
    };
    (ptr, $t:ty) => {
        ::core::sync::atomic::AtomicPtr::<$t>::new(::core::ptr::null_mut())
    };
    (AtomicU8, ty) => {
        ::core::sync::atomic::AtomicU8
    };
    (AtomicPtr<$t:ty>, ty) => {
        ::core::sync::atomic::AtomicPtr<$t>
    };
}

#[cfg(not(loom))]
macro_rules! slight_spin {
    ($attempts:expr) => {
        for _ in 0..(2 << ($attempts & ((1 << 3) - 1))) {
            core::hint::spin_loop();
        }
    };
}

#[cfg(loom)]
macro_rules! slight_spin {
    ($attempts:expr) => {
        for _ in 0..(2 << ($attempts & ((1 << 3) - 1))) {
            loom::hint::spin_loop();
        }
    };
}

macro_rules! state_const {
    ($c:ident) => {
        $crate::consts::$c
    };
}
