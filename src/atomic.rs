//! `sharedptr::atomic::AtomicSharedPtr<T>` counts owners with a lock-free
//! atomic integer. It is the default counter for [`SharedPtr`].
//!
//! See the [`SharedPtr`] docs for the API, which is the same for every
//! counter.
//!
//! ## See also
//!
//! [`LockedSharedPtr<T>`][crate::LockedSharedPtr] in this crate guards the
//! count with a mutex instead.
use crate::{cell::private, Counter, SharedPtr};
use core::sync::atomic::{
    self, AtomicUsize,
    Ordering::{Acquire, Relaxed, Release},
};

/// Lock-free owner count.
pub struct Atomic(AtomicUsize);

impl private::Sealed for Atomic {}

unsafe impl Counter for Atomic {
    fn new(v: usize) -> Self {
        Atomic(AtomicUsize::new(v))
    }

    fn get(&self) -> usize {
        // relaxed ordering as this is only advisory
        self.0.load(Relaxed)
    }

    fn inc_if_nonzero(&self) -> bool {
        // Relaxed is enough to add an owner: the caller already holds one, so
        // nothing can be freed under it.
        self.0
            .fetch_update(Relaxed, Relaxed, |n| if n == 0 { None } else { Some(n + 1) })
            .is_ok()
    }

    fn dec(&self) -> bool {
        match self.0.fetch_update(Release, Relaxed, |n| n.checked_sub(1)) {
            Ok(1) => {
                // Every other owner released with `Release`; synchronize with
                // all of them before the value is destroyed.
                atomic::fence(Acquire);
                true
            }
            Ok(_) => false,
            Err(_) => {
                log::error!("atomic count: decrement of a collapsed count ignored");
                false
            }
        }
    }
}

pub type AtomicSharedPtr<T> = SharedPtr<T, Atomic>;
