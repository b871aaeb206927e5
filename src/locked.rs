//! `sharedptr::locked::LockedSharedPtr<T>` guards its owner count with a
//! spin lock held inside the cell.
//!
//! The API is the same as [`AtomicSharedPtr<T>`][crate::AtomicSharedPtr].
//! The check-and-decrement and the refusal to resurrect a collapsed count
//! happen under the same lock, so two owners can never both decide to
//! destroy the value.
//!
//! The lock is never held while user code runs: it is released before the
//! value is destroyed, and it lives in the cell, so it is freed with it.
use crate::{cell::private, Counter, SharedPtr};
use spin::mutex::SpinMutex;

/// Mutex-guarded owner count.
pub struct Locked(SpinMutex<usize>);

impl private::Sealed for Locked {}

unsafe impl Counter for Locked {
    fn new(v: usize) -> Self {
        Locked(SpinMutex::new(v))
    }

    fn get(&self) -> usize {
        *self.0.lock()
    }

    fn inc_if_nonzero(&self) -> bool {
        let mut n = self.0.lock();
        if *n == 0 {
            return false;
        }
        *n += 1;
        true
    }

    fn dec(&self) -> bool {
        let mut n = self.0.lock();
        match *n {
            0 => {
                log::error!("locked count: decrement of a collapsed count ignored");
                false
            }
            _ => {
                *n -= 1;
                *n == 0
            }
        }
    }
}

pub type LockedSharedPtr<T> = SharedPtr<T, Locked>;
