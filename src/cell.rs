//! The reference-count cell behind every [`SharedPtr`][crate::SharedPtr].
//!
//! One cell exists per allocation. It holds the owner count and knows how to
//! destroy the value it was created for, so handles may view that value as
//! any type they like (a trait object, a field, a slice) and the right
//! destructor still runs when the last of them goes away.
use alloc::boxed::Box;
use core::{
    mem::ManuallyDrop,
    ptr::{self, NonNull},
};

/// Counting strategy for a cell. The only implementers are
/// [`Atomic`][crate::Atomic] and [`Locked`][crate::Locked].
///
/// It is `pub` so you can write code that's generic over the strategy, but
/// there's no reason to implement it for any other types.
///
/// # Safety
/// Trait is sealed. Implementations must make `inc_if_nonzero` and `dec`
/// indivisible with respect to each other across threads.
pub unsafe trait Counter: private::Sealed + Send + Sync {
    #[doc(hidden)]
    fn new(v: usize) -> Self;
    /// Snapshot of the count. Advisory only.
    #[doc(hidden)]
    fn get(&self) -> usize;
    /// Adds one owner, unless the count already reached zero.
    #[doc(hidden)]
    fn inc_if_nonzero(&self) -> bool;
    /// Removes one owner. Returns true if this call took the count to zero,
    /// in which case the caller is responsible for destroying the cell.
    /// A count that is already zero is left alone and false is returned.
    #[doc(hidden)]
    fn dec(&self) -> bool;
}

// Count and destructor for one allocation. The header does not know the type
// of the value it owns; `destroy` was monomorphized for it at creation.
pub(crate) struct Header<C> {
    count: C,
    destroy: unsafe fn(NonNull<Header<C>>),
}

#[repr(C)]
struct Cell<T, C> {
    header: Header<C>,
    value: ManuallyDrop<T>,
}

impl<C: Counter> Header<C> {
    /// Moves `value` into a fresh cell with a count of one. Returns the
    /// header and a pointer to the value inside the cell.
    ///
    /// Any handle to the cell may be the last one, on any thread, and the
    /// value is destroyed wherever that is. So the value must be `Send + Sync`
    /// whatever type the handles show it as.
    pub(crate) fn allocate<T: Send + Sync>(value: T) -> (NonNull<Header<C>>, NonNull<T>) {
        let cell = Box::into_raw(Box::new(Cell {
            header: Header {
                count: C::new(1),
                destroy: destroy::<T, C>,
            },
            value: ManuallyDrop::new(value),
        }));
        log::trace!("cell {:p}: allocated", cell);
        // Safety: `cell` came from `Box::into_raw` so it is non-null, and the
        // header sits at offset 0 because `Cell` is `repr(C)`.
        unsafe {
            let header = NonNull::new_unchecked(cell as *mut Header<C>);
            let value = NonNull::new_unchecked(ptr::addr_of_mut!((*cell).value) as *mut T);
            (header, value)
        }
    }

    /// Adds an owner. Returns false, and leaves the count alone, if the cell
    /// already collapsed; that only happens if a handle outlived its cell.
    pub(crate) fn increment(&self) -> bool {
        let ok = self.count.inc_if_nonzero();
        if !ok {
            log::error!("cell {:p}: increment on a collapsed cell ignored", self);
        }
        ok
    }

    pub(crate) fn use_count(&self) -> usize {
        self.count.get()
    }

    /// Drops one owner of `header`, destroying the value and freeing the
    /// cell if it was the last one.
    ///
    /// # Safety
    /// `header` must come from [`Header::allocate`] and the caller must own
    /// one of its counts, which it gives up here.
    pub(crate) unsafe fn release(header: NonNull<Header<C>>) {
        let h = header.as_ref();
        let destroy = h.destroy;
        if h.count.dec() {
            destroy(header);
        }
    }
}

unsafe fn destroy<T, C>(header: NonNull<Header<C>>) {
    let cell = header.as_ptr() as *mut Cell<T, C>;
    // managed object first, then the cell that held it
    ManuallyDrop::drop(&mut (*cell).value);
    drop(Box::from_raw(cell));
    log::trace!("cell {:p}: collapsed", cell);
}

pub(crate) mod private {
    pub trait Sealed {}
}
