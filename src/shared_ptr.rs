//! `SharedPtrl<'a, T, C>` is the owning handle. It is generic over the
//! counter type `C` (see [`Counter`]), and is normally used through the
//! aliases [`SharedPtr`], [`AtomicSharedPtr`][crate::AtomicSharedPtr] and
//! [`LockedSharedPtr`][crate::LockedSharedPtr], which fix `'a` to `'static`.
//!
//! A handle holds two pointers: one to the cell with the count, and one to
//! the value it shows. The second may point anywhere the first keeps alive,
//! which is how a handle to a concrete type turns into a handle to a trait
//! object or a field without a new allocation.
use crate::{
    cell::{Counter, Header},
    Atomic,
};
use alloc::boxed::Box;
use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem,
    ops::Deref,
    ptr::{self, NonNull},
};

/// Nullable, thread-safe, reference-counted pointer with type-erased
/// ownership.
///
/// Cloning shares the cell and adds one to its count; dropping removes one.
/// The value is destroyed, with the destructor of the type it was created
/// as, when the count reaches zero.
///
/// The handle is valid for `'a`. A value that borrows something gets a
/// handle no longer than that borrow, and so does every projection or cast
/// of it:
///
/// ```
/// use sharedptr::{static_pointer_cast, SharedPtrl};
///
/// struct Pair<'s>(&'s str, u32);
///
/// let name = String::from("pair");
/// let pair: SharedPtrl<Pair> = SharedPtrl::new(Pair(&name, 7));
/// let field: SharedPtrl<u32> = static_pointer_cast(&pair, |p| &p.1);
/// assert_eq!(*field, 7);
/// assert_eq!(pair.use_count(), 2);
/// ```
///
/// ```compile_fail
/// use sharedptr::SharedPtrl;
///
/// let p: SharedPtrl<i32> = {
///     let x = 5;
///     let r: SharedPtrl<&i32> = SharedPtrl::new(&x);
///     SharedPtrl::project(r, |r| *r)
/// };
/// assert_eq!(*p, 5);
/// ```
///
/// # Thread safety
///
/// The last handle destroys the value on whatever thread drops it, and a
/// cast can hide the value's type from the handle. So only `Send + Sync`
/// values go into a cell, like `std::sync::Arc` needs for its own `Send`:
///
/// ```compile_fail
/// use sharedptr::{static_pointer_cast, AtomicSharedPtr, SharedPtr};
/// use std::marker::PhantomData;
///
/// struct ThreadBound(u32, PhantomData<*const ()>);
///
/// let owner = AtomicSharedPtr::new(ThreadBound(7, PhantomData));
/// let field: SharedPtr<u32> = static_pointer_cast(&owner, |t| &t.0);
/// std::thread::spawn(move || drop(field));
/// ```
///
/// ```compile_fail
/// use sharedptr::SharedPtr;
/// use std::rc::Rc;
///
/// let b: Box<dyn std::any::Any> = Box::new(Rc::new(1));
/// let p: SharedPtr<dyn std::any::Any> = SharedPtr::from_box(b);
/// ```
pub struct SharedPtrl<'a, T: ?Sized, C: Counter = Atomic> {
    raw: Option<Raw<T, C>>,
    phantom: PhantomData<(&'a (), T)>,
}

/// A handle to a value that borrows nothing.
pub type SharedPtr<T, C = Atomic> = SharedPtrl<'static, T, C>;

// Both pointers of a non-empty handle. Keeping them in one `Option` means a
// handle can't have one without the other.
struct Raw<T: ?Sized, C> {
    header: NonNull<Header<C>>,
    ptr: NonNull<T>,
}

impl<T: ?Sized, C> Clone for Raw<T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized, C> Copy for Raw<T, C> {}

/// Stand-in for a null pointer when comparing handles.
///
/// ```
/// use sharedptr::{AtomicSharedPtr, Null, SharedPtr};
/// let p: SharedPtr<i32> = SharedPtr::null();
/// assert!(p == Null);
/// assert!(Null != AtomicSharedPtr::new(1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Null;

// Every cell holds a `Send + Sync` value (see `Header::allocate`); the bound
// here covers the type this handle shows.
unsafe impl<'a, T: ?Sized + Send + Sync, C: Counter> Send for SharedPtrl<'a, T, C> {}
unsafe impl<'a, T: ?Sized + Send + Sync, C: Counter> Sync for SharedPtrl<'a, T, C> {}

impl<'a, T: Send + Sync + 'a, C: Counter> SharedPtrl<'a, T, C> {
    /// Constructs a new handle owning `value`, with a use count of 1.
    /// Value and count share one allocation.
    pub fn new(value: T) -> Self {
        let (header, ptr) = Header::allocate(value);
        SharedPtrl::from_parts(header, ptr)
    }

    /// Releases the current value, then takes ownership of `value`.
    pub fn reset_with(&mut self, value: T) {
        self.reset();
        *self = SharedPtrl::new(value);
    }
}

impl<'a, T: ?Sized + Send + Sync + 'a, C: Counter> SharedPtrl<'a, T, C> {
    /// Return a handle for a boxed value. The box allocation is kept as-is;
    /// only the cell with the count is allocated.
    ///
    /// The cell owns the `Box<T>`, so an unsized `T` (e.g. `dyn Trait`) is
    /// destroyed through the box's own destructor.
    pub fn from_box(value: Box<T>) -> Self {
        let (header, boxed) = Header::<C>::allocate(value);
        // Safety: the box lives inside the cell until the cell is destroyed,
        // and its contents don't move when the box does.
        let ptr = unsafe { NonNull::from(&**boxed.as_ref()) };
        SharedPtrl::from_parts(header, ptr)
    }

    /// Takes ownership of a raw pointer. A null pointer gives an empty handle.
    ///
    /// # Safety
    /// A non-null `ptr` must come from [`Box::into_raw`], and nothing else
    /// may free it or take ownership of it afterwards.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        match NonNull::new(ptr) {
            Some(p) => SharedPtrl::from_box(Box::from_raw(p.as_ptr())),
            None => SharedPtrl::null(),
        }
    }

    /// Releases the current value, then takes ownership of `value`.
    pub fn reset_box(&mut self, value: Box<T>) {
        self.reset();
        *self = SharedPtrl::from_box(value);
    }
}

impl<'a, T: ?Sized, C: Counter> SharedPtrl<'a, T, C> {
    /// An empty handle. Owns nothing and has a use count of 0.
    pub const fn null() -> Self {
        SharedPtrl {
            raw: None,
            phantom: PhantomData,
        }
    }

    fn from_parts(header: NonNull<Header<C>>, ptr: NonNull<T>) -> Self {
        SharedPtrl {
            raw: Some(Raw { header, ptr }),
            phantom: PhantomData,
        }
    }

    /// Return a handle to any `U` reachable from `T`, e.g. a field, an
    /// element of a slice, or a `&dyn` view of the object.
    ///
    /// The result takes over `this`'s share of the cell, so the use count
    /// does not change. An empty handle projects to an empty handle without
    /// calling `f`.
    ///
    /// The result keeps `'a`: `f` may hand back something that lives only as
    /// long as a reference stored in `T`, and `T: 'a` bounds that.
    pub fn project<U, F>(this: Self, f: F) -> SharedPtrl<'a, U, C>
    where
        T: 'a,
        U: ?Sized + 'a,
        F: FnOnce(&T) -> &U,
    {
        let Some(raw) = this.raw else {
            return SharedPtrl::null();
        };
        // Safety: we own a count, so the value is alive.
        let ptr = NonNull::from(f(unsafe { raw.ptr.as_ref() }));
        // Forget `this` so it doesn't decrement the count, since we moved
        // its share into the result.
        mem::forget(this);
        SharedPtrl::from_parts(raw.header, ptr)
    }

    /// A new handle sharing this one's cell but showing `ptr`. Empty if the
    /// cell refuses another owner.
    ///
    /// `ptr` must be kept alive by this handle's cell, for no longer than `'a`.
    pub(crate) fn aliased<U: ?Sized>(&self, ptr: NonNull<U>) -> SharedPtrl<'a, U, C> {
        match self.raw {
            Some(raw) if self.header().is_some_and(Header::increment) => {
                SharedPtrl::from_parts(raw.header, ptr)
            }
            _ => SharedPtrl::null(),
        }
    }

    /// Returns the value, or `None` for an empty handle. Ownership is not
    /// affected.
    pub fn get(&self) -> Option<&T> {
        // Safety: ptr stays valid as long as we hold our count; there's just
        // no way to spell that lifetime in Rust.
        self.raw.map(|raw| unsafe { &*raw.ptr.as_ptr() })
    }

    fn header(&self) -> Option<&Header<C>> {
        // Safety: header is valid as long as we hold our count.
        self.raw.map(|raw| unsafe { &*raw.header.as_ptr() })
    }

    /// Number of handles sharing this one's cell, or 0 for an empty handle.
    ///
    /// Other threads may change the count at any time, so treat the result
    /// as a snapshot.
    pub fn use_count(&self) -> usize {
        self.header().map_or(0, Header::use_count)
    }

    /// Returns true if the handle is empty. Same as `== Null`.
    pub fn is_null(&self) -> bool {
        self.raw.is_none()
    }

    /// Returns true if the handle owns a value.
    pub fn is_some(&self) -> bool {
        self.raw.is_some()
    }

    /// Releases this handle's share (destroying the value if it was the
    /// last) and leaves the handle empty.
    pub fn reset(&mut self) {
        *self = SharedPtrl::null();
    }

    /// Moves the contents out, leaving this handle empty. The use count is
    /// unchanged.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Returns true if two handles show the same address. Same as `==`.
    ///
    /// This is not the same as sharing ownership: two handles from different
    /// cells can show the same static object, and two handles from one cell
    /// can show different fields.
    pub fn ptr_eq<U: ?Sized>(this: &Self, other: &SharedPtrl<'_, U, C>) -> bool {
        this.addr() == other.addr()
    }

    /// Returns true if two handles share a cell, i.e. own the same value,
    /// whatever they show. Empty handles share nothing.
    pub fn same_cell<U: ?Sized>(this: &Self, other: &SharedPtrl<'_, U, C>) -> bool {
        match (this.raw, other.raw) {
            (Some(a), Some(b)) => a.header == b.header,
            _ => false,
        }
    }

    fn addr(&self) -> *const () {
        self.raw
            .map_or(ptr::null(), |raw| raw.ptr.as_ptr() as *const ())
    }
}

impl<'a, T: ?Sized, C: Counter> Clone for SharedPtrl<'a, T, C> {
    fn clone(&self) -> Self {
        match self.raw {
            Some(raw) => self.aliased(raw.ptr),
            None => SharedPtrl::null(),
        }
    }
}

impl<'a, T: ?Sized, C: Counter> Drop for SharedPtrl<'a, T, C> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            // Safety: a non-empty handle owns one count of its cell.
            unsafe { Header::release(raw.header) }
        }
    }
}

impl<'a, T: ?Sized, C: Counter> Default for SharedPtrl<'a, T, C> {
    fn default() -> Self {
        SharedPtrl::null()
    }
}

impl<'a, T: ?Sized, C: Counter> Deref for SharedPtrl<'a, T, C> {
    type Target = T;

    /// # Panics
    /// If the handle is empty.
    fn deref(&self) -> &T {
        match self.get() {
            Some(v) => v,
            None => panic!("dereferenced an empty SharedPtr"),
        }
    }
}

impl<'a, T: ?Sized + Send + Sync + 'a, C: Counter> From<Box<T>> for SharedPtrl<'a, T, C> {
    fn from(value: Box<T>) -> Self {
        SharedPtrl::from_box(value)
    }
}

// Handles compare by the address they show, not by value and not by cell.
impl<'a, 'b, T: ?Sized, U: ?Sized, C: Counter> PartialEq<SharedPtrl<'b, U, C>>
    for SharedPtrl<'a, T, C>
{
    #[inline]
    fn eq(&self, other: &SharedPtrl<'b, U, C>) -> bool {
        SharedPtrl::ptr_eq(self, other)
    }
}

impl<'a, T: ?Sized, C: Counter> Eq for SharedPtrl<'a, T, C> {}

impl<'a, T: ?Sized, C: Counter> PartialEq<Null> for SharedPtrl<'a, T, C> {
    fn eq(&self, _: &Null) -> bool {
        self.is_null()
    }
}

impl<'a, T: ?Sized, C: Counter> PartialEq<SharedPtrl<'a, T, C>> for Null {
    fn eq(&self, other: &SharedPtrl<'a, T, C>) -> bool {
        other.is_null()
    }
}

impl<'a, T: ?Sized, C: Counter> Hash for SharedPtrl<'a, T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl<'a, T: ?Sized + fmt::Debug, C: Counter> fmt::Debug for SharedPtrl<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => fmt::Debug::fmt(v, f),
            None => f.write_str("null"),
        }
    }
}

impl<'a, T: ?Sized, C: Counter> fmt::Pointer for SharedPtrl<'a, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.addr(), f)
    }
}
