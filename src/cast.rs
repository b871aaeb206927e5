//! Conversions between handles of different types that share one cell.
//!
//! [`static_pointer_cast`] always succeeds: the conversion is a closure the
//! compiler checks, typically an unsizing cast like `|d| d as &dyn Shape` or
//! a field access. [`dynamic_pointer_cast`] checks the concrete type at
//! runtime through [`Any`] and gives an empty handle when it doesn't match.
//!
//! ```
//! use sharedptr::{dynamic_pointer_cast, static_pointer_cast, AsAny, AtomicSharedPtr, SharedPtr};
//!
//! trait Shape: AsAny {
//!     fn area(&self) -> f64;
//! }
//!
//! struct Square(f64);
//! impl Shape for Square {
//!     fn area(&self) -> f64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! let square = AtomicSharedPtr::new(Square(2.0));
//! let shape: SharedPtr<dyn Shape> = static_pointer_cast(&square, |s| s as &dyn Shape);
//! assert_eq!(shape.area(), 4.0);
//! assert_eq!(square.use_count(), 2);
//!
//! let back: SharedPtr<Square> = dynamic_pointer_cast(&shape);
//! assert!(back == square);
//! assert_eq!(square.use_count(), 3);
//!
//! let wrong: SharedPtr<String> = dynamic_pointer_cast(&shape);
//! assert!(wrong.is_null());
//! assert_eq!(wrong.use_count(), 0);
//! assert_eq!(square.use_count(), 3);
//! ```
use crate::{Counter, SharedPtrl};
use core::{any::Any, ptr::NonNull};

/// Gives a `&dyn Any` view of the concrete value behind a reference, even
/// when the reference itself is a trait object.
///
/// Implemented for every sized `'static` type and for `dyn Any` itself. To
/// make [`dynamic_pointer_cast`] work from your own trait objects, make
/// `AsAny` a supertrait of the trait.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AsAny for dyn Any {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AsAny for dyn Any + Send {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AsAny for dyn Any + Send + Sync {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Returns a handle to `f(sp)` that shares `sp`'s cell, adding one to its
/// count. An empty `sp` gives an empty handle without calling `f`.
pub fn static_pointer_cast<'a, T, U, C, F>(sp: &SharedPtrl<'a, U, C>, f: F) -> SharedPtrl<'a, T, C>
where
    T: ?Sized + 'a,
    U: ?Sized + 'a,
    C: Counter,
    F: FnOnce(&U) -> &T,
{
    SharedPtrl::project(sp.clone(), f)
}

/// Returns a handle to `sp`'s value as a `T` sharing `sp`'s cell, if the
/// value's concrete type is `T`. Otherwise returns an empty handle, and
/// `sp`'s count is not touched.
pub fn dynamic_pointer_cast<'a, T, U, C>(sp: &SharedPtrl<'a, U, C>) -> SharedPtrl<'a, T, C>
where
    T: Any,
    U: ?Sized + AsAny + 'a,
    C: Counter,
{
    dynamic_pointer_cast_with(sp, |u| AsAny::as_any(u).downcast_ref::<T>())
}

/// Like [`dynamic_pointer_cast`], with the runtime check supplied by `f`.
/// `f` runs once; `None` gives an empty handle.
pub fn dynamic_pointer_cast_with<'a, T, U, C, F>(
    sp: &SharedPtrl<'a, U, C>,
    f: F,
) -> SharedPtrl<'a, T, C>
where
    T: ?Sized + 'a,
    U: ?Sized + 'a,
    C: Counter,
    F: FnOnce(&U) -> Option<&T>,
{
    match sp.get().and_then(f) {
        Some(t) => sp.aliased(NonNull::from(t)),
        None => SharedPtrl::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atomic, Locked, SharedPtr};
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
    use std::{boxed::Box, format, string::String, sync::Arc};

    trait Base: AsAny + Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Derived(Arc<AtomicUsize>);
    impl Base for Derived {
        fn name(&self) -> &'static str {
            "derived"
        }
    }
    impl Drop for Derived {
        fn drop(&mut self) {
            self.0.fetch_add(1, SeqCst);
        }
    }

    struct Other;
    impl Base for Other {
        fn name(&self) -> &'static str {
            "other"
        }
    }

    fn derived() -> (SharedPtr<Derived, Atomic>, Arc<AtomicUsize>) {
        let n = Arc::new(AtomicUsize::new(0));
        (SharedPtr::new(Derived(n.clone())), n)
    }

    #[test]
    fn test_static_cast_shares_cell() {
        let (d, n) = derived();
        let b: SharedPtr<dyn Base> = static_pointer_cast(&d, |x| x as &dyn Base);
        assert_eq!(b.name(), "derived");
        assert_eq!((d.use_count(), b.use_count()), (2, 2));
        assert!(SharedPtr::same_cell(&d, &b));
        assert!(b == d);

        drop(d);
        assert_eq!(b.use_count(), 1);
        assert_eq!(n.load(SeqCst), 0);
        drop(b);
        assert_eq!(n.load(SeqCst), 1);
    }

    #[test]
    fn test_static_cast_empty() {
        let e: SharedPtr<Derived> = SharedPtr::null();
        let b: SharedPtr<dyn Base> = static_pointer_cast(&e, |x| x as &dyn Base);
        assert!(b.is_null());
        assert_eq!(b.use_count(), 0);
    }

    #[test]
    fn test_dynamic_cast() {
        let (d, _n) = derived();
        let b: SharedPtr<dyn Base> = static_pointer_cast(&d, |x| x as &dyn Base);

        let back: SharedPtr<Derived> = dynamic_pointer_cast(&b);
        assert!(back == d);
        assert_eq!(d.use_count(), 3);

        let other: SharedPtr<Other> = dynamic_pointer_cast(&b);
        assert!(other.is_null());
        assert_eq!(other.use_count(), 0);
        assert_eq!(b.use_count(), 3);
    }

    #[test]
    fn test_dynamic_cast_from_concrete() {
        let (d, _n) = derived();
        let same: SharedPtr<Derived> = dynamic_pointer_cast(&d);
        assert_eq!(same.use_count(), 2);

        let wrong: SharedPtr<String> = dynamic_pointer_cast(&d);
        assert!(wrong.is_null());
        assert_eq!(d.use_count(), 2);
    }

    #[test]
    fn test_dynamic_cast_dyn_any() {
        let b: Box<dyn Any + Send + Sync> = Box::new(5u32);
        let any: SharedPtr<dyn Any + Send + Sync, Locked> = SharedPtr::from_box(b);
        let n: SharedPtr<u32, Locked> = dynamic_pointer_cast(&any);
        assert_eq!(*n, 5);
        assert_eq!(any.use_count(), 2);
        let s: SharedPtr<i64, Locked> = dynamic_pointer_cast(&any);
        assert!(s.is_null());
    }

    #[test]
    fn test_casts_of_borrowed_value() {
        struct Borrowing<'n>(&'n AtomicUsize, u32);
        impl Drop for Borrowing<'_> {
            fn drop(&mut self) {
                self.0.fetch_add(1, SeqCst);
            }
        }

        let n = AtomicUsize::new(0);
        {
            let b = SharedPtrl::<_, Atomic>::new(Borrowing(&n, 7));
            let field = static_pointer_cast(&b, |x| &x.1);
            drop(b);
            assert_eq!(*field, 7);
            assert_eq!(field.use_count(), 1);

            let shown = dynamic_pointer_cast_with(&field, |x| Some(x as &dyn core::fmt::Debug));
            assert_eq!(format!("{:?}", shown), "7");
            assert_eq!(field.use_count(), 2);
            assert_eq!(n.load(SeqCst), 0);
        }
        assert_eq!(n.load(SeqCst), 1);
    }

    #[test]
    fn test_dynamic_cast_with_runs_once() {
        let p: SharedPtr<(u8, Option<u8>)> = SharedPtr::new((1, Some(2)));
        let mut calls = 0;
        let q = dynamic_pointer_cast_with(&p, |x| {
            calls += 1;
            x.1.as_ref()
        });
        assert_eq!(calls, 1);
        assert_eq!(*q, 2);
        assert_eq!(p.use_count(), 2);

        let r: SharedPtr<u8> = dynamic_pointer_cast_with(&p, |_| None);
        assert!(r.is_null());
        assert_eq!(p.use_count(), 2);
    }
}
