/*!
This crate provides [`SharedPtr<T>`], a thread-safe reference-counted pointer
modelled on C++'s
[`shared_ptr`](https://en.cppreference.com/w/cpp/memory/shared_ptr): it can be
empty, it compares by address, and handles of different types can share
ownership of one object.

```rust
    use sharedptr::{static_pointer_cast, AtomicSharedPtr, SharedPtr};
    use std::fmt::Debug;

    let a: SharedPtr<[i32; 3]> = AtomicSharedPtr::new([1, 2, 3]);
    assert_eq!(a.use_count(), 1);

    // view the same object as a trait object; both handles own it
    let b: SharedPtr<dyn Debug> = static_pointer_cast(&a, |x| x as &dyn Debug);
    assert_eq!(a.use_count(), 2);
    assert_eq!(format!("{:?}", b), "[1, 2, 3]");

    // or as one of its elements
    let c: SharedPtr<i32> = SharedPtr::project(a, |x| &x[1]);
    assert_eq!(*c, 2);
    assert_eq!(c.use_count(), 2);
```

# Ownership

Every allocation gets one *cell* holding the owner count. The cell is created
for the concrete type of the value and remembers how to destroy it, so the
value is always destroyed correctly, whatever type the last handle sees it as:

```
    use sharedptr::{static_pointer_cast, AtomicSharedPtr, SharedPtr};
    use std::sync::atomic::{AtomicBool, Ordering};

    static DROPPED: AtomicBool = AtomicBool::new(false);

    trait Base {}
    struct Derived;
    impl Base for Derived {}
    impl Drop for Derived {
        fn drop(&mut self) {
            DROPPED.store(true, Ordering::SeqCst);
        }
    }

    let derived = AtomicSharedPtr::new(Derived);
    let base: SharedPtr<dyn Base> = static_pointer_cast(&derived, |d| d as &dyn Base);
    assert_eq!(base.use_count(), 2);

    drop(derived);
    assert_eq!(base.use_count(), 1);
    assert!(!DROPPED.load(Ordering::SeqCst));

    drop(base);
    assert!(DROPPED.load(Ordering::SeqCst));
```

Two handles share ownership iff they share a cell
([`SharedPtrl::same_cell`]). `==` asks a different question: whether they
show the same address.

# Empty handles

Unlike `std::sync::Arc`, a `SharedPtr` can be empty ([`SharedPtrl::null`],
`Default`). An empty handle owns nothing and has a use count of 0.
[`SharedPtrl::get`] returns `None` for it; dereferencing it panics.

```
    use sharedptr::{Null, SharedPtr};

    let mut p: SharedPtr<String> = SharedPtr::new("hello".to_string());
    let q = p.take();
    assert!(p == Null);
    assert_eq!(p.use_count(), 0);
    assert_eq!(q.use_count(), 1);

    p.reset_with("again".to_string());
    assert_eq!(p.get().map(String::as_str), Some("again"));
```

# Borrowed values

[`SharedPtr<T>`] is an alias for [`SharedPtrl<'static, T>`][SharedPtrl]. A value
that borrows something goes in a `SharedPtrl<'a, T>`, which can't outlive the
borrow. Casts and projections keep the `'a` of their source.

Values must be `Send + Sync` (like `std::sync::Arc`'s requirement for its own
`Send`), since the last handle can be dropped on any thread and a cast can
hide what the value was.

# Counters

`SharedPtr<T, C>` is generic over how the count is kept. Both counters are
safe to share between threads:

* [`Atomic`] (the default, alias [`AtomicSharedPtr`]) uses a lock-free
  atomic integer.
* [`Locked`] (alias [`LockedSharedPtr`]) keeps the count behind a spin lock
  inside the cell.

Either way the last owner, and only the last owner, destroys the value, and
a count that reached zero is never brought back.

# Casts

[`static_pointer_cast`] converts through a closure the compiler checks, and
always succeeds. [`dynamic_pointer_cast`] checks the concrete type at runtime
through [`core::any::Any`] and returns an empty handle if it doesn't match.
See the [`cast`] module for an example with a user trait.

# Notes

There are no weak pointers, and nothing breaks reference cycles.

If you leak so many handles that the count overflows, `std::sync::Arc` aborts.
`SharedPtr` does not, because there is no `abort()` with `no_std`.

The library logs through the [`log`](https://docs.rs/log) facade: cell
creation and collapse at `trace` level, and lifecycle bugs (a count moving
after it reached zero) at `error` level.
*/
#![no_std]
#[cfg(test)]
extern crate std;

extern crate alloc;

pub mod atomic;
pub mod cast;
mod cell;
pub mod locked;
mod shared_ptr;

pub use self::atomic::{Atomic, AtomicSharedPtr};
pub use self::cast::{dynamic_pointer_cast, dynamic_pointer_cast_with, static_pointer_cast, AsAny};
pub use self::cell::Counter;
pub use self::locked::{Locked, LockedSharedPtr};
pub use self::shared_ptr::{Null, SharedPtr, SharedPtrl};
