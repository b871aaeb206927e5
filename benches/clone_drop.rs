use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sharedptr::{
    dynamic_pointer_cast, static_pointer_cast, AtomicSharedPtr, LockedSharedPtr, SharedPtr,
};
use std::any::Any;
use std::thread;

fn bench_clone_drop(c: &mut Criterion) {
    let atomic = AtomicSharedPtr::new(0u64);
    c.bench_function("atomic_clone_drop", |b| {
        b.iter(|| black_box(atomic.clone()))
    });

    let locked = LockedSharedPtr::new(0u64);
    c.bench_function("locked_clone_drop", |b| {
        b.iter(|| black_box(locked.clone()))
    });

    let std_arc = std::sync::Arc::new(0u64);
    c.bench_function("std_arc_clone_drop", |b| {
        b.iter(|| black_box(std_arc.clone()))
    });
}

fn bench_contended(c: &mut Criterion) {
    fn storm<T: Clone + Send + Sync + 'static>(p: &T) {
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        black_box(p.clone());
                    }
                });
            }
        });
    }

    let atomic = AtomicSharedPtr::new(0u64);
    c.bench_function("atomic_contended_4x1000", |b| b.iter(|| storm(&atomic)));

    let locked = LockedSharedPtr::new(0u64);
    c.bench_function("locked_contended_4x1000", |b| b.iter(|| storm(&locked)));
}

fn bench_casts(c: &mut Criterion) {
    let p = AtomicSharedPtr::new(0u64);
    let any: SharedPtr<dyn Any + Send + Sync> = static_pointer_cast(&p, |x| x as &(dyn Any + Send + Sync));

    c.bench_function("static_pointer_cast", |b| {
        b.iter(|| {
            let q: SharedPtr<dyn Any + Send + Sync> =
                static_pointer_cast(&p, |x| x as &(dyn Any + Send + Sync));
            black_box(q)
        })
    });
    c.bench_function("dynamic_pointer_cast_hit", |b| {
        b.iter(|| black_box(dynamic_pointer_cast::<u64, _, _>(&any)))
    });
    c.bench_function("dynamic_pointer_cast_miss", |b| {
        b.iter(|| black_box(dynamic_pointer_cast::<u32, _, _>(&any)))
    });
}

criterion_group!(benches, bench_clone_drop, bench_contended, bench_casts);
criterion_main!(benches);
