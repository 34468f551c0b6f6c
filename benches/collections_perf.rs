//! Benchmarks for the concurrent collections and method dispatch.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use corvid::interpreter::{ConcurrentArrayObject, ConcurrentHashObject, Object, Vm};

fn concurrent_array(len: i64) -> Object {
    let elements = (0..len).map(Object::integer).collect();
    Object::ConcurrentArray(Arc::new(ConcurrentArrayObject::new(elements)))
}

/// Threads hammering one `Concurrent::Hash` on disjoint keys.
fn hash_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_hash_contention");
    let vm = Vm::with_defaults();

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let map = Object::ConcurrentHash(Arc::new(ConcurrentHashObject::new(None)));
                crossbeam::scope(|s| {
                    for worker in 0..threads {
                        let vm = &vm;
                        let map = &map;
                        s.spawn(move |_| {
                            let mut t = vm.new_thread();
                            for i in 0..1_000 {
                                let key = Object::string(format!("{}-{}", worker, i));
                                t.send(map, "[]=", 1, &[key.clone(), Object::integer(i)], None);
                                black_box(t.send(map, "[]", 1, &[key], None));
                            }
                        });
                    }
                })
                .unwrap();
            })
        });
    }
    group.finish();
}

/// Readers and one writer sharing a `Concurrent::Array`.
fn array_read_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_array_read_write");
    let vm = Vm::with_defaults();

    for readers in [1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(readers), &readers, |b, &readers| {
            b.iter(|| {
                let array = concurrent_array(100);
                crossbeam::scope(|s| {
                    for _ in 0..readers {
                        let vm = &vm;
                        let array = &array;
                        s.spawn(move |_| {
                            let mut t = vm.new_thread();
                            for i in 0..500 {
                                let index = Object::integer(i % 100);
                                black_box(t.send(array, "[]", 1, &[index], None));
                            }
                        });
                    }
                    let vm = &vm;
                    let array = &array;
                    s.spawn(move |_| {
                        let mut t = vm.new_thread();
                        for i in 0..500 {
                            t.send(array, "push", 1, &[Object::integer(i)], None);
                        }
                    });
                })
                .unwrap();
            })
        });
    }
    group.finish();
}

/// Plain dispatch cost: builtin method, singleton override, method_missing.
fn dispatch(c: &mut Criterion) {
    let vm = Vm::with_defaults();
    let mut t = vm.new_thread();
    let array = Object::array((0..10).map(Object::integer).collect());
    let patched = Object::array(vec![]);
    patched.ensure_singleton_class().define_method(corvid::interpreter::MethodObject::new(
        "length",
        |_, _, _, _, _| Object::integer(0),
    ));

    c.bench_function("dispatch_builtin", |b| {
        b.iter(|| black_box(t.send(&array, "length", 1, &[], None)))
    });
    c.bench_function("dispatch_singleton", |b| {
        b.iter(|| black_box(t.send(&patched, "length", 1, &[], None)))
    });
    c.bench_function("dispatch_no_method", |b| {
        b.iter(|| black_box(t.send(&array, "missing", 1, &[], None)))
    });
}

criterion_group!(benches, hash_contention, array_read_write, dispatch);
criterion_main!(benches);
