//! Runtime tests spanning dispatch, equality and the concurrent collections.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use crate::config::VmConfig;
    use crate::error::ErrorKind;
    use crate::interpreter::builtins::concurrent::{ConcurrentArrayObject, ConcurrentHashObject};
    use crate::interpreter::class::Class;
    use crate::interpreter::method::MethodObject;
    use crate::interpreter::object::Object;
    use crate::interpreter::thread::{BlockFrame, Thread};
    use crate::interpreter::vm::Vm;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn returning(name: &str, text: &'static str) -> Arc<MethodObject> {
        MethodObject::new(name, move |_, _, _, _, _| Object::string(text))
    }

    fn instantiate(t: &mut Thread, class: &Arc<Class>) -> Object {
        t.send(&Object::Class(class.clone()), "new", 1, &[], None)
    }

    fn concurrent(values: impl IntoIterator<Item = i64>) -> Object {
        let elements = values.into_iter().map(Object::integer).collect();
        Object::ConcurrentArray(Arc::new(ConcurrentArrayObject::new(elements)))
    }

    fn length(t: &mut Thread, obj: &Object) -> i64 {
        t.send(obj, "length", 1, &[], None)
            .as_integer()
            .expect("length is an integer")
    }

    // Dispatch

    #[test]
    fn test_singleton_method_wins_over_class_method() {
        init_logging();
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let class = vm.define_class("Greeter", None);
        class.define_method(returning("greet", "class"));

        let patched = instantiate(&mut t, &class);
        let plain = instantiate(&mut t, &class);
        patched
            .ensure_singleton_class()
            .define_method(returning("greet", "singleton"));

        assert_eq!(t.send(&patched, "greet", 1, &[], None).as_str(), Some("singleton"));
        assert_eq!(t.send(&plain, "greet", 1, &[], None).as_str(), Some("class"));

        patched
            .singleton_class()
            .expect("singleton class exists")
            .remove_method("greet");
        assert_eq!(t.send(&patched, "greet", 1, &[], None).as_str(), Some("class"));
    }

    #[test]
    fn test_ancestor_methods_are_found() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let animal = vm.define_class("Animal", None);
        let dog = vm.define_class("Dog", Some(animal.clone()));
        animal.define_method(returning("speak", "..."));

        let rex = instantiate(&mut t, &dog);
        assert_eq!(t.send(&rex, "speak", 1, &[], None).as_str(), Some("..."));
        dog.define_method(returning("speak", "woof"));
        assert_eq!(t.send(&rex, "speak", 1, &[], None).as_str(), Some("woof"));
    }

    #[test]
    fn test_undefined_method_is_no_method_error() {
        init_logging();
        let config = VmConfig {
            trace_dispatch: true,
            ..VmConfig::default()
        };
        let vm = Vm::new(config).unwrap();
        let mut t = vm.new_thread();
        let class = vm.define_class("Ghost", None);
        let ghost = instantiate(&mut t, &class);

        let result = t.send(&ghost, "boo", 7, &[], None);
        let err = result.as_error().expect("error object");
        assert_eq!(err.kind(), ErrorKind::NoMethodError);
        assert_eq!(err.source_line(), 7);
        assert_eq!(
            err.message(),
            format!("Undefined Method 'boo' for #<Ghost:{} >", ghost.id())
        );
    }

    #[test]
    fn test_method_missing_receives_name_first() {
        init_logging();
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let class = vm.define_class("Proxy", None);
        class.define_method(MethodObject::new("method_missing", |_, _, _, args, _| {
            Object::string(format!("{} with {} args", args[0], args.len() - 1))
        }));
        let proxy = instantiate(&mut t, &class);

        assert!(proxy.find_method("anything").is_none());
        let result = t.send(&proxy, "anything", 1, &[Object::integer(1), Object::null()], None);
        assert_eq!(result.as_str(), Some("anything with 2 args"));
    }

    #[test]
    fn test_inherited_method_missing_needs_ancestor_search() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let parent = vm.define_class("Base", None);
        parent.define_method(returning("method_missing", "parent hook"));
        let child = vm.define_class("Derived", Some(parent));
        let obj = instantiate(&mut t, &child);

        assert!(obj.find_method_missing(false).is_none());
        assert!(obj.find_method_missing(true).is_some());
        assert_eq!(t.send(&obj, "nope", 1, &[], None).as_str(), Some("parent hook"));
    }

    #[test]
    fn test_singleton_method_missing_wins() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let class = vm.define_class("Hooked", None);
        class.define_method(returning("method_missing", "class hook"));
        let obj = instantiate(&mut t, &class);
        let other = instantiate(&mut t, &class);
        obj.ensure_singleton_class()
            .define_method(returning("method_missing", "singleton hook"));

        assert_eq!(t.send(&obj, "x", 1, &[], None).as_str(), Some("singleton hook"));
        assert_eq!(t.send(&other, "x", 1, &[], None).as_str(), Some("class hook"));
    }

    // Equality

    #[test]
    fn test_default_equality_is_structural() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let point = vm.define_class("Pt", None);
        let other = vm.define_class("OtherPt", None);

        let a = instantiate(&mut t, &point);
        let b = instantiate(&mut t, &point);
        let c = instantiate(&mut t, &other);
        for obj in [&a, &b, &c] {
            obj.instance_variable_set("@x", Object::integer(1));
            obj.instance_variable_set("@tags", Object::array(vec![Object::string("t")]));
        }

        assert!(a.equal_to(&b));
        assert!(!a.is_same(&b));
        assert!(!a.equal_to(&c));
        assert!(t.send(&a, "==", 1, &[b.clone()], None).is_truthy());
        assert!(t.send(&a, "!=", 1, &[c.clone()], None).is_truthy());

        b.instance_variable_set("@x", Object::integer(2));
        assert!(!a.equal_to(&b));
        assert!(!a.equal_to(&Object::null()));
    }

    #[test]
    fn test_equality_terminates_on_self_references() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let node = vm.define_class("Node", None);

        let a = instantiate(&mut t, &node);
        let b = instantiate(&mut t, &node);
        a.instance_variable_set("@me", a.clone());
        b.instance_variable_set("@me", b.clone());
        assert!(a.equal_to(&b));
        assert!(t.send(&a, "==", 1, &[b.clone()], None).is_truthy());

        a.instance_variable_set("@v", Object::integer(1));
        b.instance_variable_set("@v", Object::integer(2));
        assert!(!a.equal_to(&b));

        let xs = Object::array(vec![Object::integer(1)]);
        let ys = Object::array(vec![Object::integer(1)]);
        t.send(&xs, "push", 1, &[xs.clone()], None);
        t.send(&ys, "push", 1, &[ys.clone()], None);
        assert!(xs.equal_to(&ys));

        let h1 = Object::hash(Default::default());
        let h2 = Object::hash(Default::default());
        t.send(&h1, "[]=", 1, &[Object::string("self"), h1.clone()], None);
        t.send(&h2, "[]=", 1, &[Object::string("self"), h2.clone()], None);
        assert!(h1.equal_to(&h2));

        let ca = concurrent([1]);
        let cb = concurrent([1]);
        t.send(&ca, "push", 1, &[ca.clone()], None);
        t.send(&cb, "push", 1, &[cb.clone()], None);
        assert!(ca.equal_to(&cb));
        t.send(&cb, "push", 1, &[Object::integer(3)], None);
        assert!(!ca.equal_to(&cb));
    }

    // Concurrent::Hash

    #[test]
    fn test_concurrent_hash_under_load() {
        init_logging();
        let vm = Vm::with_defaults();
        let map = Object::ConcurrentHash(Arc::new(ConcurrentHashObject::new(None)));

        crossbeam::scope(|s| {
            for worker in 0..8 {
                let vm = &vm;
                let map = &map;
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    for i in 0..500 {
                        let key = Object::string(format!("w{}-{}", worker, i));
                        let value = Object::string(format!("value-{}-{}", worker, i));
                        t.send(map, "[]=", 1, &[key.clone(), value.clone()], None);
                        let read = t.send(map, "[]", 1, &[key.clone()], None);
                        assert!(read.equal_to(&value), "torn read for {}", key);
                        if i % 2 == 0 {
                            t.send(map, "delete", 1, &[key.clone()], None);
                            assert!(t.send(map, "[]", 1, &[key], None).is_null());
                        }
                    }
                });
            }
        })
        .unwrap();

        match &map {
            Object::ConcurrentHash(hash) => assert_eq!(hash.snapshot().len(), 8 * 250),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_hash_each_never_repeats_a_key() {
        let hash = Arc::new(ConcurrentHashObject::new(None));
        for i in 0..200 {
            hash.set(format!("seed{}", i), Object::integer(i));
        }

        crossbeam::scope(|s| {
            let writer = hash.clone();
            s.spawn(move |_| {
                for i in 0..2000 {
                    writer.set(format!("new{}", i), Object::integer(i));
                    if i % 3 == 0 {
                        writer.delete(&format!("seed{}", i % 200));
                    }
                }
            });

            let reader = hash.clone();
            s.spawn(move |_| {
                for _ in 0..20 {
                    let mut seen = HashSet::new();
                    reader
                        .each(|key, value| {
                            assert!(seen.insert(key.to_string()), "{} visited twice", key);
                            assert!(value.as_integer().is_some());
                            Ok::<(), ()>(())
                        })
                        .unwrap();
                }
            });
        })
        .unwrap();
    }

    // Concurrent::Array

    #[test]
    fn test_push_and_length_are_mutually_exclusive() {
        let vm = Vm::with_defaults();
        for _ in 0..200 {
            let array = concurrent([1, 2, 3]);
            crossbeam::scope(|s| {
                let vm = &vm;
                let array = &array;
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    t.send(array, "push", 1, &[Object::integer(4)], None);
                });
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    let len = length(&mut t, array);
                    assert!(len == 3 || len == 4, "observed length {}", len);
                });
            })
            .unwrap();
            assert_eq!(array.inspect(), "[1, 2, 3, 4]");
        }
    }

    #[test]
    fn test_concurrent_pushes_are_not_lost() {
        let vm = Vm::with_defaults();
        let array = concurrent(Vec::new());
        crossbeam::scope(|s| {
            for worker in 0..8 {
                let vm = &vm;
                let array = &array;
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    for i in 0..100 {
                        t.send(array, "push", 1, &[Object::integer(worker * 100 + i)], None);
                    }
                });
            }
        })
        .unwrap();

        let mut t = vm.new_thread();
        assert_eq!(length(&mut t, &array), 800);
    }

    #[test]
    fn test_select_returns_independent_concurrent_array() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let source = concurrent(0..10);
        let even = BlockFrame::new(1, |_, args| {
            Object::boolean(args[0].as_integer().unwrap_or(1) % 2 == 0)
        });

        let selected = t.send(&source, "select", 1, &[], Some(&even));
        assert_eq!(selected.class_name(), "Concurrent::Array");
        assert_eq!(selected.inspect(), "[0, 2, 4, 6, 8]");

        crossbeam::scope(|s| {
            for _ in 0..4 {
                let vm = &vm;
                let selected = &selected;
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    for i in 0..25 {
                        t.send(selected, "push", 1, &[Object::integer(i)], None);
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(length(&mut t, &selected), 105);
        assert_eq!(length(&mut t, &source), 10);
    }

    #[test]
    fn test_readers_run_side_by_side() {
        let vm = Vm::with_defaults();
        let array = concurrent([1, 2, 3]);
        let (entered_tx, entered_rx) = crossbeam::channel::bounded::<()>(2);
        let (release_tx, release_rx) = crossbeam::channel::bounded::<()>(2);

        crossbeam::scope(|s| {
            for _ in 0..2 {
                let vm = &vm;
                let array = &array;
                let entered_tx = entered_tx.clone();
                let release_rx = release_rx.clone();
                s.spawn(move |_| {
                    let mut t = vm.new_thread();
                    let block = BlockFrame::new(1, move |_, _| {
                        let _ = entered_tx.send(());
                        let _ = release_rx.recv_timeout(Duration::from_secs(5));
                        Object::boolean(true)
                    });
                    t.send(array, "any?", 1, &[], Some(&block));
                });
            }

            // Both readers get inside the shared lock before either leaves.
            for _ in 0..2 {
                assert!(entered_rx.recv_timeout(Duration::from_secs(5)).is_ok());
            }
            for _ in 0..2 {
                release_tx.send(()).unwrap();
            }
        })
        .unwrap();
    }

    #[test]
    fn test_concat_with_itself_returns() {
        let vm = Vm::with_defaults();
        let array = concurrent([1]);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(1);

        let worker_vm = vm.clone();
        let target = array.clone();
        std::thread::spawn(move || {
            let mut t = worker_vm.new_thread();
            t.send(&target, "concat", 1, &[target.clone()], None);
            let sum = t.send(&target, "+", 1, &[target.clone()], None);
            assert_eq!(sum.inspect(), "[1, 1, 1, 1]");
            let _ = done_tx.send(());
        });

        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert_eq!(array.inspect(), "[1, 1]");
    }

    #[test]
    fn test_crossed_concats_do_not_deadlock() {
        let vm = Vm::with_defaults();
        let a = concurrent([1]);
        let b = concurrent([2]);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(2);

        for (receiver, argument) in [(a.clone(), b.clone()), (b.clone(), a.clone())] {
            let worker_vm = vm.clone();
            let done_tx = done_tx.clone();
            std::thread::spawn(move || {
                let mut t = worker_vm.new_thread();
                for _ in 0..200 {
                    t.send(&receiver, "concat", 1, &[argument.clone()], None);
                    t.send(&receiver, "clear", 1, &[], None);
                    t.send(&receiver, "push", 1, &[Object::integer(0)], None);
                }
                let _ = done_tx.send(());
            });
        }

        for _ in 0..2 {
            assert!(done_rx.recv_timeout(Duration::from_secs(10)).is_ok());
        }
        let mut t = vm.new_thread();
        assert_eq!(length(&mut t, &a), 1);
        assert_eq!(length(&mut t, &b), 1);
    }

    #[test]
    fn test_forwarded_repeat_past_max_length_is_argument_error() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let array = concurrent([1, 2, 3]);
        let err = t.send(&array, "*", 4, &[Object::integer(i64::MAX)], None);
        assert_eq!(err.as_error().unwrap().kind(), ErrorKind::ArgumentError);
        let err = t.send(&array, "[]=", 4, &[Object::integer(1 << 40), Object::null()], None);
        assert_eq!(err.as_error().unwrap().kind(), ErrorKind::ArgumentError);
        assert_eq!(length(&mut t, &array), 3);
    }

    #[test]
    fn test_block_reentering_a_writer_deadlocks() {
        init_logging();
        let vm = Vm::with_defaults();
        let array = concurrent([1, 2]);
        let (done_tx, done_rx) = crossbeam::channel::bounded::<()>(1);

        let worker_vm = vm.clone();
        let target = array.clone();
        std::thread::spawn(move || {
            let mut t = worker_vm.new_thread();
            let inner = target.clone();
            let block = BlockFrame::new(1, move |t, args| t.send(&inner, "push", 1, args, None));
            t.send(&target, "each", 1, &[], Some(&block));
            let _ = done_tx.send(());
        });

        // The shared lock taken by `each` is still held when the block asks
        // for the exclusive one on the same array, so the worker never
        // finishes.
        assert!(done_rx.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
