//! `Concurrent::Array`: a plain array behind a reader/writer lock.
//!
//! Every forwarded operation runs against the wrapped array with the lock
//! held in the mode `FORWARDING_TABLE` gives it. That includes the block
//! of `each`, `map` and friends, so a block that calls a writer on the
//! same collection blocks forever: the lock is not reentrant.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::collections::{
    inspect_elements, json_elements, sequence_elements, ArrayObject,
};
use crate::interpreter::builtins::{builtins, check_max_arity, method, type_error};
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::{Object, Visited};
use crate::interpreter::thread::{BlockFrame, Thread};

/// Lock mode an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Shared.
    Read,
    /// Exclusive.
    Write,
}

lazy_static! {
    /// Operations `Concurrent::Array` forwards to the plain array. `dig`
    /// is not forwarded.
    pub static ref FORWARDING_TABLE: HashMap<&'static str, AccessMode> = {
        use AccessMode::{Read, Write};
        let mut table = HashMap::new();
        table.insert("[]", Read);
        table.insert("*", Read);
        table.insert("+", Read);
        table.insert("[]=", Write);
        table.insert("any?", Read);
        table.insert("at", Read);
        table.insert("clear", Write);
        table.insert("concat", Write);
        table.insert("count", Read);
        table.insert("delete_at", Write);
        table.insert("each", Read);
        table.insert("each_index", Read);
        table.insert("empty?", Read);
        table.insert("first", Read);
        table.insert("flatten", Read);
        table.insert("join", Read);
        table.insert("last", Read);
        table.insert("length", Read);
        table.insert("map", Read);
        table.insert("pop", Write);
        table.insert("push", Write);
        table.insert("reduce", Read);
        table.insert("reverse", Read);
        table.insert("reverse_each", Read);
        table.insert("rotate", Read);
        table.insert("select", Read);
        table.insert("shift", Write);
        table.insert("unshift", Write);
        table.insert("values_at", Read);
        table
    };
}

pub struct ConcurrentArrayObject {
    base: BaseObject,
    array: RwLock<Arc<ArrayObject>>,
}

impl ConcurrentArrayObject {
    pub fn new(elements: Vec<Object>) -> Self {
        Self::from_array(Arc::new(ArrayObject::new(elements)))
    }

    /// Wrap `array`. The caller must not keep using it directly.
    pub fn from_array(array: Arc<ArrayObject>) -> Self {
        Self {
            base: BaseObject::new(builtins().concurrent_array_class.clone()),
            array: RwLock::new(array),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    /// Copy of the elements, taken under the shared lock.
    pub fn snapshot(&self) -> Vec<Object> {
        self.array.read().elements()
    }

    pub fn len(&self) -> usize {
        self.array.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.read().is_empty()
    }

    /// Element-wise equality of the wrapped arrays. Each side is copied out
    /// under its own lock, one at a time.
    pub fn equal_to(&self, other: &ConcurrentArrayObject) -> bool {
        self.equal_to_in(other, &mut Visited::default())
    }

    pub(crate) fn equal_to_in(&self, other: &ConcurrentArrayObject, visited: &mut Visited) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.snapshot();
        let theirs = other.snapshot();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.equal_to_in(b, visited))
    }

    pub fn inspect(&self) -> String {
        inspect_elements(&self.snapshot())
    }

    pub(crate) fn to_json(&self, t: &mut Thread) -> String {
        json_elements(&self.snapshot(), t)
    }

    /// Run the plain array's `op` under the lock `op` is classified with.
    ///
    /// The guard is released on every exit path, unwinding included. A
    /// plain array coming back is wrapped in a new `Concurrent::Array`,
    /// except for the wrapped array itself, which maps back to `receiver`
    /// rather than to a second wrapper around the same storage.
    ///
    /// Sequence arguments of `+` and `concat` that are themselves
    /// `Concurrent::Array`s are copied out before this lock is taken, so no
    /// two of these locks are ever held at once. The receiver passed as its
    /// own argument is read through the guard already held.
    pub fn invoke(
        &self,
        receiver: &Object,
        t: &mut Thread,
        op: &str,
        line: usize,
        args: &[Object],
        block: Option<&BlockFrame>,
    ) -> Object {
        let Some(&mode) = FORWARDING_TABLE.get(op) else {
            return t.vm().init_no_method_error(line, op, receiver);
        };
        let mut args = args.to_vec();
        let mut self_arguments = Vec::new();
        if SEQUENCE_ARGUMENT_OPS.contains(&op) {
            for (i, arg) in args.iter_mut().enumerate() {
                let copied = match arg {
                    Object::ConcurrentArray(other) if std::ptr::eq(other.as_ref(), self) => {
                        self_arguments.push(i);
                        None
                    }
                    Object::ConcurrentArray(other) => Some(other.snapshot()),
                    _ => None,
                };
                if let Some(elements) = copied {
                    *arg = Object::array(elements);
                }
            }
        }

        log::trace!(
            "Concurrent::Array#{} taking {:?} lock on object {}",
            op,
            mode,
            self.base.id()
        );
        let (result, internal) = match mode {
            AccessMode::Read => {
                let guard = self.array.read();
                resolve_self_arguments(&guard, &mut args, &self_arguments);
                let result = forward(&guard, receiver, t, op, line, &args, block);
                (result, Arc::clone(&*guard))
            }
            AccessMode::Write => {
                let guard = self.array.write();
                resolve_self_arguments(&guard, &mut args, &self_arguments);
                let result = forward(&guard, receiver, t, op, line, &args, block);
                (result, Arc::clone(&*guard))
            }
        };

        match result {
            Object::Array(array) if Arc::ptr_eq(&array, &internal) => receiver.clone(),
            Object::Array(array) => Object::ConcurrentArray(Arc::new(Self::from_array(array))),
            other => other,
        }
    }
}

/// Forwarded operations that read the elements of their array arguments.
const SEQUENCE_ARGUMENT_OPS: [&str; 2] = ["+", "concat"];

fn resolve_self_arguments(internal: &ArrayObject, args: &mut [Object], positions: &[usize]) {
    if positions.is_empty() {
        return;
    }
    let elements = internal.elements();
    for &i in positions {
        args[i] = Object::array(elements.clone());
    }
}

fn forward(
    internal: &Arc<ArrayObject>,
    receiver: &Object,
    t: &mut Thread,
    op: &str,
    line: usize,
    args: &[Object],
    block: Option<&BlockFrame>,
) -> Object {
    let internal = Object::Array(internal.clone());
    match internal.find_method(op) {
        Some(method) => method.call(&internal, line, t, args, block),
        None => t.vm().init_no_method_error(line, op, receiver),
    }
}

fn this<'a>(
    t: &Thread,
    line: usize,
    receiver: &'a Object,
) -> Result<&'a ConcurrentArrayObject, Object> {
    match receiver {
        Object::ConcurrentArray(array) => Ok(array),
        other => Err(type_error(t, line, "Concurrent::Array", other)),
    }
}

/// One forwarding method per table entry.
pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    FORWARDING_TABLE
        .keys()
        .map(|&op| {
            method(op, move |receiver, line, t, args, block| {
                let array = this(t, line, receiver)?;
                Ok(array.invoke(receiver, t, op, line, args, block))
            })
        })
        .collect()
}

pub(crate) fn class_methods() -> Vec<BuiltinMethod> {
    vec![method("new", |_, line, t, args, _| {
        check_max_arity(t, line, 1, args)?;
        let elements = match args.first() {
            Some(arg) => sequence_elements(arg).ok_or_else(|| type_error(t, line, "Array", arg))?,
            None => Vec::new(),
        };
        Ok(Object::ConcurrentArray(Arc::new(ConcurrentArrayObject::new(elements))))
    })]
}
