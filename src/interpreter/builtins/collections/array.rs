//! Array class operations.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{wrong_number_of_arguments, ErrorKind};
use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::{
    builtins, check_arity, check_max_arity, expect_integer, expect_string, method, require_block,
    type_error, yield_block,
};
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::{Object, Visited};
use crate::interpreter::thread::Thread;

use super::{inspect_elements, json_elements, sequence_elements};

pub struct ArrayObject {
    base: BaseObject,
    elements: Mutex<Vec<Object>>,
}

impl ArrayObject {
    pub fn new(elements: Vec<Object>) -> Self {
        Self {
            base: BaseObject::new(builtins().array_class.clone()),
            elements: Mutex::new(elements),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    /// Copy of the current elements. Block-taking operations iterate over
    /// one of these so the block never runs with the mutex held.
    pub fn elements(&self) -> Vec<Object> {
        self.elements.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.elements.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.lock().is_empty()
    }

    pub fn push(&self, value: Object) {
        self.elements.lock().push(value);
    }

    pub(crate) fn with_elements<R>(&self, f: impl FnOnce(&mut Vec<Object>) -> R) -> R {
        f(&mut self.elements.lock())
    }

    /// Element-wise equality.
    pub fn equal_to(&self, other: &ArrayObject) -> bool {
        self.equal_to_in(other, &mut Visited::default())
    }

    pub(crate) fn equal_to_in(&self, other: &ArrayObject, visited: &mut Visited) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.elements();
        let theirs = other.elements();
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.equal_to_in(b, visited))
    }

    pub fn inspect(&self) -> String {
        inspect_elements(&self.elements())
    }

    pub(crate) fn to_json(&self, t: &mut Thread) -> String {
        json_elements(&self.elements(), t)
    }
}

impl Object {
    pub fn array(elements: Vec<Object>) -> Object {
        Object::Array(Arc::new(ArrayObject::new(elements)))
    }
}

/// Resolve a possibly negative index against `len`.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    if index < 0 || index >= len {
        None
    } else {
        Some(index as usize)
    }
}

fn this<'a>(t: &Thread, line: usize, receiver: &'a Object) -> Result<&'a ArrayObject, Object> {
    match receiver {
        Object::Array(array) => Ok(array),
        other => Err(type_error(t, line, "Array", other)),
    }
}

fn expect_count(t: &Thread, line: usize, arg: &Object) -> Result<usize, Object> {
    let count = expect_integer(t, line, arg)?;
    if count < 0 {
        return Err(t.error(
            ErrorKind::ArgumentError,
            line,
            format!("Expect argument to be a non-negative Integer. got: {}", count),
        ));
    }
    Ok(count as usize)
}

fn element_at(
    receiver: &Object,
    line: usize,
    t: &mut Thread,
    args: &[Object],
) -> Result<Object, Object> {
    if args.is_empty() {
        return Err(t.error(
            ErrorKind::ArgumentError,
            line,
            wrong_number_of_arguments(1, 0),
        ));
    }
    check_max_arity(t, line, 2, args)?;
    let array = this(t, line, receiver)?;
    let index = expect_integer(t, line, &args[0])?;
    let elements = array.elements();

    if args.len() == 1 {
        return Ok(normalize_index(index, elements.len())
            .map(|i| elements[i].clone())
            .unwrap_or_else(Object::null));
    }

    let count = expect_integer(t, line, &args[1])?;
    let len = elements.len() as i64;
    let start = if index < 0 { index + len } else { index };
    if start < 0 || start > len || count < 0 {
        return Ok(Object::null());
    }
    let end = start.saturating_add(count).min(len);
    Ok(Object::array(elements[start as usize..end as usize].to_vec()))
}

/// Largest length `*` and `[]=` may grow an array to.
pub const MAX_LENGTH: usize = 1 << 24;

fn check_length(t: &Thread, line: usize, length: usize) -> Result<(), Object> {
    if length > MAX_LENGTH {
        return Err(t.error(
            ErrorKind::ArgumentError,
            line,
            format!("Array length {} exceeds maximum: {}", length, MAX_LENGTH),
        ));
    }
    Ok(())
}

fn flatten_into(out: &mut Vec<Object>, elements: Vec<Object>) {
    for element in elements {
        match sequence_elements(&element) {
            Some(inner) => flatten_into(out, inner),
            None => out.push(element),
        }
    }
}

pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    vec![
        method("[]", |receiver, line, t, args, _| element_at(receiver, line, t, args)),
        method("at", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            element_at(receiver, line, t, args)
        }),
        method("*", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let elements = this(t, line, receiver)?.elements();
            let times = expect_count(t, line, &args[0])?;
            let total = elements.len().checked_mul(times).unwrap_or(usize::MAX);
            check_length(t, line, total)?;
            if total == 0 {
                return Ok(Object::array(Vec::new()));
            }
            let mut out = Vec::with_capacity(total);
            for _ in 0..times {
                out.extend(elements.iter().cloned());
            }
            Ok(Object::array(out))
        }),
        method("+", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let mut elements = this(t, line, receiver)?.elements();
            let other = sequence_elements(&args[0])
                .ok_or_else(|| type_error(t, line, "Array", &args[0]))?;
            elements.extend(other);
            Ok(Object::array(elements))
        }),
        method("[]=", |receiver, line, t, args, _| {
            check_arity(t, line, 2, args)?;
            let array = this(t, line, receiver)?;
            let index = expect_integer(t, line, &args[0])?;
            let value = args[1].clone();
            if index >= 0 {
                let needed = usize::try_from(index).unwrap_or(usize::MAX).saturating_add(1);
                check_length(t, line, needed)?;
            }
            let too_small = array.with_elements(|elements| {
                let len = elements.len() as i64;
                if index < -len {
                    return Some(len);
                }
                if index < 0 {
                    elements[(index + len) as usize] = value.clone();
                } else if (index as usize) < elements.len() {
                    elements[index as usize] = value.clone();
                } else {
                    elements.resize(index as usize, Object::null());
                    elements.push(value.clone());
                }
                None
            });
            if let Some(len) = too_small {
                return Err(t.error(
                    ErrorKind::ArgumentError,
                    line,
                    format!("Index value {} too small for array. minimum: -{}", index, len),
                ));
            }
            Ok(value)
        }),
        method("any?", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            for element in this(t, line, receiver)?.elements() {
                if yield_block(t, block, &[element])?.is_truthy() {
                    return Ok(Object::boolean(true));
                }
            }
            Ok(Object::boolean(false))
        }),
        method("clear", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            this(t, line, receiver)?.with_elements(|elements| elements.clear());
            Ok(receiver.clone())
        }),
        method("concat", |receiver, line, t, args, _| {
            let array = this(t, line, receiver)?;
            let mut appended = Vec::new();
            for arg in args {
                let elements =
                    sequence_elements(arg).ok_or_else(|| type_error(t, line, "Array", arg))?;
                appended.extend(elements);
            }
            array.with_elements(|elements| elements.extend(appended));
            Ok(receiver.clone())
        }),
        method("count", |receiver, line, t, args, block| {
            check_max_arity(t, line, 1, args)?;
            let elements = this(t, line, receiver)?.elements();
            if let Some(target) = args.first() {
                let count = elements.iter().filter(|e| e.equal_to(target)).count();
                return Ok(Object::integer(count as i64));
            }
            let Some(block) = block else {
                return Ok(Object::integer(elements.len() as i64));
            };
            let mut count = 0;
            for element in elements {
                if yield_block(t, block, &[element])?.is_truthy() {
                    count += 1;
                }
            }
            Ok(Object::integer(count))
        }),
        method("delete_at", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let array = this(t, line, receiver)?;
            let index = expect_integer(t, line, &args[0])?;
            let removed = array.with_elements(|elements| {
                normalize_index(index, elements.len()).map(|i| elements.remove(i))
            });
            Ok(removed.unwrap_or_else(Object::null))
        }),
        method("dig", |receiver, line, t, args, _| {
            if args.is_empty() {
                return Err(t.error(
                    ErrorKind::ArgumentError,
                    line,
                    wrong_number_of_arguments(1, 0),
                ));
            }
            let mut current = receiver.clone();
            for key in args {
                current = match &current {
                    Object::Array(array) => {
                        let index = expect_integer(t, line, key)?;
                        let elements = array.elements();
                        normalize_index(index, elements.len())
                            .map(|i| elements[i].clone())
                            .unwrap_or_else(Object::null)
                    }
                    Object::Hash(hash) => hash.get(expect_string(t, line, key)?),
                    Object::Null(_) => return Ok(Object::null()),
                    other => return Err(type_error(t, line, "Array or Hash", other)),
                };
            }
            Ok(current)
        }),
        method("each", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            for element in this(t, line, receiver)?.elements() {
                yield_block(t, block, &[element])?;
            }
            Ok(receiver.clone())
        }),
        method("each_index", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            let len = this(t, line, receiver)?.len();
            for i in 0..len {
                yield_block(t, block, &[Object::integer(i as i64)])?;
            }
            Ok(receiver.clone())
        }),
        method("empty?", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::boolean(this(t, line, receiver)?.is_empty()))
        }),
        method("first", |receiver, line, t, args, _| {
            check_max_arity(t, line, 1, args)?;
            let elements = this(t, line, receiver)?.elements();
            match args.first() {
                None => Ok(elements.first().cloned().unwrap_or_else(Object::null)),
                Some(arg) => {
                    let count = expect_count(t, line, arg)?.min(elements.len());
                    Ok(Object::array(elements[..count].to_vec()))
                }
            }
        }),
        method("flatten", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let mut out = Vec::new();
            flatten_into(&mut out, this(t, line, receiver)?.elements());
            Ok(Object::array(out))
        }),
        method("join", |receiver, line, t, args, _| {
            check_max_arity(t, line, 1, args)?;
            let separator = match args.first() {
                Some(arg) => expect_string(t, line, arg)?,
                None => "",
            };
            let parts: Vec<String> = this(t, line, receiver)?
                .elements()
                .iter()
                .map(Object::to_string)
                .collect();
            Ok(Object::string(parts.join(separator)))
        }),
        method("last", |receiver, line, t, args, _| {
            check_max_arity(t, line, 1, args)?;
            let elements = this(t, line, receiver)?.elements();
            match args.first() {
                None => Ok(elements.last().cloned().unwrap_or_else(Object::null)),
                Some(arg) => {
                    let count = expect_count(t, line, arg)?.min(elements.len());
                    Ok(Object::array(elements[elements.len() - count..].to_vec()))
                }
            }
        }),
        method("length", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::integer(this(t, line, receiver)?.len() as i64))
        }),
        method("map", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            let mut out = Vec::new();
            for element in this(t, line, receiver)?.elements() {
                out.push(yield_block(t, block, &[element])?);
            }
            Ok(Object::array(out))
        }),
        method("pop", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let popped = this(t, line, receiver)?.with_elements(|elements| elements.pop());
            Ok(popped.unwrap_or_else(Object::null))
        }),
        method("push", |receiver, line, t, args, _| {
            this(t, line, receiver)?
                .with_elements(|elements| elements.extend(args.iter().cloned()));
            Ok(receiver.clone())
        }),
        method("reduce", |receiver, line, t, args, block| {
            check_max_arity(t, line, 1, args)?;
            let block = require_block(t, line, block)?;
            let mut elements = this(t, line, receiver)?.elements().into_iter();
            let mut accumulator = match args.first() {
                Some(initial) => initial.clone(),
                None => match elements.next() {
                    Some(first) => first,
                    None => return Ok(Object::null()),
                },
            };
            for element in elements {
                accumulator = yield_block(t, block, &[accumulator, element])?;
            }
            Ok(accumulator)
        }),
        method("reverse", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let mut elements = this(t, line, receiver)?.elements();
            elements.reverse();
            Ok(Object::array(elements))
        }),
        method("reverse_each", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            for element in this(t, line, receiver)?.elements().into_iter().rev() {
                yield_block(t, block, &[element])?;
            }
            Ok(receiver.clone())
        }),
        method("rotate", |receiver, line, t, args, _| {
            check_max_arity(t, line, 1, args)?;
            let mut elements = this(t, line, receiver)?.elements();
            let by = match args.first() {
                Some(arg) => expect_integer(t, line, arg)?,
                None => 1,
            };
            if !elements.is_empty() {
                let shift = by.rem_euclid(elements.len() as i64) as usize;
                elements.rotate_left(shift);
            }
            Ok(Object::array(elements))
        }),
        method("select", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            let mut out = Vec::new();
            for element in this(t, line, receiver)?.elements() {
                if yield_block(t, block, &[element.clone()])?.is_truthy() {
                    out.push(element);
                }
            }
            Ok(Object::array(out))
        }),
        method("shift", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let shifted = this(t, line, receiver)?.with_elements(|elements| {
                if elements.is_empty() {
                    None
                } else {
                    Some(elements.remove(0))
                }
            });
            Ok(shifted.unwrap_or_else(Object::null))
        }),
        method("unshift", |receiver, line, t, args, _| {
            this(t, line, receiver)?.with_elements(|elements| {
                elements.splice(0..0, args.iter().cloned());
            });
            Ok(receiver.clone())
        }),
        method("values_at", |receiver, line, t, args, _| {
            let elements = this(t, line, receiver)?.elements();
            let mut out = Vec::with_capacity(args.len());
            for arg in args {
                let index = expect_integer(t, line, arg)?;
                out.push(
                    normalize_index(index, elements.len())
                        .map(|i| elements[i].clone())
                        .unwrap_or_else(Object::null),
                );
            }
            Ok(Object::array(out))
        }),
    ]
}
