//! Plain Array and Hash.
//!
//! These are the unsynchronised collections. Every single call is memory
//! safe, but a sequence of calls is not atomic; code that shares a
//! collection between interpreter threads should use the `Concurrent`
//! variants, which delegate to these.

pub mod array;
pub mod hash;

pub use array::ArrayObject;
pub use hash::HashObject;

use crate::interpreter::object::{json_string, Object};
use crate::interpreter::thread::Thread;

/// Elements of either kind of sequence.
pub(crate) fn sequence_elements(obj: &Object) -> Option<Vec<Object>> {
    match obj {
        Object::Array(array) => Some(array.elements()),
        Object::ConcurrentArray(array) => Some(array.snapshot()),
        _ => None,
    }
}

/// `[1, "a", nil]`
pub(crate) fn inspect_elements(elements: &[Object]) -> String {
    let parts: Vec<String> = elements.iter().map(Object::inspect).collect();
    format!("[{}]", parts.join(", "))
}

pub(crate) fn json_elements(elements: &[Object], t: &mut Thread) -> String {
    let parts: Vec<String> = elements.iter().map(|e| e.to_json(t)).collect();
    format!("[{}]", parts.join(","))
}

/// `{ a: 1, b: "2" }`, or `{}` when empty.
pub(crate) fn inspect_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a String, &'a Object)>,
) -> String {
    let parts: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value.inspect()))
        .collect();
    if parts.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", parts.join(", "))
    }
}

pub(crate) fn json_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a String, &'a Object)>,
    t: &mut Thread,
) -> String {
    let parts: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{}:{}", json_string(key), value.to_json(t)))
        .collect();
    format!("{{{}}}", parts.join(","))
}
