//! Hash class operations.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::{
    builtins, check_arity, expect_string, method, type_error,
};
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::{Object, Visited};
use crate::interpreter::thread::Thread;

use super::{inspect_pairs, json_pairs};

/// String-keyed map that keeps insertion order.
pub struct HashObject {
    base: BaseObject,
    pairs: Mutex<IndexMap<String, Object>>,
}

impl HashObject {
    pub fn new(pairs: IndexMap<String, Object>) -> Self {
        Self {
            base: BaseObject::new(builtins().hash_class.clone()),
            pairs: Mutex::new(pairs),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    /// Copy of the current pairs.
    pub fn pairs(&self) -> IndexMap<String, Object> {
        self.pairs.lock().clone()
    }

    /// The stored value, or null.
    pub fn get(&self, key: &str) -> Object {
        self.pairs
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(Object::null)
    }

    pub fn set(&self, key: impl Into<String>, value: Object) -> Object {
        self.pairs.lock().insert(key.into(), value.clone());
        value
    }

    pub fn delete(&self, key: &str) -> Option<Object> {
        self.pairs.lock().shift_remove(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.pairs.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.pairs.lock().keys().cloned().collect()
    }

    /// Same keys bound to equal values. Order is ignored.
    pub fn equal_to(&self, other: &HashObject) -> bool {
        self.equal_to_in(other, &mut Visited::default())
    }

    pub(crate) fn equal_to_in(&self, other: &HashObject, visited: &mut Visited) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.pairs();
        let theirs = other.pairs();
        mine.len() == theirs.len()
            && mine
                .iter()
                .all(|(key, value)| theirs.get(key).is_some_and(|v| value.equal_to_in(v, visited)))
    }

    pub fn inspect(&self) -> String {
        inspect_pairs(&self.pairs())
    }

    pub(crate) fn to_json(&self, t: &mut Thread) -> String {
        json_pairs(&self.pairs(), t)
    }
}

impl Object {
    pub fn hash(pairs: IndexMap<String, Object>) -> Object {
        Object::Hash(Arc::new(HashObject::new(pairs)))
    }
}

fn this<'a>(t: &Thread, line: usize, receiver: &'a Object) -> Result<&'a HashObject, Object> {
    match receiver {
        Object::Hash(hash) => Ok(hash),
        other => Err(type_error(t, line, "Hash", other)),
    }
}

pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    vec![
        method("[]", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let hash = this(t, line, receiver)?;
            let key = expect_string(t, line, &args[0])?;
            Ok(hash.get(key))
        }),
        method("[]=", |receiver, line, t, args, _| {
            check_arity(t, line, 2, args)?;
            let hash = this(t, line, receiver)?;
            let key = expect_string(t, line, &args[0])?;
            Ok(hash.set(key, args[1].clone()))
        }),
        method("delete", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let hash = this(t, line, receiver)?;
            let key = expect_string(t, line, &args[0])?;
            Ok(hash.delete(key).unwrap_or_else(Object::null))
        }),
        method("has_key?", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let hash = this(t, line, receiver)?;
            let key = expect_string(t, line, &args[0])?;
            Ok(Object::boolean(hash.has_key(key)))
        }),
        method("keys", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let keys = this(t, line, receiver)?
                .keys()
                .into_iter()
                .map(Object::string)
                .collect();
            Ok(Object::array(keys))
        }),
        method("length", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::integer(this(t, line, receiver)?.len() as i64))
        }),
    ]
}
