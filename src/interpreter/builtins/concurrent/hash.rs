//! `Concurrent::Hash`: a sharded, string-keyed map.

use std::sync::Arc;

use ahash::RandomState;
use dashmap::DashMap;
use indexmap::IndexMap;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::collections::{inspect_pairs, json_pairs};
use crate::interpreter::builtins::{
    builtins, check_arity, check_max_arity, expect_string, method, require_block, type_error,
    yield_block,
};
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::{Object, Visited};
use crate::interpreter::thread::Thread;

/// Safe for concurrent get, set, delete and iteration without any
/// external lock. There is no size query and no snapshot guarantee:
/// callers that need either copy out with `snapshot`.
pub struct ConcurrentHashObject {
    base: BaseObject,
    map: DashMap<String, Object, RandomState>,
}

impl ConcurrentHashObject {
    /// An empty map. `shard_amount` must be a power of two greater than 1;
    /// `VmConfig::validate` checks that for configured values.
    pub fn new(shard_amount: Option<usize>) -> Self {
        let map = match shard_amount {
            Some(shards) => DashMap::with_hasher_and_shard_amount(RandomState::new(), shards),
            None => DashMap::with_hasher(RandomState::new()),
        };
        Self {
            base: BaseObject::new(builtins().concurrent_hash_class.clone()),
            map,
        }
    }

    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, Object)>,
        shard_amount: Option<usize>,
    ) -> Self {
        let hash = Self::new(shard_amount);
        for (key, value) in pairs {
            hash.map.insert(key, value);
        }
        hash
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    /// The stored value, or null.
    pub fn get(&self, key: &str) -> Object {
        self.map
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(Object::null)
    }

    pub fn set(&self, key: impl Into<String>, value: Object) -> Object {
        self.map.insert(key.into(), value.clone());
        value
    }

    /// Remove `key` if present. Always null.
    pub fn delete(&self, key: &str) -> Object {
        self.map.remove(key);
        Object::null()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Call `callback` once per visible entry, in no particular order.
    ///
    /// Keys are collected first and each value is fetched again right
    /// before its call, so no shard lock is held while `callback` runs.
    /// Entries removed in the meantime are skipped; entries added in the
    /// meantime may be missed. No key is visited twice.
    pub fn each<E>(
        &self,
        mut callback: impl FnMut(&str, Object) -> Result<(), E>,
    ) -> Result<(), E> {
        let keys: Vec<String> = self.map.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            let value = match self.map.get(&key) {
                Some(entry) => entry.value().clone(),
                None => continue,
            };
            callback(&key, value)?;
        }
        Ok(())
    }

    /// Copy of the contents, sorted by key.
    pub fn snapshot(&self) -> IndexMap<String, Object> {
        let mut pairs: IndexMap<String, Object> = self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        pairs.sort_keys();
        pairs
    }

    pub fn equal_to(&self, other: &ConcurrentHashObject) -> bool {
        self.equal_to_in(other, &mut Visited::default())
    }

    pub(crate) fn equal_to_in(&self, other: &ConcurrentHashObject, visited: &mut Visited) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.snapshot();
        let theirs = other.snapshot();
        mine.len() == theirs.len()
            && mine
                .iter()
                .all(|(key, value)| theirs.get(key).is_some_and(|v| value.equal_to_in(v, visited)))
    }

    pub fn inspect(&self) -> String {
        inspect_pairs(&self.snapshot())
    }

    pub(crate) fn to_json(&self, t: &mut Thread) -> String {
        json_pairs(&self.snapshot(), t)
    }
}

fn this<'a>(
    t: &Thread,
    line: usize,
    receiver: &'a Object,
) -> Result<&'a ConcurrentHashObject, Object> {
    match receiver {
        Object::ConcurrentHash(hash) => Ok(hash),
        other => Err(type_error(t, line, "Concurrent::Hash", other)),
    }
}

pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    vec![
        method("[]", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let hash = this(t, line, receiver)?;
            Ok(hash.get(expect_string(t, line, &args[0])?))
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
            Ok(hash.delete(expect_string(t, line, &args[0])?))
        }),
        method("each", |receiver, line, t, args, block| {
            check_arity(t, line, 0, args)?;
            let block = require_block(t, line, block)?;
            let hash = this(t, line, receiver)?;
            hash.each(|key, value| {
                yield_block(t, block, &[Object::string(key), value]).map(|_| ())
            })?;
            Ok(receiver.clone())
        }),
        method("has_key?", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let hash = this(t, line, receiver)?;
            Ok(Object::boolean(hash.has_key(expect_string(t, line, &args[0])?)))
        }),
    ]
}

pub(crate) fn class_methods() -> Vec<BuiltinMethod> {
    vec![method("new", |_, line, t, args, _| {
        check_max_arity(t, line, 1, args)?;
        let shard_amount = t.vm().config().hash_shard_amount;
        let hash = match args.first() {
            None => ConcurrentHashObject::new(shard_amount),
            Some(Object::Hash(source)) => {
                ConcurrentHashObject::from_pairs(source.pairs(), shard_amount)
            }
            Some(Object::ConcurrentHash(source)) => {
                ConcurrentHashObject::from_pairs(source.snapshot(), shard_amount)
            }
            Some(other) => return Err(type_error(t, line, "Hash", other)),
        };
        Ok(Object::ConcurrentHash(Arc::new(hash)))
    })]
}
