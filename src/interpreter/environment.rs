//! Instance-variable storage for runtime objects.

use indexmap::IndexMap;

use crate::interpreter::object::{Object, Visited};

/// Name to value bindings owned by a single object.
///
/// Insertion order is kept so `inspect` output is stable, but nothing in
/// the object protocol depends on it.
#[derive(Clone, Default)]
pub struct Environment {
    values: IndexMap<String, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        self.values.get(name).cloned()
    }

    /// Bind `name`, creating it when absent.
    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.values.iter()
    }

    /// Structural comparison: same names bound to values that are
    /// `equal_to` each other. Order does not matter.
    pub fn structurally_equal(&self, other: &Environment) -> bool {
        self.structurally_equal_in(other, &mut Visited::default())
    }

    pub(crate) fn structurally_equal_in(&self, other: &Environment, visited: &mut Visited) -> bool {
        if self.values.len() != other.values.len() {
            return false;
        }
        self.values.iter().all(|(name, value)| {
            other
                .values
                .get(name)
                .is_some_and(|theirs| value.equal_to_in(theirs, visited))
        })
    }
}
