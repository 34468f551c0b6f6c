//! State shared by every runtime object: identity, owning class, optional
//! singleton class and instance variables.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::interpreter::class::Class;
use crate::interpreter::environment::Environment;
use crate::interpreter::object::Object;

/// Identity 0 is never handed out.
static NEXT_OBJECT_ID: AtomicUsize = AtomicUsize::new(1);

/// Allocate a process-unique object identity.
pub fn next_object_id() -> usize {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// The base object every concrete value type embeds.
///
/// Each accessor is individually safe to call from any thread, but a
/// sequence of calls on the same object is not atomic. Objects shared
/// between interpreter threads should be kept in the concurrent
/// collections.
pub struct BaseObject {
    id: usize,
    class: OnceLock<Arc<Class>>,
    singleton_class: RwLock<Option<Arc<Class>>>,
    instance_variables: RwLock<Environment>,
}

impl BaseObject {
    pub fn new(class: Arc<Class>) -> Self {
        let base = Self::unbound();
        let _ = base.class.set(class);
        base
    }

    /// A base with no class yet. Only the class bootstrap uses this, since
    /// `Class` has to exist before it can be its own class.
    pub(crate) fn unbound() -> Self {
        Self {
            id: next_object_id(),
            class: OnceLock::new(),
            singleton_class: RwLock::new(None),
            instance_variables: RwLock::new(Environment::new()),
        }
    }

    pub(crate) fn bind_class(&self, class: Arc<Class>) {
        let _ = self.class.set(class);
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The owning class.
    ///
    /// # Panics
    ///
    /// Panics if the object was built without a class. That can only happen
    /// through a broken bootstrap and is not a recoverable condition.
    pub fn class(&self) -> &Arc<Class> {
        match self.class.get() {
            Some(class) => class,
            None => panic!("object {} doesn't have a class", self.id),
        }
    }

    pub fn singleton_class(&self) -> Option<Arc<Class>> {
        self.singleton_class.read().clone()
    }

    /// Replace the singleton class. Last write wins.
    pub fn set_singleton_class(&self, class: Arc<Class>) {
        *self.singleton_class.write() = Some(class);
    }

    /// Return the singleton class, creating an empty one on first use.
    pub fn ensure_singleton_class(&self, describe: impl FnOnce() -> String) -> Arc<Class> {
        let mut slot = self.singleton_class.write();
        if let Some(class) = slot.as_ref() {
            return class.clone();
        }
        let class = Class::new_singleton(describe());
        log::debug!("created singleton class {} for object {}", class.name(), self.id);
        *slot = Some(class.clone());
        class
    }

    pub fn instance_variable_get(&self, name: &str) -> Option<Object> {
        self.instance_variables.read().get(name)
    }

    pub fn instance_variable_set(&self, name: &str, value: Object) -> Object {
        self.instance_variables.write().set(name, value.clone());
        value
    }

    /// Snapshot of the instance-variable environment.
    pub fn instance_variables(&self) -> Environment {
        self.instance_variables.read().clone()
    }

    pub fn set_instance_variables(&self, env: Environment) {
        *self.instance_variables.write() = env;
    }
}
