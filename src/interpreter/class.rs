//! Class descriptors: method tables, the method_missing slot, ancestors and
//! nested constants.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::builtins;
use crate::interpreter::method::MethodObject;
use crate::interpreter::object::Object;
use crate::interpreter::pointer::Pointer;

/// Name of the fallback hook consulted when resolution finds nothing.
pub const METHOD_MISSING: &str = "method_missing";

type MethodTable = HashMap<String, Arc<MethodObject>, RandomState>;

/// A class descriptor.
///
/// Many objects share one class; none of them own it. A class is itself an
/// object whose class is `Class`, so class methods live in its singleton
/// class like any other per-object method.
pub struct Class {
    base: BaseObject,
    name: String,
    superclass: Option<Arc<Class>>,
    is_singleton: bool,
    methods: RwLock<MethodTable>,
    method_missing: RwLock<Option<Arc<MethodObject>>>,
    constants: RwLock<IndexMap<String, Pointer>>,
}

impl Class {
    /// Create a class whose metaclass is `Class`.
    pub fn new(name: impl Into<String>, superclass: Option<Arc<Class>>) -> Arc<Class> {
        let class = Self::with_metaclass(
            name.into(),
            superclass,
            false,
            builtins().class_class.clone(),
        );
        log::debug!("defined class {}", class.name);
        class
    }

    pub(crate) fn new_singleton(name: String) -> Arc<Class> {
        Self::with_metaclass(name, None, true, builtins().class_class.clone())
    }

    pub(crate) fn with_metaclass(
        name: String,
        superclass: Option<Arc<Class>>,
        is_singleton: bool,
        metaclass: Arc<Class>,
    ) -> Arc<Class> {
        Arc::new(Self::build(
            BaseObject::new(metaclass),
            name,
            superclass,
            is_singleton,
        ))
    }

    /// Used by the bootstrap for `Object` and `Class`, which exist before
    /// any metaclass does.
    pub(crate) fn unbound(name: String, superclass: Option<Arc<Class>>) -> Self {
        Self::build(BaseObject::unbound(), name, superclass, false)
    }

    fn build(
        base: BaseObject,
        name: String,
        superclass: Option<Arc<Class>>,
        is_singleton: bool,
    ) -> Self {
        Self {
            base,
            name,
            superclass,
            is_singleton,
            methods: RwLock::new(MethodTable::default()),
            method_missing: RwLock::new(None),
            constants: RwLock::new(IndexMap::new()),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref()
    }

    pub fn is_singleton(&self) -> bool {
        self.is_singleton
    }

    /// Install a method. A method named `method_missing` goes into the
    /// dedicated fallback slot instead of the table.
    pub fn define_method(&self, method: Arc<MethodObject>) {
        if method.name() == METHOD_MISSING {
            *self.method_missing.write() = Some(method);
        } else {
            self.methods.write().insert(method.name().to_string(), method);
        }
    }

    pub fn remove_method(&self, name: &str) -> Option<Arc<MethodObject>> {
        if name == METHOD_MISSING {
            self.method_missing.write().take()
        } else {
            self.methods.write().remove(name)
        }
    }

    /// Look at this class's own table only.
    pub fn own_method(&self, name: &str) -> Option<Arc<MethodObject>> {
        if name == METHOD_MISSING {
            return self.method_missing_hook();
        }
        self.methods.read().get(name).cloned()
    }

    /// The method_missing slot of this class, without consulting ancestors.
    pub fn method_missing_hook(&self) -> Option<Arc<MethodObject>> {
        self.method_missing.read().clone()
    }

    /// Search this class and then each ancestor in turn.
    pub fn lookup_method(&self, name: &str) -> Option<Arc<MethodObject>> {
        if let Some(method) = self.own_method(name) {
            return Some(method);
        }
        self.ancestors().find_map(|ancestor| ancestor.own_method(name))
    }

    /// Superclasses from the nearest outwards, excluding `self`.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.superclass.as_deref(),
        }
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        if self.method_missing.read().is_some() {
            names.push(METHOD_MISSING.to_string());
        }
        names.sort();
        names
    }

    /// True when `self` is `other` or inherits from it.
    pub fn is_a(&self, other: &Class) -> bool {
        std::ptr::eq(self, other) || self.ancestors().any(|a| std::ptr::eq(a, other))
    }

    pub fn get_constant(&self, name: &str) -> Option<Pointer> {
        self.constants.read().get(name).cloned()
    }

    /// Bind a nested constant, replacing the target of an existing slot.
    pub fn set_constant(&self, name: impl Into<String>, value: Object) {
        let mut constants = self.constants.write();
        let name = name.into();
        match constants.get_mut(&name) {
            Some(slot) => slot.set_target(value),
            None => {
                let slot = match &value {
                    Object::Class(_) => Pointer::namespace(value),
                    _ => Pointer::new(value),
                };
                constants.insert(name, slot);
            }
        }
    }

    pub fn constant_names(&self) -> Vec<String> {
        self.constants.read().keys().cloned().collect()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name)
    }
}

/// Iterator over a class's superclass chain.
pub struct Ancestors<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass.as_deref();
        Some(current)
    }
}
