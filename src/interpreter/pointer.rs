//! Reference slots.

use std::sync::Arc;

use crate::interpreter::class::Class;
use crate::interpreter::object::Object;

/// An indirection cell that variable bindings, stack slots and namespace
/// entries point at. Rebinding replaces the target; the target object
/// keeps its identity.
///
/// A slot is not itself an object.
#[derive(Clone)]
pub struct Pointer {
    target: Object,
    is_namespace: bool,
}

impl Pointer {
    pub fn new(target: Object) -> Self {
        Self {
            target,
            is_namespace: false,
        }
    }

    /// A slot in a namespace table.
    pub fn namespace(target: Object) -> Self {
        Self {
            target,
            is_namespace: true,
        }
    }

    pub fn target(&self) -> &Object {
        &self.target
    }

    pub fn set_target(&mut self, target: Object) {
        self.target = target;
    }

    pub fn is_namespace(&self) -> bool {
        self.is_namespace
    }

    /// The target as a class, when it is one.
    pub fn return_class(&self) -> Option<Arc<Class>> {
        match &self.target {
            Object::Class(class) => Some(class.clone()),
            _ => None,
        }
    }
}
