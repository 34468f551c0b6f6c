//! The object protocol.
//!
//! `Object` is a cheap, cloneable handle over every concrete value kind.
//! Capability dispatch happens here, once, by matching on the variant;
//! builtins receive an `Object` and match on the kind they expect.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use ahash::RandomState;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::builtins;
use crate::interpreter::builtins::collections::{ArrayObject, HashObject};
use crate::interpreter::builtins::concurrent::{ConcurrentArrayObject, ConcurrentHashObject};
use crate::interpreter::builtins::error::ErrorObject;
use crate::interpreter::builtins::null::NullObject;
use crate::interpreter::builtins::object::InstanceObject;
use crate::interpreter::builtins::scalars::{BooleanObject, IntegerObject, StringObject};
use crate::interpreter::class::Class;
use crate::interpreter::environment::Environment;
use crate::interpreter::host::HostObject;
use crate::interpreter::method::MethodObject;
use crate::interpreter::thread::Thread;

/// Pairs of object ids whose comparison is already in progress.
pub(crate) type Visited = HashSet<(usize, usize), RandomState>;

/// A runtime value.
#[derive(Clone)]
pub enum Object {
    Null(Arc<NullObject>),
    Boolean(Arc<BooleanObject>),
    Integer(Arc<IntegerObject>),
    String(Arc<StringObject>),
    Array(Arc<ArrayObject>),
    Hash(Arc<HashObject>),
    ConcurrentArray(Arc<ConcurrentArrayObject>),
    ConcurrentHash(Arc<ConcurrentHashObject>),
    Class(Arc<Class>),
    Method(Arc<MethodObject>),
    Error(Arc<ErrorObject>),
    /// Instance of a user-defined class.
    Instance(Arc<InstanceObject>),
    /// Opaque value handed in by the native-extension bridge.
    Host(Arc<HostObject>),
}

impl Object {
    /// The null singleton.
    pub fn null() -> Object {
        builtins().null.clone()
    }

    pub fn boolean(value: bool) -> Object {
        if value {
            builtins().true_object.clone()
        } else {
            builtins().false_object.clone()
        }
    }

    pub fn base(&self) -> &BaseObject {
        match self {
            Object::Null(o) => o.base(),
            Object::Boolean(o) => o.base(),
            Object::Integer(o) => o.base(),
            Object::String(o) => o.base(),
            Object::Array(o) => o.base(),
            Object::Hash(o) => o.base(),
            Object::ConcurrentArray(o) => o.base(),
            Object::ConcurrentHash(o) => o.base(),
            Object::Class(o) => o.base(),
            Object::Method(o) => o.base(),
            Object::Error(o) => o.base(),
            Object::Instance(o) => o.base(),
            Object::Host(o) => o.base(),
        }
    }

    pub fn class(&self) -> Arc<Class> {
        self.base().class().clone()
    }

    pub fn class_name(&self) -> &str {
        self.base().class().name()
    }

    pub fn id(&self) -> usize {
        self.base().id()
    }

    /// Identity comparison.
    pub fn is_same(&self, other: &Object) -> bool {
        self.id() == other.id()
    }

    pub fn singleton_class(&self) -> Option<Arc<Class>> {
        self.base().singleton_class()
    }

    pub fn set_singleton_class(&self, class: Arc<Class>) {
        self.base().set_singleton_class(class)
    }

    /// The singleton class, created on first request.
    pub fn ensure_singleton_class(&self) -> Arc<Class> {
        self.base()
            .ensure_singleton_class(|| format!("#<Class:{}>", self))
    }

    /// Read an instance variable. Absent names give the null singleton and
    /// `false`.
    pub fn instance_variable_get(&self, name: &str) -> (Object, bool) {
        match self.base().instance_variable_get(name) {
            Some(value) => (value, true),
            None => (Object::null(), false),
        }
    }

    pub fn instance_variable_set(&self, name: &str, value: Object) -> Object {
        self.base().instance_variable_set(name, value)
    }

    pub fn instance_variables(&self) -> Environment {
        self.base().instance_variables()
    }

    pub fn set_instance_variables(&self, env: Environment) {
        self.base().set_instance_variables(env)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null(_))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null(_) => false,
            Object::Boolean(b) => b.value(),
            _ => true,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorObject> {
        match self {
            Object::Error(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(s) => Some(s.value()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(i.value()),
            _ => None,
        }
    }

    /// Equality as the language sees it.
    ///
    /// Value types compare by value, sequences element-wise, null by
    /// identity. Generic objects use the fallback rule: same class name and
    /// structurally equal instance variables, regardless of identity.
    /// Self-referencing structures terminate: a pair of containers met
    /// again while it is still being compared counts as equal.
    pub fn equal_to(&self, other: &Object) -> bool {
        self.equal_to_in(other, &mut Visited::default())
    }

    pub(crate) fn equal_to_in(&self, other: &Object, visited: &mut Visited) -> bool {
        if self.is_container() && !visited.insert((self.id(), other.id())) {
            return true;
        }
        match (self, other) {
            (Object::Null(a), Object::Null(b)) => Arc::ptr_eq(a, b),
            (Object::Boolean(a), Object::Boolean(b)) => a.value() == b.value(),
            (Object::Integer(a), Object::Integer(b)) => a.value() == b.value(),
            (Object::String(a), Object::String(b)) => a.value() == b.value(),
            (Object::Array(a), Object::Array(b)) => a.equal_to_in(b, visited),
            (Object::Hash(a), Object::Hash(b)) => a.equal_to_in(b, visited),
            (Object::ConcurrentArray(a), Object::ConcurrentArray(b)) => a.equal_to_in(b, visited),
            (Object::ConcurrentHash(a), Object::ConcurrentHash(b)) => a.equal_to_in(b, visited),
            (Object::Class(a), Object::Class(b)) => Arc::ptr_eq(a, b),
            (Object::Method(a), Object::Method(b)) => Arc::ptr_eq(a, b),
            (Object::Error(a), Object::Error(b)) => a.equal_to(b),
            (Object::Host(a), Object::Host(b)) => a.equal_to(b),
            (Object::Instance(_), _) => self.default_equal_to(other, visited),
            _ => false,
        }
    }

    fn is_container(&self) -> bool {
        matches!(
            self,
            Object::Array(_)
                | Object::Hash(_)
                | Object::ConcurrentArray(_)
                | Object::ConcurrentHash(_)
                | Object::Instance(_)
        )
    }

    fn default_equal_to(&self, other: &Object, visited: &mut Visited) -> bool {
        if self.is_same(other) {
            return true;
        }
        self.class_name() == other.class_name()
            && self
                .instance_variables()
                .structurally_equal_in(&other.instance_variables(), visited)
    }

    /// Debug form.
    pub fn inspect(&self) -> String {
        match self {
            Object::Null(_) => "nil".to_string(),
            Object::String(s) => s.inspect(),
            Object::Array(a) => a.inspect(),
            Object::Hash(h) => h.inspect(),
            Object::ConcurrentArray(a) => a.inspect(),
            Object::ConcurrentHash(h) => h.inspect(),
            Object::Error(e) => e.inspect(),
            Object::Instance(i) => i.inspect(),
            _ => self.to_string(),
        }
    }

    /// JSON form. Generic objects delegate to a user-defined `to_json`
    /// method when their class has one, which is why a thread is needed.
    pub fn to_json(&self, t: &mut Thread) -> String {
        match self {
            Object::Null(_) => "null".to_string(),
            Object::Boolean(b) => b.value().to_string(),
            Object::Integer(i) => i.value().to_string(),
            Object::String(s) => json_string(s.value()),
            Object::Array(a) => a.to_json(t),
            Object::Hash(h) => h.to_json(t),
            Object::ConcurrentArray(a) => a.to_json(t),
            Object::ConcurrentHash(h) => h.to_json(t),
            Object::Instance(i) => i.to_json(self, t),
            Object::Host(h) => h.to_json(),
            Object::Class(_) | Object::Method(_) | Object::Error(_) => {
                json_string(&self.to_string())
            }
        }
    }
}

/// Encode `s` as a JSON string literal.
pub fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// The plain textual form (`to_s`).
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null(_) => Ok(()),
            Object::Boolean(b) => write!(f, "{}", b.value()),
            Object::Integer(i) => write!(f, "{}", i.value()),
            Object::String(s) => f.write_str(s.value()),
            Object::Array(a) => f.write_str(&a.inspect()),
            Object::Hash(h) => f.write_str(&h.inspect()),
            Object::ConcurrentArray(a) => f.write_str(&a.inspect()),
            Object::ConcurrentHash(h) => f.write_str(&h.inspect()),
            Object::Class(c) => f.write_str(c.name()),
            Object::Method(m) => write!(f, "#<Method: {}>", m.name()),
            Object::Error(e) => write!(f, "{}: {}", e.kind(), e.message()),
            Object::Instance(_) | Object::Host(_) => {
                write!(f, "#<{}:{} >", self.class_name(), self.id())
            }
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::vm::Vm;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_representations() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let null = Object::null();

        assert!(!null.is_truthy());
        assert_eq!(null.to_string(), "");
        assert_eq!(null.inspect(), "nil");
        assert_eq!(null.to_json(&mut t), "null");
        assert!(null.equal_to(&Object::null()));
        assert!(!null.equal_to(&Object::boolean(false)));
        assert!(!null.equal_to(&Object::integer(0)));
    }

    #[test]
    fn test_truthiness() {
        assert!(Object::integer(0).is_truthy());
        assert!(Object::string("").is_truthy());
        assert!(Object::boolean(true).is_truthy());
        assert!(!Object::boolean(false).is_truthy());
        assert!(Object::array(vec![]).is_truthy());
    }

    #[test]
    fn test_ids_differ_and_are_stable() {
        let a = Object::string("same");
        let b = Object::string("same");
        assert_ne!(a.id(), b.id());
        let id = a.id();
        a.instance_variable_set("@x", Object::integer(1));
        assert_eq!(a.id(), id);
        assert!(a.equal_to(&b));
        assert!(!a.is_same(&b));
    }

    #[test]
    fn test_instance_variable_get_absent() {
        let obj = Object::string("s");
        let (value, found) = obj.instance_variable_get("@missing");
        assert!(!found);
        assert!(value.is_null());

        let stored = obj.instance_variable_set("@present", Object::integer(3));
        assert!(stored.equal_to(&Object::integer(3)));
        let (value, found) = obj.instance_variable_get("@present");
        assert!(found);
        assert_eq!(value.as_integer(), Some(3));
    }

    #[test]
    fn test_scalar_forms() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let s = Object::string("he said \"hi\"");
        assert_eq!(s.to_string(), "he said \"hi\"");
        assert_eq!(s.inspect(), "\"he said \\\"hi\\\"\"");
        assert_eq!(s.to_json(&mut t), "\"he said \\\"hi\\\"\"");
        assert_eq!(Object::integer(-4).to_json(&mut t), "-4");
        assert_eq!(Object::boolean(true).inspect(), "true");
    }

    #[test]
    fn test_class_and_method_forms() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let class = Object::Class(builtins().array_class.clone());
        assert_eq!(class.to_string(), "Array");
        assert_eq!(class.to_json(&mut t), "\"Array\"");
        assert_eq!(class.class_name(), "Class");
    }
}
