//! The Null class and its single instance.

use std::sync::Arc;

use crate::interpreter::base::BaseObject;
use crate::interpreter::class::Class;
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::Object;

use super::{check_arity, method};

/// The null value. Only one exists per process; equality against it is
/// identity.
pub struct NullObject {
    base: BaseObject,
}

impl NullObject {
    pub(crate) fn new(class: Arc<Class>) -> Self {
        Self {
            base: BaseObject::new(class),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }
}

pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    vec![
        method("!", |_, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::boolean(true))
        }),
        method("!=", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            Ok(Object::boolean(!receiver.equal_to(&args[0])))
        }),
        method("inspect", |_, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string("nil"))
        }),
        method("nil?", |_, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::boolean(true))
        }),
        method("to_i", |_, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::integer(0))
        }),
        method("to_s", |_, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string(""))
        }),
    ]
}

pub(crate) fn class_methods() -> Vec<BuiltinMethod> {
    vec![method("new", |receiver, line, t, _, _| {
        Err(t.vm().init_no_method_error(line, "new", receiver))
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::interpreter::builtins::builtins;
    use crate::interpreter::vm::Vm;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_methods() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let null = Object::null();

        assert!(t.send(&null, "!", 1, &[], None).is_truthy());
        assert!(t.send(&null, "nil?", 1, &[], None).is_truthy());
        assert_eq!(t.send(&null, "to_i", 1, &[], None).as_integer(), Some(0));
        assert_eq!(t.send(&null, "to_s", 1, &[], None).as_str(), Some(""));
        assert_eq!(t.send(&null, "inspect", 1, &[], None).as_str(), Some("nil"));
        assert!(!t.send(&null, "!=", 1, &[Object::null()], None).is_truthy());
        assert!(t.send(&null, "!=", 1, &[Object::integer(1)], None).is_truthy());
    }

    #[test]
    fn test_null_cannot_be_instantiated() {
        let vm = Vm::with_defaults();
        let mut t = vm.new_thread();
        let class = Object::Class(builtins().null_class.clone());
        let result = t.send(&class, "new", 4, &[], None);
        let err = result.as_error().expect("error object");
        assert_eq!(err.kind(), ErrorKind::NoMethodError);
        assert_eq!(err.message(), "Undefined Method 'new' for Null");
    }
}
