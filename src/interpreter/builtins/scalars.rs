//! Boolean, Integer and String values.

use std::sync::Arc;

use crate::interpreter::base::BaseObject;
use crate::interpreter::class::Class;
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::{json_string, Object};

use super::{builtins, check_arity, expect_integer, expect_string, method};

pub struct BooleanObject {
    base: BaseObject,
    value: bool,
}

impl BooleanObject {
    pub(crate) fn new(class: Arc<Class>, value: bool) -> Self {
        Self {
            base: BaseObject::new(class),
            value,
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

pub struct IntegerObject {
    base: BaseObject,
    value: i64,
}

impl IntegerObject {
    pub fn new(value: i64) -> Self {
        Self {
            base: BaseObject::new(builtins().integer_class.clone()),
            value,
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

pub struct StringObject {
    base: BaseObject,
    value: String,
}

impl StringObject {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            base: BaseObject::new(builtins().string_class.clone()),
            value: value.into(),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn inspect(&self) -> String {
        json_string(&self.value)
    }
}

impl Object {
    pub fn integer(value: i64) -> Object {
        Object::Integer(Arc::new(IntegerObject::new(value)))
    }

    pub fn string(value: impl Into<String>) -> Object {
        Object::String(Arc::new(StringObject::new(value)))
    }
}

fn integer_operator(name: &'static str, op: fn(i64, i64) -> i64) -> BuiltinMethod {
    method(name, move |receiver, line, t, args, _| {
        check_arity(t, line, 1, args)?;
        let left = expect_integer(t, line, receiver)?;
        let right = expect_integer(t, line, &args[0])?;
        Ok(Object::integer(op(left, right)))
    })
}

pub(crate) fn integer_methods() -> Vec<BuiltinMethod> {
    vec![
        integer_operator("+", i64::wrapping_add),
        integer_operator("-", i64::wrapping_sub),
        integer_operator("*", i64::wrapping_mul),
        method("==", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            Ok(Object::boolean(receiver.equal_to(&args[0])))
        }),
        method("to_s", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string(receiver.to_string()))
        }),
    ]
}

pub(crate) fn string_methods() -> Vec<BuiltinMethod> {
    vec![
        method("+", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let left = expect_string(t, line, receiver)?;
            let right = expect_string(t, line, &args[0])?;
            Ok(Object::string(format!("{}{}", left, right)))
        }),
        method("==", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            Ok(Object::boolean(receiver.equal_to(&args[0])))
        }),
        method("length", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let s = expect_string(t, line, receiver)?;
            Ok(Object::integer(s.chars().count() as i64))
        }),
        method("upcase", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let s = expect_string(t, line, receiver)?;
            Ok(Object::string(s.to_uppercase()))
        }),
    ]
}
