//! Generic objects and the methods of `Object` and `Class`.

use std::sync::Arc;

use crate::interpreter::base::BaseObject;
use crate::interpreter::class::Class;
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::Object;
use crate::interpreter::thread::Thread;

use super::{check_arity, expect_string, method, type_error};

/// An instance of a user-defined class. It carries nothing beyond the
/// base state; everything it knows lives in instance variables.
pub struct InstanceObject {
    base: BaseObject,
}

impl InstanceObject {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            base: BaseObject::new(class),
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    /// `#<Foo:12 @a=1 @b=x >`
    pub fn inspect(&self) -> String {
        let mut out = format!("#<{}:{} ", self.base.class().name(), self.base.id());
        for (name, value) in self.base.instance_variables().iter() {
            out.push_str(&format!("{}={} ", name, value));
        }
        out.push('>');
        out
    }

    /// A `to_json` defined by user code on the object's class wins; the
    /// plain textual form is the fallback.
    pub(crate) fn to_json(&self, obj: &Object, t: &mut Thread) -> String {
        match obj.find_method("to_json") {
            Some(custom) if !custom.is_builtin() => {
                let result = custom.call(obj, 0, t, &[], None);
                result.to_string()
            }
            _ => obj.to_string(),
        }
    }
}

pub(crate) fn object_methods() -> Vec<BuiltinMethod> {
    vec![
        method("!", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::boolean(!receiver.is_truthy()))
        }),
        method("!=", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            Ok(Object::boolean(!receiver.equal_to(&args[0])))
        }),
        method("==", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            Ok(Object::boolean(receiver.equal_to(&args[0])))
        }),
        method("class", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::Class(receiver.class()))
        }),
        method("inspect", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string(receiver.inspect()))
        }),
        method("instance_variable_get", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let name = expect_string(t, line, &args[0])?;
            Ok(receiver.instance_variable_get(name).0)
        }),
        method("instance_variable_set", |receiver, line, t, args, _| {
            check_arity(t, line, 2, args)?;
            let name = expect_string(t, line, &args[0])?;
            Ok(receiver.instance_variable_set(name, args[1].clone()))
        }),
        method("instance_variables", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            let names = receiver
                .instance_variables()
                .names()
                .into_iter()
                .map(Object::string)
                .collect();
            Ok(Object::array(names))
        }),
        method("nil?", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::boolean(receiver.is_null()))
        }),
        method("object_id", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::integer(receiver.id() as i64))
        }),
        method("respond_to?", |receiver, line, t, args, _| {
            check_arity(t, line, 1, args)?;
            let name = expect_string(t, line, &args[0])?;
            Ok(Object::boolean(receiver.find_method(name).is_some()))
        }),
        method("singleton_class", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::Class(receiver.ensure_singleton_class()))
        }),
        method("to_json", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string(receiver.to_json(t)))
        }),
        method("to_s", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            Ok(Object::string(receiver.to_string()))
        }),
    ]
}

/// Instance methods of `Class`, which makes them class methods of every
/// class.
pub(crate) fn class_methods() -> Vec<BuiltinMethod> {
    vec![
        method("name", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            match receiver {
                Object::Class(class) => Ok(Object::string(class.name())),
                other => Err(type_error(t, line, "Class", other)),
            }
        }),
        method("new", |receiver, line, t, args, block| {
            let class = match receiver {
                Object::Class(class) => class.clone(),
                other => return Err(type_error(t, line, "Class", other)),
            };
            let instance = Object::Instance(Arc::new(InstanceObject::new(class)));
            if let Some(initialize) = instance.find_method("initialize") {
                let result = initialize.call(&instance, line, t, args, block);
                if result.as_error().is_some() {
                    return Err(result);
                }
            }
            Ok(instance)
        }),
        method("superclass", |receiver, line, t, args, _| {
            check_arity(t, line, 0, args)?;
            match receiver {
                Object::Class(class) => Ok(class
                    .superclass()
                    .map(|superclass| Object::Class(superclass.clone()))
                    .unwrap_or_else(Object::null)),
                other => Err(type_error(t, line, "Class", other)),
            }
        }),
    ]
}
