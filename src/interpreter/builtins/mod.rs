//! Builtin classes for the runtime.
//!
//! The builtin class set is created once per process and shared by every
//! `Vm`, together with the null, true and false singletons. Bootstrapping
//! goes through `Bootstrap` rather than the public constructors, since
//! those consult the registry that is still being built.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::{
    wrong_argument_type, wrong_number_of_arguments, wrong_number_of_arguments_less, ErrorKind,
    CANT_YIELD_WITHOUT_BLOCK,
};
use crate::interpreter::class::Class;
use crate::interpreter::host::HostObject;
use crate::interpreter::method::{BuiltinMethod, MethodObject};
use crate::interpreter::object::Object;
use crate::interpreter::thread::{BlockFrame, Thread};

pub mod collections;
pub mod concurrent;
pub mod error;
pub mod null;
pub mod object;
pub mod scalars;

/// Handles to every builtin class plus the process-wide singletons.
pub struct Builtins {
    pub object_class: Arc<Class>,
    pub class_class: Arc<Class>,
    pub method_class: Arc<Class>,
    pub null_class: Arc<Class>,
    pub boolean_class: Arc<Class>,
    pub integer_class: Arc<Class>,
    pub string_class: Arc<Class>,
    pub array_class: Arc<Class>,
    pub hash_class: Arc<Class>,
    pub error_class: Arc<Class>,
    /// Indexed by `ErrorKind::index`.
    pub error_classes: [Arc<Class>; 4],
    pub host_class: Arc<Class>,
    /// The `Concurrent` namespace.
    pub concurrent_module: Arc<Class>,
    pub concurrent_array_class: Arc<Class>,
    pub concurrent_hash_class: Arc<Class>,
    pub null: Object,
    pub true_object: Object,
    pub false_object: Object,
}

lazy_static! {
    static ref BUILTINS: Builtins = Builtins::bootstrap();
}

/// The builtin registry, bootstrapped on first use.
pub fn builtins() -> &'static Builtins {
    &BUILTINS
}

impl Builtins {
    pub fn error_class(&self, kind: ErrorKind) -> &Arc<Class> {
        &self.error_classes[kind.index()]
    }

    /// Top-level constants every `Vm` starts with.
    pub fn constants(&self) -> Vec<(&str, Object)> {
        let mut constants: Vec<(&str, Object)> = [
            &self.object_class,
            &self.class_class,
            &self.method_class,
            &self.null_class,
            &self.boolean_class,
            &self.integer_class,
            &self.string_class,
            &self.array_class,
            &self.hash_class,
            &self.error_class,
            &self.host_class,
        ]
        .into_iter()
        .map(|class| (class.name(), Object::Class(class.clone())))
        .collect();
        for class in &self.error_classes {
            constants.push((class.name(), Object::Class(class.clone())));
        }
        constants.push(("Concurrent", Object::Class(self.concurrent_module.clone())));
        constants
    }

    fn bootstrap() -> Self {
        // Object and Class refer to each other, so both start unbound.
        let object_class = Arc::new(Class::unbound("Object".to_string(), None));
        let class_class = Arc::new(Class::unbound(
            "Class".to_string(),
            Some(object_class.clone()),
        ));
        object_class.base().bind_class(class_class.clone());
        class_class.base().bind_class(class_class.clone());

        let method_class = Class::with_metaclass(
            "Method".to_string(),
            Some(object_class.clone()),
            false,
            class_class.clone(),
        );
        let boot = Bootstrap {
            class_class: class_class.clone(),
            method_class: method_class.clone(),
        };

        boot.set_builtin_methods(&object_class, object::object_methods(), vec![]);
        boot.set_builtin_methods(&class_class, object::class_methods(), vec![]);

        let null_class = boot.define_class("Null", &object_class);
        boot.set_builtin_methods(&null_class, null::builtin_methods(), null::class_methods());

        let boolean_class = boot.define_class("Boolean", &object_class);
        let integer_class = boot.define_class("Integer", &object_class);
        boot.set_builtin_methods(&integer_class, scalars::integer_methods(), vec![]);
        let string_class = boot.define_class("String", &object_class);
        boot.set_builtin_methods(&string_class, scalars::string_methods(), vec![]);

        let array_class = boot.define_class("Array", &object_class);
        boot.set_builtin_methods(&array_class, collections::array::builtin_methods(), vec![]);
        let hash_class = boot.define_class("Hash", &object_class);
        boot.set_builtin_methods(&hash_class, collections::hash::builtin_methods(), vec![]);

        let error_class = boot.define_class("Error", &object_class);
        boot.set_builtin_methods(&error_class, error::builtin_methods(), vec![]);
        let error_classes =
            ErrorKind::ALL.map(|kind| boot.define_class(kind.class_name(), &error_class));

        let host_class = boot.define_class(HostObject::CLASS_NAME, &object_class);

        let concurrent_module = boot.define_class("Concurrent", &object_class);
        let concurrent_array_class = boot.define_class("Concurrent::Array", &object_class);
        boot.set_builtin_methods(
            &concurrent_array_class,
            concurrent::array::builtin_methods(),
            concurrent::array::class_methods(),
        );
        let concurrent_hash_class = boot.define_class("Concurrent::Hash", &object_class);
        boot.set_builtin_methods(
            &concurrent_hash_class,
            concurrent::hash::builtin_methods(),
            concurrent::hash::class_methods(),
        );
        concurrent_module.set_constant("Array", Object::Class(concurrent_array_class.clone()));
        concurrent_module.set_constant("Hash", Object::Class(concurrent_hash_class.clone()));

        let null = Object::Null(Arc::new(null::NullObject::new(null_class.clone())));
        let true_object = Object::Boolean(Arc::new(scalars::BooleanObject::new(
            boolean_class.clone(),
            true,
        )));
        let false_object = Object::Boolean(Arc::new(scalars::BooleanObject::new(
            boolean_class.clone(),
            false,
        )));

        Builtins {
            object_class,
            class_class,
            method_class,
            null_class,
            boolean_class,
            integer_class,
            string_class,
            array_class,
            hash_class,
            error_class,
            error_classes,
            host_class,
            concurrent_module,
            concurrent_array_class,
            concurrent_hash_class,
            null,
            true_object,
            false_object,
        }
    }
}

/// Class construction that never touches the registry.
struct Bootstrap {
    class_class: Arc<Class>,
    method_class: Arc<Class>,
}

impl Bootstrap {
    fn define_class(&self, name: &str, superclass: &Arc<Class>) -> Arc<Class> {
        Class::with_metaclass(
            name.to_string(),
            Some(superclass.clone()),
            false,
            self.class_class.clone(),
        )
    }

    fn set_builtin_methods(
        &self,
        class: &Arc<Class>,
        methods: Vec<BuiltinMethod>,
        class_methods: Vec<BuiltinMethod>,
    ) {
        for method in methods {
            class.define_method(self.method_object(method));
        }
        if class_methods.is_empty() {
            return;
        }
        let singleton = Class::with_metaclass(
            format!("#<Class:{}>", class.name()),
            None,
            true,
            self.class_class.clone(),
        );
        for method in class_methods {
            singleton.define_method(self.method_object(method));
        }
        class.base().set_singleton_class(singleton);
    }

    fn method_object(&self, method: BuiltinMethod) -> Arc<MethodObject> {
        MethodObject::with_class(self.method_class.clone(), method.name, method.func, true)
    }
}

/// Wrap a builtin body that reports failures as `Err(error_object)`.
pub(crate) fn method<F>(name: &str, body: F) -> BuiltinMethod
where
    F: Fn(&Object, usize, &mut Thread, &[Object], Option<&BlockFrame>) -> Result<Object, Object>
        + Send
        + Sync
        + 'static,
{
    BuiltinMethod::new(name, move |receiver, line, t, args, block| {
        match body(receiver, line, t, args, block) {
            Ok(result) => result,
            Err(error) => error,
        }
    })
}

pub(crate) fn check_arity(
    t: &Thread,
    line: usize,
    expected: usize,
    args: &[Object],
) -> Result<(), Object> {
    if args.len() != expected {
        return Err(t.error(
            ErrorKind::ArgumentError,
            line,
            wrong_number_of_arguments(expected, args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn check_max_arity(
    t: &Thread,
    line: usize,
    max: usize,
    args: &[Object],
) -> Result<(), Object> {
    if args.len() > max {
        return Err(t.error(
            ErrorKind::ArgumentError,
            line,
            wrong_number_of_arguments_less(max, args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn require_block<'a>(
    t: &Thread,
    line: usize,
    block: Option<&'a BlockFrame>,
) -> Result<&'a BlockFrame, Object> {
    block.ok_or_else(|| t.error(ErrorKind::InternalError, line, CANT_YIELD_WITHOUT_BLOCK))
}

/// Yield to `block`. An error object coming back from the block stops the
/// calling builtin.
pub(crate) fn yield_block(
    t: &mut Thread,
    block: &BlockFrame,
    args: &[Object],
) -> Result<Object, Object> {
    let result = t.builtin_method_yield(block, args);
    match result {
        Object::Error(_) => Err(result),
        _ => Ok(result),
    }
}

pub(crate) fn type_error(t: &Thread, line: usize, expected: &str, got: &Object) -> Object {
    t.error(
        ErrorKind::TypeError,
        line,
        wrong_argument_type(expected, got.class_name()),
    )
}

pub(crate) fn expect_integer(t: &Thread, line: usize, arg: &Object) -> Result<i64, Object> {
    arg.as_integer()
        .ok_or_else(|| type_error(t, line, "Integer", arg))
}

pub(crate) fn expect_string<'a>(
    t: &Thread,
    line: usize,
    arg: &'a Object,
) -> Result<&'a str, Object> {
    arg.as_str().ok_or_else(|| type_error(t, line, "String", arg))
}
