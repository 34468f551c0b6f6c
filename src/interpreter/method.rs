//! Method objects.

use std::fmt;
use std::sync::Arc;

use crate::interpreter::base::BaseObject;
use crate::interpreter::builtins::builtins;
use crate::interpreter::class::Class;
use crate::interpreter::object::Object;
use crate::interpreter::thread::{BlockFrame, Thread};

/// Signature every method body has: receiver, source line of the call
/// site, calling thread, arguments and an optional block.
pub type MethodFn =
    dyn Fn(&Object, usize, &mut Thread, &[Object], Option<&BlockFrame>) -> Object + Send + Sync;

/// A named method. Methods are objects of class `Method` and are what
/// method tables store.
pub struct MethodObject {
    base: BaseObject,
    name: String,
    func: Arc<MethodFn>,
    builtin: bool,
}

impl MethodObject {
    pub fn new<F>(name: impl Into<String>, func: F) -> Arc<MethodObject>
    where
        F: Fn(&Object, usize, &mut Thread, &[Object], Option<&BlockFrame>) -> Object
            + Send
            + Sync
            + 'static,
    {
        Self::with_class(
            builtins().method_class.clone(),
            name.into(),
            Arc::new(func),
            false,
        )
    }

    pub(crate) fn with_class(
        class: Arc<Class>,
        name: String,
        func: Arc<MethodFn>,
        builtin: bool,
    ) -> Arc<MethodObject> {
        Arc::new(Self {
            base: BaseObject::new(class),
            name,
            func,
            builtin,
        })
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for methods installed by the runtime itself rather than defined
    /// by user code.
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn call(
        &self,
        receiver: &Object,
        source_line: usize,
        thread: &mut Thread,
        args: &[Object],
        block: Option<&BlockFrame>,
    ) -> Object {
        (self.func)(receiver, source_line, thread, args, block)
    }
}

impl fmt::Debug for MethodObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({})", self.name)
    }
}

/// A builtin waiting to be installed on a class.
pub struct BuiltinMethod {
    pub name: String,
    pub func: Arc<MethodFn>,
}

impl BuiltinMethod {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Object, usize, &mut Thread, &[Object], Option<&BlockFrame>) -> Object
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}
