//! The virtual machine handle shared by interpreter threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::VmConfig;
use crate::error::{undefined_method, ErrorKind, RuntimeError};
use crate::interpreter::builtins::builtins;
use crate::interpreter::builtins::error::ErrorObject;
use crate::interpreter::class::Class;
use crate::interpreter::host::HostValue;
use crate::interpreter::object::Object;
use crate::interpreter::pointer::Pointer;
use crate::interpreter::thread::Thread;

/// Configuration plus the top-level constant table.
///
/// Builtin classes are process-wide; each `Vm` starts with a constant
/// slot for every one of them, `Concurrent` included.
pub struct Vm {
    config: VmConfig,
    constants: RwLock<IndexMap<String, Pointer>>,
    next_thread_id: AtomicUsize,
}

impl Vm {
    pub fn new(config: VmConfig) -> Result<Arc<Vm>, RuntimeError> {
        config.validate()?;
        Ok(Arc::new(Self::build(config)))
    }

    pub fn with_defaults() -> Arc<Vm> {
        Arc::new(Self::build(VmConfig::default()))
    }

    fn build(config: VmConfig) -> Self {
        let mut constants = IndexMap::new();
        for (name, value) in builtins().constants() {
            constants.insert(name.to_string(), Pointer::namespace(value));
        }
        log::debug!("vm created with {} builtin constants", constants.len());
        Self {
            config,
            constants: RwLock::new(constants),
            next_thread_id: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// A fresh interpreter thread context.
    pub fn new_thread(self: &Arc<Self>) -> Thread {
        let id = self.next_thread_id.fetch_add(1, Ordering::Relaxed);
        Thread::new(id, self.clone())
    }

    pub fn load_constant(&self, name: &str) -> Option<Pointer> {
        self.constants.read().get(name).cloned()
    }

    /// Bind a top-level constant. An existing slot is rebound in place.
    pub fn set_constant(&self, name: impl Into<String>, value: Object) {
        let name = name.into();
        let mut constants = self.constants.write();
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

    /// Resolve a `::`-separated constant path such as `Concurrent::Array`.
    pub fn lookup_constant_path(&self, path: &str) -> Result<Object, RuntimeError> {
        let mut segments = path.split("::");
        let first = segments.next().unwrap_or_default();
        let mut slot = self
            .load_constant(first)
            .ok_or_else(|| RuntimeError::UndefinedConstant(path.to_string()))?;
        let mut walked = first.to_string();

        for segment in segments {
            let namespace = match slot.return_class() {
                Some(class) if slot.is_namespace() => class,
                _ => return Err(RuntimeError::NotANamespace(walked)),
            };
            slot = namespace
                .get_constant(segment)
                .ok_or_else(|| RuntimeError::UndefinedConstant(path.to_string()))?;
            walked = format!("{}::{}", walked, segment);
        }
        Ok(slot.target().clone())
    }

    /// Create a class and bind it as a top-level constant. The superclass
    /// defaults to `Object`.
    pub fn define_class(&self, name: &str, superclass: Option<Arc<Class>>) -> Arc<Class> {
        let superclass = superclass.unwrap_or_else(|| builtins().object_class.clone());
        let class = Class::new(name, Some(superclass));
        self.set_constant(name, Object::Class(class.clone()));
        class
    }

    pub fn init_error_object(
        &self,
        kind: ErrorKind,
        source_line: usize,
        message: impl Into<String>,
    ) -> Object {
        Object::Error(Arc::new(ErrorObject::new(kind, source_line, message)))
    }

    /// The result of a send that found neither a method nor a
    /// method_missing hook.
    pub fn init_no_method_error(
        &self,
        source_line: usize,
        name: &str,
        receiver: &Object,
    ) -> Object {
        if self.config.trace_dispatch {
            log::debug!(
                "no method '{}' for {} (line {})",
                name,
                receiver.class_name(),
                source_line
            );
        }
        self.init_error_object(
            ErrorKind::NoMethodError,
            source_line,
            undefined_method(name, &receiver.to_string()),
        )
    }

    pub fn object_from_host(&self, value: HostValue) -> Object {
        Object::from_host(value)
    }
}
