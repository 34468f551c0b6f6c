//! The object runtime: values, classes, method resolution and the
//! thread-safe collections.

pub mod base;
pub mod builtins;
pub mod class;
pub mod environment;
pub mod host;
pub mod lookup;
pub mod method;
pub mod object;
pub mod pointer;
pub mod thread;
pub mod vm;

mod tests;

pub use base::{next_object_id, BaseObject};
pub use builtins::collections::{ArrayObject, HashObject};
pub use builtins::concurrent::{
    AccessMode, ConcurrentArrayObject, ConcurrentHashObject, FORWARDING_TABLE,
};
pub use builtins::error::ErrorObject;
pub use builtins::{builtins, Builtins};
pub use class::{Class, METHOD_MISSING};
pub use environment::Environment;
pub use host::{HostObject, HostValue};
pub use method::{BuiltinMethod, MethodFn, MethodObject};
pub use object::Object;
pub use pointer::Pointer;
pub use thread::{BlockFrame, Thread};
pub use vm::Vm;
