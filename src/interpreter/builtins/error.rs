//! Error objects.
//!
//! Builtins never unwind on failure. They return one of these instead and
//! leave it to the dispatch loop to decide whether it becomes a raised
//! exception.

use crate::error::ErrorKind;
use crate::interpreter::base::BaseObject;
use crate::interpreter::method::BuiltinMethod;
use crate::interpreter::object::Object;

use super::{builtins, check_arity, method};

pub struct ErrorObject {
    base: BaseObject,
    kind: ErrorKind,
    message: String,
    source_line: usize,
}

impl ErrorObject {
    pub fn new(kind: ErrorKind, source_line: usize, message: impl Into<String>) -> Self {
        Self {
            base: BaseObject::new(builtins().error_class(kind).clone()),
            kind,
            message: message.into(),
            source_line,
        }
    }

    pub fn base(&self) -> &BaseObject {
        &self.base
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Line of the call site that produced the error.
    pub fn source_line(&self) -> usize {
        self.source_line
    }

    pub fn equal_to(&self, other: &ErrorObject) -> bool {
        self.kind == other.kind && self.message == other.message
    }

    pub fn inspect(&self) -> String {
        format!("#<{}: {}>", self.kind, self.message)
    }
}

pub(crate) fn builtin_methods() -> Vec<BuiltinMethod> {
    vec![method("message", |receiver, line, t, args, _| {
        check_arity(t, line, 0, args)?;
        Ok(match receiver.as_error() {
            Some(err) => Object::string(err.message()),
            None => Object::null(),
        })
    })]
}
