//! Error types for the object runtime.
//!
//! Two layers live here. `RuntimeError` covers failures of the Rust API
//! itself (bad configuration, marshaling, constant lookup) and is returned
//! through `Result`. `ErrorKind` names the language-level errors, which are
//! never raised inside the runtime: builtins hand them back as ordinary
//! error objects and the dispatch loop decides what to do with them.

use std::fmt;

use thiserror::Error;

/// Failures of the runtime's Rust-facing API.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot marshal host value: {0}")]
    Marshal(String),

    #[error("Undefined constant '{0}'")]
    UndefinedConstant(String),

    #[error("'{0}' is not a namespace")]
    NotANamespace(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuntimeError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn marshal(message: impl Into<String>) -> Self {
        Self::Marshal(message.into())
    }
}

/// The kinds of error object a builtin can return instead of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong number of arguments.
    ArgumentError,
    /// Argument of the wrong kind, e.g. a non-string map key.
    TypeError,
    /// Construction or IO failure, or a block-taking method called without a block.
    InternalError,
    /// Method resolution found nothing and no method_missing hook handled it.
    NoMethodError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::ArgumentError,
        ErrorKind::TypeError,
        ErrorKind::InternalError,
        ErrorKind::NoMethodError,
    ];

    /// Name of the error class objects of this kind belong to.
    pub fn class_name(self) -> &'static str {
        match self {
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::NoMethodError => "NoMethodError",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ErrorKind::ArgumentError => 0,
            ErrorKind::TypeError => 1,
            ErrorKind::InternalError => 2,
            ErrorKind::NoMethodError => 3,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

pub const CANT_YIELD_WITHOUT_BLOCK: &str = "Can't yield without a block";

pub fn wrong_number_of_arguments(expected: usize, got: usize) -> String {
    format!("Expect {} argument(s). got: {}", expected, got)
}

pub fn wrong_number_of_arguments_less(max: usize, got: usize) -> String {
    format!("Expect {} or less argument(s). got: {}", max, got)
}

pub fn wrong_argument_type(expected: &str, got: &str) -> String {
    format!("Expect argument to be {}. got: {}", expected, got)
}

pub fn undefined_method(name: &str, receiver: &str) -> String {
    format!("Undefined Method '{}' for {}", name, receiver)
}
