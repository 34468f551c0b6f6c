//! Corvid: the object runtime of a dynamically-typed, class-based language.
//!
//! This crate covers how values are represented, how a message sent to a
//! receiver is resolved to a method (singleton class, owner class,
//! ancestors, method_missing), and the `Concurrent::Hash` and
//! `Concurrent::Array` collections interpreter threads share. Parsing and
//! the instruction loop live elsewhere and call into this crate.
//!
//! ```
//! use corvid::interpreter::{Object, Vm};
//!
//! let vm = Vm::with_defaults();
//! let mut thread = vm.new_thread();
//! let array = Object::array(vec![Object::integer(1), Object::integer(2)]);
//! let length = thread.send(&array, "length", 1, &[], None);
//! assert_eq!(length.as_integer(), Some(2));
//! ```

#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::unnecessary_lazy_evaluations)]

pub mod config;
pub mod error;
pub mod interpreter;

pub use config::VmConfig;
pub use error::{ErrorKind, RuntimeError};
pub use interpreter::{Object, Thread, Vm};
