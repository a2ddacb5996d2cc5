//! Stack-based virtual machine: values, lexically-scoped environments, and
//! the fetch/dispatch loop that executes a compiled [`lisby_bytecode::Program`].

mod arith;
mod environment;
mod error;
mod value;
mod vm;

pub use environment::{EnvArena, EnvId, Frame};
pub use error::RuntimeError;
pub use value::Value;
pub use vm::{is_builtin, Vm, BUILTIN_NAMES};
