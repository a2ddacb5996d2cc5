//! Core AST, interning, and position tracking shared by the lisby compiler
//! and runtime.

mod interner;
mod node;
mod span;

pub use interner::{Interner, Symbol};
pub use node::Node;
pub use span::Span;
