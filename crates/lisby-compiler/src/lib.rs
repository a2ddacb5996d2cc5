//! Lexing, parsing, macro expansion, and bytecode emission for the lisby
//! surface syntax. [`lex`] and [`parse`] turn source text into a forest of
//! [`lisby_core::Node`]s; [`Compiler::compile`] emits a [`lisby_bytecode::Program`]
//! from that forest.

mod compiler;
mod error;
mod lexer;
mod macros;
mod parser;

pub use compiler::Compiler;
pub use error::{render, SyntaxError};
pub use lexer::{lex, LexError, Spanned, Token};
pub use macros::Macro;
pub use parser::parse;
