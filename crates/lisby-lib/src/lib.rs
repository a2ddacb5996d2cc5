//! Facade crate bundling the lisby compiler and VM behind a single
//! dependency, for embedding lisby in a host application without pulling
//! in each subcrate individually.

pub use lisby_bytecode::{InvalidOpcode, ModuleError, Opcode, Program};
pub use lisby_compiler::{lex, parse, render, Compiler, LexError, Macro, Spanned, SyntaxError, Token};
pub use lisby_core::{Interner, Node, Span, Symbol};
pub use lisby_vm::{is_builtin, EnvArena, EnvId, Frame, RuntimeError, Value, Vm, BUILTIN_NAMES};

/// Everything that can go wrong turning source text into a value: a
/// malformed program, or a runtime fault while executing it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Lexes, parses, and compiles `src` into a fresh [`Program`] whose tape 0
/// ends in `HALT`. Does not execute it.
pub fn compile_str(src: &str) -> Result<Program, SyntaxError> {
    let toks = lex(src)?;
    let forest = parse(&toks)?;
    let mut program = Program::new();
    Compiler::new().compile(&mut program, &forest)?;
    Ok(program)
}

/// Compiles and runs `src` in a fresh VM, returning the top-of-stack value
/// left behind once execution reaches `HALT`. Intended for embedding and
/// for integration tests; the CLI drives [`Vm`] directly so it can reuse
/// one VM across a REPL session.
pub fn eval_str(src: &str) -> Result<Value, Error> {
    let program = compile_str(src)?;
    let mut vm = Vm::new(program);
    vm.run(0)?;
    vm.stack().last().cloned().ok_or_else(|| RuntimeError::EvalProducedNothing.into())
}
