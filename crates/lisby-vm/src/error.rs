/// A user-visible runtime error: everything the VM can fail with once a
/// program is already running.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("cannot resolve symbol: {0}")]
    UnboundSymbol(String),
    #[error("unrecognized builtin: {0}")]
    UnrecognizedBuiltin(String),
    #[error("cannot {op} types {left} and {right}")]
    ArithmeticTypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("bitwise inversion applies only to ints, got {0}")]
    NotAnInt(&'static str),
    #[error("not only applies to boolean values, got {0}")]
    NotABool(&'static str),
    #[error("not a conditional value, got {0}")]
    NotConditional(String),
    #[error("non-comparable types: {left} vs. {right}")]
    NonComparable { left: String, right: String },
    #[error("{what} expects a list, got {got}")]
    NotAList { what: &'static str, got: &'static str },
    #[error("{0} got an empty list")]
    EmptyList(&'static str),
    #[error("can only apply a continuation, closure, or a builtin, got {0}")]
    NotCallable(&'static str),
    #[error("tail calls are not implemented")]
    TailCallUnimplemented,
    #[error("program ended abruptly")]
    ProgramEndedAbruptly,
    #[error("no tapes to run")]
    NoTapes,
    #[error("malformed program: {0}")]
    Module(#[from] lisby_bytecode::ModuleError),
    #[error("invalid opcode: {0}")]
    InvalidOpcode(#[from] lisby_bytecode::InvalidOpcode),
    #[error("division by zero")]
    DivisionByZero,
    #[error("nested eval produced no value")]
    EvalProducedNothing,
}
