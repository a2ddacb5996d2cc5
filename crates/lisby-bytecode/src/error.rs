use crate::opcode::InvalidOpcode;

/// Errors raised while deserializing or otherwise validating a [`crate::Program`].
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("initial magic not found")]
    MissingHeaderMagic,
    #[error("end magic not found")]
    MissingTrailerMagic,
    #[error("unexpected end of bytecode stream, wanted {wanted} more byte(s)")]
    Truncated { wanted: usize },
    #[error("negative length field: {0}")]
    NegativeLength(i64),
    #[error("string table entry is not valid utf-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    InvalidOpcode(#[from] InvalidOpcode),
    #[error("tape {tape} references unknown symbol index {index}")]
    UnknownSymbol { tape: usize, index: usize },
}
