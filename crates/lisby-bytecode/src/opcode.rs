/// A single VM instruction. Instructions are one byte on the tape; a fixed
/// subset are followed by an 8-byte little-endian `i64` operand (see
/// [`Opcode::operand_len`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Halt = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Xor = 5,
    Mod = 6,
    And = 7,
    Or = 8,
    Inv = 9,
    PushInt = 10,
    PushFloat = 11,
    PushString = 12,
    PushSymbol = 13,
    PushSymbolRaw = 14,
    PushTrue = 15,
    PushFalse = 16,
    PushUnit = 17,
    PushClosure = 18,
    PushCont = 19,
    Quoted = 20,
    Pop = 21,
    Call = 22,
    TailCall = 23,
    Ret = 24,
    JumpIfTrue = 25,
    JumpIfFalse = 26,
    Jump = 27,
    Store = 28,
    StoreTop = 29,
    Eq = 30,
    Neq = 31,
    Gt = 32,
    Ge = 33,
    Lt = 34,
    Le = 35,
    Not = 36,
    Declare = 37,
    Print = 38,
    List = 39,
    Head = 40,
    Tail = 41,
    ListCat = 42,
    Eval = 43,
    Dump = 44,
    NewEnv = 45,
    DepartEnv = 46,
    Quasiquoted = 47,
}

/// Error returned when a raw byte does not correspond to a valid opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid opcode byte: {0}")]
pub struct InvalidOpcode(pub u8);

impl Opcode {
    const MAX: u8 = 48;

    pub const fn from_byte(byte: u8) -> Result<Self, InvalidOpcode> {
        let op = match byte {
            0 => Opcode::Halt,
            1 => Opcode::Add,
            2 => Opcode::Sub,
            3 => Opcode::Mul,
            4 => Opcode::Div,
            5 => Opcode::Xor,
            6 => Opcode::Mod,
            7 => Opcode::And,
            8 => Opcode::Or,
            9 => Opcode::Inv,
            10 => Opcode::PushInt,
            11 => Opcode::PushFloat,
            12 => Opcode::PushString,
            13 => Opcode::PushSymbol,
            14 => Opcode::PushSymbolRaw,
            15 => Opcode::PushTrue,
            16 => Opcode::PushFalse,
            17 => Opcode::PushUnit,
            18 => Opcode::PushClosure,
            19 => Opcode::PushCont,
            20 => Opcode::Quoted,
            21 => Opcode::Pop,
            22 => Opcode::Call,
            23 => Opcode::TailCall,
            24 => Opcode::Ret,
            25 => Opcode::JumpIfTrue,
            26 => Opcode::JumpIfFalse,
            27 => Opcode::Jump,
            28 => Opcode::Store,
            29 => Opcode::StoreTop,
            30 => Opcode::Eq,
            31 => Opcode::Neq,
            32 => Opcode::Gt,
            33 => Opcode::Ge,
            34 => Opcode::Lt,
            35 => Opcode::Le,
            36 => Opcode::Not,
            37 => Opcode::Declare,
            38 => Opcode::Print,
            39 => Opcode::List,
            40 => Opcode::Head,
            41 => Opcode::Tail,
            42 => Opcode::ListCat,
            43 => Opcode::Eval,
            44 => Opcode::Dump,
            45 => Opcode::NewEnv,
            46 => Opcode::DepartEnv,
            47 => Opcode::Quasiquoted,
            _ => return Err(InvalidOpcode(byte)),
        };
        Ok(op)
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Xor => "XOR",
            Opcode::Mod => "MOD",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Inv => "INV",
            Opcode::PushInt => "PUSHI",
            Opcode::PushFloat => "PUSHF",
            Opcode::PushString => "PUSHSTR",
            Opcode::PushSymbol => "PUSHSY",
            Opcode::PushSymbolRaw => "PUSHSYRAW",
            Opcode::PushTrue => "PUSHTRUE",
            Opcode::PushFalse => "PUSHFALSE",
            Opcode::PushUnit => "PUSHUNIT",
            Opcode::PushClosure => "PUSHCLOSURE",
            Opcode::PushCont => "PUSHCONT",
            Opcode::Quoted => "QUOTED",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::TailCall => "TAILCALL",
            Opcode::Ret => "RET",
            Opcode::JumpIfTrue => "JT",
            Opcode::JumpIfFalse => "JF",
            Opcode::Jump => "JMP",
            Opcode::Store => "STORE",
            Opcode::StoreTop => "STORETOP",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Not => "NOT",
            Opcode::Declare => "DECLARE",
            Opcode::Print => "PRINT",
            Opcode::List => "LIST",
            Opcode::Head => "HEAD",
            Opcode::Tail => "TAIL",
            Opcode::ListCat => "LISTCAT",
            Opcode::Eval => "EVAL",
            Opcode::Dump => "DUMP",
            Opcode::NewEnv => "NEWENV",
            Opcode::DepartEnv => "DEPARTENV",
            Opcode::Quasiquoted => "QUASIQUOTED",
        }
    }

    /// Number of bytes of immediate operand data following this opcode on
    /// the tape: either 0 or 8 (a little-endian `i64`).
    pub const fn operand_len(self) -> usize {
        match self {
            Opcode::PushInt
            | Opcode::PushFloat
            | Opcode::PushString
            | Opcode::PushSymbol
            | Opcode::Store
            | Opcode::StoreTop
            | Opcode::PushClosure
            | Opcode::JumpIfFalse
            | Opcode::Jump
            | Opcode::Declare
            | Opcode::List
            | Opcode::PushSymbolRaw
            | Opcode::Quoted
            | Opcode::JumpIfTrue
            | Opcode::PushCont
            | Opcode::Quasiquoted => 8,
            _ => 0,
        }
    }
}
