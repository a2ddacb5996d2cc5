use lisby_core::{Interner, Symbol};

use crate::error::ModuleError;
use crate::opcode::Opcode;

const MAGIC: &[u8; 8] = b"LISBY001";

/// A compiled unit: one or more code tapes plus the string and symbol
/// tables they reference by index.
///
/// Tape 0 is the top-level entry point. Every `lambda` body compiles onto
/// its own tape, opened with [`Program::lambda_start`] and closed with
/// [`Program::lambda_end`]; a `PUSHCLOSURE` instruction elsewhere then
/// references that tape by index.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub tapes: Vec<Vec<u8>>,
    strings: Interner,
    symbols: Interner,
    active: usize,
}

impl Program {
    pub fn new() -> Self {
        Self {
            tapes: vec![Vec::new()],
            strings: Interner::new(),
            symbols: Interner::new(),
            active: 0,
        }
    }

    pub fn active_tape(&self) -> usize {
        self.active
    }

    pub fn set_active_tape(&mut self, tape: usize) {
        self.active = tape;
    }

    /// Offset of the next instruction on the active tape.
    pub fn cursor(&self) -> usize {
        self.tapes[self.active].len()
    }

    pub fn cursor_of(&self, tape: usize) -> usize {
        self.tapes[tape].len()
    }

    /// Look up an already-interned symbol, failing if it was never
    /// declared. Used where a miss is a compiler or runtime bug rather
    /// than something to silently paper over.
    pub fn symbol_find(&self, name: &str) -> Option<Symbol> {
        self.symbols.find(name)
    }

    pub fn find_or_add_symbol(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    pub fn find_or_add_string(&mut self, s: &str) -> Symbol {
        self.strings.intern(s)
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.symbols.resolve(sym)
    }

    pub fn string_value(&self, sym: Symbol) -> &str {
        self.strings.resolve(sym)
    }

    pub fn symbols_len(&self) -> usize {
        self.symbols.len()
    }

    pub fn strings_len(&self) -> usize {
        self.strings.len()
    }

    /// Opens a fresh tape for a lambda body, making it active, and returns
    /// `(enclosing_tape, new_tape)`. Pair with [`Program::lambda_end`].
    pub fn lambda_start(&mut self) -> (usize, usize) {
        let orig = self.active;
        let new_tape = self.tapes.len();
        self.tapes.push(Vec::new());
        self.active = new_tape;
        (orig, new_tape)
    }

    /// Emits the closing `RET` and restores the enclosing tape as active.
    pub fn lambda_end(&mut self, orig: usize) {
        self.emit(Opcode::Ret);
        self.active = orig;
    }

    /// Appends a zero-operand opcode to the active tape.
    pub fn emit(&mut self, op: Opcode) {
        self.tapes[self.active].push(op.as_byte());
        tracing::trace!(tape = self.active, op = op.name(), "emitted");
    }

    /// Appends an opcode followed by its 8-byte little-endian operand.
    pub fn emit_with_operand(&mut self, op: Opcode, operand: i64) {
        self.emit(op);
        self.emitraw(&operand.to_le_bytes());
    }

    /// Emits 8 placeholder bytes, returning their offset on the active
    /// tape so a later [`Program::patch`] can fill them in.
    pub fn emit_placeholder(&mut self) -> usize {
        let start = self.cursor();
        self.tapes[self.active].extend_from_slice(&[0x42; 8]);
        start
    }

    pub fn emitraw(&mut self, raw: &[u8]) {
        self.tapes[self.active].extend_from_slice(raw);
    }

    /// Overwrites 8 bytes at `pc` on `tape` with `value`, little-endian.
    /// Used to back-patch jump targets and `call/cc` return addresses
    /// once the code after them has been emitted.
    pub fn patch(&mut self, tape: usize, pc: usize, value: i64) {
        self.tapes[tape][pc..pc + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub fn emit_jump_placeholder(&mut self, op: Opcode) -> usize {
        self.emit(op);
        self.emit_placeholder()
    }

    /// Serializes this program to the on-disk bytecode format:
    /// `MAGIC, strings, symbols, tapes, reversed(MAGIC)`, where each table
    /// is `<count: i64 LE> (<len: i64 LE> <bytes>)*`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        write_strings(&mut out, self.strings.as_slice());
        write_strings(&mut out, self.symbols.as_slice());
        out.extend_from_slice(&(self.tapes.len() as i64).to_le_bytes());
        for tape in &self.tapes {
            out.extend_from_slice(&(tape.len() as i64).to_le_bytes());
            out.extend_from_slice(tape);
        }
        out.extend(MAGIC.iter().rev());
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, ModuleError> {
        let mut cursor = ByteCursor::new(raw);
        if cursor.take(MAGIC.len()).ok_or(ModuleError::MissingHeaderMagic)? != MAGIC.as_slice() {
            return Err(ModuleError::MissingHeaderMagic);
        }
        let strings = read_strings(&mut cursor)?;
        let symbols = read_strings(&mut cursor)?;
        let ntapes = cursor.next_i64()?;
        let ntapes = non_negative(ntapes)?;
        let mut tapes = Vec::with_capacity(ntapes);
        for _ in 0..ntapes {
            let len = non_negative(cursor.next_i64()?)?;
            let bytes = cursor.take(len).ok_or(ModuleError::Truncated { wanted: len })?;
            tapes.push(bytes.to_vec());
        }
        let trailer: Vec<u8> = MAGIC.iter().rev().copied().collect();
        if cursor.remaining() != trailer.as_slice() {
            return Err(ModuleError::MissingTrailerMagic);
        }
        Ok(Program {
            tapes,
            strings: Interner::from_ordered(strings),
            symbols: Interner::from_ordered(symbols),
            active: 0,
        })
    }

    /// Human-readable disassembly, for `lisby -d`.
    pub fn dump(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        let _ = writeln!(out, "# strings");
        for (i, s) in self.strings.iter() {
            let _ = writeln!(out, "{:4}  {}", i.as_u32(), s);
        }
        let _ = writeln!(out, "# symbols");
        for (i, s) in self.symbols.iter() {
            let _ = writeln!(out, "{:4}  {}", i.as_u32(), s);
        }
        let _ = writeln!(out, "# code");
        for (t, tape) in self.tapes.iter().enumerate() {
            let _ = writeln!(out, "# tape {}", t);
            let mut pc = 0usize;
            while pc < tape.len() {
                let byte = tape[pc];
                match Opcode::from_byte(byte) {
                    Ok(op) => {
                        let n = op.operand_len();
                        if n > 0 && pc + 1 + n <= tape.len() {
                            let mut buf = [0u8; 8];
                            buf.copy_from_slice(&tape[pc + 1..pc + 1 + n]);
                            let _ = writeln!(
                                out,
                                "{:5}  {:4}  {} {}",
                                pc,
                                byte,
                                op.name(),
                                i64::from_le_bytes(buf)
                            );
                            pc += 1 + n;
                        } else {
                            let _ = writeln!(out, "{:5}  {:4}  {}", pc, byte, op.name());
                            pc += 1;
                        }
                    }
                    Err(_) => {
                        let _ = writeln!(out, "{:5}  {:4}  ?", pc, byte);
                        pc += 1;
                    }
                }
            }
        }
        out
    }
}

fn write_strings(out: &mut Vec<u8>, items: &[String]) {
    out.extend_from_slice(&(items.len() as i64).to_le_bytes());
    for s in items {
        let bytes = s.as_bytes();
        out.extend_from_slice(&(bytes.len() as i64).to_le_bytes());
        out.extend_from_slice(bytes);
    }
}

fn read_strings(cursor: &mut ByteCursor<'_>) -> Result<Vec<String>, ModuleError> {
    let count = non_negative(cursor.next_i64()?)?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let len = non_negative(cursor.next_i64()?)?;
        let bytes = cursor.take(len).ok_or(ModuleError::Truncated { wanted: len })?;
        out.push(std::str::from_utf8(bytes)?.to_owned());
    }
    Ok(out)
}

fn non_negative(n: i64) -> Result<usize, ModuleError> {
    if n < 0 {
        Err(ModuleError::NegativeLength(n))
    } else {
        Ok(n as usize)
    }
}

struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.data.len() < n {
            return None;
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Some(head)
    }

    fn next_i64(&mut self) -> Result<i64, ModuleError> {
        let bytes = self.take(8).ok_or(ModuleError::Truncated { wanted: 8 })?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(buf))
    }

    fn remaining(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let mut p = Program::new();
        let sym = p.find_or_add_symbol("x");
        p.emit_with_operand(Opcode::PushInt, 42);
        p.emit_with_operand(Opcode::Store, sym.as_u32() as i64);
        p.emit(Opcode::Halt);

        let bytes = p.to_bytes();
        let back = Program::from_bytes(&bytes).unwrap();
        assert_eq!(back.tapes, p.tapes);
        assert_eq!(back.symbol_name(sym), "x");
    }

    #[test]
    fn rejects_missing_header_magic() {
        let err = Program::from_bytes(b"garbage!").unwrap_err();
        assert!(matches!(err, ModuleError::MissingHeaderMagic));
    }

    #[test]
    fn lambda_start_end_opens_and_closes_a_tape() {
        let mut p = Program::new();
        let (orig, new_tape) = p.lambda_start();
        assert_eq!(orig, 0);
        assert_eq!(new_tape, 1);
        p.emit(Opcode::PushUnit);
        p.lambda_end(orig);
        assert_eq!(p.active_tape(), 0);
        assert_eq!(p.tapes[1].last(), Some(&Opcode::Ret.as_byte()));
    }

    #[test]
    fn patch_overwrites_placeholder() {
        let mut p = Program::new();
        let at = p.emit_jump_placeholder(Opcode::Jump);
        p.patch(0, at, 99);
        assert_eq!(
            i64::from_le_bytes(p.tapes[0][at..at + 8].try_into().unwrap()),
            99
        );
    }

    #[test]
    fn dump_renders_one_line_per_instruction() {
        let mut p = Program::new();
        p.emit_with_operand(Opcode::PushInt, 5);
        p.emit(Opcode::Halt);
        assert_eq!(
            p.dump(),
            "# strings\n# symbols\n# code\n# tape 0\n    0    10  PUSHI 5\n    9     0  HALT\n"
        );
    }
}
