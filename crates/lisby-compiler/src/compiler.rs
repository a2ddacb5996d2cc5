use indexmap::IndexMap;

use lisby_bytecode::{Opcode, Program};
use lisby_core::{Node, Span};

use crate::error::SyntaxError;
use crate::macros::Macro;

/// Names that compile straight to a single instruction, in argument-reversed
/// order, rather than going through the general application path.
const BUILTINS: &[(&str, Opcode)] = &[
    ("+", Opcode::Add),
    ("-", Opcode::Sub),
    ("*", Opcode::Mul),
    ("/", Opcode::Div),
    ("%", Opcode::Mod),
    ("=", Opcode::Eq),
    ("!=", Opcode::Neq),
    ("<", Opcode::Lt),
    ("<=", Opcode::Le),
    (">", Opcode::Gt),
    (">=", Opcode::Ge),
    ("not", Opcode::Not),
    ("head", Opcode::Head),
    ("tail", Opcode::Tail),
    ("dump", Opcode::Dump),
    ("^", Opcode::Xor),
    ("&", Opcode::And),
    ("|", Opcode::Or),
    ("~", Opcode::Inv),
];

fn builtin_opcode(name: &str) -> Option<Opcode> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
}

const SPECIAL_FORMS: &[&str] = &[
    "let", "define", "lambda", "if", "begin", "set!", "display", "list", "::", "eval", "or",
    "and", "call/cc", "defmacro",
];

/// Walks a parsed forest and emits bytecode onto a [`Program`]. Tracks
/// user-defined macros (`defmacro`) across the whole compilation unit, so a
/// macro defined in one top-level form is visible to every later one.
#[derive(Debug, Default)]
pub struct Compiler {
    macros: IndexMap<String, Macro>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every form in `forest` onto `program`'s active tape, in
    /// order, with no `POP` between top-level forms, then emits the closing
    /// `HALT`.
    pub fn compile(&mut self, program: &mut Program, forest: &[Node]) -> Result<(), SyntaxError> {
        for node in forest {
            self.compile_node(program, node)?;
        }
        program.emit(Opcode::Halt);
        Ok(())
    }

    fn compile_node(&mut self, p: &mut Program, node: &Node) -> Result<(), SyntaxError> {
        match node {
            Node::Application { .. } => self.application(p, node),
            Node::Quoted(inner, _) => self.quoted_contents(p, inner, 0),
            Node::Quasiquoted(inner, _) => self.quasiquoted_contents(p, inner, 0),
            _ => self.atom(p, node),
        }
    }

    fn atom(&mut self, p: &mut Program, node: &Node) -> Result<(), SyntaxError> {
        match node {
            Node::Int(v, _) => p.emit_with_operand(Opcode::PushInt, *v),
            Node::Float(v, _) => {
                p.emit(Opcode::PushFloat);
                p.emitraw(&v.to_le_bytes());
            }
            Node::Symbol(name, _) => self.push_symbol(p, name),
            Node::True(_) => p.emit(Opcode::PushTrue),
            Node::False(_) => p.emit(Opcode::PushFalse),
            Node::String(s, _) => self.push_string(p, s),
            Node::Unit(_) => p.emit(Opcode::PushUnit),
            other => {
                return Err(SyntaxError::Expected {
                    what: "an atom",
                    got: format!("{other:?}"),
                    span: node.span(),
                });
            }
        }
        Ok(())
    }

    fn push_symbol(&self, p: &mut Program, name: &str) {
        let sym = p.find_or_add_symbol(name);
        p.emit_with_operand(Opcode::PushSymbol, sym.as_u32() as i64);
    }

    fn push_string(&self, p: &mut Program, s: &str) {
        let sym = p.find_or_add_string(s);
        p.emit_with_operand(Opcode::PushString, sym.as_u32() as i64);
    }

    fn declare_and_store(&self, p: &mut Program, name: &str) {
        let sym = p.find_or_add_symbol(name);
        p.emit_with_operand(Opcode::Declare, sym.as_u32() as i64);
        p.emit_with_operand(Opcode::Store, sym.as_u32() as i64);
    }

    fn store(&self, p: &mut Program, name: &str) {
        let sym = p.find_or_add_symbol(name);
        p.emit_with_operand(Opcode::Store, sym.as_u32() as i64);
    }

    fn storetop(&self, p: &mut Program, name: &str) {
        let sym = p.find_or_add_symbol(name);
        p.emit_with_operand(Opcode::StoreTop, sym.as_u32() as i64);
    }

    /// Compiles `exprs` one after another, popping the result of every
    /// expression but the last so only the final value survives on the
    /// stack.
    fn compile_exprs(&mut self, p: &mut Program, exprs: &[Node]) -> Result<(), SyntaxError> {
        for (i, expr) in exprs.iter().enumerate() {
            self.compile_node(p, expr)?;
            if i + 1 != exprs.len() {
                p.emit(Opcode::Pop);
            }
        }
        Ok(())
    }

    /// Compiles `nodes` back-to-front, so they land on the stack in their
    /// original left-to-right order once popped.
    fn compile_list(&mut self, p: &mut Program, nodes: &[Node]) -> Result<(), SyntaxError> {
        for node in nodes.iter().rev() {
            self.compile_node(p, node)?;
        }
        Ok(())
    }

    fn application(&mut self, p: &mut Program, node: &Node) -> Result<(), SyntaxError> {
        let Node::Application { applier, args, span } = node else {
            unreachable!("caller checked Application")
        };
        match applier.as_ref() {
            Node::Symbol(name, _) => {
                if let Some(op) = builtin_opcode(name) {
                    self.compile_list(p, args)?;
                    p.emit(op);
                    Ok(())
                } else if SPECIAL_FORMS.contains(&name.as_str()) {
                    self.special_form(p, name, args, *span)
                } else if let Some(mac) = self.macros.get(name).cloned() {
                    let expanded = mac.expand(args, *span)?;
                    for n in &expanded {
                        self.compile_node(p, n)?;
                    }
                    Ok(())
                } else {
                    self.symbol_apply(p, name, args)
                }
            }
            Node::Application { .. } => {
                self.compile_list(p, args)?;
                self.application(p, applier)?;
                p.emit(Opcode::Call);
                Ok(())
            }
            other => Err(SyntaxError::NotApplicable(format!("{other:?}"), *span)),
        }
    }

    fn symbol_apply(&mut self, p: &mut Program, name: &str, args: &[Node]) -> Result<(), SyntaxError> {
        self.compile_list(p, args)?;
        self.push_symbol(p, name);
        p.emit(Opcode::Call);
        Ok(())
    }

    fn special_form(
        &mut self,
        p: &mut Program,
        name: &str,
        args: &[Node],
        span: Span,
    ) -> Result<(), SyntaxError> {
        match name {
            "let" => self.compile_let(p, args, span),
            "define" => self.compile_define(p, args, span),
            "lambda" => self.compile_lambda(p, args, span),
            "if" => self.compile_if(p, args, span),
            "begin" => self.compile_begin(p, args, span),
            "set!" => self.compile_set(p, args, span),
            "display" => self.compile_display(p, args),
            "list" => self.compile_list_form(p, args),
            "::" => self.compile_concat_list(p, args, span),
            "eval" => self.compile_eval(p, args, span),
            "or" => self.compile_or(p, args, span),
            "and" => self.compile_and(p, args, span),
            "call/cc" => self.compile_callcc(p, args, span),
            "defmacro" => self.compile_defmacro(p, args, span),
            _ => unreachable!("name came from SPECIAL_FORMS"),
        }
    }

    fn compile_or(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 2 {
            return Err(SyntaxError::Arity { form: "or", expected: "2", got: args.len(), span });
        }
        self.compile_node(p, &args[0])?;
        p.emit(Opcode::JumpIfTrue);
        let patch_true = p.emit_placeholder();
        self.compile_node(p, &args[1])?;
        p.emit(Opcode::JumpIfFalse);
        let patch_false = p.emit_placeholder();
        let pc_true = p.cursor();
        p.emit(Opcode::PushTrue);
        p.emit(Opcode::Jump);
        let patch_end = p.emit_placeholder();
        let pc_false = p.cursor();
        p.emit(Opcode::PushFalse);
        let pc_end = p.cursor();
        let tape = p.active_tape();
        p.patch(tape, patch_false, pc_false as i64);
        p.patch(tape, patch_true, pc_true as i64);
        p.patch(tape, patch_end, pc_end as i64);
        Ok(())
    }

    fn compile_and(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 2 {
            return Err(SyntaxError::Arity { form: "and", expected: "2", got: args.len(), span });
        }
        self.compile_node(p, &args[0])?;
        p.emit(Opcode::JumpIfFalse);
        let patch_false1 = p.emit_placeholder();
        self.compile_node(p, &args[1])?;
        p.emit(Opcode::JumpIfFalse);
        let patch_false2 = p.emit_placeholder();
        p.emit(Opcode::PushTrue);
        p.emit(Opcode::Jump);
        let patch_end = p.emit_placeholder();
        let pc_false = p.cursor();
        p.emit(Opcode::PushFalse);
        let pc_end = p.cursor();
        let tape = p.active_tape();
        p.patch(tape, patch_false1, pc_false as i64);
        p.patch(tape, patch_false2, pc_false as i64);
        p.patch(tape, patch_end, pc_end as i64);
        Ok(())
    }

    fn compile_concat_list(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() < 2 {
            return Err(SyntaxError::Arity { form: "::", expected: "at least 2", got: args.len(), span });
        }
        for arg in args {
            self.compile_node(p, arg)?;
        }
        for _ in 0..args.len() - 1 {
            p.emit(Opcode::ListCat);
        }
        Ok(())
    }

    fn compile_defmacro(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        let _ = p;
        if args.len() < 2 {
            return Err(SyntaxError::Arity { form: "defmacro", expected: "at least 2", got: args.len(), span });
        }
        let raw = args[0].tolist();
        if raw.is_empty() {
            return Err(SyntaxError::Arity { form: "defmacro", expected: "a name", got: 0, span });
        }
        let mut names = Vec::with_capacity(raw.len());
        for n in &raw {
            names.push(n.as_symbol().ok_or_else(|| SyntaxError::NotASymbol(format!("{n:?}"), n.span()))?.to_string());
        }
        let name = names.remove(0);
        if self.macros.contains_key(&name) {
            return Err(SyntaxError::DuplicateMacro(name, span));
        }
        if SPECIAL_FORMS.contains(&name.as_str()) {
            return Err(SyntaxError::MacroShadowsSpecialForm(name, span));
        }
        let body = args[1..].to_vec();
        self.macros.insert(name.clone(), Macro { name, params: names, body });
        Ok(())
    }

    fn compile_callcc(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 1 {
            return Err(SyntaxError::Arity { form: "call/cc", expected: "1", got: args.len(), span });
        }
        let param = &args[0];
        if !param.is_application() {
            return Err(SyntaxError::MalformedCallCC { span });
        }
        let parargs = param.tolist();
        if parargs.len() < 2 || parargs[0].as_symbol() != Some("lambda") {
            return Err(SyntaxError::MalformedCallCC { span });
        }
        let binds = parargs[1];
        if !binds.is_application() || binds.tolist().len() != 1 {
            return Err(SyntaxError::MalformedCallCC { span });
        }
        let params: Vec<Node> = binds.tolist().into_iter().cloned().collect();
        let exprs: Vec<Node> = parargs[2..].iter().map(|n| (*n).clone()).collect();
        p.emit(Opcode::PushCont);
        let patch_cont_end = p.emit_placeholder();
        self.lambda_unpacked(p, &params, &exprs)?;
        p.emit(Opcode::Call);
        let pc_after = p.cursor();
        let tape = p.active_tape();
        p.patch(tape, patch_cont_end, pc_after as i64);
        Ok(())
    }

    fn compile_list_form(&mut self, p: &mut Program, args: &[Node]) -> Result<(), SyntaxError> {
        for arg in args.iter().rev() {
            self.compile_node(p, arg)?;
        }
        p.emit_with_operand(Opcode::List, args.len() as i64);
        Ok(())
    }

    fn compile_display(&mut self, p: &mut Program, args: &[Node]) -> Result<(), SyntaxError> {
        for arg in args {
            self.compile_node(p, arg)?;
            p.emit(Opcode::Print);
        }
        self.push_string(p, "\n");
        p.emit(Opcode::Print);
        p.emit(Opcode::PushUnit);
        Ok(())
    }

    fn compile_begin(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.is_empty() {
            return Err(SyntaxError::Arity { form: "begin", expected: "at least 1", got: 0, span });
        }
        self.compile_exprs(p, args)
    }

    fn compile_set(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 2 {
            return Err(SyntaxError::Arity { form: "set!", expected: "2", got: args.len(), span });
        }
        let target = args[0].as_symbol().ok_or_else(|| SyntaxError::NotASymbol(format!("{:?}", args[0]), args[0].span()))?;
        self.compile_node(p, &args[1])?;
        self.store(p, target);
        p.emit(Opcode::PushUnit);
        Ok(())
    }

    fn compile_if(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 3 {
            return Err(SyntaxError::Arity { form: "if", expected: "3", got: args.len(), span });
        }
        let (cond, then, els) = (&args[0], &args[1], &args[2]);
        self.compile_node(p, cond)?;
        p.emit(Opcode::JumpIfFalse);
        let patch_false = p.emit_placeholder();
        self.compile_node(p, then)?;
        p.emit(Opcode::Jump);
        let patch_end = p.emit_placeholder();
        let pc_else = p.cursor();
        let tape = p.active_tape();
        p.patch(tape, patch_false, pc_else as i64);
        self.compile_node(p, els)?;
        let pc_end = p.cursor();
        p.patch(tape, patch_end, pc_end as i64);
        Ok(())
    }

    fn compile_eval(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() != 1 {
            return Err(SyntaxError::Arity { form: "eval", expected: "1", got: args.len(), span });
        }
        self.compile_node(p, &args[0])?;
        p.emit(Opcode::Eval);
        Ok(())
    }

    fn compile_let(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() < 2 {
            return Err(SyntaxError::Arity { form: "let", expected: "at least 2", got: args.len(), span });
        }
        let raw_params = &args[0];
        let exprs = &args[1..];
        if !raw_params.is_application() {
            return Err(SyntaxError::Expected { what: "a binding list", got: format!("{raw_params:?}"), span: raw_params.span() });
        }
        p.emit(Opcode::NewEnv);
        for raw_param in &raw_params.tolist() {
            if !raw_param.is_application() {
                return Err(SyntaxError::Expected { what: "a `(name value)` binding", got: format!("{raw_param:?}"), span: raw_param.span() });
            }
            let values = raw_param.tolist();
            if values.len() != 2 {
                return Err(SyntaxError::Expected { what: "one binding value", got: format!("{} value(s)", values.len()), span: raw_param.span() });
            }
            let name = values[0].as_symbol().ok_or_else(|| SyntaxError::NotASymbol(format!("{:?}", values[0]), values[0].span()))?;
            let sym = p.find_or_add_symbol(name);
            p.emit_with_operand(Opcode::Declare, sym.as_u32() as i64);
            self.compile_node(p, values[1])?;
            self.store(p, name);
        }
        self.compile_exprs(p, exprs)?;
        p.emit(Opcode::DepartEnv);
        Ok(())
    }

    fn compile_define(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() < 2 {
            return Err(SyntaxError::Arity { form: "define", expected: "at least 2", got: args.len(), span });
        }
        let binding = &args[0];
        let exprs = &args[1..];
        match binding {
            Node::Symbol(name, _) => {
                if exprs.len() > 1 {
                    return Err(SyntaxError::Arity { form: "define", expected: "1 expression for a symbol binding", got: exprs.len(), span });
                }
                self.compile_node(p, &exprs[0])?;
                let sym = p.find_or_add_symbol(name);
                p.emit_with_operand(Opcode::Declare, sym.as_u32() as i64);
                self.storetop(p, name);
            }
            Node::Application { .. } => {
                let args_list = binding.tolist();
                if args_list.is_empty() {
                    return Err(SyntaxError::Arity { form: "define", expected: "a binding name", got: 0, span });
                }
                let mut names = Vec::with_capacity(args_list.len());
                for n in &args_list {
                    names.push(n.as_symbol().ok_or_else(|| SyntaxError::NonSymbolParameter { span: n.span() })?.to_string());
                }
                let name = names.remove(0);
                let sym = p.find_or_add_symbol(&name);
                p.emit_with_operand(Opcode::Declare, sym.as_u32() as i64);
                let params: Vec<Node> = names.into_iter().map(|n| Node::Symbol(n, span)).collect();
                self.lambda_unpacked(p, &params, exprs)?;
                self.storetop(p, &name);
            }
            other => {
                return Err(SyntaxError::Expected { what: "a binding name or `(name args...)`", got: format!("{other:?}"), span: other.span() });
            }
        }
        p.emit(Opcode::PushUnit);
        Ok(())
    }

    fn compile_lambda(&mut self, p: &mut Program, args: &[Node], span: Span) -> Result<(), SyntaxError> {
        if args.len() < 2 {
            return Err(SyntaxError::Arity { form: "lambda", expected: "at least 2", got: args.len(), span });
        }
        let params = match &args[0] {
            Node::Application { .. } => args[0].tolist().into_iter().cloned().collect(),
            Node::Unit(_) => Vec::new(),
            other => {
                return Err(SyntaxError::Expected { what: "a parameter list", got: format!("{other:?}"), span: other.span() });
            }
        };
        self.lambda_unpacked(p, &params, &args[1..])
    }

    fn lambda_unpacked(&mut self, p: &mut Program, params: &[Node], exprs: &[Node]) -> Result<(), SyntaxError> {
        let (tape_orig, tape_new) = p.lambda_start();
        for param in params {
            let name = param.as_symbol().ok_or(SyntaxError::NonSymbolParameter { span: param.span() })?;
            let sym = p.find_or_add_symbol(name);
            p.emit_with_operand(Opcode::Declare, sym.as_u32() as i64);
            p.emit_with_operand(Opcode::Store, sym.as_u32() as i64);
        }
        self.compile_exprs(p, exprs)?;
        p.lambda_end(tape_orig);
        p.emit_with_operand(Opcode::PushClosure, tape_new as i64);
        Ok(())
    }

    /// Compiles the contents of a `quote` form. Quoted data is built
    /// bottom-up: each element is compiled (at quotation level 0 — nested
    /// applications are still data, not calls) with a `QUOTED` tag, then
    /// joined into a list. Symbols push their raw name rather than being
    /// resolved against the environment; `unquote` has no meaning here and
    /// falls through to the atom error below.
    fn quoted_contents(&mut self, p: &mut Program, q: &Node, level: u32) -> Result<(), SyntaxError> {
        match q {
            Node::Application { .. } => {
                let members = q.tolist();
                for member in members.iter().rev() {
                    self.quoted_contents(p, member, 0)?;
                }
                p.emit_with_operand(Opcode::Quoted, level as i64);
                p.emit_with_operand(Opcode::List, members.len() as i64);
            }
            Node::Symbol(name, _) => {
                p.emit_with_operand(Opcode::Quoted, level as i64);
                let sym = p.find_or_add_symbol(name);
                p.emit_with_operand(Opcode::PushSymbolRaw, sym.as_u32() as i64);
            }
            Node::Quoted(inner, _) => self.quoted(p, inner, level + 1)?,
            other => {
                p.emit_with_operand(Opcode::Quoted, level as i64);
                self.atom(p, other)?;
            }
        }
        Ok(())
    }

    /// Compiles the contents of a `quasiquote` form. Structurally identical
    /// to [`Compiler::quoted_contents`] except `unquote` drops back into
    /// normal compilation once the nesting level reaches zero, and the
    /// final atom arm only tags with `QUASIQUOTED` when the level is
    /// non-negative (an `unquote` can drive it negative).
    fn quasiquoted_contents(&mut self, p: &mut Program, q: &Node, level: i32) -> Result<(), SyntaxError> {
        match q {
            Node::Application { .. } => {
                let members = q.tolist();
                for member in members.iter().rev() {
                    self.quasiquoted_contents(p, member, 0)?;
                }
                p.emit_with_operand(Opcode::Quasiquoted, level as i64);
                p.emit_with_operand(Opcode::List, members.len() as i64);
            }
            Node::Symbol(name, _) => {
                p.emit_with_operand(Opcode::Quasiquoted, level as i64);
                let sym = p.find_or_add_symbol(name);
                p.emit_with_operand(Opcode::PushSymbolRaw, sym.as_u32() as i64);
            }
            Node::Quasiquoted(inner, _) => self.quasiquoted(p, inner, level + 1)?,
            Node::Unquoted(inner, span) => {
                if level < 0 {
                    return Err(SyntaxError::Expected { what: "a valid unquote nesting", got: "too many unquotes".into(), span: *span });
                } else if level == 0 {
                    self.compile_node(p, inner)?;
                } else {
                    self.quasiquoted_contents(p, inner, level - 1)?;
                }
            }
            other => {
                if level >= 0 {
                    p.emit_with_operand(Opcode::Quasiquoted, level as i64);
                }
                self.atom(p, other)?;
            }
        }
        Ok(())
    }

    fn quoted(&mut self, p: &mut Program, node: &Node, level: u32) -> Result<(), SyntaxError> {
        self.quoted_contents(p, node, level)
    }

    fn quasiquoted(&mut self, p: &mut Program, node: &Node, level: i32) -> Result<(), SyntaxError> {
        self.quasiquoted_contents(p, node, level)
    }
}

#[cfg(test)]
mod tests {
    use lisby_vm::Vm;

    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn compile(src: &str) -> Result<Program, SyntaxError> {
        let toks = lex(src)?;
        let forest = parse(&toks)?;
        let mut program = Program::new();
        Compiler::new().compile(&mut program, &forest)?;
        Ok(program)
    }

    fn run(src: &str) -> Vec<lisby_vm::Value> {
        let program = compile(src).unwrap_or_else(|err| panic!("compile `{src}`: {err}"));
        let mut vm = Vm::new(program);
        vm.run(0).unwrap_or_else(|err| panic!("run `{src}`: {err}"));
        vm.stack().to_vec()
    }

    fn last(src: &str) -> lisby_vm::Value {
        run(src).pop().unwrap_or_else(|| panic!("no stack value for `{src}`"))
    }

    #[test]
    fn builtin_application_reverses_operands_onto_the_stack() {
        assert_eq!(last("(- 10 3)"), lisby_vm::Value::Int(7));
    }

    #[test]
    fn let_introduces_a_scoped_environment() {
        assert_eq!(last("(let ((x 1) (y 2)) (+ x y))"), lisby_vm::Value::Int(3));
    }

    #[test]
    fn define_binds_at_top_level_and_yields_unit() {
        assert_eq!(last("(define x 5)"), lisby_vm::Value::List(Vec::new()));
    }

    #[test]
    fn lambda_define_shorthand_compiles_like_lambda_plus_define() {
        assert_eq!(last("(define (double x) (* 2 x)) (double 21)"), lisby_vm::Value::Int(42));
    }

    #[test]
    fn if_picks_branch_by_condition() {
        assert_eq!(last("(if #t 1 2)"), lisby_vm::Value::Int(1));
        assert_eq!(last("(if #f 1 2)"), lisby_vm::Value::Int(2));
    }

    #[test]
    fn begin_sequences_and_returns_last() {
        assert_eq!(last("(begin 1 2 3)"), lisby_vm::Value::Int(3));
    }

    #[test]
    fn set_bang_requires_an_existing_binding() {
        assert!(compile("(set! never-defined 1)").is_ok());
        assert!(run("(define x 1) (set! x 2) x").last() == Some(&lisby_vm::Value::Int(2)));
    }

    #[test]
    fn or_short_circuits_without_evaluating_the_second_arm() {
        assert_eq!(last("(or #t (/ 1 0))"), lisby_vm::Value::True);
    }

    #[test]
    fn and_short_circuits_without_evaluating_the_second_arm() {
        assert_eq!(last("(and #f (/ 1 0))"), lisby_vm::Value::False);
    }

    #[test]
    fn concat_list_requires_at_least_two_lists() {
        assert!(compile("(:: (list 1))").is_err());
        assert_eq!(last("(:: (list 1) (list 2) (list 3))"), lisby_vm::Value::List(vec![
            lisby_vm::Value::Int(1),
            lisby_vm::Value::Int(2),
            lisby_vm::Value::Int(3),
        ]));
    }

    #[test]
    fn call_cc_requires_a_single_parameter_lambda() {
        assert!(compile("(call/cc 5)").is_err());
        assert!(compile("(call/cc (lambda (a b) a))").is_err());
        assert!(compile("(call/cc (lambda (k) (k 1)))").is_ok());
    }

    #[test]
    fn defmacro_rejects_duplicate_names() {
        assert!(compile("(defmacro (twice a) (* 2 a)) (defmacro (twice a) a)").is_err());
    }

    #[test]
    fn defmacro_rejects_special_form_names() {
        assert!(compile("(defmacro (if a) a)").is_err());
    }

    #[test]
    fn defmacro_expansion_does_not_evaluate_arguments_early() {
        assert_eq!(last("(defmacro (dbl a) (+ a a)) (dbl (/ 10 2))"), lisby_vm::Value::Int(10));
    }

    #[test]
    fn quote_produces_a_bare_symbol() {
        assert_eq!(last("'sym"), lisby_vm::Value::Symbol("sym".into()));
    }

    #[test]
    fn quote_cannot_contain_unquote() {
        assert!(compile("'(1 ,x)").is_err());
    }

    #[test]
    fn quasiquote_without_unquote_wraps_the_whole_form() {
        let got = last("`x");
        assert!(matches!(got, lisby_vm::Value::Quasiquoted(..)));
    }

    #[test]
    fn quasiquote_unquote_splices_the_evaluated_value() {
        assert_eq!(last("`(1 ,(+ 1 1))"), lisby_vm::Value::List(vec![lisby_vm::Value::Int(1), lisby_vm::Value::Int(2)]));
    }

    #[test]
    fn quasiquote_unquote_too_deep_is_an_error() {
        assert!(compile("`,,1").is_err());
    }

    #[test]
    fn reified_builtin_can_be_passed_as_a_value() {
        assert_eq!(last("(define (apply2 fun a b) (fun a b)) (apply2 + 3 4)"), lisby_vm::Value::Int(7));
    }
}
