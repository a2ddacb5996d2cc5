use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use lisby_bytecode::Program;
use lisby_compiler::{lex, parse, render, Compiler, LexError};
use lisby_vm::Vm;

const VOCABULARY: &[&str] = &["define", "set!", "let", "lambda"];

/// Completes on the special-form vocabulary only; lisby has no notion of
/// "words known so far" to complete against, so this is a fixed list
/// rather than something that grows with the session.
struct VocabHelper;

impl Completer for VocabHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(|c: char| c.is_whitespace() || c == '(').map(|i| i + 1).unwrap_or(0);
        let prefix = &line[start..pos];
        let candidates = VOCABULARY
            .iter()
            .filter(|w| w.starts_with(prefix))
            .map(|w| Pair { display: (*w).to_string(), replacement: format!("{w} ") })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for VocabHelper {
    type Hint = String;
}
impl Highlighter for VocabHelper {}
impl Validator for VocabHelper {}
impl Helper for VocabHelper {}

fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(".lisby_history"))
}

/// Runs the interactive REPL: lines accumulate until they parse as a
/// balanced, non-empty form, then compile onto the running program and
/// execute from where the last line left off. A runtime or syntax error
/// rewinds the program to just before the offending form so the session
/// can keep going.
pub fn run(debug: bool) -> i32 {
    let mut editor: Editor<VocabHelper, rustyline::history::DefaultHistory> =
        match Editor::new() {
            Ok(e) => e,
            Err(err) => {
                eprintln!("failed to start line editor: {err}");
                return 1;
            }
        };
    editor.set_helper(Some(VocabHelper));
    let history_path = history_path();
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    let mut program = Program::new();
    let mut compiler = Compiler::new();
    let mut vm = Vm::new(Program::new());
    vm.set_trace(debug);
    let mut pc = 0usize;
    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() { ">> " } else { ":: " };
        let line = match editor.readline(prompt) {
            Ok(l) => l,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("Interrupted.");
                pending.clear();
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("Exiting...");
                break;
            }
            Err(err) => {
                eprintln!("line editor error: {err}");
                break;
            }
        };
        let _ = editor.add_history_entry(line.as_str());
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(&line);

        let toks = match lex(&pending) {
            Ok(toks) => toks,
            Err(LexError::ImbalancedParens(n)) if n < 0 => {
                println!("Surprising parentheses!");
                pending.clear();
                continue;
            }
            Err(LexError::ImbalancedParens(_)) => {
                // Still missing closing parens: keep accumulating lines.
                continue;
            }
            Err(err) => {
                println!("{err}");
                pending.clear();
                continue;
            }
        };
        if toks.is_empty() {
            pending.clear();
            continue;
        }
        let full_input = std::mem::take(&mut pending);

        match parse(&toks).and_then(|forest| {
            compiler.compile(&mut program, &forest)?;
            Ok(())
        }) {
            Ok(()) => {}
            Err(err) => {
                println!("{}", render(&full_input, "<repl>", &err));
                pc = vm.rewind_after_error();
                continue;
            }
        }

        if debug {
            eprintln!("{}", program.dump());
        }
        vm.reload(program.clone());
        match vm.run(pc) {
            Ok(next_pc) => {
                pc = next_pc;
                match vm.stack().last() {
                    Some(v) => println!("-> {v}"),
                    None => println!("-> no stack value"),
                }
            }
            Err(err) => {
                println!("{err}");
                pc = vm.rewind_after_error();
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
    0
}
