mod cli;
mod repl;

use std::io::Read as _;
use std::path::Path;

use clap::Parser;

use lisby_bytecode::Program;
use lisby_compiler::{lex, parse, render, Compiler};
use lisby_vm::Vm;

use cli::Cli;

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "lisby=trace" } else { "lisby=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_text(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn read_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    let file = std::fs::File::open(path)?;
    // SAFETY: the file is not expected to be concurrently truncated by
    // another process while we read a trusted bytecode artifact from disk.
    match unsafe { memmap2::Mmap::map(&file) } {
        Ok(mmap) => Ok(mmap.to_vec()),
        Err(_) => std::fs::read(path),
    }
}

fn compile_source(path: &Path, debug: bool) -> Result<Program, i32> {
    let code = read_text(path).map_err(|err| {
        eprintln!("cannot read `{}': {err}", path.display());
        1
    })?;
    let toks = lex(&code).map_err(|err| {
        eprintln!("syntax error: {err}");
        1
    })?;
    let forest = parse(&toks).map_err(|err| {
        eprintln!("{}", render(&code, &path.display().to_string(), &err));
        1
    })?;
    if debug {
        eprintln!("got {} nodes", forest.len());
        for (i, node) in forest.iter().enumerate() {
            eprintln!("{i:3}: {node:?}");
        }
    }
    let mut program = Program::new();
    Compiler::new().compile(&mut program, &forest).map_err(|err| {
        eprintln!("{}", render(&code, &path.display().to_string(), &err));
        1
    })?;
    Ok(program)
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let program = if let Some(path) = &cli.source {
        match compile_source(path, cli.verbose) {
            Ok(p) => p,
            Err(code) => return std::process::ExitCode::from(code as u8),
        }
    } else if let Some(path) = &cli.bytecode {
        let raw = match read_bytes(path) {
            Ok(r) => r,
            Err(err) => {
                eprintln!("cannot read `{}': {err}", path.display());
                return std::process::ExitCode::FAILURE;
            }
        };
        match Program::from_bytes(&raw) {
            Ok(p) => p,
            Err(err) => {
                eprintln!("malformed bytecode: {err}");
                return std::process::ExitCode::FAILURE;
            }
        }
    } else {
        return std::process::ExitCode::from(repl::run(cli.verbose) as u8);
    };

    if let Some(dump_path) = &cli.dump {
        if let Err(err) = std::fs::write(dump_path, program.to_bytes()) {
            eprintln!("cannot write `{}': {err}", dump_path.display());
            return std::process::ExitCode::FAILURE;
        }
        println!("Bytecode dumped to file `{}'", dump_path.display());
        return std::process::ExitCode::SUCCESS;
    }

    if cli.display {
        println!("{}", program.dump());
        return std::process::ExitCode::SUCCESS;
    }

    let mut vm = Vm::new(program);
    vm.set_trace(cli.verbose);
    if let Err(err) = vm.run(0) {
        eprintln!("runtime error: {err}");
        return std::process::ExitCode::FAILURE;
    }
    match vm.stack().last() {
        Some(v) => println!("Result: {v}"),
        None => eprintln!("Result: no stack value"),
    }
    std::process::ExitCode::SUCCESS
}
