use std::path::PathBuf;

use clap::Parser;

/// Running without `--source` or `--bytecode` drops you into a REPL.
#[derive(Parser, Debug)]
#[command(name = "lisby", bin_name = "lisby")]
#[command(about = "lisby interpreter")]
#[command(after_help = "Running without the source or destination arguments will give you a REPL.")]
pub struct Cli {
    /// Input source file, or `-` for stdin
    #[arg(short = 's', long)]
    pub source: Option<PathBuf>,

    /// Input bytecode file, or `-` for stdin
    #[arg(short = 'b', long)]
    pub bytecode: Option<PathBuf>,

    /// Print verbose output while compiling and running
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Without executing, dump compiled bytecode to this file
    #[arg(short = 'd', long)]
    pub dump: Option<PathBuf>,

    /// Without executing, print decoded bytecode
    #[arg(short = 'D', long)]
    pub display: bool,
}
