//! Command-line interface for peg2rs
//!
//! Compiles a grammar file into the Rust source code of its parser.
//!
//! Usage:
//!   peg2rs `<grammar>` [-o `<file>`] [--emit rust|grammar] [--no-check-actions] [-v...]

use clap::{ArgAction, Parser, ValueEnum};
use peg2rs::compiler::{format_compile_error, parse_grammar_with_options, CompileOptions};
use peg2rs::generators::{gen_peg, gen_rust_str};
use std::path::PathBuf;
use std::{fs, process};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// What to produce from the grammar
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Emit {
    /// Source code of the parser
    Rust,
    /// Normalized grammar
    Grammar,
}

/// Compile a PEG grammar with embedded actions into a Rust parser
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the grammar file
    #[arg(value_name = "GRAMMAR")]
    grammar: PathBuf,

    /// Write the result to FILE instead of the standard output
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Kind of output
    #[arg(long, value_enum, default_value = "rust", value_name = "KIND")]
    emit: Emit,

    /// Do not check that actions are valid Rust code
    #[arg(long)]
    no_check_actions: bool,

    /// Log more details on the standard error (can be repeated)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr, so that the generated code can be piped
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let file = args.grammar.display().to_string();

    let source = fs::read_to_string(&args.grammar).unwrap_or_else(|err| {
        eprintln!("{}: error: {}", file, err);
        process::exit(1);
    });

    info!(file = %file, bytes = source.len(), "compiling grammar");

    let options = CompileOptions {
        validate_actions: !args.no_check_actions,
    };

    let output = parse_grammar_with_options(&source, &options).and_then(|grammar| match args.emit {
        Emit::Rust => gen_rust_str(&grammar),
        Emit::Grammar => Ok(gen_peg(&grammar)),
    });

    let output = output.unwrap_or_else(|err| {
        eprintln!("{}", format_compile_error(&file, &source, &err));
        process::exit(1);
    });

    debug!(bytes = output.len(), "generated output");

    match &args.output {
        None => println!("{}", output.trim_end()),
        Some(path) => {
            if let Err(err) = fs::write(path, output) {
                eprintln!("{}: error: {}", path.display(), err);
                process::exit(1);
            }

            info!(output = %path.display(), "wrote output");
        }
    }
}
