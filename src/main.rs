//! codelex - print the style runs of a source file

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use codelex::error::Result;
use codelex::syntax::{spans, Registry};
use tracing_subscriber::EnvFilter;

/// Longest text excerpt printed per run
const EXCERPT_CHARS: usize = 40;

struct Options {
    lang: Option<String>,
    grammars: Vec<PathBuf>,
    file: Option<PathBuf>,
}

fn main() {
    if env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let Some(options) = parse_args(env::args().skip(1)) else {
        return Ok(());
    };

    let registry = Registry::with_builtins()?;
    for path in &options.grammars {
        registry.register_file(path)?;
    }
    registry.warm_up()?;

    let source = match &options.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let lang = options.lang.or_else(|| {
        options
            .file
            .as_ref()
            .and_then(|path| path.extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_owned)
    });

    let stream = registry.decorate(lang.as_deref(), &source, 0)?;
    let mut out = io::stdout().lock();
    for span in spans(&stream, 0, source.len()) {
        let excerpt: String = source[span.start..span.end]
            .chars()
            .take(EXCERPT_CHARS)
            .flat_map(char::escape_default)
            .collect();
        writeln!(out, "{}\t{}\t{}\t{}", span.start, span.end, span.style, excerpt)?;
    }
    Ok(())
}

/// Parse command line arguments, or return `None` after printing help or
/// version information.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Options> {
    let mut options = Options {
        lang: None,
        grammars: Vec::new(),
        file: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            "--version" | "-V" => {
                print_version();
                return None;
            }
            "--lang" | "-l" => options.lang = args.next(),
            "--grammar" | "-g" => {
                if let Some(path) = args.next() {
                    options.grammars.push(PathBuf::from(path));
                }
            }
            "-" => options.file = None,
            _ => options.file = Some(PathBuf::from(arg)),
        }
    }
    Some(options)
}

fn print_usage() {
    println!("codelex {} - data-driven lexical highlighter", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: codelex [OPTIONS] [FILE]");
    println!();
    println!("Reads FILE (or standard input) and prints one line per style run:");
    println!("start offset, end offset, style and the start of the run's text.");
    println!();
    println!("Options:");
    println!("  -l, --lang ID        Language identifier (default: file extension, then a guess)");
    println!("  -g, --grammar FILE   Register a TOML grammar file (repeatable)");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=codelex=debug) to log grammar compilation.");
}

fn print_version() {
    println!("codelex {}", env!("CARGO_PKG_VERSION"));
}
