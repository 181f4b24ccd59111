//! yamlet command-line tool for inspecting block-style YAML.
//!
//! Usage: yamlet [OPTIONS] [PATH]
//!
//! Prints the node stream of a file, every `*.yml`/`*.yaml` file in a
//! directory, or stdin (when PATH is absent or `-`).
//!
//! Options:
//!       --tokens           Print the lexer's token stream instead of nodes
//!       --check            Only report whether each input parses
//!       --max-depth <N>    Parser nesting limit [default: 256]
//!   -v, --verbose          Trace the parser to stderr
//!   -h, --help             Print help
//!   -V, --version          Print version
//!
//! Logging can also be configured with the `YAMLET_LOG` environment
//! variable, using `tracing-subscriber` filter syntax.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use libyamlet::{lex, parse_tokens_with, Location, Options, ParseFailure, DEFAULT_MAX_DEPTH};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[command(name = "yamlet", version, about = "Print the token and node streams of block-style YAML")]
struct Args {
    /// File or directory to read; stdin when absent or `-`
    path: Option<PathBuf>,

    /// Print the lexer's token stream instead of nodes
    #[arg(long, conflicts_with = "check")]
    tokens: bool,

    /// Only report whether each input parses
    #[arg(long)]
    check: bool,

    /// Parser nesting limit
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Trace the parser to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Nodes,
    Tokens,
    Check,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.tokens {
            Mode::Tokens
        } else if self.check {
            Mode::Check
        } else {
            Mode::Nodes
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_env("YAMLET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = Options::default().with_max_depth(args.max_depth);
    let mode = args.mode();

    // Check if input is a directory
    if let Some(path) = args.path.as_deref().filter(|p| *p != Path::new("-")) {
        if path.is_dir() {
            process_directory(path, mode, &options);
        }

        let input = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                process::exit(1);
            }
        };
        let display = path.display().to_string();
        process::exit(process_input(&input, &display, mode, &options));
    }

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Error reading stdin: {}", e);
        process::exit(1);
    }
    process::exit(process_input(&input, "<stdin>", mode, &options));
}

/// Whether a directory entry is a YAML input, leaving out override files.
fn is_yaml_input(path: &Path) -> bool {
    let is_yaml = path
        .extension()
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false);
    is_yaml && !path.to_string_lossy().ends_with(".expect.yml")
}

fn process_directory(dir_path: &Path, mode: Mode, options: &Options) -> ! {
    let entries = match fs::read_dir(dir_path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir_path.display(), e);
            process::exit(1);
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_yaml_input(path))
        .collect();
    paths.sort();
    debug!(dir = %dir_path.display(), files = paths.len(), "processing directory");

    let mut had_errors = false;

    for path in &paths {
        let path_str = path.display().to_string();
        let input = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {}", path_str, e);
                had_errors = true;
                continue;
            }
        };

        if mode != Mode::Check {
            println!("# {}", path_str);
        }
        if process_input(&input, &path_str, mode, options) != 0 {
            had_errors = true;
        }
    }

    process::exit(if had_errors { 1 } else { 0 });
}

/// Lex and parse one input, printing what `mode` asks for. Returns the exit
/// code for this input.
fn process_input(input: &str, path: &str, mode: Mode, options: &Options) -> i32 {
    let tokens = match lex(input) {
        Ok(tokens) => tokens,
        Err(e) => {
            report(input, path, &ParseFailure::from(e));
            return 1;
        }
    };

    if mode == Mode::Tokens {
        for (index, token) in tokens.iter().enumerate() {
            println!(
                "{:>4} {:>3} {:?} => {}",
                index,
                token.column,
                token.kind,
                token.text().escape_debug()
            );
        }
        return 0;
    }

    match parse_tokens_with(&tokens, options) {
        Ok(nodes) => {
            match mode {
                Mode::Check => println!("{}: ok", path),
                _ => {
                    for node in &nodes {
                        println!("{}", node);
                    }
                }
            }
            0
        }
        Err(failure) => {
            if mode == Mode::Nodes {
                for node in &failure.partial {
                    println!("{}", node);
                }
            }
            report(input, path, &failure);
            1
        }
    }
}

fn report(input: &str, path: &str, failure: &ParseFailure) {
    match failure.error.offset() {
        Some(offset) => {
            let location = Location::locate(input, offset);
            eprintln!("error: {}:{}: {}", path, location, failure);
        }
        None => eprintln!("error: {}: {}", path, failure),
    }
}
