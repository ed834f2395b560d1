//! The `cminor-parse` command-line interface.
//!
//! This module is the main entry point for all CLI commands and dispatches
//! them to the library. Single-file commands report failures as full miette
//! diagnostics; `check` reports one compact block per failing file.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;
use termcolor::ColorChoice;
use walkdir::WalkDir;

use crate::cli::args::{CliArgs, Command};
use crate::cli::diagnostics::{print_diagnostic_to_stderr, ParseDiagnostic};
use crate::cminor::{self, SourceKind};
use crate::errors::{print_error, ErrorKind, ParsingError};
use crate::parsing::grammar::{ParseOptions, ParseSession};

pub mod args;
pub mod diagnostics;
pub mod output;

/// Extension of cminor source files.
const SOURCE_EXTENSION: &str = "cm";

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = CliArgs::parse();
    let color: ColorChoice = args.color.into();

    match args.command {
        Command::Ast { file, kind, json } => {
            let source = read_file_or_exit(&file);
            let options = ParseOptions::for_file(0, &file.display().to_string());
            let tree = parse_or_exit(kind, &source, &options, &mut ParseSession::new());
            if let Err(e) = output::print_tree(&tree, json, color) {
                warn(&format!("could not write output: {e}"));
                process::exit(1);
            }
        }

        Command::Check { path, kind } => {
            if !check_sources(&path, kind, color) {
                process::exit(1);
            }
        }

        Command::Trace { file, kind, rule } => {
            let source = read_file_or_exit(&file);
            let options = ParseOptions::for_file(0, &file.display().to_string()).traced();
            let mut session = ParseSession::new();
            let outcome = cminor::parse(kind, &source, &options, &mut session);
            if let Some(trace) = &session.trace {
                if let Err(e) = output::print_trace(trace, rule.as_deref(), color) {
                    warn(&format!("could not write output: {e}"));
                }
            }
            if let Err(e) = outcome {
                print_error(e);
                process::exit(1);
            }
        }

        Command::Grammars { name } => {
            let domain = cminor::domain().unwrap_or_else(|e| exit_with(e));
            let listings: Vec<String> = match name {
                Some(name) => match domain.grammar(&name) {
                    Some(grammar) => vec![grammar.to_string()],
                    None => exit_with(ParsingError::unsourced(
                        ErrorKind::UnknownGrammar {
                            name,
                            referenced_by: "the command line".into(),
                        },
                        "cli",
                    )),
                },
                None => domain.grammars().map(|grammar| grammar.to_string()).collect(),
            };
            if let Err(e) = output::print_grammars(listings, color) {
                warn(&format!("could not write output: {e}"));
                process::exit(1);
            }
        }
    }
}

// ============================================================================
// COMMAND HELPERS
// ============================================================================

/// Parses every source file under `path`. Returns whether all of them parsed.
fn check_sources(path: &Path, kind: SourceKind, color: ColorChoice) -> bool {
    let files = discover_sources(path);
    if files.is_empty() {
        warn(&format!("no .{SOURCE_EXTENSION} files found under {}", path.display()));
        return true;
    }

    let mut failed = 0usize;
    for (index, file) in files.iter().enumerate() {
        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                warn(&format!("cannot read {}: {e}", file.display()));
                failed += 1;
                continue;
            }
        };
        let file_index = u32::try_from(index).unwrap_or(u32::MAX);
        let options = ParseOptions::for_file(file_index, &file.display().to_string());
        if let Err(error) = cminor::parse(kind, &source, &options, &mut ParseSession::new()) {
            print_diagnostic_to_stderr(&ParseDiagnostic::new(&error, &source), color);
            failed += 1;
        }
    }

    let total = files.len();
    println!("checked {total} file(s): {} ok, {failed} failed", total - failed);
    failed == 0
}

/// `path` itself if it is a file, otherwise every source file below it in
/// sorted order.
fn discover_sources(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        match entry {
            Ok(entry)
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION) =>
            {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn(&format!("skipping unreadable entry: {e}")),
        }
    }
    files
}

fn parse_or_exit(
    kind: SourceKind,
    source: &str,
    options: &ParseOptions,
    session: &mut ParseSession<cminor::value::SyntaxValue>,
) -> cminor::value::SyntaxValue {
    cminor::parse(kind, source, options, session).unwrap_or_else(|e| exit_with(e))
}

fn read_file_or_exit(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        warn(&format!("cannot read {}: {e}", path.display()));
        process::exit(1);
    })
}

fn exit_with(error: ParsingError) -> ! {
    print_error(error);
    process::exit(1);
}

fn warn(message: &str) {
    eprintln!("[cminor-parse] {message}");
}
