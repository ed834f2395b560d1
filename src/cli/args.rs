//! Defines the command-line arguments and subcommands for `cminor-parse`.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use termcolor::ColorChoice;

use crate::cminor::SourceKind;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "cminor-parse",
    version,
    about = "Parses cminor sources and inspects the cminor grammars."
)]
pub struct CliArgs {
    /// When to color output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a file and print its syntax tree.
    Ast {
        /// The path to the cminor source file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// What the file contains.
        #[arg(long, value_enum, default_value_t = SourceKind::Unit)]
        kind: SourceKind,
        /// Print the tree as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse every `.cm` file under a path and report the ones that fail.
    Check {
        /// A source file or a directory to search.
        #[arg(default_value = ".")]
        path: PathBuf,
        /// What the files contain.
        #[arg(long, value_enum, default_value_t = SourceKind::Unit)]
        kind: SourceKind,
    },
    /// Show the rule-level trace of a parse.
    Trace {
        /// The path to the cminor source file to trace.
        #[arg(required = true)]
        file: PathBuf,
        /// What the file contains.
        #[arg(long, value_enum, default_value_t = SourceKind::Unit)]
        kind: SourceKind,
        /// Only show events of this rule.
        #[arg(long)]
        rule: Option<String>,
    },
    /// Print the linked cminor grammars.
    Grammars {
        /// Only print the grammar with this qualified name.
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}
