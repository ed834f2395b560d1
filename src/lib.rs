//! PEG parsing runtime and the cminor grammar family.
//!
//! [`parsing`] is the language-agnostic runtime: combinators, rules, grammars
//! and the linker that turns them into a [`ParsingDomain`]. [`cminor`] builds
//! the cminor grammars on top of it and produces a typed syntax tree.

pub use crate::errors::{print_error, ErrorCategory, ErrorKind, ErrorReporting, ParsingError};
pub use crate::parsing::{DomainBuilder, GrammarBuilder, ParseOptions, ParseSession, ParsingDomain};
pub use crate::span::Span;

pub mod cli;
pub mod cminor;
pub mod errors;
pub mod parsing;
pub mod span;
