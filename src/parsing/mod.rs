//! The PEG parsing runtime.
//!
//! Grammars are trees of [`Parser`] combinators grouped into [`Rule`]s,
//! registered in a [`DomainBuilder`] and linked into a [`ParsingDomain`].
//! Values flow between rules through an [`ObjectStack`]: inherited arguments
//! go in, one synthesized value comes out.

pub mod domain;
pub(crate) mod engine;
pub mod grammar;
pub mod matching;
pub mod parser;
pub mod rule;
pub mod scanner;
pub mod stack;
pub mod stdlib;
pub mod trace;

pub use domain::{DomainBuilder, ParsingDomain};
pub use grammar::{Grammar, GrammarBuilder, GrammarRef, ParseOptions, ParseSession, RuleLink};
pub use matching::Match;
pub use parser::{CharSet, Nonterminal, Parser};
pub use rule::{Attribute, Context, Matched, Rule, RuleId};
pub use scanner::Scanner;
pub use stack::ObjectStack;
pub use trace::{ParseTrace, TraceEvent, TraceEventKind};
