//! The cminor grammar family.
//!
//! Each submodule contributes one grammar through a `create` factory that
//! first ensures the grammars it references. The linked domain is built once
//! per process and shared by every parse.

pub mod ast;
pub mod compile_unit;
pub mod expression;
pub mod identifier;
pub mod keyword;
pub mod literal;
pub mod statement;
pub mod type_expr;
pub mod value;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::cminor::ast::{CompileUnit, Expr, Statement};
use crate::cminor::value::{ParsingContext, SyntaxValue};
use crate::errors::{ErrorKind, ParsingError};
use crate::parsing::domain::{DomainBuilder, ParsingDomain};
use crate::parsing::grammar::{ParseOptions, ParseSession};

static DOMAIN: OnceCell<ParsingDomain<SyntaxValue>> = OnceCell::new();

/// Registers and links every cminor grammar.
pub fn build_domain() -> Result<ParsingDomain<SyntaxValue>, ParsingError> {
    let mut builder = DomainBuilder::new();
    keyword::create(&mut builder)?;
    compile_unit::create(&mut builder)?;
    builder.build()
}

/// The process-wide cminor domain, linked on first use.
pub fn domain() -> Result<&'static ParsingDomain<SyntaxValue>, ParsingError> {
    DOMAIN.get_or_try_init(build_domain)
}

/// What a piece of source text is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Unit,
    Statement,
    Expression,
}

impl SourceKind {
    pub fn grammar_name(self) -> &'static str {
        match self {
            SourceKind::Unit => compile_unit::NAME,
            SourceKind::Statement => statement::NAME,
            SourceKind::Expression => expression::NAME,
        }
    }

    /// Inherited arguments of the grammar's start rule.
    fn start_args(self) -> Vec<SyntaxValue> {
        match self {
            SourceKind::Expression => vec![ParsingContext::default().into()],
            SourceKind::Unit | SourceKind::Statement => Vec::new(),
        }
    }
}

/// Parses `source` as `kind` with the caller's options and session.
pub fn parse(
    kind: SourceKind,
    source: &str,
    options: &ParseOptions,
    session: &mut ParseSession<SyntaxValue>,
) -> Result<SyntaxValue, ParsingError> {
    let name = kind.grammar_name();
    let grammar = domain()?.grammar(name).ok_or_else(|| {
        ParsingError::unsourced(
            ErrorKind::UnknownGrammar {
                name: name.to_string(),
                referenced_by: "cminor".into(),
            },
            "parse",
        )
    })?;
    grammar
        .parse_in(source, options, kind.start_args(), session)?
        .ok_or_else(|| {
            ParsingError::unsourced(
                ErrorKind::MissingValue {
                    rule: name.to_string(),
                },
                "parse",
            )
        })
}

fn parse_file(kind: SourceKind, source: &str, file_index: u32, file_name: &str) -> Result<SyntaxValue, ParsingError> {
    let mut session = ParseSession::new();
    parse(kind, source, &ParseOptions::for_file(file_index, file_name), &mut session)
}

pub fn parse_expression(source: &str, file_index: u32, file_name: &str) -> Result<Expr, ParsingError> {
    parse_file(SourceKind::Expression, source, file_index, file_name)?.into_expr()
}

pub fn parse_statement(source: &str, file_index: u32, file_name: &str) -> Result<Statement, ParsingError> {
    parse_file(SourceKind::Statement, source, file_index, file_name)?.into_statement()
}

pub fn parse_compile_unit(source: &str, file_index: u32, file_name: &str) -> Result<CompileUnit, ParsingError> {
    parse_file(SourceKind::Unit, source, file_index, file_name)?.into_compile_unit()
}
