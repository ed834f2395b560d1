//! Shared helpers for the integration tests.
//!
//! Provides a small arithmetic grammar over `i64` for runtime tests and thin
//! wrappers around the cminor entry points.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use cminor_parsing::cminor::ast::{CompileUnit, Expr, Statement};
use cminor_parsing::cminor::{parse_compile_unit, parse_expression, parse_statement};
use cminor_parsing::parsing::parser::{char_set, chr, digit, nonterminal, token};
use cminor_parsing::parsing::{stdlib, DomainBuilder, GrammarBuilder, ParsingDomain, Rule};
use cminor_parsing::ParsingError;

pub const CALC: &str = "test.Calculator";

/// `Sum = Product ([+-] Product!)*`, `Product = Number ('*' Number!)*`,
/// numbers up to 1000, comments and whitespace skipped.
pub fn calculator() -> ParsingDomain<i64> {
    let mut builder = DomainBuilder::new();
    builder
        .ensure(CALC, |domain| {
            stdlib::create(domain)?;
            let mut g = GrammarBuilder::new(CALC);
            g.reference(stdlib::NAME)
                .link("Skip", &stdlib::qualified("spaces_and_comments"))
                .rule(
                    Rule::new(
                        "Sum",
                        nonterminal("Left", "Product", 0).then(
                            char_set("+-")
                                .act("Op")
                                .then(nonterminal("Right", "Product", 0).expect())
                                .many(),
                        ),
                    )
                    .value("Int")
                    .yields("Left")
                    .action("Op", |ctx, m| ctx.set("sign", if m.text == "-" { -1 } else { 1 }))
                    .post_call("Right", |ctx, right| {
                        let sign = ctx.get("sign").copied().unwrap_or(1);
                        let left = ctx.take_value().unwrap_or_default();
                        ctx.set_value(left + sign * right);
                    }),
                )
                .rule(
                    Rule::new(
                        "Product",
                        nonterminal("Left", "Number", 0)
                            .then(chr('*').then(nonterminal("Right", "Number", 0).expect()).many()),
                    )
                    .value("Int")
                    .yields("Left")
                    .post_call("Right", |ctx, right| {
                        let left = ctx.take_value().unwrap_or_default();
                        ctx.set_value(left * right);
                    }),
                )
                .rule(
                    Rule::new("Number", token(digit().some()).act("A0"))
                        .value("Int")
                        .predicate("A0", |ctx, m| match m.text.parse::<i64>() {
                            Ok(n) if n <= 1000 => {
                                ctx.set_value(n);
                                true
                            }
                            _ => false,
                        }),
                )
                .start("Sum")
                .skip("Skip");
            Ok(g)
        })
        .expect("calculator grammar registers");
    builder.build().expect("calculator grammar links")
}

pub fn calc(input: &str) -> Result<i64, ParsingError> {
    let domain = calculator();
    let grammar = domain.grammar(CALC).expect("calculator grammar exists");
    Ok(grammar
        .parse(input, 0, "calc.txt", Vec::new())?
        .expect("Sum has a value"))
}

pub fn expr(source: &str) -> Expr {
    parse_expression(source, 0, "test.cm")
        .unwrap_or_else(|e| panic!("'{source}' should parse: {e}"))
}

pub fn stmt(source: &str) -> Statement {
    parse_statement(source, 0, "test.cm")
        .unwrap_or_else(|e| panic!("'{source}' should parse: {e}"))
}

pub fn unit(source: &str) -> CompileUnit {
    parse_compile_unit(source, 0, "test.cm")
        .unwrap_or_else(|e| panic!("'{source}' should parse: {e}"))
}

pub fn stmt_error(source: &str) -> ParsingError {
    match parse_statement(source, 0, "test.cm") {
        Ok(statement) => panic!("'{source}' should not parse, got {statement:?}"),
        Err(error) => error,
    }
}

/// Source files with extension `cm` below `dir`, sorted.
pub fn fixture_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "cm"))
        .collect();
    files.sort();
    files
}

pub fn fixtures_dir(kind: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(kind)
}
