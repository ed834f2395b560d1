//! Literals. Lexical shapes come from the stdlib rules; the actions here
//! decode the matched text and reject what does not fit the value type.

use crate::cminor::ast::Literal;
use crate::cminor::value::SyntaxValue;
use crate::errors::{ErrorKind, ParsingError};
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{char_set, chr, choice, keyword, rule, token, Parser};
use crate::parsing::rule::{Context, Rule};
use crate::parsing::stdlib;

pub const NAME: &str = "cminor.parser.LiteralGrammar";

const ALTERNATIVES: [&str; 6] = [
    "BooleanLiteral",
    "FloatingLiteral",
    "IntegerLiteral",
    "CharLiteral",
    "StringLiteral",
    "NullLiteral",
];

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME);
        for name in ["digit_sequence", "uint", "hex", "char", "string"] {
            g.link(name, &stdlib::qualified(name));
        }

        let mut literal = Rule::new("Literal", choice(ALTERNATIVES.map(rule))).value("Literal");
        for name in ALTERNATIVES {
            literal = literal.yields(name);
        }

        g.rule(literal)
            .rule(
                Rule::new(
                    "BooleanLiteral",
                    keyword("true").act("True").or(keyword("false").act("False")),
                )
                .value("Literal")
                .action("True", |ctx, _| ctx.set_value(Literal::Bool(true).into()))
                .action("False", |ctx, _| ctx.set_value(Literal::Bool(false).into())),
            )
            .rule(
                Rule::new(
                    "FloatingLiteral",
                    token(
                        rule("digit_sequence")
                            .then(chr('.'))
                            .then(rule("digit_sequence"))
                            .then(exponent().opt())
                            .or(rule("digit_sequence").then(exponent())),
                    )
                    .act("A0"),
                )
                .value("Literal")
                .predicate("A0", |ctx, m| match m.text.parse::<f64>() {
                    Ok(value) => {
                        ctx.set_value(Literal::Float(value).into());
                        true
                    }
                    Err(_) => false,
                }),
            )
            .rule(
                Rule::new(
                    "IntegerLiteral",
                    rule("hex").act("Hex").or(rule("uint").act("Dec")),
                )
                .value("Literal")
                .checked("Hex", |ctx, m| {
                    set_int(ctx, m.text, u64::from_str_radix(&m.text[2..], 16).ok())
                })
                .checked("Dec", |ctx, m| set_int(ctx, m.text, m.text.parse::<u64>().ok())),
            )
            .rule(
                Rule::new("CharLiteral", rule("char").act("A0"))
                    .value("Literal")
                    .predicate("A0", |ctx, m| {
                        let decoded = unquote(m.text).and_then(unescape).unwrap_or_default();
                        let mut chars = decoded.chars();
                        match (chars.next(), chars.next()) {
                            (Some(ch), None) => {
                                ctx.set_value(Literal::Char(ch).into());
                                true
                            }
                            _ => false,
                        }
                    }),
            )
            .rule(
                Rule::new("StringLiteral", rule("string").act("A0"))
                    .value("Literal")
                    .predicate("A0", |ctx, m| match unquote(m.text).and_then(unescape) {
                        Some(text) => {
                            ctx.set_value(Literal::String(text).into());
                            true
                        }
                        None => false,
                    }),
            )
            .rule(
                Rule::new("NullLiteral", keyword("null").act("A0"))
                    .value("Literal")
                    .action("A0", |ctx, _| ctx.set_value(Literal::Null.into())),
            )
            .start("Literal");
        Ok(g)
    })
}

fn exponent() -> Parser {
    char_set("eE")
        .then(char_set("+-").opt())
        .then(rule("digit_sequence"))
}

/// The digits already matched, so a failed conversion is an overflow.
fn set_int(ctx: &mut Context<SyntaxValue>, text: &str, value: Option<u64>) -> Result<bool, ErrorKind> {
    let value = value.ok_or_else(|| ErrorKind::LiteralOverflow {
        literal: text.to_string(),
        type_name: "ulong".to_string(),
    })?;
    ctx.set_value(Literal::Int(value).into());
    Ok(true)
}

/// Text between the opening and closing quote.
fn unquote(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    chars.next()?;
    chars.next_back()?;
    Some(chars.as_str())
}

/// Decodes the escape sequences the stdlib `escape` rule accepts.
pub fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'x' | 'X' => {
                let digits = take_digits(&mut chars, 16, usize::MAX);
                char::from_u32(u32::from_str_radix(&digits, 16).ok()?)?
            }
            'u' => {
                let digits = take_digits(&mut chars, 16, 4);
                if digits.len() != 4 {
                    return None;
                }
                char::from_u32(u32::from_str_radix(&digits, 16).ok()?)?
            }
            first @ '0'..='7' => {
                let mut digits = first.to_string();
                digits.push_str(&take_digits(&mut chars, 8, usize::MAX));
                char::from_u32(u32::from_str_radix(&digits, 8).ok()?)?
            }
            other @ ('\'' | '"' | '\\' | '?') => other,
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, radix: u32, max: usize) -> String {
    let mut digits = String::new();
    while digits.len() < max {
        match chars.peek() {
            Some(ch) if ch.is_digit(radix) => {
                digits.push(*ch);
                chars.next();
            }
            _ => break,
        }
    }
    digits
}
