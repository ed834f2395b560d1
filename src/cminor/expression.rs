//! Expressions, by precedence level.
//!
//! Every rule takes the inherited `ctx` attribute (a [`ParsingContext`]) and
//! synthesizes an [`Expr`]. Binary levels are left-associative and fold their
//! operands as they go.

use crate::cminor::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::cminor::value::{parsing_context, push_item, take_as, take_items, ParsingContext, SyntaxValue};
use crate::cminor::{identifier, literal};
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{char_set, chr, choice, keyword, nonterminal, rule, string, Parser};
use crate::parsing::rule::{Context, Rule};
use crate::parsing::stdlib;
use crate::span::Span;

pub const NAME: &str = "cminor.parser.ExpressionGrammar";

/// Rule with the inherited context attribute and an `Expr` value.
fn expression_rule(name: &str, definition: Parser) -> Rule<SyntaxValue> {
    Rule::new(name, definition)
        .inherited("ctx", "ParsingContext")
        .value("Expr")
}

/// Pre-call producing a fresh (non-lvalue) context.
fn rvalue(_: &Context<SyntaxValue>) -> Vec<SyntaxValue> {
    vec![ParsingContext::default().into()]
}

/// `operand (operator operand!)*`
fn binary_level(name: &str, operand: &str, operators: Parser) -> Rule<SyntaxValue> {
    let definition = nonterminal("Left", operand, 1).then(
        operators
            .act("Op")
            .then(nonterminal("Right", operand, 1).expect())
            .many(),
    );
    expression_rule(name, definition)
        .forward("Left", &["ctx"])
        .forward("Right", &["ctx"])
        .yields("Left")
        .predicate("Op", |ctx, m| match BinaryOp::from_symbol(m.text) {
            Some(op) => {
                ctx.set("op", op.into());
                true
            }
            None => false,
        })
        .post_call("Right", fold_binary)
}

fn fold_binary(ctx: &mut Context<SyntaxValue>, right: SyntaxValue) {
    let op = ctx.get("op").and_then(SyntaxValue::as_binary_op);
    let left = ctx.take_value().and_then(|value| value.into_expr().ok());
    // A missing value here surfaces as a MissingValue error when the rule leaves.
    if let (Some(op), Some(left), Ok(right)) = (op, left, right.into_expr()) {
        ctx.set_value(Expr::binary(op, left, right).into());
    }
}

/// Replaces the current value with `wrap(value)`, spanning from the start of
/// the rule to `end`.
fn wrap_value(ctx: &mut Context<SyntaxValue>, end: Span, wrap: impl FnOnce(Box<Expr>) -> ExprKind) -> bool {
    let Some(target) = ctx.take_value().and_then(|value| value.into_expr().ok()) else {
        return false;
    };
    let span = Span::new(end.file_index, ctx.start(), end.end);
    ctx.set_value(Expr::new(wrap(Box::new(target)), span).into());
    true
}

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        identifier::create(domain)?;
        literal::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .reference(identifier::NAME)
            .reference(literal::NAME)
            .link("Identifier", &format!("{}.Identifier", identifier::NAME))
            .link("Literal", &format!("{}.Literal", literal::NAME))
            .link("SpacesAndComments", &stdlib::qualified("spaces_and_comments"));

        g.rule(
            expression_rule("Expression", nonterminal("Disjunction", "Disjunction", 1))
                .forward("Disjunction", &["ctx"])
                .yields("Disjunction"),
        )
        .rule(binary_level("Disjunction", "Conjunction", string("||")))
        .rule(binary_level("Conjunction", "Equality", string("&&")))
        .rule(binary_level(
            "Equality",
            "Relational",
            string("==").or(string("!=")),
        ))
        .rule(binary_level(
            "Relational",
            "Shift",
            choice([
                string("<="),
                string(">="),
                chr('<').except(string("<<")),
                chr('>').except(string(">>")),
            ]),
        ))
        .rule(binary_level(
            "Shift",
            "Additive",
            string("<<").or(string(">>")),
        ))
        .rule(binary_level("Additive", "Multiplicative", char_set("+-")))
        .rule(binary_level("Multiplicative", "Prefix", char_set("*/%")))
        .rule(
            expression_rule(
                "Prefix",
                char_set("\\-+!~")
                    .act("Op")
                    .then(nonterminal("Operand", "Prefix", 1).expect())
                    .or(nonterminal("Postfix", "Postfix", 1)),
            )
            .forward("Operand", &["ctx"])
            .forward("Postfix", &["ctx"])
            .yields("Postfix")
            .predicate("Op", |ctx, m| match UnaryOp::from_symbol(m.text) {
                Some(op) => {
                    ctx.set("op", SyntaxValue::UnaryOp(op));
                    true
                }
                None => false,
            })
            .post_call("Operand", |ctx, operand| {
                let op = ctx.get("op").and_then(SyntaxValue::as_unary_op);
                if let (Some(op), Ok(operand)) = (op, operand.into_expr()) {
                    let span = Span::new(operand.span.file_index, ctx.start(), operand.span.end);
                    let kind = ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    };
                    ctx.set_value(Expr::new(kind, span).into());
                }
            }),
        )
        .rule(
            expression_rule(
                "Postfix",
                nonterminal("Primary", "Primary", 1).then(
                    choice([
                        chr('.').then(rule("Identifier").expect()).act("Member"),
                        chr('(')
                            .act("Open")
                            .then(nonterminal("Arg", "Expression", 1).sep_by(chr(',')).opt())
                            .then(chr(')').expect())
                            .act("Invoke"),
                        chr('[')
                            .then(nonterminal("Index", "Expression", 1).expect())
                            .then(chr(']').expect())
                            .act("Indexed"),
                    ])
                    .many(),
                ),
            )
            .forward("Primary", &["ctx"])
            .yields("Primary")
            .pre_call("Arg", rvalue)
            .pre_call("Index", rvalue)
            .post_call("Arg", |ctx, arg| push_item(ctx, "args", arg))
            .action("Open", |ctx, _| ctx.set("args", SyntaxValue::List(Vec::new())))
            .predicate("Member", |ctx, m| {
                let Some(member) = take_as(ctx, "Identifier", SyntaxValue::into_identifier) else {
                    return false;
                };
                wrap_value(ctx, m.span, |target| ExprKind::Member { target, member })
            })
            .predicate("Invoke", |ctx, m| {
                let Some(arguments) = take_items(ctx, "args", SyntaxValue::into_expr) else {
                    return false;
                };
                wrap_value(ctx, m.span, |target| ExprKind::Invoke { target, arguments })
            })
            .predicate("Indexed", |ctx, m| {
                let Some(index) = take_as(ctx, "Index", SyntaxValue::into_expr) else {
                    return false;
                };
                wrap_value(ctx, m.span, |target| ExprKind::Index {
                    target,
                    index: Box::new(index),
                })
            }),
        )
        .rule(
            expression_rule(
                "Primary",
                choice([
                    chr('(')
                        .then(nonterminal("Paren", "Expression", 1))
                        .then(chr(')').expect()),
                    rule("Literal").act("Literal"),
                    keyword("this").act("This"),
                    rule("Identifier").act("Name"),
                ]),
            )
            .forward("Paren", &["ctx"])
            .yields("Paren")
            .predicate("Literal", |ctx, m| {
                if parsing_context(ctx).parsing_lvalue {
                    return false;
                }
                match take_as(ctx, "Literal", SyntaxValue::into_literal) {
                    Some(literal) => {
                        ctx.set_value(Expr::new(ExprKind::Literal(literal), m.span).into());
                        true
                    }
                    None => false,
                }
            })
            .action("This", |ctx, m| ctx.set_value(Expr::new(ExprKind::This, m.span).into()))
            .predicate("Name", |ctx, m| {
                match take_as(ctx, "Identifier", SyntaxValue::into_identifier) {
                    Some(id) => {
                        ctx.set_value(Expr::new(ExprKind::Identifier(id), m.span).into());
                        true
                    }
                    None => false,
                }
            }),
        )
        .start("Expression")
        .skip("SpacesAndComments");
        Ok(g)
    })
}
