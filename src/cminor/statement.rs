//! Statements.
//!
//! Statements that end in `;` are split into a body rule and a terminated
//! rule so that `for` headers can reuse the bodies without the semicolon.

use crate::cminor::ast::{Statement, StatementKind};
use crate::cminor::value::{push_item, take_as, take_items, ParsingContext, SyntaxValue};
use crate::cminor::{expression, identifier, type_expr};
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{chr, choice, keyword, nonterminal, rule, string, Parser};
use crate::parsing::rule::{Context, Rule};
use crate::parsing::stdlib;
use crate::span::Span;

pub const NAME: &str = "cminor.parser.StatementGrammar";

const STATEMENTS: [&str; 12] = [
    "Compound",
    "If",
    "While",
    "DoWhile",
    "For",
    "Return",
    "Break",
    "Continue",
    "Construction",
    "Assignment",
    "ExpressionStatement",
    "Empty",
];

fn statement_rule(name: &str, definition: Parser) -> Rule<SyntaxValue> {
    Rule::new(name, definition).value("Statement")
}

/// First alternative that matches becomes the value.
fn one_of(name: &str, alternatives: &[&str]) -> Rule<SyntaxValue> {
    let mut statement = statement_rule(name, choice(alternatives.iter().map(|alt| rule(alt))));
    for alt in alternatives {
        statement = statement.yields(alt);
    }
    statement
}

/// `body ';'!`, with the semicolon included in the statement span.
fn terminated(name: &str, body: &str) -> Rule<SyntaxValue> {
    statement_rule(
        name,
        nonterminal("Body", body, 0)
            .then(chr(';').expect())
            .act("End"),
    )
    .yields("Body")
    .predicate("End", |ctx, m| match ctx.value_mut() {
        Some(SyntaxValue::Statement(statement)) => {
            statement.span.extend_to(m.span.end);
            true
        }
        _ => false,
    })
}

fn expression(local_name: &str) -> Parser {
    nonterminal(local_name, "Expression", 1)
}

fn rvalue(_: &Context<SyntaxValue>) -> Vec<SyntaxValue> {
    vec![ParsingContext::default().into()]
}

fn finish(ctx: &mut Context<SyntaxValue>, kind: StatementKind, span: Span) -> bool {
    ctx.set_value(Statement::new(kind, span).into());
    true
}

fn assignment_operator() -> Parser {
    chr('=').except(string("=="))
}

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        identifier::create(domain)?;
        type_expr::create(domain)?;
        expression::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .reference(identifier::NAME)
            .reference(type_expr::NAME)
            .reference(expression::NAME)
            .link("Identifier", &format!("{}.Identifier", identifier::NAME))
            .link("TypeExpr", &format!("{}.TypeExpr", type_expr::NAME))
            .link("Expression", &format!("{}.Expression", expression::NAME))
            .link("Postfix", &format!("{}.Postfix", expression::NAME))
            .link("SpacesAndComments", &stdlib::qualified("spaces_and_comments"));

        g.rule(one_of("Statement", &STATEMENTS))
            .rule(
                statement_rule(
                    "Compound",
                    chr('{')
                        .act("Open")
                        .then(nonterminal("Item", "Statement", 0).many())
                        .then(chr('}').act("Close").expect()),
                )
                .action("Open", |ctx, _| ctx.set("items", SyntaxValue::List(Vec::new())))
                .post_call("Item", |ctx, item| push_item(ctx, "items", item))
                .predicate("Close", |ctx, m| {
                    let Some(items) = take_items(ctx, "items", SyntaxValue::into_statement) else {
                        return false;
                    };
                    let span = Span::new(m.span.file_index, ctx.start(), m.span.end);
                    finish(ctx, StatementKind::Compound(items), span)
                }),
            )
            .rule(
                statement_rule(
                    "If",
                    keyword("if")
                        .then(chr('('))
                        .then(expression("Cond").expect())
                        .then(chr(')').expect())
                        .then(nonterminal("Then", "Statement", 0).expect())
                        .then(
                            keyword("else")
                                .then(nonterminal("Else", "Statement", 0).expect())
                                .opt(),
                        )
                        .act("If"),
                )
                .pre_call("Cond", rvalue)
                .predicate("If", |ctx, m| {
                    let condition = take_as(ctx, "Cond", SyntaxValue::into_expr);
                    let then_branch = take_as(ctx, "Then", SyntaxValue::into_statement);
                    let (Some(condition), Some(then_branch)) = (condition, then_branch) else {
                        return false;
                    };
                    let else_branch = take_as(ctx, "Else", SyntaxValue::into_statement).map(Box::new);
                    let kind = StatementKind::If {
                        condition,
                        then_branch: Box::new(then_branch),
                        else_branch,
                    };
                    finish(ctx, kind, m.span)
                }),
            )
            .rule(
                statement_rule(
                    "While",
                    keyword("while")
                        .then(chr('('))
                        .then(expression("Cond").expect())
                        .then(chr(')').expect())
                        .then(nonterminal("Body", "Statement", 0).expect())
                        .act("While"),
                )
                .pre_call("Cond", rvalue)
                .predicate("While", |ctx, m| {
                    let condition = take_as(ctx, "Cond", SyntaxValue::into_expr);
                    let body = take_as(ctx, "Body", SyntaxValue::into_statement);
                    let (Some(condition), Some(body)) = (condition, body) else {
                        return false;
                    };
                    let kind = StatementKind::While {
                        condition,
                        body: Box::new(body),
                    };
                    finish(ctx, kind, m.span)
                }),
            )
            .rule(
                statement_rule(
                    "DoWhile",
                    keyword("do")
                        .then(nonterminal("Body", "Statement", 0).expect())
                        .then(keyword("while").expect())
                        .then(chr('(').expect())
                        .then(expression("Cond").expect())
                        .then(chr(')').expect())
                        .then(chr(';').expect())
                        .act("DoWhile"),
                )
                .pre_call("Cond", rvalue)
                .predicate("DoWhile", |ctx, m| {
                    let body = take_as(ctx, "Body", SyntaxValue::into_statement);
                    let condition = take_as(ctx, "Cond", SyntaxValue::into_expr);
                    let (Some(body), Some(condition)) = (body, condition) else {
                        return false;
                    };
                    let kind = StatementKind::DoWhile {
                        body: Box::new(body),
                        condition,
                    };
                    finish(ctx, kind, m.span)
                }),
            )
            .rule(
                statement_rule(
                    "For",
                    keyword("for")
                        .then(chr('(').expect())
                        .then(nonterminal("Init", "ForInit", 0).opt())
                        .then(chr(';').expect())
                        .then(expression("Cond").opt())
                        .then(chr(';').expect())
                        .then(nonterminal("Step", "ForStep", 0).opt())
                        .then(chr(')').expect())
                        .then(nonterminal("Body", "Statement", 0).expect())
                        .act("For"),
                )
                .pre_call("Cond", rvalue)
                .predicate("For", |ctx, m| {
                    let Some(body) = take_as(ctx, "Body", SyntaxValue::into_statement) else {
                        return false;
                    };
                    let kind = StatementKind::For {
                        init: take_as(ctx, "Init", SyntaxValue::into_statement).map(Box::new),
                        condition: take_as(ctx, "Cond", SyntaxValue::into_expr),
                        step: take_as(ctx, "Step", SyntaxValue::into_statement).map(Box::new),
                        body: Box::new(body),
                    };
                    finish(ctx, kind, m.span)
                }),
            )
            .rule(
                statement_rule(
                    "Return",
                    keyword("return")
                        .then(expression("Value").opt())
                        .then(chr(';').expect())
                        .act("Return"),
                )
                .pre_call("Value", rvalue)
                .predicate("Return", |ctx, m| {
                    let value = take_as(ctx, "Value", SyntaxValue::into_expr);
                    finish(ctx, StatementKind::Return(value), m.span)
                }),
            )
            .rule(
                statement_rule("Break", keyword("break").then(chr(';').expect()).act("Break"))
                    .predicate("Break", |ctx, m| finish(ctx, StatementKind::Break, m.span)),
            )
            .rule(
                statement_rule(
                    "Continue",
                    keyword("continue").then(chr(';').expect()).act("Continue"),
                )
                .predicate("Continue", |ctx, m| finish(ctx, StatementKind::Continue, m.span)),
            )
            .rule(terminated("Construction", "ConstructionBody"))
            .rule(
                statement_rule(
                    "ConstructionBody",
                    rule("TypeExpr")
                        .then(rule("Identifier"))
                        .then(chr('=').then(expression("Init").expect()).opt())
                        .act("A0"),
                )
                .pre_call("Init", rvalue)
                .predicate("A0", |ctx, m| {
                    let type_expr = take_as(ctx, "TypeExpr", SyntaxValue::into_type);
                    let name = take_as(ctx, "Identifier", SyntaxValue::into_identifier);
                    let (Some(type_expr), Some(name)) = (type_expr, name) else {
                        return false;
                    };
                    let kind = StatementKind::Construction {
                        type_expr,
                        name,
                        init: take_as(ctx, "Init", SyntaxValue::into_expr),
                    };
                    finish(ctx, kind, m.span)
                }),
            )
            .rule(terminated("Assignment", "AssignmentBody"))
            .rule(
                statement_rule(
                    "AssignmentBody",
                    nonterminal("Target", "Postfix", 1)
                        .then(assignment_operator())
                        .then(expression("Value").expect())
                        .act("A0"),
                )
                .pre_call("Target", |_| vec![ParsingContext::lvalue().into()])
                .pre_call("Value", rvalue)
                .predicate("A0", |ctx, m| {
                    let target = take_as(ctx, "Target", SyntaxValue::into_expr);
                    let value = take_as(ctx, "Value", SyntaxValue::into_expr);
                    let (Some(target), Some(value)) = (target, value) else {
                        return false;
                    };
                    finish(ctx, StatementKind::Assignment { target, value }, m.span)
                }),
            )
            .rule(terminated("ExpressionStatement", "ExpressionBody"))
            .rule(
                statement_rule("ExpressionBody", expression("Expr").act("A0"))
                    .pre_call("Expr", rvalue)
                    .predicate("A0", |ctx, m| match take_as(ctx, "Expr", SyntaxValue::into_expr) {
                        Some(expr) => finish(ctx, StatementKind::Expression(expr), m.span),
                        None => false,
                    }),
            )
            .rule(
                statement_rule("Empty", chr(';').act("A0"))
                    .action("A0", |ctx, m| {
                        ctx.set_value(Statement::new(StatementKind::Empty, m.span).into())
                    }),
            )
            .rule(one_of(
                "ForInit",
                &["ConstructionBody", "AssignmentBody", "ExpressionBody"],
            ))
            .rule(one_of("ForStep", &["AssignmentBody", "ExpressionBody"]))
            .start("Statement")
            .skip("SpacesAndComments");
        Ok(g)
    })
}
