//! Compile units: a sequence of free functions.

use crate::cminor::ast::{CompileUnit, Function, Parameter};
use crate::cminor::value::{push_item, take_as, take_items, SyntaxValue};
use crate::cminor::{identifier, statement, type_expr};
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{chr, nonterminal, rule};
use crate::parsing::rule::Rule;
use crate::parsing::stdlib;

pub const NAME: &str = "cminor.parser.CompileUnitGrammar";

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        identifier::create(domain)?;
        type_expr::create(domain)?;
        statement::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .reference(identifier::NAME)
            .reference(type_expr::NAME)
            .reference(statement::NAME)
            .link("Identifier", &format!("{}.Identifier", identifier::NAME))
            .link("TypeExpr", &format!("{}.TypeExpr", type_expr::NAME))
            .link("CompoundStatement", &format!("{}.Compound", statement::NAME))
            .link("SpacesAndComments", &stdlib::qualified("spaces_and_comments"))
            .rule(
                Rule::new("CompileUnit", rule("Function").many().act("Unit"))
                    .value("CompileUnit")
                    .post_call("Function", |ctx, function| push_item(ctx, "functions", function))
                    .predicate("Unit", |ctx, m| {
                        let Some(functions) = take_items(ctx, "functions", SyntaxValue::into_function) else {
                            return false;
                        };
                        let unit = CompileUnit {
                            file_name: m.file_name.to_string(),
                            functions,
                            span: m.span,
                        };
                        ctx.set_value(unit.into());
                        true
                    }),
            )
            .rule(
                Rule::new(
                    "Function",
                    nonterminal("ReturnType", "TypeExpr", 0)
                        .then(rule("Identifier"))
                        .then(chr('('))
                        .then(rule("Parameter").sep_by(chr(',')).opt())
                        .then(chr(')').expect())
                        .then(nonterminal("Body", "CompoundStatement", 0).expect())
                        .act("A0"),
                )
                .value("Function")
                .post_call("Parameter", |ctx, parameter| push_item(ctx, "parameters", parameter))
                .predicate("A0", |ctx, m| {
                    let return_type = take_as(ctx, "ReturnType", SyntaxValue::into_type);
                    let name = take_as(ctx, "Identifier", SyntaxValue::into_identifier);
                    let body = take_as(ctx, "Body", SyntaxValue::into_statement);
                    let parameters = take_items(ctx, "parameters", SyntaxValue::into_parameter);
                    let (Some(return_type), Some(name), Some(body), Some(parameters)) =
                        (return_type, name, body, parameters)
                    else {
                        return false;
                    };
                    let function = Function {
                        return_type,
                        name,
                        parameters,
                        body,
                        span: m.span,
                    };
                    ctx.set_value(function.into());
                    true
                }),
            )
            .rule(
                Rule::new(
                    "Parameter",
                    rule("TypeExpr").then(rule("Identifier").expect()).act("A0"),
                )
                .value("Parameter")
                .predicate("A0", |ctx, m| {
                    let type_expr = take_as(ctx, "TypeExpr", SyntaxValue::into_type);
                    let name = take_as(ctx, "Identifier", SyntaxValue::into_identifier);
                    let (Some(type_expr), Some(name)) = (type_expr, name) else {
                        return false;
                    };
                    ctx.set_value(
                        Parameter {
                            type_expr,
                            name,
                            span: m.span,
                        }
                        .into(),
                    );
                    true
                }),
            )
            .start("CompileUnit")
            .skip("SpacesAndComments");
        Ok(g)
    })
}
