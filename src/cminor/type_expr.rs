//! Type expressions: basic types, qualified class names and array types.

use crate::cminor::ast::{BasicType, TypeExpr, TypeKind};
use crate::cminor::identifier;
use crate::cminor::value::{take_as, SyntaxValue};
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{chr, keyword_list, rule};
use crate::parsing::rule::Rule;
use crate::parsing::stdlib;
use crate::span::Span;

pub const NAME: &str = "cminor.parser.TypeExprGrammar";

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        identifier::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .reference(identifier::NAME)
            .link("identifier", &stdlib::qualified("identifier"))
            .link("QualifiedId", &format!("{}.QualifiedId", identifier::NAME))
            .link("SpacesAndComments", &stdlib::qualified("spaces_and_comments"))
            .rule(
                Rule::new(
                    "TypeExpr",
                    keyword_list(rule("identifier"), BasicType::KEYWORDS)
                        .act("Basic")
                        .or(rule("QualifiedId").act("Named"))
                        .then(chr('[').then(chr(']')).act("Array").many()),
                )
                .value("TypeExpr")
                .predicate("Basic", |ctx, m| match BasicType::from_keyword(m.text) {
                    Some(basic) => {
                        ctx.set_value(
                            TypeExpr {
                                kind: TypeKind::Basic(basic),
                                span: m.span,
                            }
                            .into(),
                        );
                        true
                    }
                    None => false,
                })
                .predicate("Named", |ctx, m| {
                    match take_as(ctx, "QualifiedId", SyntaxValue::into_identifier) {
                        Some(name) => {
                            ctx.set_value(
                                TypeExpr {
                                    kind: TypeKind::Named(name),
                                    span: m.span,
                                }
                                .into(),
                            );
                            true
                        }
                        None => false,
                    }
                })
                .predicate("Array", |ctx, m| {
                    let Some(element) = ctx.take_value().and_then(|v| v.into_type().ok()) else {
                        return false;
                    };
                    let span = Span::new(m.span.file_index, ctx.start(), m.span.end);
                    ctx.set_value(
                        TypeExpr {
                            kind: TypeKind::Array(Box::new(element)),
                            span,
                        }
                        .into(),
                    );
                    true
                }),
            )
            .start("TypeExpr")
            .skip("SpacesAndComments");
        Ok(g)
    })
}
