//! Identifiers: stdlib identifiers that are not keywords.

use crate::cminor::ast::Identifier;
use crate::cminor::keyword;
use crate::cminor::value::SyntaxValue;
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{chr, rule, token};
use crate::parsing::rule::Rule;
use crate::parsing::stdlib;

pub const NAME: &str = "cminor.parser.IdentifierGrammar";

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        keyword::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .reference(keyword::NAME)
            .link("identifier", &stdlib::qualified("identifier"))
            .link("Keyword", &format!("{}.Keyword", keyword::NAME))
            .rule(
                Rule::new(
                    "Identifier",
                    rule("identifier").except(rule("Keyword")).act("A0"),
                )
                .value("Identifier")
                .action("A0", |ctx, m| {
                    ctx.set_value(Identifier::new(m.text, m.span).into())
                }),
            )
            .rule(
                Rule::new(
                    "QualifiedId",
                    token(rule("Identifier").sep_by(chr('.'))).act("A0"),
                )
                .value("Identifier")
                .action("A0", |ctx, m| {
                    ctx.set_value(Identifier::new(m.text, m.span).into())
                }),
            )
            .start("Identifier");
        Ok(g)
    })
}
