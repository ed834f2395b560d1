//! Reserved words.

use crate::cminor::value::SyntaxValue;
use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{keyword_list, rule};
use crate::parsing::rule::Rule;
use crate::parsing::stdlib;

pub const NAME: &str = "cminor.parser.KeywordGrammar";

pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "cast", "catch", "char", "class",
    "const", "continue", "default", "delegate", "delete", "do", "double", "else", "enum",
    "explicit", "extern", "false", "float", "for", "goto", "if", "implicit", "int", "interface",
    "internal", "is", "long", "namespace", "new", "null", "operator", "out", "override",
    "private", "protected", "public", "ref", "return", "sbyte", "short", "static", "string",
    "switch", "this", "throw", "true", "try", "uint", "ulong", "ushort", "using", "virtual",
    "void", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn create(domain: &mut DomainBuilder<SyntaxValue>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |domain| {
        stdlib::create(domain)?;
        let mut g = GrammarBuilder::new(NAME);
        g.reference(stdlib::NAME)
            .link("identifier", &stdlib::qualified("identifier"))
            .rule(Rule::new(
                "Keyword",
                keyword_list(rule("identifier"), KEYWORDS.iter().copied()),
            ))
            .start("Keyword");
        Ok(g)
    })
}
