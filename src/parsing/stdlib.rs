//! Lexical rules shared by every grammar family.
//!
//! The rules here synthesize no values, so the grammar can be added to a
//! domain of any value type. Clients capture matched text with actions of
//! their own around calls to these rules.

use crate::errors::ParsingError;
use crate::parsing::domain::DomainBuilder;
use crate::parsing::grammar::GrammarBuilder;
use crate::parsing::parser::{
    any, char_set, chr, digit, hex_digit, id_cont, id_start, keyword, rule, space, string, token,
};
use crate::parsing::rule::Rule;

pub const NAME: &str = "cminor.parsing.stdlib";

/// Registers the grammar unless it already is.
pub fn create<V: Clone + 'static>(domain: &mut DomainBuilder<V>) -> Result<(), ParsingError> {
    domain.ensure(NAME, |_| Ok(grammar()))
}

/// Qualified name of the stdlib rule `rule_name`, for links.
pub fn qualified(rule_name: &str) -> String {
    format!("{NAME}.{rule_name}")
}

fn grammar<V: 'static>() -> GrammarBuilder<V> {
    let mut g = GrammarBuilder::new(NAME);
    g.rule(Rule::new("spaces", space().some()))
        .rule(Rule::new(
            "newline",
            string("\r\n").or(chr('\n')).or(chr('\r')),
        ))
        .rule(Rule::new(
            "line_comment",
            token(
                string("//")
                    .then(char_set("^\\r\\n").many())
                    .then(rule("newline").opt()),
            ),
        ))
        .rule(Rule::new(
            "block_comment",
            token(
                string("/*")
                    .then(any().except(string("*/")).many())
                    .then(string("*/").expect()),
            ),
        ))
        .rule(Rule::new(
            "comment",
            rule("line_comment").or(rule("block_comment")),
        ))
        .rule(Rule::new(
            "spaces_and_comments",
            space().or(rule("comment")).some(),
        ))
        .rule(Rule::new("identifier", token(id_start().then(id_cont().many()))))
        .rule(Rule::new(
            "qualified_id",
            token(rule("identifier").sep_by(chr('.'))),
        ))
        .rule(Rule::new("digit_sequence", token(digit().some())))
        .rule(Rule::new(
            "int",
            token(char_set("+-").opt().then(rule("digit_sequence"))),
        ))
        .rule(Rule::new("uint", rule("digit_sequence")))
        .rule(Rule::new(
            "hex",
            token(string("0x").or(string("0X")).then(hex_digit().some())),
        ))
        .rule(Rule::new(
            "num",
            token(
                char_set("+-")
                    .opt()
                    .then(rule("digit_sequence"))
                    .then(chr('.').then(rule("digit_sequence")).opt())
                    .then(
                        char_set("eE")
                            .then(char_set("+-").opt())
                            .then(rule("digit_sequence"))
                            .opt(),
                    ),
            ),
        ))
        .rule(Rule::new(
            "escape",
            token(
                chr('\\').then(
                    char_set("xX")
                        .then(hex_digit().some())
                        .or(chr('u').then(hex_digit()).then(hex_digit()).then(hex_digit()).then(hex_digit()))
                        .or(char_set("0-7").some())
                        .or(char_set("abfnrtv'\"\\\\?"))
                        .expect(),
                ),
            ),
        ))
        .rule(Rule::new(
            "char",
            token(
                chr('\'')
                    .then(char_set("^\\\\'\\r\\n").or(rule("escape")))
                    .then(chr('\'').expect()),
            ),
        ))
        .rule(Rule::new(
            "string",
            token(
                chr('"')
                    .then(char_set("^\\\\\"\\r\\n").or(rule("escape")).many())
                    .then(chr('"').expect()),
            ),
        ))
        .rule(Rule::new("bool", keyword("true").or(keyword("false"))));
    g
}
