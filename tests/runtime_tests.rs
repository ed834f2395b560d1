//! Runtime behavior exercised through small test grammars.

mod common;

use common::{calc, calculator, CALC};

use cminor_parsing::parsing::parser::{chr, keyword, string};
use cminor_parsing::parsing::{
    DomainBuilder, GrammarBuilder, ParseOptions, ParseSession, Rule, TraceEventKind,
};
use cminor_parsing::span::LineCol;
use cminor_parsing::{ErrorCategory, ErrorKind};

/// One-rule domain whose start rule has no value.
fn recognizer(definition: cminor_parsing::parsing::Parser) -> cminor_parsing::ParsingDomain<()> {
    let mut builder = DomainBuilder::new();
    let mut g = GrammarBuilder::new("test.Recognizer");
    g.rule(Rule::new("Start", definition)).start("Start");
    builder.add(g).unwrap();
    builder.build().unwrap()
}

fn recognizes(domain: &cminor_parsing::ParsingDomain<()>, input: &str) -> bool {
    domain
        .grammar("test.Recognizer")
        .unwrap()
        .parse(input, 0, "input", Vec::new())
        .is_ok()
}

#[test]
fn precedence_and_associativity_follow_rule_nesting() {
    assert_eq!(calc("1 + 2 * 3").unwrap(), 7);
    assert_eq!(calc("10 - 4 - 3").unwrap(), 3);
    assert_eq!(calc("2*3*4").unwrap(), 24);
}

#[test]
fn skip_rule_covers_whitespace_and_comments() {
    assert_eq!(calc("  1 /* two */ + 2 // tail\n").unwrap(), 3);
    assert_eq!(calc("// only a comment first\n5").unwrap(), 5);
}

#[test]
fn tokens_do_not_skip_inside() {
    // `Number` is a token, so "1 2" is not one number.
    let err = calc("1 2").unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ExpectationFailure {
            expected: "Sum".into(),
            found: "'2'".into(),
        }
    );
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 3 }));
    let help = err.diagnostic_info.help.as_deref().unwrap();
    assert!(help.starts_with("expected one of: "), "{help}");
    assert!(help.contains("'*'"), "{help}");
}

#[test]
fn expectation_failure_names_the_missing_construct() {
    let err = calc("1 +").unwrap_err();
    assert!(err.is_expectation_failure());
    assert_eq!(err.expected(), Some("Product"));
    assert_eq!(
        err.to_string(),
        "parsing file 'calc.txt' failed at line 1, column 4: Product expected, found end of file"
    );
    assert_eq!(err.error_code(), "cminor::parse::expectation_failure");
}

#[test]
fn predicates_can_reject_a_match() {
    assert_eq!(calc("1000").unwrap(), 1000);
    let err = calc("1 + 1001").unwrap_err();
    assert_eq!(err.expected(), Some("Product"));
    assert_eq!(err.span().map(|span| span.start), Some(4));
}

#[test]
fn session_stack_is_balanced_after_success_and_failure() {
    let domain = calculator();
    let grammar = domain.grammar(CALC).unwrap();
    let mut session = ParseSession::new();
    session.stack.push(-1);

    let value = grammar
        .parse_in("4 * 5", &ParseOptions::default(), Vec::new(), &mut session)
        .unwrap();
    assert_eq!(value, Some(20));
    assert_eq!(session.stack.len(), 1);

    assert!(grammar
        .parse_in("4 *", &ParseOptions::default(), Vec::new(), &mut session)
        .is_err());
    assert_eq!(session.stack.len(), 1);
    assert_eq!(session.stack.peek(), Some(&-1));
}

#[test]
fn start_rule_arguments_are_counted() {
    let domain = calculator();
    let err = domain
        .grammar(CALC)
        .unwrap()
        .parse("1", 0, "calc.txt", vec![7])
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ArgumentCountMismatch {
            expected: 0,
            actual: 1,
            ..
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Grammar);
}

#[test]
fn trace_records_nested_rule_events() {
    let domain = calculator();
    let grammar = domain.grammar(CALC).unwrap();
    let mut session = ParseSession::new();
    let options = ParseOptions::for_file(3, "calc.txt").traced();
    grammar.parse_in("1+2", &options, Vec::new(), &mut session).unwrap();

    let trace = session.trace.expect("trace was requested");
    let first = &trace.events[0];
    assert_eq!((first.kind, first.rule.as_str(), first.depth), (TraceEventKind::Enter, "test.Calculator.Sum", 0));
    let last = trace.events.last().unwrap();
    assert_eq!((last.kind, last.rule.as_str()), (TraceEventKind::Success, "test.Calculator.Sum"));
    assert_eq!(last.span.file_index, 3);
    assert_eq!(last.excerpt, "1+2");
    let numbers: Vec<_> = trace
        .for_rule("Number")
        .filter(|event| event.kind == TraceEventKind::Success)
        .map(|event| event.excerpt.as_str())
        .collect();
    assert_eq!(numbers, ["1", "2"]);
    assert_eq!(trace.for_rule("test.Calculator.Number").count(), trace.for_rule("Number").count());
    // Skipping is not traced.
    assert_eq!(trace.for_rule("spaces_and_comments").count(), 0);
}

#[test]
fn untraced_parses_leave_no_trace() {
    let domain = calculator();
    let mut session = ParseSession::new();
    domain
        .grammar(CALC)
        .unwrap()
        .parse_in("1", &ParseOptions::default(), Vec::new(), &mut session)
        .unwrap();
    assert!(session.trace.is_none());
}

#[test]
fn difference_rejects_equal_or_longer_exclusions() {
    let domain = recognizer(chr('<').except(string("<<")).then(chr('x')));
    assert!(recognizes(&domain, "<x"));
    assert!(!recognizes(&domain, "<<x"));
}

#[test]
fn keywords_need_a_word_boundary() {
    let domain = recognizer(keyword("if").then(chr('!').opt()));
    assert!(recognizes(&domain, "if"));
    assert!(recognizes(&domain, "if!"));
    assert!(!recognizes(&domain, "iffy"));
}

#[test]
fn ordered_choice_commits_to_the_first_hit() {
    // "a" wins over "ab", leaving "b" unconsumed.
    let domain = recognizer(string("a").or(string("ab")));
    assert!(recognizes(&domain, "a"));
    assert!(!recognizes(&domain, "ab"));
}

#[test]
fn value_free_start_rule_yields_none() {
    let domain = recognizer(chr('x').many());
    let value = domain
        .grammar("test.Recognizer")
        .unwrap()
        .parse("xxx", 0, "input", Vec::new())
        .unwrap();
    assert_eq!(value, None);
}

#[test]
fn grammar_without_start_rule_cannot_parse() {
    let mut builder: DomainBuilder<()> = DomainBuilder::new();
    let mut g = GrammarBuilder::new("test.NoStart");
    g.rule(Rule::new("A", chr('a')));
    builder.add(g).unwrap();
    let domain = builder.build().unwrap();
    let err = domain
        .grammar("test.NoStart")
        .unwrap()
        .parse("a", 0, "input", Vec::new())
        .unwrap_err();
    assert_eq!(err.error_code(), "cminor::grammar::no_start_rule");
    assert!(err.span().is_none());
}

#[test]
fn linked_domain_is_reusable() {
    let domain = calculator();
    let grammar = domain.grammar(CALC).unwrap();
    for (input, expected) in [("1", 1), ("2 * 2", 4), ("9 - 10", -1)] {
        assert_eq!(grammar.parse(input, 0, "calc.txt", Vec::new()).unwrap(), Some(expected));
    }
}
