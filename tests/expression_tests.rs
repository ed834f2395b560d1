//! Expression grammar: precedence, postfix chains, literals and failures.

mod common;

use common::expr;

use cminor_parsing::cminor::ast::{BinaryOp, ExprKind, Literal, UnaryOp};
use cminor_parsing::cminor::parse_expression;
use cminor_parsing::span::{LineCol, Span};
use cminor_parsing::ErrorKind;

fn rendered(source: &str) -> String {
    expr(source).to_string()
}

fn literal(source: &str) -> Literal {
    match expr(source).kind {
        ExprKind::Literal(literal) => literal,
        other => panic!("'{source}' is not a literal: {other:?}"),
    }
}

#[test]
fn binary_levels_bind_in_precedence_order() {
    assert_eq!(rendered("1 + 2 * 3"), "(+ 1 (* 2 3))");
    assert_eq!(rendered("a || b && c"), "(|| a (&& b c))");
    assert_eq!(rendered("a == b < c"), "(== a (< b c))");
    assert_eq!(rendered("x << 2 < y"), "(< (<< x 2) y)");
    assert_eq!(rendered("a % b - c / d"), "(- (% a b) (/ c d))");
    assert_eq!(rendered("p != q || r >= s"), "(|| (!= p q) (>= r s))");
}

#[test]
fn binary_operators_associate_left() {
    assert_eq!(rendered("1 - 2 - 3"), "(- (- 1 2) 3)");
    assert_eq!(rendered("a >> b >> c"), "(>> (>> a b) c)");
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(rendered("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    assert_eq!(rendered("((x))"), "x");
}

#[test]
fn prefix_operators_nest() {
    assert_eq!(rendered("-x * !y"), "(* (- x) (! y))");
    assert_eq!(rendered("~-+a"), "(~ (- (+ a)))");
    match expr("!done").kind {
        ExprKind::Unary { op, .. } => assert_eq!(op, UnaryOp::Not),
        other => panic!("expected a unary expression, got {other:?}"),
    }
}

#[test]
fn postfix_chains_apply_left_to_right() {
    assert_eq!(rendered("a.b(1, c)[i]"), "a.b(1, c)[i]");
    assert_eq!(rendered("f()"), "f()");
    assert_eq!(rendered("this.items[n - 1]"), "this.items[(- n 1)]");
    assert_eq!(rendered("m ( x ) . y"), "m(x).y");
    match expr("g(1)(2)").kind {
        ExprKind::Invoke { target, arguments } => {
            assert_eq!(target.to_string(), "g(1)");
            assert_eq!(arguments.len(), 1);
        }
        other => panic!("expected an invocation, got {other:?}"),
    }
}

#[test]
fn literals_decode_their_values() {
    assert_eq!(literal("42"), Literal::Int(42));
    assert_eq!(literal("0x1F"), Literal::Int(31));
    assert_eq!(literal("1.5e3"), Literal::Float(1500.0));
    assert_eq!(literal("2E-1"), Literal::Float(0.2));
    assert_eq!(literal("'\\n'"), Literal::Char('\n'));
    assert_eq!(literal("'x'"), Literal::Char('x'));
    assert_eq!(literal("\"hi\\t\\\"there\\\"\""), Literal::String("hi\t\"there\"".into()));
    assert_eq!(literal("true"), Literal::Bool(true));
    assert_eq!(literal("false"), Literal::Bool(false));
    assert_eq!(literal("null"), Literal::Null);
}

#[test]
fn keyword_prefixed_names_are_identifiers() {
    for name in ["truthy", "nullable", "thisOne", "iffy"] {
        match expr(name).kind {
            ExprKind::Identifier(id) => assert_eq!(id.name, name),
            other => panic!("'{name}' should be an identifier, got {other:?}"),
        }
    }
}

#[test]
fn spans_cover_the_source_text() {
    let e = expr("  a + bc");
    assert_eq!(e.span, Span::new(0, 2, 8));
    match e.kind {
        ExprKind::Binary { op, left, right } => {
            assert_eq!(op, BinaryOp::Add);
            assert_eq!(left.span, Span::new(0, 2, 3));
            assert_eq!(right.span, Span::new(0, 6, 8));
        }
        other => panic!("expected a binary expression, got {other:?}"),
    }
    assert_eq!(expr("f(x)").span, Span::new(0, 0, 4));
}

#[test]
fn comments_are_skipped_between_tokens() {
    assert_eq!(rendered("a /* plus */ + // more\n b"), "(+ a b)");
}

#[test]
fn trailing_input_is_reported_where_parsing_stopped() {
    let err = parse_expression("1+2 garbage", 0, "expr.cm").unwrap_err();
    assert!(err.is_expectation_failure());
    assert_eq!(err.expected(), Some("Expression"));
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 5 }));
    assert!(err.to_string().ends_with("found 'garbage'"), "{err}");
    assert!(err.diagnostic_info.help.is_some());
}

#[test]
fn unclosed_invocation_expects_a_parenthesis() {
    let err = parse_expression("f(1,", 0, "expr.cm").unwrap_err();
    assert_eq!(err.expected(), Some("')'"));
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 4 }));
}

#[test]
fn missing_operand_is_an_expectation_failure() {
    let err = parse_expression("a *", 0, "expr.cm").unwrap_err();
    assert_eq!(err.expected(), Some("Prefix"));
    assert_eq!(err.file_name(), Some("expr.cm"));
}

#[test]
fn keywords_are_not_expressions() {
    assert!(parse_expression("while", 0, "expr.cm").is_err());
    assert!(parse_expression("", 0, "expr.cm").is_err());
}

#[test]
fn oversized_integer_literals_fail_the_parse() {
    let err = parse_expression("99999999999999999999", 0, "expr.cm").unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::LiteralOverflow {
            literal: "99999999999999999999".into(),
            type_name: "ulong".into(),
        }
    );
    assert_eq!(err.error_code(), "cminor::parse::literal_overflow");
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 1 }));
    assert_eq!(err.span(), Some(Span::new(0, 0, 20)));

    let err = parse_expression("x + 0x1FFFFFFFFFFFFFFFF", 0, "expr.cm").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::LiteralOverflow { .. }), "{err}");
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 5 }));
    assert_eq!(literal("18446744073709551615"), Literal::Int(u64::MAX));
}
