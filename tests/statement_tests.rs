//! Statement grammar: every statement form, spans and error positions.

mod common;

use common::{stmt, stmt_error};

use cminor_parsing::cminor::ast::{BasicType, ExprKind, StatementKind, TypeKind};
use cminor_parsing::cminor::{parse, SourceKind};
use cminor_parsing::span::{LineCol, Span};
use cminor_parsing::{ParseOptions, ParseSession};

#[test]
fn compound_statement_collects_its_items() {
    let s = stmt("{ x; y; }");
    assert_eq!(s.span, Span::new(0, 0, 9));
    let items = s.children().expect("compound statement");
    assert_eq!(items.len(), 2);
    for (item, name) in items.iter().zip(["x", "y"]) {
        match &item.kind {
            StatementKind::Expression(e) => assert_eq!(e.to_string(), name),
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }
    assert_eq!(items[0].span, Span::new(0, 2, 4));
}

#[test]
fn empty_and_nested_blocks() {
    assert_eq!(stmt("{}").children().map(<[_]>::len), Some(0));
    let outer = stmt("{ { ; } }");
    let inner = &outer.children().unwrap()[0];
    assert_eq!(inner.span, Span::new(0, 2, 7));
    assert_eq!(inner.children().unwrap()[0].kind, StatementKind::Empty);
}

#[test]
fn if_with_and_without_else() {
    match stmt("if (a < b) x = 1; else { y = 2; }").kind {
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            assert_eq!(condition.to_string(), "(< a b)");
            assert!(matches!(then_branch.kind, StatementKind::Assignment { .. }));
            assert!(else_branch.unwrap().children().is_some());
        }
        other => panic!("expected if, got {other:?}"),
    }
    match stmt("if (ok) return;").kind {
        StatementKind::If { else_branch, .. } => assert!(else_branch.is_none()),
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn dangling_else_binds_to_the_nearest_if() {
    match stmt("if (a) if (b) x; else y;").kind {
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert!(else_branch.is_none());
            assert!(matches!(
                then_branch.kind,
                StatementKind::If {
                    else_branch: Some(_),
                    ..
                }
            ));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn loops() {
    match stmt("while (i < 3) i = i + 1;").kind {
        StatementKind::While { condition, body } => {
            assert_eq!(condition.to_string(), "(< i 3)");
            assert!(matches!(body.kind, StatementKind::Assignment { .. }));
        }
        other => panic!("expected while, got {other:?}"),
    }
    match stmt("do { n = n - 1; } while (n > 0);").kind {
        StatementKind::DoWhile { condition, .. } => assert_eq!(condition.to_string(), "(> n 0)"),
        other => panic!("expected do-while, got {other:?}"),
    }
}

#[test]
fn for_statement_parts_are_optional() {
    match stmt("for (int i = 0; i < 10; i = i + 1) sum = sum + i;").kind {
        StatementKind::For {
            init,
            condition,
            step,
            body,
        } => {
            assert!(matches!(init.unwrap().kind, StatementKind::Construction { .. }));
            assert_eq!(condition.unwrap().to_string(), "(< i 10)");
            assert!(matches!(step.unwrap().kind, StatementKind::Assignment { .. }));
            assert!(matches!(body.kind, StatementKind::Assignment { .. }));
        }
        other => panic!("expected for, got {other:?}"),
    }
    match stmt("for (;;) break;").kind {
        StatementKind::For {
            init,
            condition,
            step,
            body,
        } => {
            assert!(init.is_none() && condition.is_none() && step.is_none());
            assert_eq!(body.kind, StatementKind::Break);
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn jumps() {
    assert_eq!(stmt("break;").kind, StatementKind::Break);
    assert_eq!(stmt("continue ;").kind, StatementKind::Continue);
    assert_eq!(stmt("return;").kind, StatementKind::Return(None));
    match stmt("return x * 2;").kind {
        StatementKind::Return(Some(value)) => assert_eq!(value.to_string(), "(* x 2)"),
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn constructions_declare_typed_names() {
    match stmt("int[] values = make(3);").kind {
        StatementKind::Construction {
            type_expr,
            name,
            init,
        } => {
            match type_expr.kind {
                TypeKind::Array(element) => {
                    assert_eq!(element.kind, TypeKind::Basic(BasicType::Int))
                }
                other => panic!("expected an array type, got {other:?}"),
            }
            assert_eq!(name.name, "values");
            assert_eq!(init.unwrap().to_string(), "make(3)");
        }
        other => panic!("expected a construction, got {other:?}"),
    }
    match stmt("System.Text.Builder b;").kind {
        StatementKind::Construction { type_expr, init, .. } => {
            match type_expr.kind {
                TypeKind::Named(id) => assert_eq!(id.name, "System.Text.Builder"),
                other => panic!("expected a named type, got {other:?}"),
            }
            assert!(init.is_none());
        }
        other => panic!("expected a construction, got {other:?}"),
    }
}

#[test]
fn assignment_targets_are_postfix_expressions() {
    match stmt("a.b[i] = c == d;").kind {
        StatementKind::Assignment { target, value } => {
            assert!(matches!(target.kind, ExprKind::Index { .. }));
            assert_eq!(value.to_string(), "(== c d)");
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
    // `==` is not an assignment operator.
    assert!(matches!(stmt("a == b;").kind, StatementKind::Expression(_)));
}

#[test]
fn literal_cannot_be_assigned_to() {
    let err = stmt_error("1 = x;");
    assert_eq!(err.expected(), Some("';'"));
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 3 }));
    assert!(err.to_string().ends_with("found '='"), "{err}");
}

#[test]
fn statement_spans_include_the_semicolon() {
    let s = stmt("  x = 1 ;");
    assert_eq!(s.span, Span::new(0, 2, 9));
    let s = stmt("f(1);");
    assert_eq!(s.span, Span::new(0, 0, 5));
}

#[test]
fn unclosed_condition_reports_the_parenthesis() {
    let err = stmt_error("if (x");
    assert_eq!(err.expected(), Some("')'"));
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 6 }));
    assert_eq!(
        err.to_string(),
        "parsing file 'test.cm' failed at line 1, column 6: ')' expected, found end of file"
    );
}

#[test]
fn missing_semicolon_is_reported_on_the_next_line() {
    let err = stmt_error("{\n  x = 1\n  y = 2;\n}");
    assert_eq!(err.expected(), Some("';'"));
    assert_eq!(err.location(), Some(LineCol { line: 3, column: 3 }));
}

#[test]
fn unterminated_block_expects_a_brace() {
    let err = stmt_error("{ x; ");
    assert_eq!(err.expected(), Some("'}'"));
}

#[test]
fn keywords_cannot_start_an_expression_statement() {
    // `if` is only a keyword, so the farthest attempt is its missing '('.
    let err = stmt_error("if = 1;");
    assert_eq!(err.expected(), Some("Statement"));
    assert_eq!(err.location(), Some(LineCol { line: 1, column: 4 }));
    assert!(err.diagnostic_info.help.as_deref().unwrap().contains("'('"));
}

#[test]
fn parsing_is_deterministic() {
    let source = "{ int n = 0; while (n < 10) { if (n % 2 == 0) continue; n = n + 1; } }";
    assert_eq!(stmt(source), stmt(source));
}

#[test]
fn a_reused_session_leaves_its_stack_empty() {
    let options = ParseOptions::for_file(0, "test.cm");
    let mut session = ParseSession::new();
    let cases = [
        (SourceKind::Statement, "x = a[1];", true),
        (SourceKind::Statement, "int[] xs = f(1, 2);", true),
        (SourceKind::Statement, "1 = x;", false),
        (SourceKind::Statement, "if (a) b = 1; else c;", true),
        (SourceKind::Statement, "if (x", false),
        (SourceKind::Expression, "a + b * c", true),
        (SourceKind::Expression, "f(1,", false),
        (SourceKind::Statement, "while (i < n) { i = i + 1; }", true),
    ];
    for (kind, source, valid) in cases {
        let result = parse(kind, source, &options, &mut session);
        assert_eq!(result.is_ok(), valid, "{source}");
        assert!(session.stack.is_empty(), "'{source}' left {} value(s)", session.stack.len());
    }
}
