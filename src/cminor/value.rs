//! Values carried on the object stack by the cminor grammars.

use serde::{Deserialize, Serialize};

use crate::cminor::ast::{
    BinaryOp, CompileUnit, Expr, Function, Identifier, Literal, Parameter, Statement, TypeExpr,
    UnaryOp,
};
use crate::errors::{ErrorKind, ParsingError};
use crate::parsing::rule::Context;

/// Inherited attribute of the expression rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsingContext {
    /// Set while parsing the target of an assignment; literals are rejected.
    pub parsing_lvalue: bool,
}

impl ParsingContext {
    pub fn lvalue() -> Self {
        Self {
            parsing_lvalue: true,
        }
    }
}

/// One variant per synthesized or inherited type. Serializes as the carried
/// value itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyntaxValue {
    Context(ParsingContext),
    Identifier(Identifier),
    Literal(Literal),
    Expr(Expr),
    BinaryOp(BinaryOp),
    UnaryOp(UnaryOp),
    Type(TypeExpr),
    Statement(Statement),
    Parameter(Parameter),
    Function(Function),
    CompileUnit(CompileUnit),
    /// Accumulator for repeated nonterminals.
    List(Vec<SyntaxValue>),
}

macro_rules! conversions {
    ($($variant:ident($ty:ty) => $into:ident, $type_name:literal;)*) => {
        impl SyntaxValue {
            /// Name of the carried type, for diagnostics.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(SyntaxValue::$variant(_) => $type_name,)*
                    SyntaxValue::List(_) => "List",
                }
            }

            $(
                pub fn $into(self) -> Result<$ty, ParsingError> {
                    match self {
                        SyntaxValue::$variant(value) => Ok(value),
                        other => Err(other.unexpected($type_name)),
                    }
                }
            )*
        }

        $(
            impl From<$ty> for SyntaxValue {
                fn from(value: $ty) -> Self {
                    SyntaxValue::$variant(value)
                }
            }
        )*
    };
}

conversions! {
    Context(ParsingContext) => into_context, "ParsingContext";
    Identifier(Identifier) => into_identifier, "Identifier";
    Literal(Literal) => into_literal, "Literal";
    Expr(Expr) => into_expr, "Expr";
    BinaryOp(BinaryOp) => into_binary_op, "BinaryOp";
    UnaryOp(UnaryOp) => into_unary_op, "UnaryOp";
    Type(TypeExpr) => into_type, "TypeExpr";
    Statement(Statement) => into_statement, "Statement";
    Parameter(Parameter) => into_parameter, "Parameter";
    Function(Function) => into_function, "Function";
    CompileUnit(CompileUnit) => into_compile_unit, "CompileUnit";
}

impl SyntaxValue {
    fn unexpected(&self, expected: &str) -> ParsingError {
        ParsingError::unsourced(
            ErrorKind::UnexpectedValue {
                expected: expected.to_string(),
                found: self.type_name().to_string(),
            },
            "value",
        )
    }

    pub fn into_list(self) -> Result<Vec<SyntaxValue>, ParsingError> {
        match self {
            SyntaxValue::List(items) => Ok(items),
            other => Err(other.unexpected("List")),
        }
    }

    pub fn as_context(&self) -> Option<ParsingContext> {
        match self {
            SyntaxValue::Context(ctx) => Some(*ctx),
            _ => None,
        }
    }

    pub fn as_binary_op(&self) -> Option<BinaryOp> {
        match self {
            SyntaxValue::BinaryOp(op) => Some(*op),
            _ => None,
        }
    }

    pub fn as_unary_op(&self) -> Option<UnaryOp> {
        match self {
            SyntaxValue::UnaryOp(op) => Some(*op),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Context helpers used by grammar actions
// ----------------------------------------------------------------------------

/// The inherited `ctx` attribute of an expression rule.
pub(crate) fn parsing_context(ctx: &Context<SyntaxValue>) -> ParsingContext {
    ctx.get("ctx")
        .and_then(SyntaxValue::as_context)
        .unwrap_or_default()
}

/// Appends `value` to the list variable `name`, creating it if needed.
pub(crate) fn push_item(ctx: &mut Context<SyntaxValue>, name: &str, value: SyntaxValue) {
    match ctx.get_mut(name) {
        Some(SyntaxValue::List(items)) => items.push(value),
        _ => ctx.set(name, SyntaxValue::List(vec![value])),
    }
}

/// Takes the list variable `name`, converting every item. A missing list is empty.
pub(crate) fn take_items<T>(
    ctx: &mut Context<SyntaxValue>,
    name: &str,
    convert: impl Fn(SyntaxValue) -> Result<T, ParsingError>,
) -> Option<Vec<T>> {
    match ctx.take(name) {
        None => Some(Vec::new()),
        Some(list) => list
            .into_list()
            .ok()?
            .into_iter()
            .map(|item| convert(item).ok())
            .collect(),
    }
}

/// Takes variable `name` and converts it.
pub(crate) fn take_as<T>(
    ctx: &mut Context<SyntaxValue>,
    name: &str,
    convert: impl FnOnce(SyntaxValue) -> Result<T, ParsingError>,
) -> Option<T> {
    ctx.take(name).and_then(|value| convert(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn conversions_report_the_found_type() {
        let value = SyntaxValue::Identifier(Identifier::new("x", Span::default()));
        let err = value.into_expr().unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnexpectedValue {
                expected: "Expr".into(),
                found: "Identifier".into(),
            }
        );
        assert_eq!(err.error_code(), "cminor::value::unexpected_value");
    }

    #[test]
    fn list_helpers_accumulate_in_order() {
        let mut ctx = Context::new();
        push_item(&mut ctx, "ids", Identifier::new("a", Span::default()).into());
        push_item(&mut ctx, "ids", Identifier::new("b", Span::default()).into());
        let ids = take_items(&mut ctx, "ids", SyntaxValue::into_identifier).unwrap();
        let names: Vec<_> = ids.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(take_items(&mut ctx, "ids", SyntaxValue::into_identifier), Some(vec![]));
    }

    #[test]
    fn missing_context_defaults_to_rvalue() {
        let mut ctx = Context::new();
        assert!(!parsing_context(&ctx).parsing_lvalue);
        ctx.set("ctx", ParsingContext::lvalue().into());
        assert!(parsing_context(&ctx).parsing_lvalue);
    }
}
