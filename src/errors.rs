//! Parsing error handling.
//!
//! A single [`ParsingError`] type covers every failure the runtime can report:
//! expectation failures raised while matching input, and parsing exceptions
//! raised when a grammar is structurally broken. Errors are created through
//! the [`ErrorReporting`] trait so the source and span are always attached by
//! whoever owns them.

use miette::{Diagnostic, LabeledSpan, NamedSource};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::span::{LineCol, LineIndex, Span};

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Named source text used for error reporting.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The single error type of the parsing runtime.
#[derive(Debug)]
pub struct ParsingError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened, when the error is tied to input text
    pub source_info: Option<SourceInfo>,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// Every failure the runtime can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Input errors
    #[error("{expected} expected, found {found}")]
    ExpectationFailure { expected: String, found: String },
    #[error("literal '{literal}' does not fit in {type_name}")]
    LiteralOverflow { literal: String, type_name: String },

    // Grammar structure errors
    #[error("grammar '{grammar}' has no start rule")]
    NoStartRule { grammar: String },
    #[error("grammar '{name}' referenced by '{referenced_by}' is not registered")]
    UnknownGrammar { name: String, referenced_by: String },
    #[error("grammar '{name}' is registered twice")]
    DuplicateGrammar { name: String },
    #[error("rule '{rule}' is defined twice in grammar '{grammar}'")]
    DuplicateRule { grammar: String, rule: String },
    #[error("{role} rule '{rule}' of grammar '{grammar}' does not exist")]
    UnknownRule {
        grammar: String,
        rule: String,
        role: String,
    },
    #[error("nonterminal '{nonterminal}' in rule '{caller}' refers to unknown rule '{rule}'")]
    UnresolvedRule {
        caller: String,
        nonterminal: String,
        rule: String,
    },
    #[error("rule '{caller}' passes {actual} argument(s) to '{rule}', which takes {expected}")]
    ArgumentCountMismatch {
        caller: String,
        rule: String,
        expected: usize,
        actual: usize,
    },
    #[error("action '{action}' of rule '{rule}' is not bound")]
    UnboundAction { rule: String, action: String },
    #[error("rule '{rule}' forwards '{attribute}', which is not one of its inherited attributes")]
    UnknownAttribute { rule: String, attribute: String },
    #[error("skip rule '{rule}' of grammar '{grammar}' must take no inherited values and synthesize none")]
    InvalidSkipRule { grammar: String, rule: String },
    #[error("invalid character class '{text}': {reason}")]
    InvalidCharSet { text: String, reason: String },

    // Internal errors
    #[error("rule '{rule}' needs {needed} inherited value(s) but the stack holds {available}")]
    StackUnderflow {
        rule: String,
        needed: usize,
        available: usize,
    },
    #[error("rule '{rule}' matched without producing its value")]
    MissingValue { rule: String },
    #[error("expected a {expected} value, found {found}")]
    UnexpectedValue { expected: String, found: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input did not match the grammar
    Expectation,
    /// Input matched but its content is out of range
    Input,
    /// The grammar itself is malformed
    Grammar,
    /// Runtime invariant broken; indicates a grammar or engine bug
    Internal,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ExpectationFailure { .. } => ErrorCategory::Expectation,
            Self::LiteralOverflow { .. } => ErrorCategory::Input,

            Self::NoStartRule { .. }
            | Self::UnknownGrammar { .. }
            | Self::DuplicateGrammar { .. }
            | Self::DuplicateRule { .. }
            | Self::UnknownRule { .. }
            | Self::UnresolvedRule { .. }
            | Self::ArgumentCountMismatch { .. }
            | Self::UnboundAction { .. }
            | Self::UnknownAttribute { .. }
            | Self::InvalidSkipRule { .. }
            | Self::InvalidCharSet { .. } => ErrorCategory::Grammar,

            Self::StackUnderflow { .. }
            | Self::MissingValue { .. }
            | Self::UnexpectedValue { .. } => ErrorCategory::Internal,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::ExpectationFailure { .. } => "expectation_failure",
            Self::LiteralOverflow { .. } => "literal_overflow",
            Self::NoStartRule { .. } => "no_start_rule",
            Self::UnknownGrammar { .. } => "unknown_grammar",
            Self::DuplicateGrammar { .. } => "duplicate_grammar",
            Self::DuplicateRule { .. } => "duplicate_rule",
            Self::UnknownRule { .. } => "unknown_rule",
            Self::UnresolvedRule { .. } => "unresolved_rule",
            Self::ArgumentCountMismatch { .. } => "argument_count_mismatch",
            Self::UnboundAction { .. } => "unbound_action",
            Self::UnknownAttribute { .. } => "unknown_attribute",
            Self::InvalidSkipRule { .. } => "invalid_skip_rule",
            Self::InvalidCharSet { .. } => "invalid_char_set",
            Self::StackUnderflow { .. } => "stack_underflow",
            Self::MissingValue { .. } => "missing_value",
            Self::UnexpectedValue { .. } => "unexpected_value",
        }
    }
}

/// Input position an error refers to.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub file_name: String,
    pub span: Span,
    pub location: LineCol,
}

#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl ParsingError {
    /// Error not tied to any input text: grammar structure and internal failures.
    pub fn unsourced(kind: ErrorKind, phase: &str) -> Self {
        let error_code = format!("cminor::{}::{}", phase, kind.code_suffix());
        Self {
            kind,
            source_info: None,
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn is_expectation_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::ExpectationFailure { .. })
    }

    /// Description of the construct that was expected, for expectation failures.
    pub fn expected(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::ExpectationFailure { expected, .. } => Some(expected),
            _ => None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.source_info.as_ref().map(|info| info.span)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source_info.as_ref().map(|info| info.file_name.as_str())
    }

    pub fn location(&self) -> Option<LineCol> {
        self.source_info.as_ref().map(|info| info.location)
    }

    pub fn error_code(&self) -> &str {
        &self.diagnostic_info.error_code
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::ExpectationFailure { expected, .. } => format!("{expected} expected here"),
            ErrorKind::LiteralOverflow { type_name, .. } => format!("out of range for {type_name}"),
            ErrorKind::StackUnderflow { .. } => "stack underflow".into(),
            ErrorKind::MissingValue { .. } => "rule matched here".into(),
            _ => "here".into(),
        }
    }
}

impl std::error::Error for ParsingError {}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_info {
            Some(info) => write!(
                f,
                "parsing file '{}' failed at line {}, column {}: {}",
                info.file_name, info.location.line, info.location.column, self.kind
            ),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Diagnostic for ParsingError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let info = self.source_info.as_ref()?;
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            info.span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .as_ref()
            .map(|info| &*info.source as &dyn miette::SourceCode)
    }
}

// ============================================================================
// ERROR CREATION
// ============================================================================

/// Context-aware error creation. Whoever owns the source text implements this.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: Span) -> ParsingError;

    fn expectation_failure(&self, expected: &str, found: &str, span: Span) -> ParsingError {
        self.report(
            ErrorKind::ExpectationFailure {
                expected: expected.into(),
                found: found.into(),
            },
            span,
        )
    }

    /// Creates an internal error. These indicate grammar or engine bugs, not
    /// problems in the parsed input.
    fn internal_error(&self, kind: ErrorKind, span: Span) -> ParsingError {
        self.report(kind, span).with_help(
            "This is an internal parser error. The grammar or the runtime is at fault, not the input.",
        )
    }
}

/// Builds a sourced error for `source_text` named `file_name`.
pub fn sourced_error(
    kind: ErrorKind,
    phase: &str,
    file_name: &str,
    source_text: &str,
    span: Span,
) -> ParsingError {
    let location = LineIndex::new(source_text).line_col(source_text, span.start);
    let error_code = format!("cminor::{}::{}", phase, kind.code_suffix());
    ParsingError {
        kind,
        source_info: Some(SourceInfo {
            source: SourceContext::from_file(file_name, source_text).to_named_source(),
            file_name: file_name.to_string(),
            span,
            location,
        }),
        diagnostic_info: DiagnosticInfo {
            help: None,
            error_code,
        },
    }
}

/// Prints a ParsingError with full miette diagnostics
pub fn print_error(error: ParsingError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expectation_failure_display_includes_location() {
        let err = sourced_error(
            ErrorKind::ExpectationFailure {
                expected: "')'".into(),
                found: "end of file".into(),
            },
            "parse",
            "main.cm",
            "if (x\n",
            Span::at(0, 5),
        );
        assert_eq!(
            err.to_string(),
            "parsing file 'main.cm' failed at line 1, column 6: ')' expected, found end of file"
        );
        assert_eq!(err.error_code(), "cminor::parse::expectation_failure");
        assert_eq!(err.expected(), Some("')'"));
        assert_eq!(err.category(), ErrorCategory::Expectation);
    }

    #[test]
    fn unsourced_errors_have_no_labels() {
        let err = ParsingError::unsourced(
            ErrorKind::NoStartRule {
                grammar: "G".into(),
            },
            "grammar",
        );
        assert_eq!(err.to_string(), "grammar 'G' has no start rule");
        assert!(err.labels().is_none());
        assert!(err.source_code().is_none());
        assert_eq!(err.category(), ErrorCategory::Grammar);
    }
}
