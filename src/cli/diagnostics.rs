//! Compact diagnostics for commands that report many files at once.
//!
//! Single-file commands print full miette reports through
//! [`print_error`](crate::errors::print_error). `check` prints one short block
//! per failing file instead: the message, its location and the offending line
//! with a caret under the error span.

use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::errors::ParsingError;
use crate::span::LineIndex;

// === Core Types ===

/// A parsing error paired with the source text it was raised for.
pub struct ParseDiagnostic<'a> {
    error: &'a ParsingError,
    source: &'a str,
}

/// The offending line and where the caret goes under it.
struct Snippet<'a> {
    line: usize,
    text: &'a str,
    /// Display columns before the caret.
    indent: usize,
    /// Display columns the caret covers, at least one.
    width: usize,
}

impl<'a> ParseDiagnostic<'a> {
    pub fn new(error: &'a ParsingError, source: &'a str) -> Self {
        Self { error, source }
    }

    fn snippet(&self) -> Option<Snippet<'a>> {
        let span = self.error.span()?;
        let location = self.error.location()?;
        let text = LineIndex::new(self.source).line_text(self.source, location.line)?;
        let prefix_len: usize = text
            .chars()
            .take(location.column - 1)
            .map(char::len_utf8)
            .sum();
        let line_end = span.start - prefix_len + text.len();
        let covered = self.source.get(span.start..span.end.min(line_end)).unwrap_or("");
        Some(Snippet {
            line: location.line,
            text,
            indent: text[..prefix_len].width(),
            width: covered.width().max(1),
        })
    }

    fn location(&self) -> String {
        match (self.error.file_name(), self.error.location()) {
            (Some(file), Some(at)) => format!("{file}:{}:{}", at.line, at.column),
            (Some(file), None) => file.to_string(),
            _ => "<unknown>".into(),
        }
    }
}

impl Display for ParseDiagnostic<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "error[{}]: {}", self.error.error_code(), self.error.kind())?;
        writeln!(f, "  --> {}", self.location())?;
        if let Some(snippet) = self.snippet() {
            let gutter = snippet.line.to_string().len();
            writeln!(f, "{:gutter$} |", "")?;
            writeln!(f, "{:gutter$} | {}", snippet.line, snippet.text)?;
            writeln!(
                f,
                "{:gutter$} | {:indent$}{}",
                "",
                "",
                "^".repeat(snippet.width),
                indent = snippet.indent
            )?;
        }
        if let Some(help) = &self.error.diagnostic_info.help {
            writeln!(f, "  = help: {help}")?;
        }
        Ok(())
    }
}

// === Public API ===

/// Prints a diagnostic to standard error, colored when `color` allows.
pub fn print_diagnostic_to_stderr(diagnostic: &ParseDiagnostic, color: ColorChoice) {
    let mut stderr = StandardStream::stderr(color);
    if write_diagnostic(&mut stderr, diagnostic).is_err() {
        eprintln!("{diagnostic}");
    }
}

/// Writes a diagnostic with colors to any `WriteColor` implementation.
pub fn write_diagnostic(writer: &mut impl WriteColor, diagnostic: &ParseDiagnostic) -> io::Result<()> {
    let error = diagnostic.error;
    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(writer, "error[{}]", error.error_code())?;
    writer.reset()?;
    writeln!(writer, ": {}", error.kind())?;

    writer.set_color(ColorSpec::new().set_fg(Some(Color::Blue)))?;
    write!(writer, "  --> ")?;
    writer.reset()?;
    writeln!(writer, "{}", diagnostic.location())?;

    if let Some(snippet) = diagnostic.snippet() {
        let gutter = snippet.line.to_string().len();
        let mut blue = ColorSpec::new();
        blue.set_fg(Some(Color::Blue));
        writer.set_color(&blue)?;
        writeln!(writer, "{:gutter$} |", "")?;
        write!(writer, "{} | ", snippet.line)?;
        writer.reset()?;
        writeln!(writer, "{}", snippet.text)?;
        writer.set_color(&blue)?;
        write!(writer, "{:gutter$} | ", "")?;
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        writeln!(writer, "{:indent$}{}", "", "^".repeat(snippet.width), indent = snippet.indent)?;
        writer.reset()?;
    }
    if let Some(help) = &error.diagnostic_info.help {
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(writer, "  = help")?;
        writer.reset()?;
        writeln!(writer, ": {help}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{sourced_error, ErrorKind};
    use crate::span::Span;

    fn expectation(source: &str, start: usize, end: usize) -> ParsingError {
        sourced_error(
            ErrorKind::ExpectationFailure {
                expected: "';'".into(),
                found: "'}'".into(),
            },
            "parse",
            "demo.cm",
            source,
            Span::new(0, start, end),
        )
    }

    #[test]
    fn caret_sits_under_the_error() {
        let source = "int f() {\n  x = 1\n}\n";
        let error = expectation(source, 18, 19);
        let text = ParseDiagnostic::new(&error, source).to_string();
        assert_eq!(
            text,
            "error[cminor::parse::expectation_failure]: ';' expected, found '}'\n  \
             --> demo.cm:3:1\n  |\n3 | }\n  | ^\n"
        );
    }

    #[test]
    fn caret_accounts_for_wide_chars() {
        let source = "s = \"日本\" x";
        let start = source.find('x').unwrap();
        let error = expectation(source, start, start + 1);
        let text = ParseDiagnostic::new(&error, source).to_string();
        let caret_line = text.lines().nth(4).unwrap();
        // Each CJK char is two columns wide.
        assert_eq!(caret_line, format!("  | {}^", " ".repeat(11)));
    }
}
