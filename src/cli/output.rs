//! Handles all user-facing output for the CLI.
//!
//! Syntax trees, parse traces and grammar listings are printed from here so
//! every command colors and formats them the same way.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::cminor::value::SyntaxValue;
use crate::parsing::trace::{ParseTrace, TraceEvent, TraceEventKind};

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints a syntax tree, pretty-printed or as JSON.
pub fn print_tree(value: &SyntaxValue, json: bool, color: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color);
    if json {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        return writeln!(stdout, "{text}");
    }
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "{}", value.type_name())?;
    stdout.reset()?;
    if let SyntaxValue::Expr(expr) = value {
        writeln!(stdout, " {expr}")?;
    } else {
        writeln!(stdout)?;
    }
    writeln!(stdout, "{value:#?}")
}

/// Prints trace events indented by rule depth. `rule` restricts the output
/// to the events of one rule, named bare or qualified.
pub fn print_trace(trace: &ParseTrace, rule: Option<&str>, color: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color);
    let events = trace
        .events
        .iter()
        .filter(|event| rule.map_or(true, |name| event.is_rule(name)));
    let mut shown = 0usize;
    for event in events {
        write_event(&mut stdout, event)?;
        shown += 1;
    }
    stdout.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(stdout, "{shown} of {} event(s)", trace.len())?;
    stdout.reset()
}

/// Prints grammar listings separated by blank lines.
pub fn print_grammars(listings: impl IntoIterator<Item = String>, color: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color);
    for (i, listing) in listings.into_iter().enumerate() {
        if i > 0 {
            writeln!(stdout)?;
        }
        write_listing(&mut stdout, &listing)?;
    }
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_event(out: &mut impl WriteColor, event: &TraceEvent) -> io::Result<()> {
    let (marker, color) = match event.kind {
        TraceEventKind::Enter => ("->", Color::Cyan),
        TraceEventKind::Success => ("ok", Color::Green),
        TraceEventKind::Failure => ("--", Color::Red),
    };
    write!(out, "{:indent$}", "", indent = event.depth * 2)?;
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{marker} ")?;
    out.reset()?;
    write!(out, "{} ", event.rule)?;
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    write!(out, "@{}..{}", event.span.start, event.span.end)?;
    out.reset()?;
    if event.kind != TraceEventKind::Failure && !event.excerpt.is_empty() {
        write!(out, " {:?}", event.excerpt)?;
    }
    writeln!(out)
}

/// Highlights the `grammar` header line of a listing.
fn write_listing(out: &mut impl WriteColor, listing: &str) -> io::Result<()> {
    for line in listing.lines() {
        if let Some(name) = line.strip_prefix("grammar ") {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            write!(out, "grammar")?;
            out.reset()?;
            writeln!(out, " {name}")?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use termcolor::NoColor;

    #[test]
    fn events_are_indented_by_depth() {
        let mut trace = ParseTrace::new();
        trace.record(TraceEventKind::Enter, "Statement", 0, Span::at(0, 0), "x;");
        trace.record(TraceEventKind::Failure, "If", 1, Span::at(0, 0), "");
        let mut out = NoColor::new(Vec::new());
        for event in &trace.events {
            write_event(&mut out, event).unwrap();
        }
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "-> Statement @0..0 \"x;\"\n  -- If @0..0\n");
    }
}
