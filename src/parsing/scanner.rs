//! Cursor over the immutable input of one parse.

use std::collections::BTreeSet;

use crate::errors::{sourced_error, ErrorKind, ErrorReporting, ParsingError};
use crate::parsing::rule::RuleId;
use crate::parsing::trace::{ParseTrace, TraceEventKind};
use crate::span::Span;

/// Longest piece of input quoted as "found" in expectation failures.
const FOUND_CHARS: usize = 16;

/// Single-pass, single-consumer cursor over `source[start..end]`.
///
/// Besides the position, the scanner tracks token mode (skip rule disabled),
/// the farthest position at which a terminal failed together with what was
/// expected there, and the optional parse trace.
pub struct Scanner<'a> {
    source: &'a str,
    start: usize,
    pos: usize,
    end: usize,
    file_name: String,
    file_index: u32,
    skip_rule: Option<RuleId>,
    token_depth: usize,
    skipping: bool,
    rule_depth: usize,
    farthest: usize,
    expected: BTreeSet<String>,
    trace: Option<ParseTrace>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, file_index: u32, file_name: impl Into<String>) -> Self {
        Self::with_bounds(source, 0, source.len(), file_index, file_name)
    }

    /// Scanner restricted to `source[start..end]`. Spans stay relative to the
    /// whole of `source`.
    pub fn with_bounds(
        source: &'a str,
        start: usize,
        end: usize,
        file_index: u32,
        file_name: impl Into<String>,
    ) -> Self {
        let end = end.min(source.len());
        let start = start.min(end);
        Self {
            source,
            start,
            pos: start,
            end,
            file_name: file_name.into(),
            file_index,
            skip_rule: None,
            token_depth: 0,
            skipping: false,
            rule_depth: 0,
            farthest: start,
            expected: BTreeSet::new(),
            trace: None,
        }
    }

    pub fn with_skip_rule(mut self, skip_rule: Option<RuleId>) -> Self {
        self.skip_rule = skip_rule;
        self
    }

    pub fn skip_rule(&self) -> Option<RuleId> {
        self.skip_rule
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos >= self.start && pos <= self.end);
        self.pos = pos;
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..self.end]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consumes `literal` if the input continues with it.
    pub fn eat_str(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Zero-width span at the current position.
    pub fn span(&self) -> Span {
        Span::at(self.file_index, self.pos)
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span::new(self.file_index, start, self.pos)
    }

    pub fn text(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    // ------------------------------------------------------------------
    // Token mode and skipping
    // ------------------------------------------------------------------

    pub fn begin_token(&mut self) {
        self.token_depth += 1;
    }

    pub fn end_token(&mut self) {
        self.token_depth = self.token_depth.saturating_sub(1);
    }

    pub fn in_token(&self) -> bool {
        self.token_depth > 0
    }

    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    pub(crate) fn set_skipping(&mut self, skipping: bool) {
        self.skipping = skipping;
    }

    /// True when the skip rule may run at the current point.
    pub fn can_skip(&self) -> bool {
        self.skip_rule.is_some() && !self.skipping && self.token_depth == 0
    }

    // ------------------------------------------------------------------
    // Failure tracking
    // ------------------------------------------------------------------

    /// Records that `expected` failed to match at the current position.
    pub fn note_failure(&mut self, expected: impl FnOnce() -> String) {
        if self.skipping {
            return;
        }
        if self.pos > self.farthest {
            self.farthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.farthest {
            self.expected.insert(expected());
        }
    }

    pub fn farthest(&self) -> usize {
        self.farthest.max(self.pos)
    }

    /// Terminals that failed at the farthest failure position. Empty once the
    /// scanner itself has moved past that position.
    pub fn expected_at_farthest(&self) -> impl Iterator<Item = &str> {
        let stale = self.pos > self.farthest;
        self.expected
            .iter()
            .filter(move |_| !stale)
            .map(String::as_str)
    }

    /// Describes the input at `pos` for "found ..." messages: the word
    /// starting there, or else its single char.
    pub fn found_at(&self, pos: usize) -> String {
        let rest = self.source.get(pos..self.end).unwrap_or("");
        let Some(first) = rest.chars().next() else {
            return "end of file".into();
        };
        if first.is_whitespace() {
            return format!("{first:?}");
        }
        if !is_word_char(first) {
            return format!("'{first}'");
        }
        let word: String = rest
            .chars()
            .take_while(|ch| is_word_char(*ch))
            .take(FOUND_CHARS)
            .collect();
        format!("'{word}'")
    }

    /// Span of the char at `pos`, or a zero-width span at the end of input.
    pub fn char_span_at(&self, pos: usize) -> Span {
        let len = self.source[pos.min(self.end)..self.end]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        Span::new(self.file_index, pos, pos + len)
    }

    // ------------------------------------------------------------------
    // Tracing
    // ------------------------------------------------------------------

    pub fn enable_trace(&mut self) {
        self.trace = Some(ParseTrace::new());
    }

    pub fn take_trace(&mut self) -> Option<ParseTrace> {
        self.trace.take()
    }

    pub(crate) fn enter_rule(&mut self, grammar: &str, rule: &str) {
        if !self.skipping {
            if let Some(trace) = self.trace.as_mut() {
                let rest = &self.source[self.pos..self.end];
                trace.record(
                    TraceEventKind::Enter,
                    &qualified(grammar, rule),
                    self.rule_depth,
                    Span::at(self.file_index, self.pos),
                    rest,
                );
            }
        }
        self.rule_depth += 1;
    }

    pub(crate) fn leave_rule(&mut self, grammar: &str, rule: &str, start: usize, matched: bool) {
        self.rule_depth = self.rule_depth.saturating_sub(1);
        if self.skipping {
            return;
        }
        if let Some(trace) = self.trace.as_mut() {
            let (kind, end) = if matched {
                (TraceEventKind::Success, self.pos)
            } else {
                (TraceEventKind::Failure, start)
            };
            trace.record(
                kind,
                &qualified(grammar, rule),
                self.rule_depth,
                Span::new(self.file_index, start, end),
                &self.source[start..end],
            );
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn qualified(grammar: &str, rule: &str) -> String {
    if grammar.is_empty() {
        rule.to_string()
    } else {
        format!("{grammar}.{rule}")
    }
}

impl ErrorReporting for Scanner<'_> {
    fn report(&self, kind: ErrorKind, span: Span) -> ParsingError {
        sourced_error(kind, "parse", &self.file_name, self.source, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_limit_the_visible_input() {
        let mut scanner = Scanner::with_bounds("xx abc yy", 3, 6, 2, "t.cm");
        assert_eq!(scanner.rest(), "abc");
        assert!(scanner.eat_str("ab"));
        assert_eq!(scanner.span(), Span::at(2, 5));
        assert_eq!(scanner.advance_char(), Some('c'));
        assert!(scanner.at_end());
        assert_eq!(scanner.advance_char(), None);
    }

    #[test]
    fn farthest_failure_keeps_only_the_latest_position() {
        let mut scanner = Scanner::new("abc", 0, "t.cm");
        scanner.note_failure(|| "'x'".into());
        scanner.set_position(2);
        scanner.note_failure(|| "'y'".into());
        scanner.note_failure(|| "'z'".into());
        scanner.set_position(1);
        scanner.note_failure(|| "'w'".into());
        assert_eq!(scanner.farthest(), 2);
        assert_eq!(scanner.expected_at_farthest().collect::<Vec<_>>(), vec!["'y'", "'z'"]);
    }

    #[test]
    fn expectations_behind_the_position_are_stale() {
        let mut scanner = Scanner::new("abc", 0, "t.cm");
        scanner.set_position(1);
        scanner.note_failure(|| "'x'".into());
        scanner.set_position(3);
        assert_eq!(scanner.farthest(), 3);
        assert_eq!(scanner.expected_at_farthest().count(), 0);
    }

    #[test]
    fn failures_inside_skipping_are_ignored() {
        let mut scanner = Scanner::new("abc", 0, "t.cm");
        scanner.set_position(1);
        scanner.set_skipping(true);
        scanner.note_failure(|| "space".into());
        assert_eq!(scanner.expected_at_farthest().count(), 0);
    }

    #[test]
    fn found_describes_the_next_word() {
        let scanner = Scanner::new("x garbage here", 0, "t.cm");
        assert_eq!(scanner.found_at(2), "'garbage'");
        assert_eq!(scanner.found_at(14), "end of file");
        assert_eq!(scanner.found_at(1), "' '");
    }

    #[test]
    fn found_stops_at_the_end_of_the_first_token() {
        let scanner = Scanner::new("f(a,) 'b'", 0, "t.cm");
        assert_eq!(scanner.found_at(3), "','");
        assert_eq!(scanner.found_at(4), "')'");
        assert_eq!(scanner.found_at(7), "'b'");
        assert_eq!(scanner.found_at(0), "'f'");
    }

    #[test]
    fn trace_events_carry_qualified_rule_names() {
        let mut scanner = Scanner::new("x", 0, "t.cm");
        scanner.enable_trace();
        scanner.enter_rule("lang.Names", "Identifier");
        scanner.advance_char();
        scanner.leave_rule("lang.Names", "Identifier", 0, true);
        let trace = scanner.take_trace().unwrap();
        let rules: Vec<_> = trace.events.iter().map(|event| event.rule.as_str()).collect();
        assert_eq!(rules, ["lang.Names.Identifier", "lang.Names.Identifier"]);
        assert_eq!(trace.for_rule("Identifier").count(), 2);
    }
}
