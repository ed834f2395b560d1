//! Recorded rule-level parse events.
//!
//! A trace is only collected when [`ParseOptions::trace`](crate::parsing::ParseOptions)
//! is set. The CLI prints it through `cli::output::print_trace`.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Longest excerpt of matched or upcoming text kept per event.
const EXCERPT_CHARS: usize = 24;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEventKind {
    Enter,
    Success,
    Failure,
}

/// One step of a rule invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: TraceEventKind,
    /// Qualified `Grammar.Rule` name.
    pub rule: String,
    pub depth: usize,
    pub span: Span,
    /// Upcoming input for `Enter`, matched input for `Success`.
    pub excerpt: String,
}

impl TraceEvent {
    /// True for the qualified rule name `name`, or for a bare rule name
    /// matching the last segment.
    pub fn is_rule(&self, name: &str) -> bool {
        self.rule == name || self.rule.rsplit_once('.').is_some_and(|(_, rule)| rule == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseTrace {
    pub events: Vec<TraceEvent>,
}

impl ParseTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TraceEventKind, rule: &str, depth: usize, span: Span, text: &str) {
        self.events.push(TraceEvent {
            kind,
            rule: rule.to_string(),
            depth,
            span,
            excerpt: excerpt(text),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events for one rule, qualified or bare, in order.
    pub fn for_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |event| event.is_rule(rule))
    }
}

fn excerpt(text: &str) -> String {
    let mut out: String = text
        .chars()
        .take(EXCERPT_CHARS)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if text.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpts_are_shortened_and_flattened() {
        let mut trace = ParseTrace::new();
        trace.record(
            TraceEventKind::Enter,
            "lang.Statements.Statement",
            0,
            Span::at(0, 0),
            "while (x)\n{ very long body text here }",
        );
        let event = &trace.events[0];
        assert!(event.excerpt.ends_with("..."));
        assert!(!event.excerpt.contains('\n'));
        assert_eq!(trace.for_rule("Statement").count(), 1);
        assert_eq!(trace.for_rule("lang.Statements.Statement").count(), 1);
        assert_eq!(trace.for_rule("Statements.Statement").count(), 0);
    }
}
