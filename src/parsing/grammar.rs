//! Grammars and the parse entry point.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, ErrorReporting, ParsingError};
use crate::parsing::domain::ParsingDomain;
use crate::parsing::engine::{invoke_rule, skip, ParseState};
use crate::parsing::rule::{Rule, RuleId};
use crate::parsing::scanner::Scanner;
use crate::parsing::stack::ObjectStack;
use crate::parsing::trace::ParseTrace;

/// Most expected terminals listed in the help of an expectation failure.
const MAX_EXPECTED_LISTED: usize = 8;

// ============================================================================
// BUILDING
// ============================================================================

/// Alias for a rule of another grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLink {
    pub alias: String,
    /// `Grammar.Rule`, where `Grammar` is a qualified grammar name.
    pub target: String,
}

/// A grammar under construction, before linking.
pub struct GrammarBuilder<V> {
    pub(crate) name: String,
    pub(crate) references: Vec<String>,
    pub(crate) rules: Vec<Rule<V>>,
    pub(crate) links: Vec<RuleLink>,
    pub(crate) start: Option<String>,
    pub(crate) skip: Option<String>,
}

impl<V: 'static> GrammarBuilder<V> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            references: Vec::new(),
            rules: Vec::new(),
            links: Vec::new(),
            start: None,
            skip: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a grammar whose rules this grammar may call by qualified name.
    pub fn reference(&mut self, grammar: &str) -> &mut Self {
        if !self.references.iter().any(|name| name == grammar) {
            self.references.push(grammar.to_string());
        }
        self
    }

    pub fn rule(&mut self, rule: Rule<V>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Makes `target` (`Grammar.Rule`) callable as `alias`.
    pub fn link(&mut self, alias: &str, target: &str) -> &mut Self {
        self.links.push(RuleLink {
            alias: alias.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn start(&mut self, rule: &str) -> &mut Self {
        self.start = Some(rule.to_string());
        self
    }

    pub fn skip(&mut self, rule: &str) -> &mut Self {
        self.skip = Some(rule.to_string());
        self
    }
}

// ============================================================================
// LINKED GRAMMARS
// ============================================================================

/// A linked grammar. Rules are owned by the domain and referred to by id.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) references: Vec<String>,
    pub(crate) rules: Vec<RuleId>,
    pub(crate) rule_index: HashMap<String, RuleId>,
    pub(crate) links: Vec<(String, RuleId)>,
    pub(crate) start: Option<RuleId>,
    pub(crate) skip: Option<RuleId>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Own rule or link alias named `name`.
    pub fn lookup(&self, name: &str) -> Option<RuleId> {
        self.rule_index.get(name).copied().or_else(|| {
            self.links
                .iter()
                .find(|(alias, _)| alias == name)
                .map(|(_, id)| *id)
        })
    }
}

/// Options of a single parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub file_name: String,
    pub file_index: u32,
    /// Record rule enter/leave events into the session trace.
    pub trace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            file_name: "<input>".to_string(),
            file_index: 0,
            trace: false,
        }
    }
}

impl ParseOptions {
    pub fn for_file(file_index: u32, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            file_index,
            trace: false,
        }
    }

    pub fn traced(mut self) -> Self {
        self.trace = true;
        self
    }
}

/// Per-call resources a caller may want to inspect after a parse.
#[derive(Debug)]
pub struct ParseSession<V> {
    pub stack: ObjectStack<V>,
    pub trace: Option<ParseTrace>,
}

impl<V> ParseSession<V> {
    pub fn new() -> Self {
        Self {
            stack: ObjectStack::new(),
            trace: None,
        }
    }
}

impl<V> Default for ParseSession<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A grammar of a linked domain, ready to parse.
pub struct GrammarRef<'d, V> {
    pub(crate) domain: &'d ParsingDomain<V>,
    pub(crate) grammar: &'d Grammar,
}

impl<V> Clone for GrammarRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for GrammarRef<'_, V> {}

impl<'d, V: Clone + 'static> GrammarRef<'d, V> {
    pub fn name(&self) -> &'d str {
        &self.grammar.name
    }

    pub fn grammar(&self) -> &'d Grammar {
        self.grammar
    }

    pub fn start_rule(&self) -> Option<&'d Rule<V>> {
        self.grammar.start.map(|id| self.domain.rule(id))
    }

    pub fn skip_rule(&self) -> Option<&'d Rule<V>> {
        self.grammar.skip.map(|id| self.domain.rule(id))
    }

    /// Own rules, in definition order.
    pub fn rules(&self) -> impl Iterator<Item = &'d Rule<V>> + 'd {
        let domain = self.domain;
        self.grammar.rules.iter().map(move |id| domain.rule(*id))
    }

    /// Own rule or link alias named `name`.
    pub fn rule(&self, name: &str) -> Option<&'d Rule<V>> {
        self.grammar.lookup(name).map(|id| self.domain.rule(id))
    }

    /// Parses all of `input` with the start rule, passing `args` as its
    /// inherited attributes. Returns the start rule's synthesized value, or
    /// `None` if it declares none.
    pub fn parse(
        &self,
        input: &str,
        file_index: u32,
        file_name: &str,
        args: Vec<V>,
    ) -> Result<Option<V>, ParsingError> {
        let mut session = ParseSession::new();
        self.parse_in(
            input,
            &ParseOptions::for_file(file_index, file_name),
            args,
            &mut session,
        )
    }

    /// Like [`parse`](Self::parse), using the caller's session. The session
    /// stack is back at its original depth when this returns, on success and
    /// on failure alike.
    pub fn parse_in(
        &self,
        input: &str,
        options: &ParseOptions,
        args: Vec<V>,
        session: &mut ParseSession<V>,
    ) -> Result<Option<V>, ParsingError> {
        let Some(start) = self.grammar.start else {
            return Err(ParsingError::unsourced(
                ErrorKind::NoStartRule {
                    grammar: self.grammar.name.clone(),
                },
                "grammar",
            ));
        };
        let start_rule = self.domain.rule(start);
        if args.len() != start_rule.attributes().len() {
            return Err(ParsingError::unsourced(
                ErrorKind::ArgumentCountMismatch {
                    caller: format!("{}::parse", self.grammar.name),
                    rule: start_rule.qualified_name(),
                    expected: start_rule.attributes().len(),
                    actual: args.len(),
                },
                "grammar",
            ));
        }

        let mut scanner = Scanner::new(input, options.file_index, options.file_name.as_str())
            .with_skip_rule(self.grammar.skip);
        if options.trace {
            scanner.enable_trace();
        }
        let depth = session.stack.len();
        for arg in args {
            session.stack.push(arg);
        }

        let outcome = {
            let mut state = ParseState {
                rules: self.domain.rules(),
                scanner: &mut scanner,
                stack: &mut session.stack,
            };
            run_start_rule(&mut state, start, start_rule, depth)
        };
        session.trace = scanner.take_trace();
        if outcome.is_err() {
            session.stack.truncate(depth);
        }
        debug_assert_eq!(session.stack.len(), depth, "object stack out of balance");
        outcome
    }
}

fn run_start_rule<V: Clone + 'static>(
    state: &mut ParseState<'_, '_, V>,
    start: RuleId,
    start_rule: &Rule<V>,
    depth: usize,
) -> Result<Option<V>, ParsingError> {
    skip(state)?;
    let m = invoke_rule(state, start)?;
    if m.is_hit() {
        skip(state)?;
    }
    if m.is_miss() || !state.scanner.at_end() {
        return Err(incomplete_parse(state.scanner, start_rule));
    }
    if !start_rule.has_value() {
        return Ok(None);
    }
    match state.stack.pop() {
        Some(value) if state.stack.len() == depth => Ok(Some(value)),
        _ => Err(state.scanner.internal_error(
            ErrorKind::MissingValue {
                rule: start_rule.qualified_name(),
            },
            state.scanner.span(),
        )),
    }
}

/// Expectation failure for input the start rule did not cover, positioned at
/// the farthest point any terminal was tried.
fn incomplete_parse<V: 'static>(scanner: &Scanner<'_>, start_rule: &Rule<V>) -> ParsingError {
    let farthest = scanner.farthest();
    let expected: Vec<&str> = scanner.expected_at_farthest().collect();
    let error = scanner.expectation_failure(
        start_rule.info(),
        &scanner.found_at(farthest),
        scanner.char_span_at(farthest),
    );
    if expected.is_empty() {
        return error;
    }
    let mut listed = expected[..expected.len().min(MAX_EXPECTED_LISTED)].join(", ");
    if expected.len() > MAX_EXPECTED_LISTED {
        listed.push_str(", ...");
    }
    error.with_help(format!("expected one of: {listed}"))
}

impl<V: Clone + 'static> fmt::Display for GrammarRef<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "grammar {}", self.grammar.name)?;
        writeln!(f, "{{")?;
        for reference in &self.grammar.references {
            writeln!(f, "    using {reference};")?;
        }
        for (alias, id) in &self.grammar.links {
            writeln!(f, "    {alias} = {};", self.domain.rule(*id).qualified_name())?;
        }
        if let Some(start) = self.start_rule() {
            writeln!(f, "    start {};", start.qualified_name())?;
        }
        if let Some(skip) = self.skip_rule() {
            writeln!(f, "    skip {};", skip.qualified_name())?;
        }
        for rule in self.rules() {
            writeln!(f, "    {rule}")?;
        }
        writeln!(f, "}}")
    }
}
