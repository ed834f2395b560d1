//! Execution of combinator trees against a scanner.
//!
//! Every combinator restores the scanner position when it misses, so a miss
//! never consumes input. Rule invocations keep the object stack balanced:
//! inherited arguments are popped on entry and exactly one value is pushed on
//! a hit when the rule declares a value type.

use crate::errors::{ErrorKind, ErrorReporting, ParsingError};
use crate::parsing::matching::Match;
use crate::parsing::parser::{Nonterminal, Parser};
use crate::parsing::rule::{Context, Matched, Rule, RuleId};
use crate::parsing::scanner::Scanner;
use crate::parsing::stack::ObjectStack;

/// Mutable state of one parse.
pub(crate) struct ParseState<'p, 'a, V> {
    pub rules: &'p [Rule<V>],
    pub scanner: &'p mut Scanner<'a>,
    pub stack: &'p mut ObjectStack<V>,
}

type Outcome = Result<Match, ParsingError>;

/// Runs the scanner's skip rule at the current position, if skipping applies.
pub(crate) fn skip<V: Clone + 'static>(state: &mut ParseState<'_, '_, V>) -> Result<(), ParsingError> {
    let Some(skip_rule) = state.scanner.skip_rule() else {
        return Ok(());
    };
    if !state.scanner.can_skip() {
        return Ok(());
    }
    let save = state.scanner.position();
    let depth = state.stack.len();
    state.scanner.set_skipping(true);
    let outcome = invoke_rule(state, skip_rule);
    state.scanner.set_skipping(false);
    // Whatever the skip rule synthesized is discarded
    state.stack.truncate(depth);
    if outcome?.is_miss() {
        state.scanner.set_position(save);
    }
    Ok(())
}

/// Enter, match, leave.
pub(crate) fn invoke_rule<V: Clone + 'static>(state: &mut ParseState<'_, '_, V>, id: RuleId) -> Outcome {
    let rules = state.rules;
    let rule = &rules[id.0];
    let start = state.scanner.position();

    let needed = rule.attributes().len();
    let available = state.stack.len();
    let Some(args) = state.stack.pop_n(needed) else {
        return Err(state.scanner.internal_error(
            ErrorKind::StackUnderflow {
                rule: rule.qualified_name(),
                needed,
                available,
            },
            state.scanner.span(),
        ));
    };

    let mut ctx = Context::enter(rule.attributes(), args, start);
    state.scanner.enter_rule(rule.grammar(), rule.name());
    let outcome = rule.definition().parse(state, rule, &mut ctx);
    let matched = matches!(outcome, Ok(Match::Hit(_)));
    state.scanner.leave_rule(rule.grammar(), rule.name(), start, matched);
    let m = outcome?;

    if m.is_hit() && rule.has_value() {
        let Some(value) = ctx.take_value() else {
            return Err(state.scanner.internal_error(
                ErrorKind::MissingValue {
                    rule: rule.qualified_name(),
                },
                state.scanner.span_from(start),
            ));
        };
        state.stack.push(value);
    }
    Ok(m)
}

fn match_char<V>(state: &mut ParseState<'_, '_, V>, parser: &Parser, accept: impl Fn(char) -> bool) -> Match {
    match state.scanner.peek() {
        Some(ch) if accept(ch) => {
            state.scanner.advance_char();
            Match::Hit(ch.len_utf8())
        }
        _ => {
            state.scanner.note_failure(|| parser.info());
            Match::Miss
        }
    }
}

fn is_id_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_id_cont(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl Parser {
    pub(crate) fn parse<V: Clone + 'static>(
        &self,
        state: &mut ParseState<'_, '_, V>,
        rule: &Rule<V>,
        ctx: &mut Context<V>,
    ) -> Outcome {
        use Parser::*;
        let start = state.scanner.position();
        match self {
            Empty => Ok(Match::empty()),
            Any => Ok(match_char(state, self, |_| true)),
            Space => Ok(match_char(state, self, char::is_whitespace)),
            Letter => Ok(match_char(state, self, char::is_alphabetic)),
            Digit => Ok(match_char(state, self, |ch| ch.is_ascii_digit())),
            HexDigit => Ok(match_char(state, self, |ch| ch.is_ascii_hexdigit())),
            Punctuation => Ok(match_char(state, self, |ch| ch.is_ascii_punctuation())),
            IdStart => Ok(match_char(state, self, is_id_start)),
            IdCont => Ok(match_char(state, self, is_id_cont)),
            Char(expected) => Ok(match_char(state, self, |ch| ch == *expected)),
            CharSet(set) => Ok(match_char(state, self, |ch| set.matches(ch))),

            Str(literal) => {
                if state.scanner.eat_str(literal) {
                    Ok(Match::Hit(literal.len()))
                } else {
                    state.scanner.note_failure(|| self.info());
                    Ok(Match::Miss)
                }
            }

            Keyword(word) => {
                let bounded = state.scanner.eat_str(word)
                    && !state.scanner.peek().is_some_and(is_id_cont);
                if bounded {
                    Ok(Match::Hit(word.len()))
                } else {
                    state.scanner.set_position(start);
                    state.scanner.note_failure(|| self.info());
                    Ok(Match::Miss)
                }
            }

            KeywordList { selector, keywords } => {
                let m = selector.parse(state, rule, ctx)?;
                let end = state.scanner.position();
                if m.is_hit() && keywords.contains(state.scanner.text(start, end)) {
                    return Ok(m);
                }
                state.scanner.set_position(start);
                state.scanner.note_failure(|| self.info());
                Ok(Match::Miss)
            }

            Sequence(left, right) => {
                if left.parse(state, rule, ctx)?.is_miss() {
                    return Ok(Match::Miss);
                }
                let mid = state.scanner.position();
                skip(state)?;
                match right.parse(state, rule, ctx)? {
                    Match::Miss => {
                        state.scanner.set_position(start);
                        return Ok(Match::Miss);
                    }
                    // Skipped input before an empty match stays unconsumed
                    Match::Hit(0) => state.scanner.set_position(mid),
                    Match::Hit(_) => {}
                }
                Ok(Match::between(start, state.scanner.position()))
            }

            Alternative(left, right) => {
                let m = left.parse(state, rule, ctx)?;
                if m.is_hit() {
                    return Ok(m);
                }
                state.scanner.set_position(start);
                right.parse(state, rule, ctx)
            }

            Difference(left, right) => {
                let Match::Hit(left_len) = left.parse(state, rule, ctx)? else {
                    state.scanner.set_position(start);
                    return Ok(Match::Miss);
                };
                let after = state.scanner.position();
                state.scanner.set_position(start);
                match right.parse(state, rule, ctx)? {
                    Match::Hit(right_len) if right_len >= left_len => {
                        state.scanner.set_position(start);
                        Ok(Match::Miss)
                    }
                    _ => {
                        state.scanner.set_position(after);
                        Ok(Match::Hit(left_len))
                    }
                }
            }

            List(item, separator) => {
                if item.parse(state, rule, ctx)?.is_miss() {
                    return Ok(Match::Miss);
                }
                loop {
                    let save = state.scanner.position();
                    skip(state)?;
                    if separator.parse(state, rule, ctx)?.is_miss() {
                        state.scanner.set_position(save);
                        break;
                    }
                    skip(state)?;
                    if item.parse(state, rule, ctx)?.is_miss() {
                        state.scanner.set_position(save);
                        break;
                    }
                }
                Ok(Match::between(start, state.scanner.position()))
            }

            Optional(subject) => {
                let m = subject.parse(state, rule, ctx)?;
                if m.is_hit() {
                    return Ok(m);
                }
                state.scanner.set_position(start);
                Ok(Match::empty())
            }

            KleeneStar(subject) => {
                repeat(state, rule, ctx, subject, true)?;
                Ok(Match::between(start, state.scanner.position()))
            }

            Positive(subject) => {
                if subject.parse(state, rule, ctx)?.is_miss() {
                    return Ok(Match::Miss);
                }
                repeat(state, rule, ctx, subject, false)?;
                Ok(Match::between(start, state.scanner.position()))
            }

            Expectation(subject) => {
                let m = subject.parse(state, rule, ctx)?;
                if m.is_hit() {
                    return Ok(m);
                }
                let pos = state.scanner.position();
                let found = state.scanner.found_at(pos);
                let span = state.scanner.char_span_at(pos);
                Err(state.scanner.expectation_failure(&subject.info(), &found, span))
            }

            Token(subject) => {
                state.scanner.begin_token();
                let outcome = subject.parse(state, rule, ctx);
                state.scanner.end_token();
                outcome
            }

            Lookahead(subject) => {
                let m = subject.parse(state, rule, ctx)?;
                state.scanner.set_position(start);
                Ok(if m.is_hit() { Match::empty() } else { Match::Miss })
            }

            Not(subject) => {
                let m = subject.parse(state, rule, ctx)?;
                state.scanner.set_position(start);
                Ok(if m.is_hit() { Match::Miss } else { Match::empty() })
            }

            Action { id, subject } => {
                let m = subject.parse(state, rule, ctx)?;
                if m.is_miss() {
                    return Ok(m);
                }
                let Some(action) = rule.action_fn(id) else {
                    return Err(state.scanner.internal_error(
                        ErrorKind::UnboundAction {
                            rule: rule.qualified_name(),
                            action: id.clone(),
                        },
                        state.scanner.span_from(start),
                    ));
                };
                let end = state.scanner.position();
                let matched = Matched {
                    text: state.scanner.text(start, end),
                    span: state.scanner.span_from(start),
                    file_name: state.scanner.file_name(),
                };
                match action(ctx, &matched) {
                    Ok(true) => Ok(m),
                    Ok(false) => {
                        state.scanner.set_position(start);
                        Ok(Match::Miss)
                    }
                    Err(kind) => Err(state.scanner.report(kind, matched.span)),
                }
            }

            Nonterminal(nonterminal) => call(state, rule, ctx, nonterminal),
        }
    }
}

/// Greedy repetition with the skip rule applied between iterations.
fn repeat<V: Clone + 'static>(
    state: &mut ParseState<'_, '_, V>,
    rule: &Rule<V>,
    ctx: &mut Context<V>,
    subject: &Parser,
    mut first: bool,
) -> Result<(), ParsingError> {
    while !state.scanner.at_end() {
        let save = state.scanner.position();
        if !first {
            skip(state)?;
        }
        first = false;
        if subject.parse(state, rule, ctx)?.is_miss() {
            state.scanner.set_position(save);
            break;
        }
    }
    Ok(())
}

/// Pre-call, invoke, post-call.
fn call<V: Clone + 'static>(
    state: &mut ParseState<'_, '_, V>,
    caller: &Rule<V>,
    ctx: &mut Context<V>,
    nonterminal: &Nonterminal,
) -> Outcome {
    let Some(target) = nonterminal.target() else {
        return Err(state.scanner.internal_error(
            ErrorKind::UnresolvedRule {
                caller: caller.qualified_name(),
                nonterminal: nonterminal.local_name.clone(),
                rule: nonterminal.rule_name.clone(),
            },
            state.scanner.span(),
        ));
    };

    let args = caller
        .pre_call_fn(&nonterminal.local_name)
        .map(|pre_call| pre_call(ctx))
        .unwrap_or_default();
    if args.len() != nonterminal.num_args {
        return Err(state.scanner.internal_error(
            ErrorKind::ArgumentCountMismatch {
                caller: caller.qualified_name(),
                rule: nonterminal.rule_name.clone(),
                expected: nonterminal.num_args,
                actual: args.len(),
            },
            state.scanner.span(),
        ));
    }
    for arg in args {
        state.stack.push(arg);
    }

    let m = invoke_rule(state, target)?;
    let rules = state.rules;
    if m.is_hit() && rules[target.0].has_value() {
        let Some(value) = state.stack.pop() else {
            return Err(state.scanner.internal_error(
                ErrorKind::MissingValue {
                    rule: rules[target.0].qualified_name(),
                },
                state.scanner.span(),
            ));
        };
        match caller.post_call_fn(&nonterminal.local_name) {
            Some(post_call) => post_call(ctx, value),
            None => ctx.set(&nonterminal.local_name, value),
        }
    }
    Ok(m)
}
