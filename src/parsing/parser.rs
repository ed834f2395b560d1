//! The combinator tree.
//!
//! A [`Parser`] describes a parsing expression. Trees are assembled with the
//! free functions and builder methods in this module, stored in rules, and
//! executed by the engine once the owning domain has been linked.
//!
//! ```rust
//! use cminor_parsing::parsing::parser::{chr, rule, string};
//! let arguments = chr('(').then(rule("Expression").sep_by(chr(',')).opt()).then(chr(')').expect());
//! let shift_left = string("<<").except(string("<<="));
//! assert_eq!(arguments.to_string(), "'(' (Expression % ',')? ')'!");
//! assert_eq!(shift_left.to_string(), "\"<<\" - \"<<=\"");
//! ```

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use crate::parsing::rule::RuleId;

/// A parsing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Parser {
    /// Matches nothing, always hits.
    Empty,
    /// Any single char.
    Any,
    Space,
    Letter,
    Digit,
    HexDigit,
    Punctuation,
    /// Letter or `_`.
    IdStart,
    /// Letter, digit or `_`.
    IdCont,
    Char(char),
    Str(String),
    CharSet(CharSet),
    /// A literal that must not be followed by an identifier char.
    Keyword(String),
    /// Selector match whose text is one of `keywords`.
    KeywordList {
        selector: Box<Parser>,
        keywords: BTreeSet<String>,
    },
    Sequence(Box<Parser>, Box<Parser>),
    /// Ordered choice.
    Alternative(Box<Parser>, Box<Parser>),
    /// Left, unless right matches at least as much input.
    Difference(Box<Parser>, Box<Parser>),
    /// `item (separator item)*`
    List(Box<Parser>, Box<Parser>),
    Optional(Box<Parser>),
    KleeneStar(Box<Parser>),
    Positive(Box<Parser>),
    /// A miss is a hard error.
    Expectation(Box<Parser>),
    /// Skip rule disabled inside.
    Token(Box<Parser>),
    /// `&p`: zero-width positive lookahead.
    Lookahead(Box<Parser>),
    /// `!p`: zero-width negative lookahead.
    Not(Box<Parser>),
    Action {
        id: String,
        subject: Box<Parser>,
    },
    Nonterminal(Nonterminal),
}

/// Call of another rule from within a rule's definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Nonterminal {
    /// Name under which the callee's value is stored in the caller's context.
    pub local_name: String,
    /// Rule name as written: own rule, rule link alias, or `Grammar.Rule`.
    pub rule_name: String,
    pub num_args: usize,
    pub(crate) target: Option<RuleId>,
}

impl Nonterminal {
    /// Resolved callee, available once the domain is linked.
    pub fn target(&self) -> Option<RuleId> {
        self.target
    }
}

// ============================================================================
// CHARACTER SETS
// ============================================================================

/// Character class such as `[a-zA-Z_]` or `[^\n\r]`.
///
/// Malformed class text is kept and reported when the domain is linked.
#[derive(Debug, Clone, PartialEq)]
pub struct CharSet {
    text: String,
    ranges: Vec<(char, char)>,
    inverse: bool,
    invalid: Option<String>,
}

impl CharSet {
    /// Parses class text without the surrounding brackets. A leading `^`
    /// inverts the class; `\n`, `\r`, `\t`, `\\`, `\-`, `\]` and `\^` are escapes.
    pub fn new(text: &str) -> Self {
        let mut set = CharSet {
            text: text.to_string(),
            ranges: Vec::new(),
            inverse: false,
            invalid: None,
        };
        let mut chars = text.chars().peekable();
        if chars.peek() == Some(&'^') {
            set.inverse = true;
            chars.next();
        }
        let mut pending: Vec<char> = Vec::new();
        while let Some(ch) = chars.next() {
            let ch = if ch == '\\' {
                match chars.next().map(unescape) {
                    Some(Some(escaped)) => escaped,
                    Some(None) => {
                        set.invalid = Some("unknown escape sequence".into());
                        return set;
                    }
                    None => {
                        set.invalid = Some("trailing backslash".into());
                        return set;
                    }
                }
            } else if ch == '-' && !pending.is_empty() && chars.peek().is_some() {
                let low = pending.pop().unwrap_or(ch);
                let high = match chars.next() {
                    Some('\\') => match chars.next().and_then(unescape) {
                        Some(escaped) => escaped,
                        None => {
                            set.invalid = Some("bad escape in range".into());
                            return set;
                        }
                    },
                    Some(high) => high,
                    None => break,
                };
                if low > high {
                    set.invalid = Some(format!("range {low:?}-{high:?} is reversed"));
                    return set;
                }
                set.ranges.push((low, high));
                continue;
            } else {
                ch
            };
            pending.push(ch);
        }
        set.ranges.extend(pending.into_iter().map(|ch| (ch, ch)));
        if set.ranges.is_empty() {
            set.invalid = Some("empty class".into());
        }
        set
    }

    pub fn matches(&self, ch: char) -> bool {
        let inside = self
            .ranges
            .iter()
            .any(|&(low, high)| low <= ch && ch <= high);
        inside != self.inverse
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid.as_deref()
    }
}

fn unescape(ch: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '0' => Some('\0'),
        '\\' | '-' | ']' | '^' | '[' => Some(ch),
        _ => None,
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

pub fn empty() -> Parser {
    Parser::Empty
}

pub fn any() -> Parser {
    Parser::Any
}

pub fn space() -> Parser {
    Parser::Space
}

pub fn letter() -> Parser {
    Parser::Letter
}

pub fn digit() -> Parser {
    Parser::Digit
}

pub fn hex_digit() -> Parser {
    Parser::HexDigit
}

pub fn punctuation() -> Parser {
    Parser::Punctuation
}

pub fn id_start() -> Parser {
    Parser::IdStart
}

pub fn id_cont() -> Parser {
    Parser::IdCont
}

pub fn chr(ch: char) -> Parser {
    Parser::Char(ch)
}

pub fn string(literal: &str) -> Parser {
    Parser::Str(literal.to_string())
}

pub fn char_set(text: &str) -> Parser {
    Parser::CharSet(CharSet::new(text))
}

pub fn keyword(word: &str) -> Parser {
    Parser::Keyword(word.to_string())
}

pub fn keyword_list<'w>(selector: Parser, words: impl IntoIterator<Item = &'w str>) -> Parser {
    Parser::KeywordList {
        selector: Box::new(selector),
        keywords: words.into_iter().map(str::to_string).collect(),
    }
}

/// Call of `name` whose value is stored under the same name.
pub fn rule(name: &str) -> Parser {
    nonterminal(name, name, 0)
}

pub fn nonterminal(local_name: &str, rule_name: &str, num_args: usize) -> Parser {
    Parser::Nonterminal(Nonterminal {
        local_name: local_name.to_string(),
        rule_name: rule_name.to_string(),
        num_args,
        target: None,
    })
}

/// Left-nested sequence of all `parts`; `Empty` when there are none.
pub fn sequence(parts: impl IntoIterator<Item = Parser>) -> Parser {
    parts
        .into_iter()
        .reduce(|left, right| left.then(right))
        .unwrap_or(Parser::Empty)
}

/// Ordered choice between all `options`, first listed wins.
pub fn choice(options: impl IntoIterator<Item = Parser>) -> Parser {
    options
        .into_iter()
        .reduce(|left, right| left.or(right))
        .unwrap_or(Parser::Empty)
}

pub fn token(subject: Parser) -> Parser {
    Parser::Token(Box::new(subject))
}

pub fn lookahead(subject: Parser) -> Parser {
    Parser::Lookahead(Box::new(subject))
}

pub fn not(subject: Parser) -> Parser {
    Parser::Not(Box::new(subject))
}

impl From<char> for Parser {
    fn from(ch: char) -> Self {
        Parser::Char(ch)
    }
}

impl From<&str> for Parser {
    fn from(literal: &str) -> Self {
        Parser::Str(literal.to_string())
    }
}

impl Parser {
    pub fn then(self, next: impl Into<Parser>) -> Parser {
        Parser::Sequence(Box::new(self), Box::new(next.into()))
    }

    pub fn or(self, other: impl Into<Parser>) -> Parser {
        Parser::Alternative(Box::new(self), Box::new(other.into()))
    }

    pub fn except(self, excluded: impl Into<Parser>) -> Parser {
        Parser::Difference(Box::new(self), Box::new(excluded.into()))
    }

    pub fn sep_by(self, separator: impl Into<Parser>) -> Parser {
        Parser::List(Box::new(self), Box::new(separator.into()))
    }

    pub fn opt(self) -> Parser {
        Parser::Optional(Box::new(self))
    }

    pub fn many(self) -> Parser {
        Parser::KleeneStar(Box::new(self))
    }

    pub fn some(self) -> Parser {
        Parser::Positive(Box::new(self))
    }

    pub fn expect(self) -> Parser {
        Parser::Expectation(Box::new(self))
    }

    pub fn token(self) -> Parser {
        token(self)
    }

    /// Wraps `self` in the semantic action `id` of the owning rule.
    pub fn act(self, id: &str) -> Parser {
        Parser::Action {
            id: id.to_string(),
            subject: Box::new(self),
        }
    }

    /// Description used in expectation failures: grammar text without actions.
    pub fn info(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_expr(&mut out, false, 0);
        out
    }

    // ------------------------------------------------------------------
    // Traversal, used by the linker
    // ------------------------------------------------------------------

    pub fn children(&self) -> Vec<&Parser> {
        use Parser::*;
        match self {
            Sequence(a, b) | Alternative(a, b) | Difference(a, b) | List(a, b) => vec![&**a, &**b],
            Optional(p) | KleeneStar(p) | Positive(p) | Expectation(p) | Token(p)
            | Lookahead(p) | Not(p) => vec![&**p],
            Action { subject, .. } => vec![&**subject],
            KeywordList { selector, .. } => vec![&**selector],
            _ => vec![],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Parser> {
        use Parser::*;
        match self {
            Sequence(a, b) | Alternative(a, b) | Difference(a, b) | List(a, b) => {
                vec![&mut **a, &mut **b]
            }
            Optional(p) | KleeneStar(p) | Positive(p) | Expectation(p) | Token(p)
            | Lookahead(p) | Not(p) => vec![&mut **p],
            Action { subject, .. } => vec![&mut **subject],
            KeywordList { selector, .. } => vec![&mut **selector],
            _ => vec![],
        }
    }

    /// Visits `self` and every descendant, parents first.
    pub fn walk<'p>(&'p self, visit: &mut dyn FnMut(&'p Parser)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub(crate) fn try_walk_mut<E>(
        &mut self,
        visit: &mut dyn FnMut(&mut Parser) -> Result<(), E>,
    ) -> Result<(), E> {
        visit(self)?;
        for child in self.children_mut() {
            child.try_walk_mut(visit)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn precedence(&self) -> u8 {
        use Parser::*;
        match self {
            Alternative(..) => 1,
            Difference(..) => 2,
            Sequence(..) | List(..) => 3,
            Optional(_) | KleeneStar(_) | Positive(_) | Expectation(_) | Lookahead(_) | Not(_) => 4,
            _ => 5,
        }
    }

    fn write_expr(&self, out: &mut dyn fmt::Write, actions: bool, min_prec: u8) -> fmt::Result {
        use Parser::*;
        // Actions are transparent unless rendered
        if let Action { id, subject } = self {
            if !actions {
                return subject.write_expr(out, actions, min_prec);
            }
            subject.write_expr(out, actions, 5)?;
            return write!(out, "{{{id}}}");
        }
        let prec = self.precedence();
        let parens = prec < min_prec;
        if parens {
            out.write_char('(')?;
        }
        match self {
            Empty => out.write_str("empty")?,
            Any => out.write_str("anychar")?,
            Space => out.write_str("space")?,
            Letter => out.write_str("letter")?,
            Digit => out.write_str("digit")?,
            HexDigit => out.write_str("hexdigit")?,
            Punctuation => out.write_str("punctuation")?,
            IdStart => out.write_str("idstart")?,
            IdCont => out.write_str("idcont")?,
            Char(ch) => write!(out, "'{}'", ch.escape_default())?,
            Str(text) => write!(out, "\"{}\"", text.escape_default())?,
            CharSet(set) => write!(out, "[{}]", set.text())?,
            Keyword(word) => write!(out, "keyword(\"{word}\")")?,
            KeywordList { selector, keywords } => {
                out.write_str("keyword_list(")?;
                selector.write_expr(out, actions, 0)?;
                out.write_str(", [")?;
                for (i, word) in keywords.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    write!(out, "\"{word}\"")?;
                }
                out.write_str("])")?;
            }
            Sequence(a, b) => {
                a.write_expr(out, actions, 3)?;
                out.write_char(' ')?;
                b.write_expr(out, actions, 4)?;
            }
            Alternative(a, b) => {
                a.write_expr(out, actions, 1)?;
                out.write_str(" | ")?;
                b.write_expr(out, actions, 2)?;
            }
            Difference(a, b) => {
                a.write_expr(out, actions, 2)?;
                out.write_str(" - ")?;
                b.write_expr(out, actions, 3)?;
            }
            List(item, separator) => {
                item.write_expr(out, actions, 4)?;
                out.write_str(" % ")?;
                separator.write_expr(out, actions, 4)?;
            }
            Optional(p) => postfix(out, p, '?', actions)?,
            KleeneStar(p) => postfix(out, p, '*', actions)?,
            Positive(p) => postfix(out, p, '+', actions)?,
            Expectation(p) => postfix(out, p, '!', actions)?,
            Lookahead(p) => {
                out.write_char('&')?;
                p.write_expr(out, actions, 5)?;
            }
            Not(p) => {
                out.write_char('!')?;
                p.write_expr(out, actions, 5)?;
            }
            Token(p) => {
                out.write_str("token(")?;
                p.write_expr(out, actions, 0)?;
                out.write_char(')')?;
            }
            Nonterminal(nt) => {
                if actions && nt.local_name != nt.rule_name {
                    write!(out, "{}:", nt.local_name)?;
                }
                out.write_str(&nt.rule_name)?;
                if actions && nt.num_args > 0 {
                    write!(out, "/{}", nt.num_args)?;
                }
            }
            Action { .. } => unreachable!("handled above"),
        }
        if parens {
            out.write_char(')')?;
        }
        Ok(())
    }
}

fn postfix(out: &mut dyn fmt::Write, subject: &Parser, op: char, actions: bool) -> fmt::Result {
    subject.write_expr(out, actions, 5)?;
    out.write_char(op)
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_expr(f, true, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_set_ranges_and_inversion() {
        let ident = CharSet::new("a-zA-Z_");
        assert!(ident.matches('q'));
        assert!(ident.matches('_'));
        assert!(!ident.matches('7'));

        let not_newline = CharSet::new("^\\n\\r");
        assert!(not_newline.is_inverse());
        assert!(not_newline.matches('x'));
        assert!(!not_newline.matches('\n'));

        let with_dash = CharSet::new("+-");
        assert!(with_dash.matches('-'));
        assert!(with_dash.matches('+'));
        assert!(with_dash.invalid_reason().is_none());
    }

    #[test]
    fn malformed_char_sets_are_flagged() {
        assert!(CharSet::new("z-a").invalid_reason().is_some());
        assert!(CharSet::new("ab\\").invalid_reason().is_some());
        assert!(CharSet::new("\\q").invalid_reason().is_some());
        assert!(CharSet::new("").invalid_reason().is_some());
    }

    #[test]
    fn rendering_respects_precedence() {
        let p = sequence([chr('a'), chr('b').or(chr('c')), rule("X").many()]);
        assert_eq!(p.to_string(), "'a' ('b' | 'c') X*");

        let q = chr('a').then(chr('b')).or(chr('c')).opt();
        assert_eq!(q.to_string(), "('a' 'b' | 'c')?");
    }

    #[test]
    fn info_hides_actions_and_local_names() {
        let p = nonterminal("Cond", "Expression", 1).act("A3").expect();
        assert_eq!(p.to_string(), "Cond:Expression/1{A3}!");
        assert_eq!(p.info(), "Expression!");
        assert_eq!(chr(')').act("A1").info(), "')'");
    }

    #[test]
    fn sequence_and_choice_of_nothing_are_empty() {
        assert_eq!(sequence(Vec::new()), Parser::Empty);
        assert_eq!(choice(Vec::new()), Parser::Empty);
    }

    #[test]
    fn walk_visits_every_node() {
        let p = chr('a').then(rule("B").act("A0")).many();
        let mut count = 0;
        p.walk(&mut |_| count += 1);
        assert_eq!(count, 5);
    }
}
