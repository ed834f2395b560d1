//! Rules: named productions with inherited attributes, a synthesized value,
//! and the semantic actions and call hooks that run inside their definition.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::ErrorKind;
use crate::parsing::parser::Parser;
use crate::span::Span;

/// Index of a rule inside a linked [`ParsingDomain`](crate::parsing::ParsingDomain).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Declared inherited attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub type_name: String,
}

/// What an action sees of the input its subject matched.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'a> {
    pub text: &'a str,
    pub span: Span,
    pub file_name: &'a str,
}

/// Semantic action. `Ok(false)` rejects the match; an error kind aborts the
/// parse with an error positioned at the matched text.
pub type ActionFn<V> =
    Arc<dyn Fn(&mut Context<V>, &Matched<'_>) -> Result<bool, ErrorKind> + Send + Sync>;
/// Produces the inherited arguments of a nonterminal call.
pub type PreCallFn<V> = Arc<dyn Fn(&Context<V>) -> Vec<V> + Send + Sync>;
/// Consumes the value a called rule synthesized.
pub type PostCallFn<V> = Arc<dyn Fn(&mut Context<V>, V) + Send + Sync>;

// ============================================================================
// CONTEXT
// ============================================================================

/// Working state of one rule invocation.
///
/// Holds the inherited attributes under their declared names, the values of
/// called nonterminals under their local names, any other variables actions
/// choose to keep, and the synthesized value.
pub struct Context<V> {
    vars: HashMap<String, V>,
    value: Option<V>,
    start: usize,
}

impl<V> Context<V> {
    pub(crate) fn enter(attributes: &[Attribute], args: Vec<V>, start: usize) -> Self {
        let vars = attributes
            .iter()
            .map(|attr| attr.name.clone())
            .zip(args)
            .collect();
        Self {
            vars,
            value: None,
            start,
        }
    }

    /// Detached context, for driving actions outside a parse.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            value: None,
            start: 0,
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.vars.get_mut(name)
    }

    pub fn take(&mut self, name: &str) -> Option<V> {
        self.vars.remove(name)
    }

    pub fn set(&mut self, name: &str, value: V) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.value.as_mut()
    }

    pub fn set_value(&mut self, value: V) {
        self.value = Some(value);
    }

    pub fn take_value(&mut self) -> Option<V> {
        self.value.take()
    }

    /// Offset at which the current rule invocation started.
    pub fn start(&self) -> usize {
        self.start
    }
}

impl<V> Default for Context<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RULE
// ============================================================================

pub struct Rule<V> {
    name: String,
    grammar: String,
    definition: Parser,
    attributes: Vec<Attribute>,
    value_type: Option<String>,
    actions: HashMap<String, ActionFn<V>>,
    pre_calls: HashMap<String, PreCallFn<V>>,
    post_calls: HashMap<String, PostCallFn<V>>,
    forwarded: Vec<String>,
}

impl<V: 'static> Rule<V> {
    pub fn new(name: &str, definition: Parser) -> Self {
        Self {
            name: name.to_string(),
            grammar: String::new(),
            definition,
            attributes: Vec::new(),
            value_type: None,
            actions: HashMap::new(),
            pre_calls: HashMap::new(),
            post_calls: HashMap::new(),
            forwarded: Vec::new(),
        }
    }

    /// Declares an inherited attribute. Callers pass one value per attribute,
    /// in declaration order.
    pub fn inherited(mut self, name: &str, type_name: &str) -> Self {
        self.attributes.push(Attribute {
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
        self
    }

    /// Declares that the rule synthesizes a value on every successful match.
    pub fn value(mut self, type_name: &str) -> Self {
        self.value_type = Some(type_name.to_string());
        self
    }

    pub fn action(
        mut self,
        id: &str,
        action: impl Fn(&mut Context<V>, &Matched<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(
            id.to_string(),
            Arc::new(move |ctx: &mut Context<V>, matched: &Matched<'_>| {
                action(ctx, matched);
                Ok(true)
            }),
        );
        self
    }

    /// Action that may reject the match by returning `false`.
    pub fn predicate(
        mut self,
        id: &str,
        action: impl Fn(&mut Context<V>, &Matched<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(
            id.to_string(),
            Arc::new(move |ctx: &mut Context<V>, matched: &Matched<'_>| Ok(action(ctx, matched))),
        );
        self
    }

    /// Action that may reject the match or fail the whole parse, for text that
    /// has the right shape but an invalid content.
    pub fn checked(
        mut self,
        id: &str,
        action: impl Fn(&mut Context<V>, &Matched<'_>) -> Result<bool, ErrorKind> + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(id.to_string(), Arc::new(action));
        self
    }

    /// Computes the arguments passed to the nonterminal `local_name`.
    pub fn pre_call(
        mut self,
        local_name: &str,
        args: impl Fn(&Context<V>) -> Vec<V> + Send + Sync + 'static,
    ) -> Self {
        self.pre_calls.insert(local_name.to_string(), Arc::new(args));
        self
    }

    /// Replaces the default handling of the value returned by `local_name`,
    /// which is to store it in the context under that name.
    pub fn post_call(
        mut self,
        local_name: &str,
        consume: impl Fn(&mut Context<V>, V) + Send + Sync + 'static,
    ) -> Self {
        self.post_calls.insert(local_name.to_string(), Arc::new(consume));
        self
    }

    /// Makes the value returned by `local_name` this rule's value.
    pub fn yields(self, local_name: &str) -> Self {
        self.post_call(local_name, |ctx, value| ctx.set_value(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grammar the rule belongs to; empty until added to a domain.
    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    pub fn qualified_name(&self) -> String {
        if self.grammar.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.grammar, self.name)
        }
    }

    pub(crate) fn set_grammar(&mut self, grammar: &str) {
        self.grammar = grammar.to_string();
    }

    pub fn definition(&self) -> &Parser {
        &self.definition
    }

    pub(crate) fn definition_mut(&mut self) -> &mut Parser {
        &mut self.definition
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn value_type(&self) -> Option<&str> {
        self.value_type.as_deref()
    }

    pub fn has_value(&self) -> bool {
        self.value_type.is_some()
    }

    pub fn action_fn(&self, id: &str) -> Option<&ActionFn<V>> {
        self.actions.get(id)
    }

    pub fn pre_call_fn(&self, local_name: &str) -> Option<&PreCallFn<V>> {
        self.pre_calls.get(local_name)
    }

    pub fn post_call_fn(&self, local_name: &str) -> Option<&PostCallFn<V>> {
        self.post_calls.get(local_name)
    }

    /// Attribute names passed on through [`forward`](Rule::forward).
    pub fn forwarded(&self) -> &[String] {
        &self.forwarded
    }

    /// Expected-construct description: the rule's own name.
    pub fn info(&self) -> &str {
        &self.name
    }
}

impl<V: Clone + 'static> Rule<V> {
    /// Passes the named inherited attributes of this rule on to the
    /// nonterminal `local_name`, unchanged and in the given order. Names are
    /// checked against the declared attributes when the domain is linked.
    pub fn forward(mut self, local_name: &str, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        for name in &names {
            if !self.forwarded.contains(name) {
                self.forwarded.push(name.clone());
            }
        }
        self.pre_call(local_name, move |ctx| {
            names
                .iter()
                .filter_map(|name| ctx.get(name).cloned())
                .collect()
        })
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("grammar", &self.grammar)
            .field("attributes", &self.attributes)
            .field("value_type", &self.value_type)
            .field("actions", &actions)
            .field("definition", &self.definition.to_string())
            .finish()
    }
}

impl<V> fmt::Display for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.attributes.is_empty() {
            let attrs: Vec<String> = self
                .attributes
                .iter()
                .map(|attr| format!("{}: {}", attr.name, attr.type_name))
                .collect();
            write!(f, "({})", attrs.join(", "))?;
        }
        if let Some(value_type) = &self.value_type {
            write!(f, ": {value_type}")?;
        }
        write!(f, " ::= {};", self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parser::{chr, nonterminal};

    #[test]
    fn enter_binds_attributes_by_name() {
        let attrs = vec![
            Attribute {
                name: "ctx".into(),
                type_name: "Ctx".into(),
            },
            Attribute {
                name: "depth".into(),
                type_name: "u32".into(),
            },
        ];
        let ctx = Context::enter(&attrs, vec![10, 20], 4);
        assert_eq!(ctx.get("ctx"), Some(&10));
        assert_eq!(ctx.get("depth"), Some(&20));
        assert_eq!(ctx.start(), 4);
        assert!(ctx.value().is_none());
    }

    #[test]
    fn forward_passes_named_values_in_order() {
        let rule: Rule<i32> = Rule::new("R", nonterminal("Sub", "S", 2))
            .inherited("a", "i32")
            .inherited("b", "i32")
            .forward("Sub", &["b", "a"]);
        let mut ctx = Context::new();
        ctx.set("a", 1);
        ctx.set("b", 2);
        let args = rule.pre_call_fn("Sub").map(|f| f(&ctx));
        assert_eq!(args, Some(vec![2, 1]));
        assert_eq!(rule.forwarded(), ["b", "a"]);
    }

    #[test]
    fn display_shows_signature() {
        let rule: Rule<()> = Rule::new("Paren", chr('(').then(chr(')')))
            .inherited("ctx", "ParsingContext")
            .value("Expr");
        assert_eq!(rule.to_string(), "Paren(ctx: ParsingContext): Expr ::= '(' ')';");
    }

    #[test]
    fn yields_moves_the_callee_value_up() {
        let rule: Rule<i32> = Rule::new("R", rule_call()).value("i32").yields("Sub");
        let mut ctx = Context::new();
        if let Some(post_call) = rule.post_call_fn("Sub") {
            post_call(&mut ctx, 42);
        }
        assert_eq!(ctx.value(), Some(&42));
        assert!(!ctx.contains("Sub"));
    }

    fn rule_call() -> Parser {
        nonterminal("Sub", "S", 0)
    }

    #[test]
    fn plain_actions_always_pass() {
        let rule: Rule<u8> = Rule::new("R", chr('x').act("A0")).action("A0", |ctx, _| ctx.set_value(7));
        let mut ctx = Context::new();
        let matched = Matched {
            text: "x",
            span: Span::new(0, 0, 1),
            file_name: "t",
        };
        let pass = rule.action_fn("A0").map(|f| f(&mut ctx, &matched));
        assert_eq!(pass, Some(Ok(true)));
        assert_eq!(ctx.value(), Some(&7));
    }

    #[test]
    fn checked_actions_can_raise() {
        let rule: Rule<u8> = Rule::new("R", chr('x').act("A0")).checked("A0", |_, m| {
            Err(ErrorKind::LiteralOverflow {
                literal: m.text.to_string(),
                type_name: "u8".into(),
            })
        });
        let matched = Matched {
            text: "x",
            span: Span::new(0, 0, 1),
            file_name: "t",
        };
        let outcome = rule.action_fn("A0").map(|f| f(&mut Context::new(), &matched));
        assert!(matches!(outcome, Some(Err(ErrorKind::LiteralOverflow { .. }))));
    }
}
