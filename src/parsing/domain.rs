//! Grammar registration and linking.
//!
//! Grammars are declared into a [`DomainBuilder`] by factory functions that
//! first ensure the grammars they reference. [`DomainBuilder::build`] links
//! everything into an immutable [`ParsingDomain`]: rule ids are allocated,
//! every nonterminal is resolved by name, and structural mistakes in the
//! grammars are reported before any input is parsed. Start rule arguments
//! are supplied by the caller and counted when a parse begins.

use std::collections::{HashMap, HashSet};

use crate::errors::{ErrorKind, ParsingError};
use crate::parsing::grammar::{Grammar, GrammarBuilder, GrammarRef};
use crate::parsing::parser::Parser;
use crate::parsing::rule::{Rule, RuleId};

const LINK_PHASE: &str = "link";

fn link_error(kind: ErrorKind) -> ParsingError {
    ParsingError::unsourced(kind, LINK_PHASE)
}

// ============================================================================
// BUILDER
// ============================================================================

/// Collects grammars before linking.
pub struct DomainBuilder<V> {
    grammars: Vec<GrammarBuilder<V>>,
    index: HashMap<String, usize>,
    pending: HashSet<String>,
}

impl<V: Clone + 'static> DomainBuilder<V> {
    pub fn new() -> Self {
        Self {
            grammars: Vec::new(),
            index: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    /// True when `name` is registered or its factory is currently running.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.pending.contains(name)
    }

    /// Runs `factory` unless a grammar called `name` already exists or is
    /// being created further up the call chain, then registers what it returns.
    ///
    /// Factories call `ensure` for the grammars they reference before building
    /// their own rules, so mutually referencing grammars are created once.
    pub fn ensure(
        &mut self,
        name: &str,
        factory: impl FnOnce(&mut Self) -> Result<GrammarBuilder<V>, ParsingError>,
    ) -> Result<(), ParsingError> {
        if self.contains(name) {
            return Ok(());
        }
        self.pending.insert(name.to_string());
        let outcome = factory(self);
        self.pending.remove(name);
        self.add(outcome?)
    }

    /// Registers a grammar. Names are unique within a domain.
    pub fn add(&mut self, grammar: GrammarBuilder<V>) -> Result<(), ParsingError> {
        if self.index.contains_key(grammar.name()) {
            return Err(link_error(ErrorKind::DuplicateGrammar {
                name: grammar.name().to_string(),
            }));
        }
        self.index
            .insert(grammar.name().to_string(), self.grammars.len());
        self.grammars.push(grammar);
        Ok(())
    }

    /// Links every registered grammar.
    pub fn build(self) -> Result<ParsingDomain<V>, ParsingError> {
        let DomainBuilder {
            grammars: builders,
            index: builder_index,
            ..
        } = self;

        for builder in &builders {
            for reference in &builder.references {
                if !builder_index.contains_key(reference) {
                    return Err(link_error(ErrorKind::UnknownGrammar {
                        name: reference.clone(),
                        referenced_by: builder.name.clone(),
                    }));
                }
            }
        }

        let order = dependency_order(&builders, &builder_index);
        let mut slots: Vec<Option<GrammarBuilder<V>>> = builders.into_iter().map(Some).collect();
        let mut rules: Vec<Rule<V>> = Vec::new();
        let mut owners: Vec<usize> = Vec::new();
        let mut grammars: Vec<Grammar> = Vec::new();
        let mut pending_links = Vec::new();

        for old_index in order {
            let Some(builder) = slots[old_index].take() else {
                continue;
            };
            let GrammarBuilder {
                name,
                references,
                rules: grammar_rules,
                links,
                start,
                skip,
            } = builder;

            let mut ids = Vec::with_capacity(grammar_rules.len());
            let mut rule_index = HashMap::new();
            for mut rule in grammar_rules {
                let id = RuleId(rules.len());
                if rule_index.insert(rule.name().to_string(), id).is_some() {
                    return Err(link_error(ErrorKind::DuplicateRule {
                        grammar: name.clone(),
                        rule: rule.name().to_string(),
                    }));
                }
                rule.set_grammar(&name);
                ids.push(id);
                rules.push(rule);
                owners.push(grammars.len());
            }

            pending_links.push((links, start, skip));
            grammars.push(Grammar {
                name,
                references,
                rules: ids,
                rule_index,
                links: Vec::new(),
                start: None,
                skip: None,
            });
        }

        let index: HashMap<String, usize> = grammars
            .iter()
            .enumerate()
            .map(|(i, grammar)| (grammar.name.clone(), i))
            .collect();

        // Links first, so start and skip rules may name an alias.
        for (i, (links, _, _)) in pending_links.iter().enumerate() {
            let mut resolved = Vec::with_capacity(links.len());
            for link in links {
                let id = resolve_link_target(&grammars, &index, &grammars[i].name, &link.target)?;
                resolved.push((link.alias.clone(), id));
            }
            grammars[i].links = resolved;
        }
        for (i, (_, start, skip)) in pending_links.iter().enumerate() {
            grammars[i].start = resolve_role(&grammars[i], start.as_deref(), "start")?;
            grammars[i].skip = resolve_role(&grammars[i], skip.as_deref(), "skip")?;
            // Skip runs between any two elements, where nothing can be pushed
            // for it and nothing it synthesizes is kept.
            if let Some(id) = grammars[i].skip {
                let skip_rule = &rules[id.0];
                if !skip_rule.attributes().is_empty() || skip_rule.has_value() {
                    return Err(link_error(ErrorKind::InvalidSkipRule {
                        grammar: grammars[i].name.clone(),
                        rule: skip_rule.qualified_name(),
                    }));
                }
            }
        }

        let attribute_counts: Vec<usize> = rules.iter().map(|rule| rule.attributes().len()).collect();
        for (i, rule) in rules.iter_mut().enumerate() {
            check_definition(rule)?;
            let grammar = &grammars[owners[i]];
            let caller = rule.qualified_name();
            rule.definition_mut().try_walk_mut(&mut |node| {
                let Parser::Nonterminal(nonterminal) = node else {
                    return Ok(());
                };
                let Some(target) = resolve(&grammars, &index, grammar, &nonterminal.rule_name) else {
                    return Err(link_error(ErrorKind::UnresolvedRule {
                        caller: caller.clone(),
                        nonterminal: nonterminal.local_name.clone(),
                        rule: nonterminal.rule_name.clone(),
                    }));
                };
                let expected = attribute_counts[target.0];
                if nonterminal.num_args != expected {
                    return Err(link_error(ErrorKind::ArgumentCountMismatch {
                        caller: caller.clone(),
                        rule: nonterminal.rule_name.clone(),
                        expected,
                        actual: nonterminal.num_args,
                    }));
                }
                nonterminal.target = Some(target);
                Ok(())
            })?;
        }

        Ok(ParsingDomain {
            grammars,
            index,
            rules,
        })
    }
}

impl<V: Clone + 'static> Default for DomainBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Referenced grammars before referencing ones. Cycles are broken at the
/// first grammar revisited; resolution is by name so order inside a cycle
/// does not matter.
fn dependency_order<V>(builders: &[GrammarBuilder<V>], index: &HashMap<String, usize>) -> Vec<usize> {
    fn visit<V>(
        i: usize,
        builders: &[GrammarBuilder<V>],
        index: &HashMap<String, usize>,
        seen: &mut [bool],
        order: &mut Vec<usize>,
    ) {
        if seen[i] {
            return;
        }
        seen[i] = true;
        for reference in &builders[i].references {
            if let Some(&j) = index.get(reference) {
                visit(j, builders, index, seen, order);
            }
        }
        order.push(i);
    }

    let mut seen = vec![false; builders.len()];
    let mut order = Vec::with_capacity(builders.len());
    for i in 0..builders.len() {
        visit(i, builders, index, &mut seen, &mut order);
    }
    order
}

/// Forwarded names must be declared attributes, action ids must be bound and
/// char classes well formed.
fn check_definition<V: 'static>(rule: &Rule<V>) -> Result<(), ParsingError> {
    for name in rule.forwarded() {
        if !rule.attributes().iter().any(|attr| &attr.name == name) {
            return Err(link_error(ErrorKind::UnknownAttribute {
                rule: rule.qualified_name(),
                attribute: name.clone(),
            }));
        }
    }
    let mut problem = None;
    rule.definition().walk(&mut |node| {
        if problem.is_some() {
            return;
        }
        match node {
            Parser::Action { id, .. } if rule.action_fn(id).is_none() => {
                problem = Some(ErrorKind::UnboundAction {
                    rule: rule.qualified_name(),
                    action: id.clone(),
                });
            }
            Parser::CharSet(set) => {
                if let Some(reason) = set.invalid_reason() {
                    problem = Some(ErrorKind::InvalidCharSet {
                        text: set.text().to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
            _ => {}
        }
    });
    match problem {
        Some(kind) => Err(link_error(kind)),
        None => Ok(()),
    }
}

/// Own rule, then link alias, then `Grammar.Rule` where `Grammar` is this
/// grammar or one it references.
fn resolve(
    grammars: &[Grammar],
    index: &HashMap<String, usize>,
    grammar: &Grammar,
    name: &str,
) -> Option<RuleId> {
    if let Some(id) = grammar.lookup(name) {
        return Some(id);
    }
    let (grammar_name, rule_name) = name.rsplit_once('.')?;
    let visible = grammar_name == grammar.name
        || grammar.references.iter().any(|reference| reference == grammar_name);
    if !visible {
        return None;
    }
    let target = &grammars[*index.get(grammar_name)?];
    target.rule_index.get(rule_name).copied()
}

fn resolve_link_target(
    grammars: &[Grammar],
    index: &HashMap<String, usize>,
    owner: &str,
    target: &str,
) -> Result<RuleId, ParsingError> {
    let unknown_rule = || {
        link_error(ErrorKind::UnknownRule {
            grammar: owner.to_string(),
            rule: target.to_string(),
            role: "link target".into(),
        })
    };
    let (grammar_name, rule_name) = target.rsplit_once('.').ok_or_else(unknown_rule)?;
    let Some(&i) = index.get(grammar_name) else {
        return Err(link_error(ErrorKind::UnknownGrammar {
            name: grammar_name.to_string(),
            referenced_by: owner.to_string(),
        }));
    };
    grammars[i]
        .rule_index
        .get(rule_name)
        .copied()
        .ok_or_else(unknown_rule)
}

fn resolve_role(grammar: &Grammar, name: Option<&str>, role: &str) -> Result<Option<RuleId>, ParsingError> {
    let Some(name) = name else {
        return Ok(None);
    };
    match grammar.lookup(name) {
        Some(id) => Ok(Some(id)),
        None => Err(link_error(ErrorKind::UnknownRule {
            grammar: grammar.name.clone(),
            rule: name.to_string(),
            role: role.to_string(),
        })),
    }
}

// ============================================================================
// LINKED DOMAIN
// ============================================================================

/// Immutable set of linked grammars. Reused for any number of parses.
pub struct ParsingDomain<V> {
    grammars: Vec<Grammar>,
    index: HashMap<String, usize>,
    rules: Vec<Rule<V>>,
}

impl<V: Clone + 'static> ParsingDomain<V> {
    pub fn grammar(&self, name: &str) -> Option<GrammarRef<'_, V>> {
        let grammar = &self.grammars[*self.index.get(name)?];
        Some(GrammarRef {
            domain: self,
            grammar,
        })
    }

    /// All grammars, referenced grammars first.
    pub fn grammars(&self) -> impl Iterator<Item = GrammarRef<'_, V>> + '_ {
        self.grammars.iter().map(move |grammar| GrammarRef {
            domain: self,
            grammar,
        })
    }

    pub fn rule(&self, id: RuleId) -> &Rule<V> {
        &self.rules[id.0]
    }

    pub fn rules(&self) -> &[Rule<V>] {
        &self.rules
    }

    /// Looks up `Grammar.Rule`.
    pub fn find_rule(&self, qualified_name: &str) -> Option<RuleId> {
        let (grammar_name, rule_name) = qualified_name.rsplit_once('.')?;
        let grammar = &self.grammars[*self.index.get(grammar_name)?];
        grammar.rule_index.get(rule_name).copied()
    }
}
