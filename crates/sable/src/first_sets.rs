//! Calculation of FIRST and FOLLOW sets.

use crate::{
    grammar::{is_nonterminal, Grammar, TerminalID, TerminalSet},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

/// FIRST sets of the nonterminals in a grammar.
///
/// Each rule contributes only through its first right-hand side symbol,
/// so FIRST does not propagate through a nullable leading nonterminal.
/// Nonterminals with a literal empty production are tracked separately
/// as epsilon-bearing; indirectly nullable nonterminals are not.
#[derive(Debug)]
pub struct FirstSets {
    first_sets: Map<String, TerminalSet>,
    epsilon: Set<String>,
}

impl FirstSets {
    pub fn new(g: &Grammar) -> Self {
        let mut first_sets: Map<String, TerminalSet> = g
            .nonterminals()
            .map(|n| (n.to_owned(), TerminalSet::default()))
            .collect();

        let epsilon: Set<String> = g
            .rules()
            .iter()
            .filter(|rule| rule.is_epsilon())
            .map(|rule| rule.left.clone())
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in g.rules() {
                let Some(symbol) = rule.right.first() else {
                    continue;
                };
                let added = if is_nonterminal(symbol) {
                    first_sets[symbol.as_str()].clone()
                } else {
                    terminal_of(g, symbol).into_iter().collect()
                };
                changed |= first_sets[rule.left.as_str()].union_with(&added);
            }
        }

        Self {
            first_sets,
            epsilon,
        }
    }

    /// Return FIRST of `nonterminal`, without epsilon.
    pub fn get(&self, nonterminal: &str) -> Option<&TerminalSet> {
        self.first_sets.get(nonterminal)
    }

    /// Return whether `nonterminal` has a literal empty production.
    pub fn has_epsilon(&self, nonterminal: &str) -> bool {
        self.epsilon.contains(nonterminal)
    }

    /// `First(symbols)`, together with whether epsilon belongs to it.
    ///
    /// The sequence is scanned from the left until a terminal or a
    /// nonterminal without an empty production is met. An empty or
    /// exhausted sequence derives epsilon.
    pub fn first_of_sequence(&self, g: &Grammar, symbols: &[String]) -> (TerminalSet, bool) {
        let mut res = TerminalSet::default();
        for symbol in symbols {
            if !is_nonterminal(symbol) {
                if let Some(t) = terminal_of(g, symbol) {
                    res.insert(t);
                }
                return (res, false);
            }
            if let Some(first) = self.get(symbol) {
                res.union_with(first);
            }
            if !self.has_epsilon(symbol) {
                return (res, false);
            }
        }
        (res, true)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (symbol, set) in &self.first_sets {
                write!(f, "FIRST({}) = {}", symbol, set.display(g))?;
                if self.has_epsilon(symbol) {
                    f.write_str(" + e")?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

/// FOLLOW sets of the nonterminals in a grammar.
#[derive(Debug)]
pub struct FollowSets {
    follow_sets: Map<String, TerminalSet>,
}

impl FollowSets {
    pub fn new(g: &Grammar, first: &FirstSets) -> Self {
        let mut follow_sets: Map<String, TerminalSet> = g
            .nonterminals()
            .map(|n| (n.to_owned(), TerminalSet::default()))
            .collect();
        follow_sets[g.start_symbol()].insert(TerminalID::EOI);

        let mut changed = true;
        while changed {
            changed = false;
            for rule in g.rules() {
                for (i, symbol) in rule.right.iter().enumerate() {
                    if !is_nonterminal(symbol) {
                        continue;
                    }
                    let (mut added, nullable) = first.first_of_sequence(g, &rule.right[i + 1..]);
                    if nullable {
                        added.union_with(&follow_sets[rule.left.as_str()]);
                    }
                    changed |= follow_sets[symbol.as_str()].union_with(&added);
                }
            }
        }

        Self { follow_sets }
    }

    pub fn get(&self, nonterminal: &str) -> Option<&TerminalSet> {
        self.follow_sets.get(nonterminal)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (symbol, set) in &self.follow_sets {
                writeln!(f, "FOLLOW({}) = {}", symbol, set.display(g))?;
            }
            Ok(())
        })
    }
}

fn terminal_of(g: &Grammar, symbol: &str) -> Option<TerminalID> {
    let id = g.terminal_id(symbol);
    debug_assert!(id.is_some(), "unregistered terminal `{}'", symbol);
    id
}
