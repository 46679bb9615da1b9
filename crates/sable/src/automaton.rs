//! Construction of the approximate SLR(1) action table.
//!
//! Every position inside a production is a state of its own (an item
//! state). Transitions leaving a state on a nonterminal also include the
//! transitions into the productions of that nonterminal, so a state can
//! shift the same symbol into several item states. Such cells are merged
//! into a single state until every cell has at most one target, and the
//! reductions are filled in from the FOLLOW sets afterwards.

use crate::{
    first_sets::{FirstSets, FollowSets},
    grammar::{is_nonterminal, Grammar, GrammarError, RuleIndex},
    table::{Action, ActionTable, Item, Reduce, StateId, StateKey},
    types::{Map, Queue, Set},
};
use sable_runtime::Diagnostics;
use std::fmt;

const DEFAULT_MAX_MERGE_ROUNDS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid grammar")]
    Grammar(
        #[from]
        #[source]
        GrammarError,
    ),

    #[error("state merging did not converge after {rounds} rounds")]
    NonTermination { rounds: usize },
}

impl BuildError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Grammar(err) => err.code(),
            Self::NonTermination { .. } => "B007",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

/// A cell that received more than one action.
///
/// The action already in the cell is kept; `rejected` is the reduction
/// that was not inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub state: String,
    pub symbol: String,
    pub kept: String,
    pub rejected: RuleIndex,
}

impl Conflict {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ConflictKind::ShiftReduce => "B004",
            ConflictKind::ReduceReduce => "B005",
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ConflictKind::ShiftReduce => "shift/reduce",
            ConflictKind::ReduceReduce => "reduce/reduce",
        };
        write!(
            f,
            "{} conflict in state [{}] on `{}': kept {}, dropped R{}",
            kind, self.state, self.symbol, self.kept, self.rejected
        )
    }
}

/// Settings of the table construction.
#[derive(Debug, Clone)]
pub struct Config {
    max_merge_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            max_merge_rounds: DEFAULT_MAX_MERGE_ROUNDS,
        }
    }

    /// Set the number of merge rounds after which the construction gives up.
    pub fn max_merge_rounds(&mut self, rounds: usize) -> &mut Self {
        self.max_merge_rounds = rounds;
        self
    }

    /// Build the action table of `g`, reporting conflicts to `diagnostics`.
    pub fn build<D>(
        &self,
        g: &Grammar,
        follow: &FollowSets,
        diagnostics: &mut D,
    ) -> Result<ActionTable, BuildError>
    where
        D: Diagnostics<Conflict>,
    {
        let span = tracing::debug_span!("build", rules = g.rules().len());
        let _entered = span.enter();

        let mut builder = Builder {
            g,
            follow,
            rows: Map::default(),
        };
        builder.populate();
        builder.merge(self.max_merge_rounds)?;
        let reachable = builder.reachable();
        builder.insert_reduces(&reachable, diagnostics);
        let table = builder.finalize(reachable);

        tracing::debug!("{} states", table.len());
        Ok(table)
    }
}

/// Build the action table of `g` with the default settings.
pub fn build<D>(g: &Grammar, diagnostics: &mut D) -> Result<ActionTable, BuildError>
where
    D: Diagnostics<Conflict>,
{
    let first = FirstSets::new(g);
    let follow = FollowSets::new(g, &first);
    Config::new().build(g, &follow, diagnostics)
}

#[derive(Debug, Default, Clone)]
struct Cell {
    shifts: Vec<StateKey>,
    reduce: Option<RuleIndex>,
}

impl Cell {
    fn add_shift(&mut self, target: StateKey) {
        if !self.shifts.contains(&target) {
            self.shifts.push(target);
        }
    }
}

type Row = Map<String, Cell>;

struct Builder<'g> {
    g: &'g Grammar,
    follow: &'g FollowSets,
    rows: Map<StateKey, Row>,
}

impl<'g> Builder<'g> {
    /// Create the start state and every item state with their shifts.
    fn populate(&mut self) {
        let g = self.g;

        self.rows.insert(StateKey::Start, Row::default());
        for rule in g.rules() {
            for (i, symbol) in rule.right.iter().enumerate() {
                let key = StateKey::Item(Item::new(symbol.as_str(), rule.index, i + 1));
                self.rows.insert(key, Row::default());
            }
        }

        for rule in g.productions(g.start_symbol()) {
            if let Some(first) = rule.right.first() {
                self.add_transition(&StateKey::Start, Item::new(first.as_str(), rule.index, 1));
            }
        }

        for rule in g.rules() {
            for (i, symbol) in rule.right.iter().enumerate().skip(1) {
                let from = StateKey::Item(Item::new(rule.right[i - 1].as_str(), rule.index, i));
                self.add_transition(&from, Item::new(symbol.as_str(), rule.index, i + 1));
            }
        }
    }

    /// Add the shift `from --(target.symbol)--> target`.
    ///
    /// If the symbol is a nonterminal, `from` also shifts into the first
    /// item of each of its productions, transitively.
    fn add_transition(&mut self, from: &StateKey, target: Item) {
        let g = self.g;
        let mut expanded: Set<String> = Set::default();
        let mut pending: Queue<Item> = Some(target).into_iter().collect();

        while let Some(item) = pending.pop() {
            let row = self.rows.entry(from.clone()).or_default();
            row.entry(item.symbol.clone())
                .or_default()
                .add_shift(StateKey::Item(item.clone()));

            if is_nonterminal(&item.symbol) && expanded.insert(item.symbol.clone()) {
                for rule in g.productions(&item.symbol) {
                    if let Some(first) = rule.right.first() {
                        pending.push(Item::new(first.as_str(), rule.index, 1));
                    }
                }
            }
        }
    }

    /// Replace every cell with several shift targets by a merged state,
    /// until no such cell is left.
    fn merge(&mut self, max_rounds: usize) -> Result<(), BuildError> {
        let mut rounds = 0;
        loop {
            let mut merged = 0;

            // states created in this round are handled in the next one.
            let len = self.rows.len();
            for i in 0..len {
                let conflicting: Vec<String> = self.rows[i]
                    .iter()
                    .filter(|(_, cell)| cell.shifts.len() > 1)
                    .map(|(symbol, _)| symbol.clone())
                    .collect();

                for symbol in conflicting {
                    let cell = &mut self.rows[i][symbol.as_str()];
                    let targets = std::mem::take(&mut cell.shifts);
                    let key = StateKey::merged(&targets);
                    cell.shifts.push(key.clone());

                    if !self.rows.contains_key(&key) {
                        let row = self.union_rows(&targets);
                        tracing::trace!("merged state with {} items", key.items().len());
                        self.rows.insert(key, row);
                    }
                    merged += 1;
                }
            }

            if merged == 0 {
                return Ok(());
            }

            rounds += 1;
            tracing::debug!("merge round {}: {} cells, {} states", rounds, merged, self.rows.len());
            if rounds > max_rounds {
                return Err(BuildError::NonTermination { rounds: max_rounds });
            }
        }
    }

    fn union_rows(&self, keys: &[StateKey]) -> Row {
        let mut row = Row::default();
        for key in keys {
            let Some(source) = self.rows.get(key) else {
                continue;
            };
            for (symbol, cell) in source {
                let dest = row.entry(symbol.clone()).or_default();
                for target in &cell.shifts {
                    dest.add_shift(target.clone());
                }
            }
        }
        row
    }

    /// Collect the states reachable from the start state, in breadth-first order.
    fn reachable(&self) -> Set<StateKey> {
        let mut states = Set::default();
        states.insert(StateKey::Start);

        let mut i = 0;
        while let Some(key) = states.get_index(i) {
            let mut next = vec![];
            if let Some(row) = self.rows.get(key) {
                for cell in row.values() {
                    next.extend(cell.shifts.iter().cloned());
                }
            }
            states.extend(next);
            i += 1;
        }

        states
    }

    /// Insert the reductions of completed items on the FOLLOW set of their
    /// left-hand side. A cell keeps the action it already holds.
    fn insert_reduces<D>(&mut self, reachable: &Set<StateKey>, diagnostics: &mut D)
    where
        D: Diagnostics<Conflict>,
    {
        let g = self.g;
        let follow_sets = self.follow;
        let mut reported: Set<(StateKey, String)> = Set::default();

        for key in reachable {
            for item in key.items() {
                let Some(rule) = g.rule(item.rule) else {
                    continue;
                };
                if item.position != rule.right.len() {
                    continue;
                }
                let Some(follow) = follow_sets.get(&rule.left) else {
                    continue;
                };

                let Some(row) = self.rows.get_mut(key) else {
                    continue;
                };
                for t in follow.iter() {
                    let symbol = g.terminal(t);
                    let cell = row.entry(symbol.to_owned()).or_default();

                    let (kind, kept) = match (cell.shifts.first(), cell.reduce) {
                        (Some(target), _) => (
                            ConflictKind::ShiftReduce,
                            target.encode(g.start_symbol()).to_string(),
                        ),
                        (None, None) => {
                            cell.reduce = Some(rule.index);
                            continue;
                        }
                        (None, Some(existing)) if existing == rule.index => continue,
                        (None, Some(existing)) => {
                            (ConflictKind::ReduceReduce, format!("R{}", existing))
                        }
                    };

                    if reported.insert((key.clone(), symbol.to_owned())) {
                        let conflict = Conflict {
                            kind,
                            state: key.encode(g.start_symbol()).to_string(),
                            symbol: symbol.to_owned(),
                            kept,
                            rejected: rule.index,
                        };
                        tracing::debug!("{}", conflict);
                        diagnostics.report(conflict);
                    }
                }
            }
        }
    }

    fn finalize(self, reachable: Set<StateKey>) -> ActionTable {
        let g = self.g;
        let mut rows = self.rows;
        let mut states = Map::default();

        for key in &reachable {
            let mut actions = Map::default();
            if let Some(row) = rows.swap_remove(key) {
                for (symbol, cell) in row {
                    let action = match (&cell.shifts[..], cell.reduce) {
                        ([], None) => continue,
                        ([], Some(rule)) => Action::Reduce(Reduce {
                            rule,
                            action: g.rule(rule).and_then(|r| r.semantic_action.clone()),
                        }),
                        ([target], _) => {
                            // every shift target is reachable by construction
                            let index = reachable.get_index_of(target).unwrap_or_default();
                            Action::Shift(StateId::from_index(index))
                        }
                        _ => unreachable!("unmerged cell on `{}'", symbol),
                    };
                    actions.insert(symbol, action);
                }
            }
            states.insert(key.clone(), actions);
        }

        ActionTable::new(g.start_symbol().to_owned(), states)
    }
}
