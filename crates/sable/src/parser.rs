//! Binding of a built action table to the runtime parser.

use crate::{
    grammar::Grammar,
    table::{Action, ActionTable, StateId},
};
use sable_runtime::{ParseAction, ParseTable, Production};

/// A grammar together with its action table, as consumed by the parser engine.
#[derive(Debug, Copy, Clone)]
pub struct ParserDefinition<'a> {
    grammar: &'a Grammar,
    table: &'a ActionTable,
}

impl<'a> ParserDefinition<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a ActionTable) -> Self {
        Self { grammar, table }
    }
}

impl ParseTable for ParserDefinition<'_> {
    type State = StateId;

    fn start_symbol(&self) -> &str {
        self.table.start_symbol()
    }

    fn initial_state(&self) -> StateId {
        self.table.initial_state()
    }

    fn action(&self, current: StateId, symbol: &str) -> Option<ParseAction<'_, StateId>> {
        Some(match self.table.action(current, symbol)? {
            Action::Shift(next) => ParseAction::Shift(*next),
            Action::Reduce(reduce) => ParseAction::Reduce {
                rule: reduce.rule.index(),
                action: reduce.action.as_deref(),
            },
        })
    }

    fn rule(&self, index: usize) -> Option<Production<'_>> {
        self.grammar.rules().get(index).map(|rule| Production {
            left: &rule.left,
            right: &rule.right,
        })
    }

    fn state_name(&self, state: StateId) -> String {
        self.table.state_name(state)
    }
}
