//! Parser definition.

use std::fmt;

/// The trait for abstracting the generated action table.
pub trait ParseTable {
    /// The handle to identify a state of the automaton.
    type State: Copy + PartialEq + fmt::Debug;

    /// Return the start symbol of the grammar.
    fn start_symbol(&self) -> &str;

    /// Return the initial state.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state and grammar
    /// symbol, or `None` if the table has no entry for them.
    fn action(&self, current: Self::State, symbol: &str) -> Option<ParseAction<'_, Self::State>>;

    /// Return the production rule with the specified index.
    fn rule(&self, index: usize) -> Option<Production<'_>>;

    /// Return a readable name of the state, used in error messages.
    fn state_name(&self, state: Self::State) -> String {
        format!("{:?}", state)
    }
}

macro_rules! forward_parse_table {
    ($($ty:ty),*) => {$(
        impl<T: ?Sized> ParseTable for $ty
        where
            T: ParseTable,
        {
            type State = T::State;

            fn start_symbol(&self) -> &str {
                (**self).start_symbol()
            }

            fn initial_state(&self) -> Self::State {
                (**self).initial_state()
            }

            fn action(
                &self,
                current: Self::State,
                symbol: &str,
            ) -> Option<ParseAction<'_, Self::State>> {
                (**self).action(current, symbol)
            }

            fn rule(&self, index: usize) -> Option<Production<'_>> {
                (**self).rule(index)
            }

            fn state_name(&self, state: Self::State) -> String {
                (**self).state_name(state)
            }
        }
    )*};
}

forward_parse_table!(&T, std::rc::Rc<T>, std::sync::Arc<T>);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseAction<'t, TState> {
    Shift(TState),
    Reduce {
        rule: usize,
        action: Option<&'t str>,
    },
}

/// A borrowed view of a production rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Production<'t> {
    pub left: &'t str,
    pub right: &'t [String],
}
