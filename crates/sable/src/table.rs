//! The action table and its state keys.

use crate::{
    grammar::{Grammar, RuleIndex},
    types::Map,
    util::display_fn,
};
use std::fmt;

const REDUCE_PREFIX: char = 'R';
const ACTION_SEPARATOR: char = '~';

/// A state of the item automaton: the position `position` in the
/// right-hand side of `rule`, reached by shifting `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub symbol: String,
    pub rule: RuleIndex,
    pub position: usize,
}

impl Item {
    pub fn new(symbol: impl Into<String>, rule: RuleIndex, position: usize) -> Self {
        Self {
            symbol: symbol.into(),
            rule,
            position,
        }
    }

    /// Decode the textual form `symbol:rule:position`.
    pub fn decode(text: &str) -> Option<Self> {
        let mut parts = text.rsplitn(3, ':');
        let position = parts.next()?.parse().ok()?;
        let rule = parts.next()?.parse::<u32>().ok()?;
        let symbol = parts.next().filter(|s| !s.is_empty())?;
        Some(Self::new(symbol, RuleIndex::new(rule), position))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.symbol, self.rule, self.position)
    }
}

/// The structured identity of an automaton state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Start,
    Item(Item),

    /// The union of several item states, sorted and without duplicates.
    Merged(Vec<Item>),
}

impl StateKey {
    /// Build the key of the state merging `keys`.
    pub fn merged<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a StateKey>,
    {
        let mut items: Vec<Item> = keys
            .into_iter()
            .flat_map(|key| key.items().iter().cloned())
            .collect();
        items.sort();
        items.dedup();
        if items.len() == 1 {
            Self::Item(items.remove(0))
        } else {
            Self::Merged(items)
        }
    }

    /// Return the items making up this state.
    pub fn items(&self) -> &[Item] {
        match self {
            Self::Start => &[],
            Self::Item(item) => std::slice::from_ref(item),
            Self::Merged(items) => items,
        }
    }

    /// Return the textual form of this key.
    ///
    /// The start state is named after the start symbol, merged states
    /// join their items with a single space.
    pub fn encode<'a>(&'a self, start_symbol: &'a str) -> impl fmt::Display + 'a {
        display_fn(move |f| match self {
            Self::Start => f.write_str(start_symbol),
            Self::Item(item) => write!(f, "{}", item),
            Self::Merged(items) => crate::util::write_spaced(f, items),
        })
    }

    pub fn decode(text: &str, start_symbol: &str) -> Option<Self> {
        if text == start_symbol {
            return Some(Self::Start);
        }
        let items = text
            .split(' ')
            .map(Item::decode)
            .collect::<Option<Vec<_>>>()?;
        match items.len() {
            0 => None,
            1 => items.into_iter().next().map(Self::Item),
            _ => Some(Self::Merged(items)),
        }
    }
}

/// The handle of a state in an `ActionTable`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId {
    raw: u32,
}

impl StateId {
    pub const START: Self = Self::new(0);

    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self::new(index as u32)
    }

    fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduce {
    pub rule: RuleIndex,
    pub action: Option<String>,
}

/// The action that the automaton in a state performs on a grammar symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Consume the symbol and transition to the specified state.
    Shift(StateId),

    /// Reduce by the specified production rule.
    Reduce(Reduce),
}

/// The action table mapping (state, grammar symbol) to an action.
///
/// State ids are assigned in breadth-first order from the start state,
/// which is always `StateId::START`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTable {
    start_symbol: String,
    states: Map<StateKey, Map<String, Action>>,
}

impl ActionTable {
    pub(crate) fn new(start_symbol: String, states: Map<StateKey, Map<String, Action>>) -> Self {
        debug_assert!(matches!(states.get_index(0), Some((StateKey::Start, _))));
        Self {
            start_symbol,
            states,
        }
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn initial_state(&self) -> StateId {
        StateId::START
    }

    /// Return the number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &StateKey)> + '_ {
        self.states
            .keys()
            .enumerate()
            .map(|(i, key)| (StateId::new(i as u32), key))
    }

    pub fn state_key(&self, id: StateId) -> Option<&StateKey> {
        self.states.get_index(id.index()).map(|(key, _)| key)
    }

    pub fn find_state(&self, key: &StateKey) -> Option<StateId> {
        self.states
            .get_index_of(key)
            .map(|i| StateId::new(i as u32))
    }

    pub fn actions(&self, id: StateId) -> impl Iterator<Item = (&str, &Action)> + '_ {
        self.states
            .get_index(id.index())
            .into_iter()
            .flat_map(|(_, row)| row.iter().map(|(symbol, action)| (symbol.as_str(), action)))
    }

    pub fn action(&self, id: StateId, symbol: &str) -> Option<&Action> {
        self.states.get_index(id.index())?.1.get(symbol)
    }

    /// Overwrite the action of a cell, returning the previous one.
    ///
    /// Returns `None` without modifying the table if `id` is not a state of it.
    pub fn insert(
        &mut self,
        id: StateId,
        symbol: impl Into<String>,
        action: Action,
    ) -> Option<Action> {
        let (_, row) = self.states.get_index_mut(id.index())?;
        row.insert(symbol.into(), action)
    }

    /// Return the textual name of a state.
    pub fn state_name(&self, id: StateId) -> String {
        match self.state_key(id) {
            Some(key) => key.encode(&self.start_symbol).to_string(),
            None => format!("<invalid state {}>", id),
        }
    }

    /// Encode an action in its compact textual form.
    ///
    /// A shift is written as the name of its target state, a reduction as
    /// `R<rule>` optionally followed by `~<action>`.
    pub fn encode_action(&self, action: &Action) -> String {
        match action {
            Action::Shift(id) => self.state_name(*id),
            Action::Reduce(Reduce { rule, action: None }) => {
                format!("{}{}", REDUCE_PREFIX, rule)
            }
            Action::Reduce(Reduce {
                rule,
                action: Some(name),
            }) => format!("{}{}{}{}", REDUCE_PREFIX, rule, ACTION_SEPARATOR, name),
        }
    }

    /// Decode an action from its compact textual form.
    pub fn decode_action(&self, text: &str) -> Result<Action, TableFormatError> {
        if let Some(reduce) = decode_reduce(text) {
            return Ok(Action::Reduce(reduce));
        }
        let key = StateKey::decode(text, &self.start_symbol)
            .ok_or_else(|| TableFormatError::InvalidStateName(text.to_owned()))?;
        self.find_state(&key)
            .map(Action::Shift)
            .ok_or_else(|| TableFormatError::UnknownState(text.to_owned()))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (key, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(
                    f,
                    "#### State {:02} [{}]",
                    i,
                    key.encode(&self.start_symbol)
                )?;
                writeln!(f, "## actions")?;
                for (symbol, action) in row {
                    match action {
                        Action::Shift(n) => {
                            writeln!(f, "- {} => shift({})", symbol, n)?;
                        }
                        Action::Reduce(reduce) => match g.rule(reduce.rule) {
                            Some(rule) => writeln!(f, "- {} => reduce({})", symbol, rule)?,
                            None => writeln!(
                                f,
                                "- {} => reduce(<unknown rule {}>)",
                                symbol, reduce.rule
                            )?,
                        },
                    }
                }
            }
            Ok(())
        })
    }
}

/// Match `R<digits>` optionally followed by `~<name>`.
fn decode_reduce(text: &str) -> Option<Reduce> {
    let rest = text.strip_prefix(REDUCE_PREFIX)?;
    let (digits, action) = match rest.split_once(ACTION_SEPARATOR) {
        Some((digits, name)) if !name.is_empty() => (digits, Some(name.to_owned())),
        Some(..) => return None,
        None => (rest, None),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rule = RuleIndex::new(digits.parse().ok()?);
    Some(Reduce { rule, action })
}

#[derive(Debug, thiserror::Error)]
pub enum TableFormatError {
    #[error("malformed table data: {}", _0)]
    Json(#[from] serde_json::Error),

    #[error("invalid state name `{}'", _0)]
    InvalidStateName(String),

    #[error("reference to unknown state `{}'", _0)]
    UnknownState(String),

    #[error("state `{}' is defined twice", _0)]
    DuplicateState(String),

    #[error("the first state must be the start state")]
    MissingStart,
}

impl TableFormatError {
    pub fn code(&self) -> &'static str {
        "B006"
    }
}
