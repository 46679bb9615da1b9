//! Grammar types.

use crate::{
    types::{Map, Set},
    util::{display_fn, write_spaced},
};
use std::{fmt, fs, io, path::Path};

pub use sable_runtime::END_MARKER;

/// The right-hand side symbol denoting the empty production.
pub const EPSILON: &str = "e";

const ARROW: &str = "->";
const ACTION_PREFIX: char = '~';

/// Return whether `symbol` is a nonterminal, i.e. wrapped in angle brackets.
pub fn is_nonterminal(symbol: &str) -> bool {
    symbol.len() > 2 && symbol.starts_with('<') && symbol.ends_with('>')
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleIndex {
    raw: u32,
}

impl RuleIndex {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self { raw }
    }

    pub fn index(self) -> usize {
        self.raw as usize
    }
}

impl From<usize> for RuleIndex {
    fn from(index: usize) -> Self {
        Self::new(index as u32)
    }
}

impl fmt::Display for RuleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

/// A set of terminal symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.raw.into())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.raw.into())
    }

    /// Add every element of `other`, returning whether this set grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if other.inner.is_subset(&self.inner) {
            return false;
        }
        self.inner.union_with(&other.inner);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| TerminalID::new(raw as u16))
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            write_spaced(f, self.iter().map(|t| g.terminal(t)))?;
            f.write_str("}")
        })
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.raw.into()).collect(),
        }
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    pub index: RuleIndex,
    pub left: String,
    pub right: Vec<String>,
    pub semantic_action: Option<String>,
}

impl GrammarRule {
    pub fn is_epsilon(&self) -> bool {
        self.right.is_empty()
    }

    /// Parse a single rule of the form `<LHS> -> sym1 sym2 ... [~action]`.
    pub fn parse(text: &str, index: RuleIndex) -> Result<Self, FormatError> {
        let (left, right) = text.split_once(ARROW).ok_or(FormatError::MissingArrow)?;

        let left = left.trim();
        if !is_nonterminal(left) || left.contains(char::is_whitespace) {
            return Err(FormatError::InvalidLeft);
        }

        let mut right: Vec<String> = right.split_whitespace().map(str::to_owned).collect();

        let semantic_action = match right.last() {
            Some(last) if last.starts_with(ACTION_PREFIX) => {
                let name = last[ACTION_PREFIX.len_utf8()..].to_owned();
                if name.is_empty() {
                    return Err(FormatError::EmptyAction);
                }
                right.pop();
                Some(name)
            }
            _ => None,
        };

        if matches!(&right[..], [e] if e == EPSILON) {
            right.clear();
        }

        Ok(Self {
            index,
            left: left.to_owned(),
            right,
            semantic_action,
        })
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.left, ARROW)?;
        if self.right.is_empty() {
            f.write_str(EPSILON)?;
        } else {
            write_spaced(f, &self.right)?;
        }
        if let Some(action) = &self.semantic_action {
            write!(f, " {}{}", ACTION_PREFIX, action)?;
        }
        Ok(())
    }
}

/// Parse grammar rules from lines of text, skipping blank lines.
pub fn parse_grammar<I>(lines: I) -> Result<Vec<GrammarRule>, GrammarError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut rules = vec![];
    for (i, line) in lines.into_iter().enumerate() {
        let text = line.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        let rule = GrammarRule::parse(text, rules.len().into()).map_err(|reason| {
            GrammarError::Format {
                line: i + 1,
                text: text.to_owned(),
                reason,
            }
        })?;
        rules.push(rule);
    }
    Ok(rules)
}

/// The grammar definition used to derive the action table.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<GrammarRule>,
    terminals: Set<String>,
    nonterminals: Set<String>,
    productions: Map<String, Vec<RuleIndex>>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for (_, terminal) in self.terminals() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals() {
            write!(f, "{}", nonterminal)?;
            if nonterminal == self.start_symbol() {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in &self.rules {
            writeln!(f, "{}: {}", rule.index, rule)?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Self, GrammarError> {
        Self::from_lines(source.lines())
    }

    pub fn from_lines<I>(lines: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::new(parse_grammar(lines)?)
    }

    /// Build a grammar from parsed rules.
    ///
    /// The start symbol is the left-hand side of the first rule. Rules are
    /// renumbered by their position.
    pub fn new(mut rules: Vec<GrammarRule>) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut terminals = Set::default();
        terminals.insert(END_MARKER.to_owned());
        let mut nonterminals = Set::default();
        let mut productions: Map<String, Vec<RuleIndex>> = Map::default();

        for (i, rule) in rules.iter_mut().enumerate() {
            rule.index = i.into();
            nonterminals.insert(rule.left.clone());
            productions
                .entry(rule.left.clone())
                .or_default()
                .push(rule.index);
        }
        for rule in &rules {
            for symbol in &rule.right {
                if is_nonterminal(symbol) {
                    nonterminals.insert(symbol.clone());
                } else {
                    terminals.insert(symbol.clone());
                }
            }
        }

        Ok(Self {
            rules,
            terminals,
            nonterminals,
            productions,
        })
    }

    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    pub fn rule(&self, index: RuleIndex) -> Option<&GrammarRule> {
        self.rules.get(index.index())
    }

    pub fn start_symbol(&self) -> &str {
        &self.rules[0].left
    }

    /// Return the rules whose left-hand side is `nonterminal`, in definition order.
    pub fn productions<'g>(
        &'g self,
        nonterminal: &str,
    ) -> impl Iterator<Item = &'g GrammarRule> + 'g {
        self.productions
            .get(nonterminal)
            .into_iter()
            .flatten()
            .map(move |index| &self.rules[index.index()])
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &str)> + '_ {
        self.terminals
            .iter()
            .enumerate()
            .map(|(i, name)| (TerminalID::new(i as u16), name.as_str()))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.nonterminals.iter().map(String::as_str)
    }

    pub fn terminal_id(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .get_index_of(name)
            .map(|i| TerminalID::new(i as u16))
    }

    pub fn terminal(&self, id: TerminalID) -> &str {
        &self.terminals[id.raw as usize]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("missing `->' separator")]
    MissingArrow,

    #[error("the left-hand side must be a single nonterminal")]
    InvalidLeft,

    #[error("empty semantic action name")]
    EmptyAction,
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("line {line}: {reason}: `{text}'")]
    Format {
        line: usize,
        text: String,
        reason: FormatError,
    },

    #[error("the grammar contains no rules")]
    Empty,
}

impl GrammarError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::IO(..) => "G001",
            Self::Format { .. } => "B002",
            Self::Empty => "B001",
        }
    }
}
