//! A table-driven shift/reduce parser generator.
//!
//! Grammars are written one rule per line:
//!
//! ```text
//! <Z> -> <S> #
//! <S> -> <S> + <T> ~BinaryExpr
//! <S> -> <T>
//! <T> -> id ~Ident
//! ```
//!
//! Nonterminals are wrapped in angle brackets, the left-hand side of the
//! first rule is the start symbol, and a trailing `~Name` selects the
//! semantic action building the AST node of the rule.

pub mod automaton;
pub mod first_sets;
pub mod grammar;
pub mod io;
pub mod parser;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    automaton::{BuildError, Config, Conflict, ConflictKind},
    grammar::{Grammar, GrammarError, GrammarRule, RuleIndex},
    parser::ParserDefinition,
    table::{Action, ActionTable, Item, Reduce, StateId, StateKey, TableFormatError},
};
pub use sable_runtime::{
    AstNode, AstVisitor, Diagnostics, Discard, Literal, Param, ParseError, Position, Token,
    TokenKind, Warning,
};

/// The artifacts of compiling a grammar.
#[derive(Debug)]
pub struct Compiled {
    pub grammar: Grammar,
    pub table: ActionTable,

    /// Conflicts resolved while filling in the reductions.
    pub conflicts: Vec<Conflict>,
}

/// Compile grammar rules into an action table.
pub fn build_table<I>(lines: I) -> Result<Compiled, BuildError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let span = tracing::debug_span!("build_table");
    let _entered = span.enter();

    let grammar = Grammar::from_lines(lines)?;
    for rule in grammar.rules() {
        if let Some(action) = rule.semantic_action.as_deref() {
            if !sable_runtime::synth::is_known_action(action) {
                tracing::warn!("rule {}: unknown semantic action `{}'", rule.index, action);
            }
        }
    }

    let mut conflicts = vec![];
    let table = automaton::build(&grammar, &mut conflicts)?;
    Ok(Compiled {
        grammar,
        table,
        conflicts,
    })
}

/// Parse `tokens` with the specified table, discarding warnings.
pub fn parse(
    tokens: &[Token],
    table: &ActionTable,
    grammar: &Grammar,
) -> Result<AstNode, ParseError> {
    parse_with(tokens, table, grammar, &mut Discard)
}

/// Parse `tokens` with the specified table, reporting warnings to `warnings`.
pub fn parse_with<D>(
    tokens: &[Token],
    table: &ActionTable,
    grammar: &Grammar,
    warnings: &mut D,
) -> Result<AstNode, ParseError>
where
    D: Diagnostics<Warning>,
{
    sable_runtime::parse(ParserDefinition::new(grammar, table), tokens, warnings)
}

impl Compiled {
    pub fn parse(&self, tokens: &[Token]) -> Result<AstNode, ParseError> {
        parse(tokens, &self.table, &self.grammar)
    }
}
