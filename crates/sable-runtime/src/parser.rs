//! Parser engine.

use crate::{
    ast::{AstItem, AstNode},
    definition::{ParseAction, ParseTable},
    diagnostics::{Diagnostics, Warning},
    synth::{self, AstBuilderError},
    token::{Position, Token, END_MARKER},
};
use std::{collections::VecDeque, fmt};

/// A grammar symbol waiting in the input queue.
#[derive(Debug, Clone)]
pub struct QueuedSymbol {
    pub symbol: String,
    pub token: Token,

    /// Whether shifting this symbol moves a value onto the AST stack.
    ///
    /// For a reduced nonterminal this records whether synthesis produced a
    /// node, which is already on the AST stack.
    pub ast_significant: bool,

    reduced: bool,
}

impl QueuedSymbol {
    fn input(token: Token) -> Self {
        Self {
            symbol: token.grammar_symbol().to_owned(),
            ast_significant: token.is_ast_significant(),
            token,
            reduced: false,
        }
    }

    fn reduced(symbol: &str, token: Token, ast_significant: bool) -> Self {
        Self {
            symbol: symbol.to_owned(),
            token,
            ast_significant,
            reduced: true,
        }
    }

    /// Whether this symbol was produced by a reduction rather than read from the input.
    pub fn is_reduced(&self) -> bool {
        self.reduced
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry<S> {
    pub symbol: String,
    pub state: S,
    pub carries_ast: bool,
}

/// The outcome of a single parser step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Shifted { symbol: String },
    Reduced { rule: usize, left: String },

    /// The start symbol has been reduced.
    Completed,
}

/// The parser driven by an action table.
#[derive(Debug)]
pub struct Parser<TDef>
where
    TDef: ParseTable,
{
    definition: TDef,
    input: VecDeque<QueuedSymbol>,
    stack: Vec<StackEntry<TDef::State>>,
    ast_stack: Vec<AstItem>,
    completed: bool,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create a parser over `tokens`, appending the end marker.
    pub fn new(definition: TDef, tokens: &[Token]) -> Self {
        let mut input: VecDeque<QueuedSymbol> =
            tokens.iter().cloned().map(QueuedSymbol::input).collect();
        let end = tokens
            .last()
            .map_or_else(Position::default, |t| t.position);
        input.push_back(QueuedSymbol::input(Token::end(end)));

        let sentinel = StackEntry {
            symbol: definition.start_symbol().to_owned(),
            state: definition.initial_state(),
            carries_ast: false,
        };

        Self {
            definition,
            input,
            stack: vec![sentinel],
            ast_stack: vec![],
            completed: false,
        }
    }

    pub fn input(&self) -> &VecDeque<QueuedSymbol> {
        &self.input
    }

    pub fn stack(&self) -> &[StackEntry<TDef::State>] {
        &self.stack
    }

    pub fn ast_stack(&self) -> &[AstItem] {
        &self.ast_stack
    }

    pub fn is_done(&self) -> bool {
        self.completed || self.input.is_empty()
    }

    /// Consume one symbol from the input queue and perform the corresponding action.
    pub fn step<D>(&mut self, warnings: &mut D) -> Result<Step, ParseError>
    where
        D: Diagnostics<Warning>,
    {
        if self.completed {
            return Ok(Step::Completed);
        }

        let lookahead = self
            .input
            .pop_front()
            .ok_or_else(|| TableConsistencyError::IncompleteParse {
                stack: self.stack_symbols(),
                input: vec![],
                ast_items: self.ast_stack.len(),
            })?;

        let current = match self.stack.last() {
            Some(entry) => entry.state,
            None => return Err(TableConsistencyError::EmptyStack.into()),
        };

        let action = self
            .definition
            .action(current, &lookahead.symbol)
            .ok_or_else(|| ParseError::UnexpectedToken {
                state: self.definition.state_name(current),
                symbol: lookahead.symbol.clone(),
                position: lookahead.token.position,
            })?;

        match action {
            ParseAction::Shift(next) => {
                tracing::trace!("shift {} => {:?}", lookahead.symbol, next);
                if lookahead.ast_significant && !lookahead.reduced {
                    self.ast_stack.push(AstItem::Token(lookahead.token));
                }
                self.stack.push(StackEntry {
                    symbol: lookahead.symbol.clone(),
                    state: next,
                    carries_ast: lookahead.ast_significant,
                });
                Ok(Step::Shifted {
                    symbol: lookahead.symbol,
                })
            }

            ParseAction::Reduce { rule, action } => {
                let action = action.map(str::to_owned);
                self.reduce(rule, action.as_deref(), lookahead, warnings)
            }
        }
    }

    fn reduce<D>(
        &mut self,
        index: usize,
        action: Option<&str>,
        lookahead: QueuedSymbol,
        warnings: &mut D,
    ) -> Result<Step, ParseError>
    where
        D: Diagnostics<Warning>,
    {
        let rule = self
            .definition
            .rule(index)
            .ok_or(TableConsistencyError::UnknownRule { rule: index })?;
        let left = rule.left.to_owned();
        tracing::trace!("reduce {} -> {:?} on {}", left, rule.right, lookahead.symbol);

        // The sentinel never takes part in a reduction.
        let n = rule.right.len();
        let matches = self.stack.len() > n
            && self.stack[self.stack.len() - n..]
                .iter()
                .zip(rule.right)
                .all(|(entry, symbol)| entry.symbol == *symbol);
        if !matches {
            return Err(TableConsistencyError::StackMismatch {
                rule: index,
                expected: rule.right.to_vec(),
                found: self.stack_symbols(),
            }
            .into());
        }

        let popped = self.stack.split_off(self.stack.len() - n);
        let ast_count = popped.iter().filter(|e| e.carries_ast).count();
        if self.ast_stack.len() < ast_count {
            return Err(TableConsistencyError::AstStackUnderflow {
                rule: index,
                required: ast_count,
                available: self.ast_stack.len(),
            }
            .into());
        }
        let children = self.ast_stack.split_off(self.ast_stack.len() - ast_count);

        let node = match action {
            Some(action) => Some(synth::build(action, children, index)?),
            None => self.promote(index, &left, children, warnings),
        };
        let produced = node.is_some();
        if let Some(node) = node {
            self.ast_stack.push(AstItem::Node(node));
        }

        let origin = lookahead.token.clone();
        self.input.push_front(lookahead);
        self.input
            .push_front(QueuedSymbol::reduced(&left, origin, produced));

        if left == self.definition.start_symbol() {
            tracing::trace!("completed");
            self.completed = true;
            return Ok(Step::Completed);
        }

        Ok(Step::Reduced { rule: index, left })
    }

    /// Pass the children of a rule without semantic action through.
    fn promote<D>(
        &self,
        rule: usize,
        left: &str,
        children: Vec<AstItem>,
        warnings: &mut D,
    ) -> Option<AstNode>
    where
        D: Diagnostics<Warning>,
    {
        let count = children.len();
        let mut nodes = children.into_iter().filter_map(|child| match child {
            AstItem::Node(node) => Some(node),
            AstItem::Token(..) => None,
        });
        let first = nodes.next();

        // a single node child is the common unit-rule case
        if count == 1 && first.is_some() {
            return first;
        }
        tracing::debug!("rule {} has no semantic action for {} children", rule, count);
        warnings.report(Warning::BuilderUsage {
            rule,
            left: left.to_owned(),
            children: count,
            promoted: first.is_some(),
        });
        first
    }

    /// Check the final configuration and return the root of the AST.
    pub fn finish(mut self) -> Result<AstNode, ParseError> {
        let start = self.definition.start_symbol();
        let initial = self.definition.initial_state();

        let stack_ok = matches!(
            &self.stack[..],
            [sentinel] if sentinel.symbol == start && sentinel.state == initial
        );
        let input_ok = self.completed
            && self.input.len() == 2
            && self.input[0].symbol == start
            && self.input[1].symbol == END_MARKER;
        let ast_ok = matches!(&self.ast_stack[..], [AstItem::Node(..)]);

        if !(stack_ok && input_ok && ast_ok) {
            return Err(TableConsistencyError::IncompleteParse {
                stack: self.stack_symbols(),
                input: self.input.iter().map(|q| q.symbol.clone()).collect(),
                ast_items: self.ast_stack.len(),
            }
            .into());
        }

        match self.ast_stack.pop() {
            Some(AstItem::Node(root)) => Ok(root),
            _ => unreachable!(),
        }
    }

    fn stack_symbols(&self) -> Vec<String> {
        self.stack.iter().map(|e| e.symbol.clone()).collect()
    }
}

/// Run the parser over `tokens` until the start symbol is reduced.
pub fn parse<TDef, D>(
    definition: TDef,
    tokens: &[Token],
    warnings: &mut D,
) -> Result<AstNode, ParseError>
where
    TDef: ParseTable,
    D: Diagnostics<Warning>,
{
    let span = tracing::debug_span!("parse", tokens = tokens.len());
    let _entered = span.enter();

    let mut parser = Parser::new(definition, tokens);
    while !parser.is_done() {
        parser.step(warnings)?;
    }
    parser.finish()
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected symbol `{symbol}' at {position} (state {state})")]
    UnexpectedToken {
        state: String,
        symbol: String,
        position: Position,
    },

    #[error("the action table is inconsistent with the input")]
    TableConsistency(
        #[from]
        #[source]
        TableConsistencyError,
    ),

    #[error("failed to synthesize the AST")]
    AstBuilder(
        #[from]
        #[source]
        AstBuilderError,
    ),
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedToken { .. } => "P008",
            Self::TableConsistency(err) => err.code(),
            Self::AstBuilder(err) => err.code(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableConsistencyError {
    #[error("rule {rule} is not defined in the grammar")]
    UnknownRule { rule: usize },

    #[error("rule {rule} expects {} on top of the stack, found {}",
        Symbols(.expected), Symbols(.found))]
    StackMismatch {
        rule: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("rule {rule} needs {required} AST entries but only {available} are available")]
    AstStackUnderflow {
        rule: usize,
        required: usize,
        available: usize,
    },

    #[error("the parser stack is empty")]
    EmptyStack,

    #[error(
        "parse ended in an unexpected configuration (stack {}, input {}, {ast_items} AST entries)",
        Symbols(.stack),
        Symbols(.input)
    )]
    IncompleteParse {
        stack: Vec<String>,
        input: Vec<String>,
        ast_items: usize,
    },
}

impl TableConsistencyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownRule { .. } => "P003",
            Self::StackMismatch { .. } | Self::EmptyStack => "P005",
            Self::IncompleteParse { .. } => "P006",
            Self::AstStackUnderflow { .. } => "P007",
        }
    }
}

struct Symbols<'a>(&'a [String]);

impl fmt::Display for Symbols<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(symbol)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{definition::Production, diagnostics::Discard, token::TokenKind};

    // <Z> -> <T> #
    // <T> -> id ~Ident
    struct Table {
        rules: Vec<(String, Vec<String>)>,
        corrupt: bool,
    }

    impl Table {
        fn new() -> Self {
            Self {
                rules: vec![
                    ("<Z>".into(), vec!["<T>".into(), "#".into()]),
                    ("<T>".into(), vec!["id".into()]),
                ],
                corrupt: false,
            }
        }
    }

    impl ParseTable for Table {
        type State = u8;

        fn start_symbol(&self) -> &str {
            "<Z>"
        }

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, symbol: &str) -> Option<ParseAction<'_, u8>> {
            match (current, symbol) {
                (0, "id") => Some(ParseAction::Shift(1)),
                (0, "<T>") => Some(ParseAction::Shift(2)),
                (1, "#") if self.corrupt => Some(ParseAction::Reduce {
                    rule: 0,
                    action: None,
                }),
                (1, "#") => Some(ParseAction::Reduce {
                    rule: 1,
                    action: Some("Ident"),
                }),
                (2, "#") => Some(ParseAction::Shift(3)),
                (3, "#") => Some(ParseAction::Reduce {
                    rule: 0,
                    action: None,
                }),
                _ => None,
            }
        }

        fn rule(&self, index: usize) -> Option<Production<'_>> {
            self.rules.get(index).map(|(left, right)| Production {
                left,
                right,
            })
        }
    }

    fn tokens(lexemes: &[(TokenKind, &str)]) -> Vec<Token> {
        lexemes
            .iter()
            .enumerate()
            .map(|(i, (kind, lexeme))| Token::new(*kind, *lexeme, Position::new(1, i as u32 + 1)))
            .collect()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn accepts_single_identifier() {
        init_tracing();
        let tokens = tokens(&[(TokenKind::Identifier, "x"), (TokenKind::Punct, "#")]);
        let mut warnings = vec![];
        let root = parse(Table::new(), &tokens, &mut warnings).unwrap();
        assert_eq!(root, AstNode::Identifier("x".into()));
        assert!(warnings.is_empty());
    }

    #[test]
    fn reduced_symbol_is_requeued_before_lookahead() {
        let tokens = tokens(&[(TokenKind::Identifier, "x"), (TokenKind::Punct, "#")]);
        let mut parser = Parser::new(Table::new(), &tokens);

        assert_eq!(
            parser.step(&mut Discard).unwrap(),
            Step::Shifted {
                symbol: "id".into()
            }
        );
        assert_eq!(
            parser.step(&mut Discard).unwrap(),
            Step::Reduced {
                rule: 1,
                left: "<T>".into()
            }
        );
        let input = parser.input();
        assert_eq!(input[0].symbol, "<T>");
        assert!(input[0].is_reduced());
        assert_eq!(input[0].token, tokens[1]);
        assert_eq!(input[1].symbol, "#");
        assert_eq!(input[1].token, tokens[1]);
    }

    #[test]
    fn missing_entry_is_unexpected_token() {
        let tokens = tokens(&[(TokenKind::Identifier, "x"), (TokenKind::Identifier, "y")]);
        let err = parse(Table::new(), &tokens, &mut Discard).unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                state,
                symbol,
                position,
            } => {
                assert_eq!(state, "1");
                assert_eq!(symbol, "id");
                assert_eq!(position, Position::new(1, 2));
            }
            err => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn corrupted_reduce_is_table_inconsistency() {
        let tokens = tokens(&[(TokenKind::Identifier, "x"), (TokenKind::Punct, "#")]);
        let mut table = Table::new();
        table.corrupt = true;
        let err = parse(table, &tokens, &mut Discard).unwrap_err();
        assert!(matches!(
            err,
            ParseError::TableConsistency(TableConsistencyError::StackMismatch { rule: 0, .. })
        ));
        assert_eq!(err.code(), "P005");
    }

    #[test]
    fn input_without_terminator_is_incomplete() {
        let tokens = tokens(&[(TokenKind::Identifier, "x")]);
        let err = parse(Table::new(), &tokens, &mut Discard).unwrap_err();
        assert!(matches!(
            err,
            ParseError::TableConsistency(TableConsistencyError::IncompleteParse { .. })
        ));
    }
}
