//! Token types shared with the lexer.

use std::fmt;

/// The grammar symbol that marks the end of input.
pub const END_MARKER: &str = "#";

/// Lexemes of operator tokens that are kept on the AST stack.
const SIGNIFICANT_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "=", "==", "!=", "<", ">", "<=", ">=", "!", "&&", "||", "and", "or",
    "not", "div", "mod",
];

/// A location in the source text.
///
/// Both `line` and `column` start at 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The category of a token, as classified by the lexer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TokenKind {
    Identifier,
    Integer,
    Float,
    String,
    True,
    False,
    Null,
    Keyword,
    Operator,
    Punct,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// The synthetic token appended after the last input token.
    pub fn end(position: Position) -> Self {
        Self::new(TokenKind::End, END_MARKER, position)
    }

    /// Return the terminal symbol that this token is matched against in the grammar.
    ///
    /// Identifiers become `id`, numeric literals become `num`, and every
    /// other token is matched by its lexeme.
    pub fn grammar_symbol(&self) -> &str {
        match self.kind {
            TokenKind::Identifier => "id",
            TokenKind::Integer | TokenKind::Float => "num",
            _ => &self.lexeme,
        }
    }

    /// Whether this token carries information into the AST once shifted.
    pub fn is_ast_significant(&self) -> bool {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => true,
            TokenKind::Keyword | TokenKind::Operator | TokenKind::Punct => {
                SIGNIFICANT_OPERATORS.contains(&self.lexeme.as_str())
            }
            TokenKind::End => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}' at {}", self.lexeme, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_symbols() {
        let pos = Position::default();
        assert_eq!(
            Token::new(TokenKind::Identifier, "x", pos).grammar_symbol(),
            "id"
        );
        assert_eq!(Token::new(TokenKind::Float, "1.5", pos).grammar_symbol(), "num");
        assert_eq!(Token::new(TokenKind::Keyword, "if", pos).grammar_symbol(), "if");
        assert_eq!(Token::end(pos).grammar_symbol(), END_MARKER);
    }

    #[test]
    fn significance() {
        let pos = Position::default();
        assert!(Token::new(TokenKind::Operator, "+", pos).is_ast_significant());
        assert!(Token::new(TokenKind::Keyword, "mod", pos).is_ast_significant());
        assert!(Token::new(TokenKind::Null, "null", pos).is_ast_significant());
        assert!(!Token::new(TokenKind::Punct, ";", pos).is_ast_significant());
        assert!(!Token::new(TokenKind::Keyword, "while", pos).is_ast_significant());
        assert!(!Token::end(pos).is_ast_significant());
    }
}
