//! Runtime implementation for the `sable` parser generator.
//!
//! This crate drives an action table over a token stream and synthesizes
//! the AST through the semantic actions named in the grammar.

pub mod ast;
pub mod definition;
pub mod diagnostics;
pub mod parser;
pub mod synth;
pub mod token;
pub mod visit;

pub use crate::{
    ast::{AstItem, AstNode, Literal, Param},
    definition::{ParseAction, ParseTable, Production},
    diagnostics::{Diagnostics, Discard, Warning},
    parser::{parse, ParseError, Parser, Step, TableConsistencyError},
    synth::AstBuilderError,
    token::{Position, Token, TokenKind, END_MARKER},
    visit::{walk, AstVisitor},
};
