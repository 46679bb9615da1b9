//! Abstract syntax tree produced by semantic actions.

use crate::token::{Position, Token};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AstNode {
    Program(Vec<AstNode>),
    Block(Vec<AstNode>),

    /// A transparent sequence of nodes.
    ///
    /// Lists are spliced into the children of `Program`, `Block`, `Call`
    /// and enclosing lists.
    List(Vec<AstNode>),

    VarDecl {
        name: String,
        ty: String,
        init: Option<Box<AstNode>>,
    },
    ConstDecl {
        name: String,
        ty: String,
        value: Box<AstNode>,
    },
    FuncDecl {
        name: String,
        params: Vec<Param>,
        return_type: String,
        body: Box<AstNode>,
    },

    /// A single parameter, collected into `FuncDecl` by its builder.
    Param(Param),

    Assign {
        target: String,
        value: Box<AstNode>,
    },
    Binary {
        left: Box<AstNode>,
        op: String,
        right: Box<AstNode>,
    },
    Unary {
        op: String,
        operand: Box<AstNode>,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    Literal(Literal),
    Identifier(String),
    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        elifs: Vec<(AstNode, AstNode)>,
        else_branch: Option<Box<AstNode>>,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        update: Option<Box<AstNode>>,
        body: Box<AstNode>,
    },
}

impl AstNode {
    /// Return a short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Program(..) => "Program",
            Self::Block(..) => "Block",
            Self::List(..) => "List",
            Self::VarDecl { .. } => "VarDecl",
            Self::ConstDecl { .. } => "ConstDecl",
            Self::FuncDecl { .. } => "FuncDecl",
            Self::Param(..) => "Param",
            Self::Assign { .. } => "Assign",
            Self::Binary { .. } => "Binary",
            Self::Unary { .. } => "Unary",
            Self::Call { .. } => "Call",
            Self::Literal(..) => "Literal",
            Self::Identifier(..) => "Identifier",
            Self::If { .. } => "If",
            Self::While { .. } => "While",
            Self::For { .. } => "For",
        }
    }

    /// Return the child nodes in source order.
    pub fn children(&self) -> Vec<&AstNode> {
        let mut children = vec![];
        match self {
            Self::Program(nodes) | Self::Block(nodes) | Self::List(nodes) => {
                children.extend(nodes);
            }
            Self::VarDecl { init, .. } => children.extend(init.as_deref()),
            Self::ConstDecl { value, .. } => children.push(&**value),
            Self::FuncDecl { body, .. } => children.push(&**body),
            Self::Assign { value, .. } => children.push(&**value),
            Self::Binary { left, right, .. } => {
                children.push(&**left);
                children.push(&**right);
            }
            Self::Unary { operand, .. } => children.push(&**operand),
            Self::Call { callee, args } => {
                children.push(&**callee);
                children.extend(args);
            }
            Self::If {
                condition,
                then_branch,
                elifs,
                else_branch,
            } => {
                children.push(&**condition);
                children.push(&**then_branch);
                for (condition, block) in elifs {
                    children.push(condition);
                    children.push(block);
                }
                children.extend(else_branch.as_deref());
            }
            Self::While { condition, body } => {
                children.push(&**condition);
                children.push(&**body);
            }
            Self::For {
                init,
                condition,
                update,
                body,
            } => {
                children.extend(init.as_deref());
                children.extend(condition.as_deref());
                children.extend(update.as_deref());
                children.push(&**body);
            }
            Self::Param(..) | Self::Literal(..) | Self::Identifier(..) => (),
        }
        children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
        }
    }
}

/// An entry of the AST stack: either a synthesized node or a raw token
/// that has not been consumed by a semantic action yet.
#[derive(Debug, Clone, PartialEq)]
pub enum AstItem {
    Node(AstNode),
    Token(Token),
}

impl AstItem {
    pub fn as_node(&self) -> Option<&AstNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(..) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Node(..) => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.as_token().map(|t| t.position)
    }
}
