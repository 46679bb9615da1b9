//! Semantic actions turning reduced children into AST nodes.

use crate::{
    ast::{AstItem, AstNode, Literal, Param},
    token::{Position, TokenKind},
};

type Builder = fn(Vec<AstItem>) -> Result<AstNode, String>;

#[derive(Debug, thiserror::Error)]
pub enum AstBuilderError {
    #[error("unknown semantic action `{action}' (rule {rule})")]
    UnknownAction { action: String, rule: usize },

    #[error("semantic action `{action}' (rule {rule}) cannot build a node{}: {reason}",
        .position.map(|p| format!(" at {}", p)).unwrap_or_default())]
    Shape {
        action: String,
        rule: usize,
        reason: String,
        position: Option<Position>,
    },
}

impl AstBuilderError {
    pub fn code(&self) -> &'static str {
        "P007"
    }
}

/// Return whether `action` names a known semantic action.
pub fn is_known_action(action: &str) -> bool {
    builder(action).is_some()
}

/// Build an AST node for the rule `rule` using the semantic action named `action`.
///
/// `children` are the AST stack entries popped for the reduced right-hand
/// side, in source order.
pub fn build(
    action: &str,
    children: Vec<AstItem>,
    rule: usize,
) -> Result<AstNode, AstBuilderError> {
    let builder = builder(action).ok_or_else(|| AstBuilderError::UnknownAction {
        action: action.to_owned(),
        rule,
    })?;
    let position = children.iter().find_map(AstItem::position);
    builder(children).map_err(|reason| AstBuilderError::Shape {
        action: action.to_owned(),
        rule,
        reason,
        position,
    })
}

fn builder(action: &str) -> Option<Builder> {
    let builder: Builder = match action {
        "Program" => |c| Ok(AstNode::Program(flatten(c))),
        "Block" => |c| Ok(AstNode::Block(flatten(c))),
        "List" => |c| Ok(AstNode::List(flatten(c))),
        "VarDecl" => var_decl,
        "ConstDecl" => const_decl,
        "FuncDecl" => func_decl,
        "Param" => param,
        "Assign" | "AssignExpr" => assign,
        "BinaryExpr" => binary,
        "UnaryExpr" => unary,
        "Call" | "CallExpr" => call,
        "Literal" => literal,
        "Num" => number,
        "Ident" | "Identifier" => identifier,
        "If" | "IfStmt" => if_stmt,
        "While" | "WhileStmt" => while_stmt,
        "For" | "ForStmt" => for_stmt,
        _ => return None,
    };
    Some(builder)
}

/// Keep the node children, splicing the contents of `List` nodes.
fn flatten(children: Vec<AstItem>) -> Vec<AstNode> {
    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        match child {
            AstItem::Node(AstNode::List(items)) => nodes.extend(items),
            AstItem::Node(node) => nodes.push(node),
            AstItem::Token(..) => (),
        }
    }
    nodes
}

fn describe(children: &[AstItem]) -> String {
    let mut s = String::from("[");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        match child {
            AstItem::Node(node) => s.push_str(node.kind()),
            AstItem::Token(token) => {
                s.push('`');
                s.push_str(&token.lexeme);
                s.push('\'');
            }
        }
    }
    s.push(']');
    s
}

fn name_of(item: &AstItem) -> Option<String> {
    match item {
        AstItem::Node(AstNode::Identifier(name)) => Some(name.clone()),
        AstItem::Token(token) if token.kind == TokenKind::Identifier => Some(token.lexeme.clone()),
        _ => None,
    }
}

fn is_assign_token(item: &AstItem) -> bool {
    matches!(item, AstItem::Token(t) if t.lexeme == "=")
}

fn var_decl(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let mut rest = children.into_iter();

    let name = rest
        .next()
        .as_ref()
        .and_then(name_of)
        .ok_or_else(|| format!("expected a variable name, got {}", shape))?;

    let ty = match rest.next() {
        Some(item) if !is_assign_token(&item) => type_of(item),
        _ => None,
    }
    .ok_or_else(|| format!("expected a type name, got {}", shape))?;

    let init = match rest.next() {
        None => None,
        Some(item) if is_assign_token(&item) => match rest.next() {
            Some(AstItem::Node(init)) => Some(Box::new(init)),
            _ => return Err(format!("expected an initializer after `=', got {}", shape)),
        },
        Some(..) => return Err(format!("unexpected children {}", shape)),
    };

    if rest.next().is_some() {
        return Err(format!("too many children {}", shape));
    }

    Ok(AstNode::VarDecl { name, ty, init })
}

/// A type is written as an identifier, or as any other token shifted onto the AST stack.
fn type_of(item: AstItem) -> Option<String> {
    match item {
        AstItem::Token(token) => Some(token.lexeme),
        node => name_of(&node),
    }
}

fn const_decl(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 4]>::try_from(children) {
        Ok([name, ty, eq, AstItem::Node(value)]) if is_assign_token(&eq) => {
            let name = name_of(&name)
                .ok_or_else(|| format!("expected a constant name, got {}", shape))?;
            let ty = type_of(ty).ok_or_else(|| format!("expected a type name, got {}", shape))?;
            Ok(AstNode::ConstDecl {
                name,
                ty,
                value: Box::new(value),
            })
        }
        _ => Err(format!("expected [name, type, `=', value], got {}", shape)),
    }
}

/// `[name, param*, return type, block]`, with parameter lists spliced.
fn func_decl(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let mut items = Vec::with_capacity(children.len());
    for child in children {
        match child {
            AstItem::Node(AstNode::List(nodes)) => {
                items.extend(nodes.into_iter().map(AstItem::Node));
            }
            child => items.push(child),
        }
    }

    let body = match items.pop() {
        Some(AstItem::Node(body)) => Box::new(expect_block(body, &shape)?),
        _ => return Err(format!("expected a function body, got {}", shape)),
    };
    let return_type = items
        .pop()
        .and_then(type_of)
        .ok_or_else(|| format!("expected a return type, got {}", shape))?;

    let mut items = items.into_iter();
    let name = items
        .next()
        .as_ref()
        .and_then(name_of)
        .ok_or_else(|| format!("expected a function name, got {}", shape))?;

    let params = items
        .map(|item| match item {
            AstItem::Node(AstNode::Param(param)) => Ok(param),
            _ => Err(format!("expected parameters, got {}", shape)),
        })
        .collect::<Result<_, _>>()?;

    Ok(AstNode::FuncDecl {
        name,
        params,
        return_type,
        body,
    })
}

/// `[name, type]`
fn param(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 2]>::try_from(children) {
        Ok([name, ty]) => {
            let name = name_of(&name)
                .ok_or_else(|| format!("expected a parameter name, got {}", shape))?;
            let ty = type_of(ty).ok_or_else(|| format!("expected a type name, got {}", shape))?;
            Ok(AstNode::Param(Param { name, ty }))
        }
        Err(..) => Err(format!("expected [name, type], got {}", shape)),
    }
}

fn assign(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 3]>::try_from(children) {
        Ok([target, eq, AstItem::Node(value)]) if is_assign_token(&eq) => {
            let target = name_of(&target)
                .ok_or_else(|| format!("expected an assignment target, got {}", shape))?;
            Ok(AstNode::Assign {
                target,
                value: Box::new(value),
            })
        }
        _ => Err(format!("expected [target, `=', value], got {}", shape)),
    }
}

fn binary(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 3]>::try_from(children) {
        Ok([AstItem::Node(left), AstItem::Token(op), AstItem::Node(right)]) => Ok(AstNode::Binary {
            left: Box::new(left),
            op: op.lexeme,
            right: Box::new(right),
        }),
        _ => Err(format!("expected [node, operator, node], got {}", shape)),
    }
}

fn unary(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 2]>::try_from(children) {
        Ok([AstItem::Token(op), AstItem::Node(operand)]) => Ok(AstNode::Unary {
            op: op.lexeme,
            operand: Box::new(operand),
        }),
        _ => Err(format!("expected [operator, node], got {}", shape)),
    }
}

fn call(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let mut nodes = flatten(children).into_iter();
    let callee = nodes
        .next()
        .ok_or_else(|| format!("expected a callee, got {}", shape))?;
    Ok(AstNode::Call {
        callee: Box::new(callee),
        args: nodes.collect(),
    })
}

fn literal(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let token = match <[AstItem; 1]>::try_from(children) {
        Ok([AstItem::Token(token)]) => token,
        // a literal already built by a nested rule
        Ok([AstItem::Node(node @ AstNode::Literal(..))]) => return Ok(node),
        _ => return Err(format!("expected a single literal token, got {}", shape)),
    };
    let literal = match token.kind {
        TokenKind::Integer => token
            .lexeme
            .parse()
            .map(Literal::Integer)
            .map_err(|e| format!("invalid integer literal `{}': {}", token.lexeme, e))?,
        TokenKind::Float => token
            .lexeme
            .parse()
            .map(Literal::Float)
            .map_err(|e| format!("invalid float literal `{}': {}", token.lexeme, e))?,
        TokenKind::String => Literal::String(unquote(&token.lexeme).to_owned()),
        TokenKind::True => Literal::Bool(true),
        TokenKind::False => Literal::Bool(false),
        TokenKind::Null => Literal::Null,
        _ => return Err(format!("`{}' is not a literal", token.lexeme)),
    };
    Ok(AstNode::Literal(literal))
}

/// A single integer or float token.
fn number(children: Vec<AstItem>) -> Result<AstNode, String> {
    let numeric = matches!(
        &children[..],
        [AstItem::Token(token)] if matches!(token.kind, TokenKind::Integer | TokenKind::Float)
    );
    if !numeric {
        return Err(format!("expected a single numeric token, got {}", describe(&children)));
    }
    literal(children)
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

fn identifier(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstItem; 1]>::try_from(children) {
        Ok([item]) => name_of(&item)
            .map(AstNode::Identifier)
            .ok_or_else(|| format!("expected an identifier, got {}", shape)),
        _ => Err(format!("expected a single identifier, got {}", shape)),
    }
}

fn expect_block(node: AstNode, shape: &str) -> Result<AstNode, String> {
    match node {
        AstNode::Block(..) => Ok(node),
        _ => Err(format!("expected a block, got {}", shape)),
    }
}

fn if_stmt(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let mut nodes = flatten(children).into_iter();

    let condition = nodes
        .next()
        .ok_or_else(|| format!("expected a condition, got {}", shape))?;
    let then_branch = nodes
        .next()
        .ok_or_else(|| format!("expected a block, got {}", shape))
        .and_then(|n| expect_block(n, &shape))?;

    let rest: Vec<AstNode> = nodes.collect();
    let (pairs, else_branch) = if rest.len() % 2 == 1 {
        let (pairs, last) = rest.split_at(rest.len() - 1);
        (pairs.to_vec(), Some(expect_block(last[0].clone(), &shape)?))
    } else {
        (rest, None)
    };

    let mut elifs = Vec::with_capacity(pairs.len() / 2);
    let mut pairs = pairs.into_iter();
    while let (Some(cond), Some(block)) = (pairs.next(), pairs.next()) {
        elifs.push((cond, expect_block(block, &shape)?));
    }

    Ok(AstNode::If {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        elifs,
        else_branch: else_branch.map(Box::new),
    })
}

fn while_stmt(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    match <[AstNode; 2]>::try_from(flatten(children)) {
        Ok([condition, body]) => Ok(AstNode::While {
            condition: Box::new(condition),
            body: Box::new(expect_block(body, &shape)?),
        }),
        Err(..) => Err(format!("expected [condition, block], got {}", shape)),
    }
}

fn for_stmt(children: Vec<AstItem>) -> Result<AstNode, String> {
    let shape = describe(&children);
    let mut nodes = flatten(children);
    let body = match nodes.pop() {
        Some(body) => Box::new(expect_block(body, &shape)?),
        None => return Err(format!("expected a loop body, got {}", shape)),
    };
    let mut parts = nodes.into_iter().map(Box::new);
    let (init, condition, update) = match parts.len() {
        0 => (None, None, None),
        1 => (None, parts.next(), None),
        3 => (parts.next(), parts.next(), parts.next()),
        _ => {
            return Err(format!(
                "expected [block], [condition, block] or [init, condition, update, block], got {}",
                shape
            ))
        }
    };
    Ok(AstNode::For {
        init,
        condition,
        update,
        body,
    })
}
