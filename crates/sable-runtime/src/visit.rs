//! Traversal of the AST.

use crate::ast::{AstNode, Param};

/// A visitor over a syntax tree.
///
/// Nodes are visited in pre-order. Overriding `visit_node` replaces the
/// descent into the children; call [`walk`] to keep it.
pub trait AstVisitor {
    fn visit_node(&mut self, node: &AstNode) {
        walk(self, node);
    }

    fn visit_param(&mut self, param: &Param) {
        let _ = param;
    }
}

/// Visit the parameters and the child nodes of `node`.
pub fn walk<V>(visitor: &mut V, node: &AstNode)
where
    V: AstVisitor + ?Sized,
{
    match node {
        AstNode::FuncDecl { params, .. } => params.iter().for_each(|p| visitor.visit_param(p)),
        AstNode::Param(param) => visitor.visit_param(param),
        _ => (),
    }
    for child in node.children() {
        visitor.visit_node(child);
    }
}
