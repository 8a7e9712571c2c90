//! AST visitor trait for traversing the syntax tree.
//!
//! Provides an `AstVisitor` trait for customizable traversal and a
//! `for_each_child` function for generic iteration over all children.

use crate::expression::{Expression, NameAccessor};
use crate::node::*;

/// A visitor that traverses the AST. Default implementations walk into
/// children and expressions in source order.
pub trait AstVisitor {
    fn visit_node(&mut self, node: &AstNode) {
        walk_node(self, node);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }
}

/// Visit a node's own expressions, then its children.
pub fn walk_node<V: AstVisitor + ?Sized>(visitor: &mut V, node: &AstNode) {
    for expr in node.kind.expressions() {
        visitor.visit_expression(expr);
    }
    for child in node.children.values() {
        visitor.visit_node(child);
    }
}

/// Visit the sub-expressions of an expression.
pub fn walk_expression<V: AstVisitor + ?Sized>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal(_) | Expression::Missing(_) => {}
        Expression::Name(name) => {
            for accessor in &name.accessors {
                if let NameAccessor::Index { indices } = accessor {
                    for index in indices {
                        visitor.visit_expression(index);
                    }
                }
            }
        }
        Expression::Call(call) => {
            for arg in &call.arguments {
                visitor.visit_expression(arg);
            }
        }
        Expression::Unary(n) => visitor.visit_expression(&n.operand),
        Expression::Binary(n) => {
            visitor.visit_expression(&n.left);
            visitor.visit_expression(&n.right);
        }
        Expression::IsNull(n) => visitor.visit_expression(&n.operand),
        Expression::Clipped(n) => visitor.visit_expression(&n.operand),
        Expression::Parenthesized(n) => visitor.visit_expression(&n.inner),
    }
}

/// Call `f` for each direct child of `node`, in source order.
pub fn for_each_child<'a>(node: &'a AstNode, mut f: impl FnMut(&'a AstNode)) {
    for child in node.children.values() {
        f(child);
    }
}

/// Count nodes in a tree, including the root.
pub fn count_nodes(node: &AstNode) -> usize {
    struct Counter(usize);
    impl AstVisitor for Counter {
        fn visit_node(&mut self, node: &AstNode) {
            self.0 += 1;
            walk_node(self, node);
        }
    }
    let mut counter = Counter(0);
    counter.visit_node(node);
    counter.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgl_core::text::TextSpan;

    #[test]
    fn test_walk_visits_expressions_and_children() {
        struct Names(Vec<String>);
        impl AstVisitor for Names {
            fn visit_expression(&mut self, expr: &Expression) {
                if let Expression::Name(n) = expr {
                    self.0.push(n.name.clone());
                }
                walk_expression(self, expr);
            }
        }

        let mut root = AstNode::new(NodeKind::Try, 0);
        root.data.end_index = 20;
        let value = Expression::Name(crate::expression::NameExpression::simple(
            "total",
            TextSpan::new(8, 5),
        ));
        let mut let_node = AstNode::new(
            NodeKind::Let(LetStatement {
                target: None,
                values: vec![value],
            }),
            4,
        );
        let_node.data.end_index = 13;
        root.add_child(let_node);

        let mut names = Names(Vec::new());
        names.visit_node(&root);
        assert_eq!(names.0, vec!["total".to_string()]);
        assert_eq!(count_nodes(&root), 2);
    }
}
