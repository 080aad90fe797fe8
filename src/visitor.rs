//! Generic AST traversal for tooling
//!
//! Tools that walk the tree (linters, analyzers) implement [`Visitor`] and
//! override the hooks they care about; the `walk_*` functions provide the
//! default recursion over every node kind, so a new pass never has to
//! modify the AST definitions.

use crate::ast::{AssignTarget, Expression, Module, Statement};

/// A traversal over the syntax tree.
///
/// Each hook defaults to walking into the node's children; override a hook
/// to observe (or cut off) traversal at that node kind.
pub trait Visitor {
    fn visit_module(&mut self, module: &Module) {
        walk_module(self, module);
    }

    fn visit_statement(&mut self, statement: &Statement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }
}

/// Walk every statement of a module
pub fn walk_module<V: Visitor + ?Sized>(visitor: &mut V, module: &Module) {
    for statement in &module.statements {
        visitor.visit_statement(statement);
    }
}

/// Walk the expressions of a statement
pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, statement: &Statement) {
    match statement {
        Statement::Assignment { target, value, .. } => {
            if let AssignTarget::Index { object, key, .. } = target {
                visitor.visit_expression(object);
                visitor.visit_expression(key);
            }
            visitor.visit_expression(value);
        }
        Statement::Expression { expr, .. } => visitor.visit_expression(expr),
    }
}

/// Walk the children of an expression
pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal { .. } | Expression::Variable { .. } => {}
        Expression::Index { object, key, .. } => {
            visitor.visit_expression(object);
            visitor.visit_expression(key);
        }
        Expression::Call { args, .. } => {
            for arg in args {
                visitor.visit_expression(arg);
            }
        }
        Expression::List { elements, .. } => {
            for element in elements {
                visitor.visit_expression(element);
            }
        }
        Expression::Map { entries, .. } => {
            for (_, value) in entries {
                visitor.visit_expression(value);
            }
        }
    }
}

impl Expression {
    /// Double-dispatch entry point for tree-walking tools
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_expression(self);
    }
}

impl Statement {
    /// Double-dispatch entry point for tree-walking tools
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_statement(self);
    }
}

impl Module {
    /// Double-dispatch entry point for tree-walking tools
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_module(self);
    }
}
