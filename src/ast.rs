//! Abstract Syntax Tree definitions for Sable
//!
//! This module defines the AST nodes for the Sable configuration language.
//! Every node carries an optional source span so that diagnostics can point
//! at the construct that produced them.

use serde::{Deserialize, Serialize};

use crate::lexer::Span;
use crate::value::Value;

/// Source location information (always available)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl From<&Span> for SourceSpan {
    fn from(span: &Span) -> Self {
        SourceSpan {
            line: span.start.line,
            column: span.start.column,
            offset: span.start.offset,
            length: span.text.len(),
        }
    }
}

/// A Sable module (file)
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub statements: Vec<Statement>,
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assignment: `name = value`, `target[key] = value`, `target[key] += value`
    Assignment {
        target: AssignTarget,
        op: AssignOp,
        value: Expression,
        span: Option<SourceSpan>,
    },

    /// Expression statement (for side effects)
    Expression {
        expr: Expression,
        span: Option<SourceSpan>,
    },
}

/// The left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// A plain variable: `name = ...`
    Name(String),

    /// An indexed container slot: `object[key] = ...`
    ///
    /// The object sub-expression is evaluated exactly once per assignment,
    /// even for the augmented form that both reads and writes the slot.
    Index {
        object: Expression,
        key: Expression,
        span: Option<SourceSpan>,
    },
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign, // =
    Add,    // +=
}

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal scalar value
    Literal {
        value: Value,
        span: Option<SourceSpan>,
    },

    /// Variable reference
    Variable {
        name: String,
        span: Option<SourceSpan>,
    },

    /// Index access: `list[0]`, `map["key"]`, `"text"[2]`
    Index {
        object: Box<Expression>,
        key: Box<Expression>,
        span: Option<SourceSpan>,
    },

    /// Function call: `func(args)`
    Call {
        name: String,
        args: Vec<Expression>,
        span: Option<SourceSpan>,
    },

    /// List literal: `[1, 2, 3]`
    List {
        elements: Vec<Expression>,
        span: Option<SourceSpan>,
    },

    /// Map literal: `{key: value, ...}`
    Map {
        entries: Vec<(String, Expression)>,
        span: Option<SourceSpan>,
    },
}

impl Expression {
    /// Get the span of this expression, if available
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Expression::Literal { span, .. } => span.as_ref(),
            Expression::Variable { span, .. } => span.as_ref(),
            Expression::Index { span, .. } => span.as_ref(),
            Expression::Call { span, .. } => span.as_ref(),
            Expression::List { span, .. } => span.as_ref(),
            Expression::Map { span, .. } => span.as_ref(),
        }
    }
}

impl Statement {
    /// Get the span of this statement, if available
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Statement::Assignment { span, .. } => span.as_ref(),
            Statement::Expression { span, .. } => span.as_ref(),
        }
    }
}
