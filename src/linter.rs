//! Linter for Sable - checks code for style issues and likely mistakes
//!
//! Built on the [`Visitor`] traversal, so new rules slot in without
//! touching the AST definitions.

use anyhow::Result;
use std::collections::HashMap;

use crate::ast::{AssignTarget, Expression, Module, Statement};
use crate::value::Value;
use crate::visitor::{walk_expression, walk_statement, Visitor};

/// Severity level for lint issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A lint issue found in the code
#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: Severity,
    pub message: String,
    pub rule: String,
    pub suggestion: Option<String>,
}

/// Linter for Sable code
pub struct Linter {
    issues: Vec<LintIssue>,
    variables: HashMap<String, bool>, // name -> used
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}

impl Linter {
    /// Create a new linter
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            variables: HashMap::new(),
        }
    }

    /// Lint a module and return all issues
    pub fn lint(&mut self, module: &Module) -> Result<Vec<LintIssue>> {
        self.issues.clear();
        self.variables.clear();

        // First pass: collect all definitions
        for statement in &module.statements {
            if let Statement::Assignment {
                target: AssignTarget::Name(name),
                ..
            } = statement
            {
                self.variables.insert(name.clone(), false);
            }
        }

        // Second pass: walk the tree, marking uses and checking rules
        module.accept(self);

        self.check_unused();

        Ok(self.issues.clone())
    }

    fn check_unused(&mut self) {
        let mut unused: Vec<_> = self
            .variables
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(name, _)| name.clone())
            .collect();
        unused.sort();

        for name in unused {
            self.issues.push(LintIssue {
                severity: Severity::Warning,
                message: format!("variable '{}' is defined but never used", name),
                rule: "unused-variable".to_string(),
                suggestion: Some(format!("remove the assignment to '{}'", name)),
            });
        }
    }

    /// Flag index expressions whose failure is already visible statically:
    /// an integer literal key outside the bounds of a literal sequence.
    fn check_constant_index(&mut self, object: &Expression, key: &Expression) {
        let Expression::Literal {
            value: Value::Int(index),
            ..
        } = key
        else {
            return;
        };

        let length = match object {
            Expression::List { elements, .. } => elements.len(),
            Expression::Literal {
                value: Value::String(s),
                ..
            } => s.chars().count(),
            _ => return,
        };

        if *index >= length as i64 || *index < -(length as i64) {
            self.issues.push(LintIssue {
                severity: Severity::Error,
                message: format!(
                    "index {} is out of range for a literal of length {}",
                    index, length
                ),
                rule: "constant-index".to_string(),
                suggestion: None,
            });
        }
    }
}

impl Visitor for Linter {
    fn visit_statement(&mut self, statement: &Statement) {
        if let Statement::Assignment {
            target: AssignTarget::Index { object, key, .. },
            ..
        } = statement
        {
            self.check_constant_index(object, key);
        }
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Variable { name, .. } => {
                if let Some(used) = self.variables.get_mut(name) {
                    *used = true;
                }
            }
            Expression::Index { object, key, .. } => {
                self.check_constant_index(object, key);
            }
            _ => {}
        }
        walk_expression(self, expr);
    }
}
