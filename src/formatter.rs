//! Code formatter for Sable
//!
//! Renders the AST back to canonical source text. Formatting is purely
//! textual and never evaluates anything; formatting a parse of formatted
//! output yields the same text again.

use anyhow::Result;

use crate::ast::{AssignOp, AssignTarget, Expression, Module, Statement};
use crate::value::Value;

/// Formatter for Sable code
pub struct Formatter;

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Format a module
    pub fn format_module(&self, module: &Module) -> Result<String> {
        let mut output = String::new();

        for statement in &module.statements {
            output.push_str(&self.format_statement(statement)?);
            output.push('\n');
        }

        Ok(output)
    }

    /// Format a statement
    pub fn format_statement(&self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Assignment {
                target, op, value, ..
            } => {
                let target_text = match target {
                    AssignTarget::Name(name) => name.clone(),
                    AssignTarget::Index { object, key, .. } => format!(
                        "{}[{}]",
                        self.format_expression(object)?,
                        self.format_expression(key)?
                    ),
                };
                let op_text = match op {
                    AssignOp::Assign => "=",
                    AssignOp::Add => "+=",
                };
                Ok(format!(
                    "{} {} {}",
                    target_text,
                    op_text,
                    self.format_expression(value)?
                ))
            }

            Statement::Expression { expr, .. } => self.format_expression(expr),
        }
    }

    /// Format an expression
    pub fn format_expression(&self, expr: &Expression) -> Result<String> {
        match expr {
            Expression::Literal { value, .. } => Ok(self.format_literal(value)),

            Expression::Variable { name, .. } => Ok(name.clone()),

            Expression::Index { object, key, .. } => Ok(format!(
                "{}[{}]",
                self.format_expression(object)?,
                self.format_expression(key)?
            )),

            Expression::Call { name, args, .. } => {
                let formatted: Result<Vec<_>> =
                    args.iter().map(|a| self.format_expression(a)).collect();
                Ok(format!("{}({})", name, formatted?.join(", ")))
            }

            Expression::List { elements, .. } => {
                let formatted: Result<Vec<_>> =
                    elements.iter().map(|e| self.format_expression(e)).collect();
                Ok(format!("[{}]", formatted?.join(", ")))
            }

            Expression::Map { entries, .. } => {
                let mut parts = Vec::new();
                for (key, value) in entries {
                    parts.push(format!(
                        "{}: {}",
                        format_map_key(key),
                        self.format_expression(value)?
                    ));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
        }
    }

    fn format_literal(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Int(i) => i.to_string(),
            // {:?} keeps the decimal point, so floats reparse as floats
            Value::Float(f) => format!("{:?}", f),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            // Containers and host objects never appear as parsed literals
            other => other.to_string_repr(),
        }
    }
}

/// Render a map key, quoting it unless it reparses as a bare identifier.
/// Keyword keys like `"null"` lex as keywords, so they need quotes too.
fn format_map_key(key: &str) -> String {
    if is_plain_identifier(key) {
        key.to_string()
    } else {
        format!("\"{}\"", escape_string(key))
    }
}

fn is_plain_identifier(s: &str) -> bool {
    if matches!(s, "true" | "false" | "null") {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            other => result.push(other),
        }
    }
    result
}
