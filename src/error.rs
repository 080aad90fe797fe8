//! Error handling and formatting for Sable
//!
//! Provides detailed, user-friendly error messages for evaluation and
//! validation errors, all tagged with a source location when one is known.

use colored::Colorize;
use thiserror::Error;

use crate::ast::SourceSpan;

/// Runtime evaluation error
///
/// Every variant except `Interrupted` carries the most specific source span
/// available: type errors point at the whole expression, index errors at
/// the key that failed to resolve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A value's runtime type does not support the attempted operation
    #[error("{message}")]
    Type {
        message: String,
        span: Option<SourceSpan>,
    },

    /// A key failed to resolve: wrong key type, out of range, or missing
    #[error("{message}")]
    Index {
        message: String,
        span: Option<SourceSpan>,
    },

    /// Reference to a name with no binding
    #[error("undefined variable: {name}")]
    Undefined {
        name: String,
        span: Option<SourceSpan>,
    },

    /// Any other runtime failure (arity mismatch, bad operands, ...)
    #[error("{message}")]
    Eval {
        message: String,
        span: Option<SourceSpan>,
    },

    /// Cooperative cancellation was observed; not a language-level error
    #[error("evaluation interrupted")]
    Interrupted,
}

impl EvalError {
    pub fn type_error(message: impl Into<String>, span: Option<&SourceSpan>) -> Self {
        EvalError::Type {
            message: message.into(),
            span: span.cloned(),
        }
    }

    pub fn index_error(message: impl Into<String>, span: Option<&SourceSpan>) -> Self {
        EvalError::Index {
            message: message.into(),
            span: span.cloned(),
        }
    }

    pub fn eval_error(message: impl Into<String>, span: Option<&SourceSpan>) -> Self {
        EvalError::Eval {
            message: message.into(),
            span: span.cloned(),
        }
    }

    /// The source span this error points at, if any
    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            EvalError::Type { span, .. }
            | EvalError::Index { span, .. }
            | EvalError::Undefined { span, .. }
            | EvalError::Eval { span, .. } => span.as_ref(),
            EvalError::Interrupted => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, EvalError::Interrupted)
    }
}

/// Static validation error with source location
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, span: Option<&SourceSpan>) -> Self {
        Self {
            message: message.into(),
            span: span.cloned(),
        }
    }
}

/// Format an evaluation error with source context and colors
pub fn format_eval_error(error: &EvalError, source: &str) -> String {
    render_diagnostic("Error", &error.to_string(), error.span(), source)
}

/// Format a validation error with source context and colors
pub fn format_validation_error(error: &ValidationError, source: &str) -> String {
    render_diagnostic("Validation error", &error.message, error.span.as_ref(), source)
}

/// Render a diagnostic message with location, source context and a caret
fn render_diagnostic(
    header: &str,
    message: &str,
    span: Option<&SourceSpan>,
    source: &str,
) -> String {
    let mut output = String::new();

    // Error header
    output.push_str(&format!(
        "{} {}\n",
        format!("{}:", header).red().bold(),
        message
    ));

    let Some(span) = span else {
        return output;
    };

    // Location information
    output.push_str(&format!(
        "  {} {}:{}\n",
        "-->".blue().bold(),
        "input".dimmed(),
        format!("{}:{}", span.line, span.column).cyan()
    ));

    // Show the problematic line with context
    let lines: Vec<&str> = source.lines().collect();
    if span.line > 0 && span.line <= lines.len() {
        let line_idx = span.line - 1;

        output.push_str(&format!("   {}\n", "|".blue()));

        // Show previous line for context if available
        if line_idx > 0 {
            output.push_str(&format!(
                " {} | {}\n",
                format!("{:3}", span.line - 1).blue().dimmed(),
                lines[line_idx - 1].dimmed()
            ));
        }

        // Show the error line
        output.push_str(&format!(
            " {} | {}\n",
            format!("{:3}", span.line).blue().bold(),
            lines[line_idx]
        ));

        // Show error indicator
        let caret_len = span.length.max(1);
        let indicator = format!(
            "{}{}",
            " ".repeat(span.column.saturating_sub(1) + 7),
            "^".repeat(caret_len)
        );
        output.push_str(&format!("   {} {}\n", "|".blue(), indicator.red().bold()));

        // Show next line for context if available
        if line_idx + 1 < lines.len() {
            output.push_str(&format!(
                " {} | {}\n",
                format!("{:3}", span.line + 1).blue().dimmed(),
                lines[line_idx + 1].dimmed()
            ));
        }

        output.push_str(&format!("   {}\n", "|".blue()));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(line: usize, column: usize) -> SourceSpan {
        SourceSpan {
            line,
            column,
            offset: 0,
            length: 3,
        }
    }

    #[test]
    fn test_error_display() {
        let err = EvalError::type_error("type 'int' has no operator [](string)", None);
        assert_eq!(err.to_string(), "type 'int' has no operator [](string)");
    }

    #[test]
    fn test_undefined_display() {
        let err = EvalError::Undefined {
            name: "port".to_string(),
            span: None,
        };
        assert_eq!(err.to_string(), "undefined variable: port");
    }

    #[test]
    fn test_error_span_accessor() {
        let err = EvalError::index_error("index out of range", Some(&span_at(2, 5)));
        assert_eq!(err.span().map(|s| s.line), Some(2));
        assert_eq!(EvalError::Interrupted.span(), None);
    }

    #[test]
    fn test_format_includes_location() {
        colored::control::set_override(false);
        let err = EvalError::index_error("index out of range", Some(&span_at(1, 3)));
        let rendered = format_eval_error(&err, "x = nums[99]");
        assert!(rendered.contains("index out of range"));
        assert!(rendered.contains("1:3"));
        assert!(rendered.contains("x = nums[99]"));
        colored::control::unset_override();
    }

    #[test]
    fn test_format_without_span() {
        colored::control::set_override(false);
        let rendered = format_eval_error(&EvalError::Interrupted, "x = 1");
        assert!(rendered.contains("evaluation interrupted"));
        assert!(!rendered.contains("-->"));
        colored::control::unset_override();
    }
}
