//! Sable - Sable Configuration Language
//!
//! A small dynamically-typed configuration language built around a
//! tree-walking evaluator. The language's `object[key]` indexing works over
//! strings, lists, maps, and any host-defined type that implements the
//! [`Indexable`](index::Indexable) capability.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod formatter;
pub mod functions;
pub mod index;
pub mod lexer;
pub mod linter;
pub mod token_parser;
pub mod validator;
pub mod value;
pub mod visitor;

use anyhow::{Context, Result};

// Re-export commonly used types
pub use ast::{Expression, Module, SourceSpan, Statement};
pub use error::{EvalError, ValidationError};
pub use evaluator::{EvaluatedModule, Environment};
pub use index::{Indexable, RawValue};
pub use lexer::{Lexer, Token, TokenKind};
pub use token_parser::TokenParser;
pub use value::Value;

/// Sable version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse Sable source from a string
pub fn parse_str(input: &str) -> Result<Module> {
    let mut lexer = Lexer::new(input);
    let tokens = lexer.tokenize()?;
    let mut parser = TokenParser::new(tokens);
    parser.parse_module()
}

/// Parse Sable source from a file
pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> Result<Module> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    parse_str(&content)
}

/// Parse and evaluate a string, returning the top-level bindings
pub fn eval_str(input: &str) -> Result<EvaluatedModule> {
    let module = parse_str(input)?;
    let mut env = Environment::new();
    Ok(env.evaluate(&module)?)
}

/// Parse and statically validate a string without evaluating it
pub fn check_str(input: &str) -> Result<(), Vec<ValidationError>> {
    let module = parse_str(input).map_err(|e| {
        vec![ValidationError::new(e.to_string(), None)]
    })?;
    validator::Validator::new().check_module(&module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_eval() {
        let evaluated = eval_str("name = \"sable\"\ninitial = name[0]").unwrap();
        assert_eq!(
            evaluated.bindings.get("initial"),
            Some(&Value::String("s".to_string()))
        );
    }

    #[test]
    fn test_check_str() {
        assert!(check_str("x = [1]\ny = x[0]").is_ok());
        assert!(check_str("y = missing[0]").is_err());
    }
}
