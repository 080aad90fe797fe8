//! Token-based parser for Sable
//!
//! This module implements a recursive descent parser that consumes
//! tokens from the lexer to build an AST. This approach correctly
//! handles keyword/identifier distinction.

use anyhow::{anyhow, Result};

use crate::ast::{AssignOp, AssignTarget, Expression, Module, SourceSpan, Statement};
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

/// Parser that consumes tokens to produce an AST
pub struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenParser {
    /// Create a new parser from a token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse a complete module
    pub fn parse_module(&mut self) -> Result<Module> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Module { statements })
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Statement> {
        let start_pos = self.mark_position();
        let expr = self.parse_expression()?;

        let op = if self.check(&TokenKind::Equal) {
            Some(AssignOp::Assign)
        } else if self.check(&TokenKind::PlusEqual) {
            Some(AssignOp::Add)
        } else {
            None
        };

        let Some(op) = op else {
            return Ok(Statement::Expression {
                span: expr.span().cloned(),
                expr,
            });
        };
        self.advance();

        let target = match expr {
            Expression::Variable { name, .. } => AssignTarget::Name(name),
            Expression::Index {
                object, key, span, ..
            } => AssignTarget::Index {
                object: *object,
                key: *key,
                span,
            },
            other => {
                return Err(anyhow!(
                    "Invalid assignment target: {:?}",
                    other
                ))
            }
        };

        let value = self.parse_expression()?;

        Ok(Statement::Assignment {
            target,
            op,
            value,
            span: self.span_from(start_pos),
        })
    }

    /// Parse an expression
    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_postfix()
    }

    /// Parse postfix chains: calls and index accesses
    fn parse_postfix(&mut self) -> Result<Expression> {
        let start_pos = self.mark_position();
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::LeftParen) && matches!(expr, Expression::Variable { .. }) {
                // Function call - only if expression is a variable
                self.advance();
                let args = if !self.check(&TokenKind::RightParen) {
                    self.parse_argument_list()?
                } else {
                    Vec::new()
                };
                self.expect(&TokenKind::RightParen)?;

                if let Expression::Variable { name, .. } = expr {
                    expr = Expression::Call {
                        name,
                        args,
                        span: self.span_from(start_pos),
                    };
                } else {
                    unreachable!()
                }
            } else if self.check(&TokenKind::LeftBracket) {
                // Index access
                self.advance();
                let key = self.parse_expression()?;
                self.expect(&TokenKind::RightBracket)?;

                expr = Expression::Index {
                    object: Box::new(expr),
                    key: Box::new(key),
                    span: self.span_from(start_pos),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list
    fn parse_argument_list(&mut self) -> Result<Vec<Expression>> {
        let mut args = vec![self.parse_expression()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expression> {
        // List literal
        if self.check(&TokenKind::LeftBracket) {
            return self.parse_list();
        }

        // Map literal
        if self.check(&TokenKind::LeftBrace) {
            return self.parse_map();
        }

        // Literals
        let literal_span = self.current_span();
        if let Some(value) = self.parse_literal()? {
            return Ok(Expression::Literal {
                value,
                span: literal_span,
            });
        }

        // Identifier (variable reference)
        if self.check_identifier() {
            let span = self.current_span();
            let name = self.parse_identifier()?;
            return Ok(Expression::Variable { name, span });
        }

        Err(anyhow!("Unexpected token: {:?}", self.current().kind))
    }

    /// Parse a list literal
    fn parse_list(&mut self) -> Result<Expression> {
        let start_pos = self.mark_position();
        self.expect(&TokenKind::LeftBracket)?;

        let mut elements = Vec::new();
        if !self.check(&TokenKind::RightBracket) {
            elements.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RightBracket) {
                    break; // trailing comma
                }
                elements.push(self.parse_expression()?);
            }
        }
        self.expect(&TokenKind::RightBracket)?;

        Ok(Expression::List {
            elements,
            span: self.span_from(start_pos),
        })
    }

    /// Parse a map literal: `{key: value, ...}`
    fn parse_map(&mut self) -> Result<Expression> {
        let start_pos = self.mark_position();
        self.expect(&TokenKind::LeftBrace)?;

        let mut entries = Vec::new();
        if !self.check(&TokenKind::RightBrace) {
            entries.push(self.parse_map_entry()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RightBrace) {
                    break; // trailing comma
                }
                entries.push(self.parse_map_entry()?);
            }
        }
        self.expect(&TokenKind::RightBrace)?;

        Ok(Expression::Map {
            entries,
            span: self.span_from(start_pos),
        })
    }

    /// Parse one `key: value` map entry; keys are identifiers or strings
    fn parse_map_entry(&mut self) -> Result<(String, Expression)> {
        let key = match &self.current().kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::String(s) => s.clone(),
            other => return Err(anyhow!("Expected map key, got {:?}", other)),
        };
        self.advance();
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_expression()?;
        Ok((key, value))
    }

    /// Parse a literal value, if the current token is one
    fn parse_literal(&mut self) -> Result<Option<Value>> {
        let value = match &self.current().kind {
            TokenKind::Integer(i) => Value::Int(*i),
            TokenKind::Float(f) => Value::Float(*f),
            TokenKind::String(s) => Value::String(s.clone()),
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(value))
    }

    /// Parse an identifier
    fn parse_identifier(&mut self) -> Result<String> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(anyhow!("Expected identifier, got {:?}", self.current().kind))
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self) -> bool {
        matches!(self.current().kind, TokenKind::Identifier(_))
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(anyhow!(
                "Expected {:?}, got {:?}",
                kind,
                self.current().kind
            ))
        }
    }

    /// Mark the current position to start tracking a span
    fn mark_position(&self) -> usize {
        self.position
    }

    /// Create a SourceSpan from a marked position to the previous token
    /// (the last token that was consumed before the current position)
    fn span_from(&self, start_pos: usize) -> Option<SourceSpan> {
        if start_pos >= self.tokens.len() {
            return None;
        }

        let start_token = &self.tokens[start_pos];

        let end_pos = if self.position > 0 {
            self.position - 1
        } else {
            0
        };

        if end_pos >= self.tokens.len() {
            return None;
        }

        let end_token = &self.tokens[end_pos];

        Some(SourceSpan {
            line: start_token.span.start.line,
            column: start_token.span.start.column,
            offset: start_token.span.start.offset,
            length: end_token.span.end.offset - start_token.span.start.offset,
        })
    }

    /// Get the span of the current token
    fn current_span(&self) -> Option<SourceSpan> {
        if self.position >= self.tokens.len() {
            return None;
        }

        let token = &self.tokens[self.position];
        Some(SourceSpan {
            line: token.span.start.line,
            column: token.span.start.column,
            offset: token.span.start.offset,
            length: token.span.text.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Module {
        let tokens = tokenize(source).unwrap();
        TokenParser::new(tokens).parse_module().unwrap()
    }

    #[test]
    fn test_parse_simple_assignment() {
        let module = parse("port = 8080");
        assert_eq!(module.statements.len(), 1);
        let Statement::Assignment { target, op, value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(target, &AssignTarget::Name("port".to_string()));
        assert_eq!(*op, AssignOp::Assign);
        assert!(matches!(value, Expression::Literal { value: Value::Int(8080), .. }));
    }

    #[test]
    fn test_parse_index_expression() {
        let module = parse("first = servers[0]");
        let Statement::Assignment { value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Index { object, key, .. } = value else {
            panic!("expected index expression");
        };
        assert!(matches!(&**object, Expression::Variable { name, .. } if name == "servers"));
        assert!(matches!(&**key, Expression::Literal { value: Value::Int(0), .. }));
    }

    #[test]
    fn test_parse_chained_index() {
        let module = parse("x = grid[0][1]");
        let Statement::Assignment { value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        // Outer index's object is itself an index expression
        let Expression::Index { object, .. } = value else {
            panic!("expected index expression");
        };
        assert!(matches!(&**object, Expression::Index { .. }));
    }

    #[test]
    fn test_parse_index_assignment_target() {
        let module = parse("xs[0] = 1");
        let Statement::Assignment { target, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(target, AssignTarget::Index { .. }));
    }

    #[test]
    fn test_parse_augmented_assignment() {
        let module = parse("counts[\"a\"] += 1");
        let Statement::Assignment { op, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(*op, AssignOp::Add);
    }

    #[test]
    fn test_parse_invalid_assignment_target() {
        let tokens = tokenize("42 = 1").unwrap();
        let err = TokenParser::new(tokens).parse_module().unwrap_err();
        assert!(err.to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_parse_collections() {
        let module = parse("m = {a: 1, \"b c\": [2, 3]}");
        let Statement::Assignment { value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Map { entries, .. } = value else {
            panic!("expected map literal");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, "b c");
    }

    #[test]
    fn test_parse_call_with_args() {
        let module = parse("n = len(names)");
        let Statement::Assignment { value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Call { name, args, .. } = value else {
            panic!("expected call");
        };
        assert_eq!(name, "len");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_index_spans_point_at_source() {
        let module = parse("first = servers[idx]");
        let Statement::Assignment { value, .. } = &module.statements[0] else {
            panic!("expected assignment");
        };
        let Expression::Index { key, span, .. } = value else {
            panic!("expected index expression");
        };
        // The whole index expression starts at `servers`
        assert_eq!(span.as_ref().unwrap().column, 9);
        // The key's own span is more specific: it points at `idx`
        assert_eq!(key.span().unwrap().column, 17);
    }

    #[test]
    fn test_parse_expression_statement() {
        let module = parse("len(\"abc\")");
        assert!(matches!(
            module.statements[0],
            Statement::Expression { .. }
        ));
    }
}
