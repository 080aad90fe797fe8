//! Lexer module for Sable - tokenizes source code before parsing
//!
//! This module provides a two-phase compilation approach:
//! 1. Lexer: Source code → Token stream
//! 2. Parser: Token stream → AST
//!
//! This separation allows proper keyword/identifier distinction.

use anyhow::{anyhow, Result};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "lexer.pest"]
struct LexerParser;

/// Position information for a token
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A token with its value and position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Span of source text
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    True,
    False,
    Null,

    // Literals
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),

    // Operators
    Equal,     // =
    PlusEqual, // +=

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
    Comma,        // ,
    Colon,        // :

    // Special
    Eof,
}

/// Lexer that converts source code to tokens
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the source code
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let pairs = LexerParser::parse(Rule::tokens, self.source)
            .map_err(|e| anyhow!("Lexer error: {}", e))?;

        for pair in pairs {
            if pair.as_rule() == Rule::tokens {
                for inner in pair.into_inner() {
                    if inner.as_rule() == Rule::token {
                        if let Some(token) = self.process_token(inner)? {
                            self.tokens.push(token);
                        }
                    }
                }
            }
        }

        // Add EOF token
        let eof_pos = self.position_from_offset(self.source.len());
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span {
                start: eof_pos.clone(),
                end: eof_pos,
                text: String::new(),
            },
        });

        Ok(self.tokens.clone())
    }

    /// Process a single token pair
    fn process_token(&self, pair: pest::iterators::Pair<Rule>) -> Result<Option<Token>> {
        let span = self.span_from_pair(&pair);

        for inner in pair.into_inner() {
            let kind = match inner.as_rule() {
                Rule::keyword_token => match inner.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    kw => return Err(anyhow!("Unknown keyword: {}", kw)),
                },

                Rule::identifier_token => TokenKind::Identifier(inner.as_str().to_string()),

                Rule::number_token => {
                    let text = inner.as_str();
                    if text.contains('.') {
                        let f: f64 = text
                            .parse()
                            .map_err(|_| anyhow!("Invalid float: {}", text))?;
                        TokenKind::Float(f)
                    } else {
                        let i: i64 = text
                            .parse()
                            .map_err(|_| anyhow!("Invalid integer: {}", text))?;
                        TokenKind::Integer(i)
                    }
                }

                Rule::string_token => {
                    let text = inner.as_str();
                    // Remove quotes and unescape
                    let content = self.unescape_string(&text[1..text.len() - 1])?;
                    TokenKind::String(content)
                }

                Rule::operator_token => match inner.as_str() {
                    "+=" => TokenKind::PlusEqual,
                    "=" => TokenKind::Equal,
                    op => return Err(anyhow!("Unknown operator: {}", op)),
                },

                Rule::punctuation_token => match inner.as_str() {
                    "(" => TokenKind::LeftParen,
                    ")" => TokenKind::RightParen,
                    "[" => TokenKind::LeftBracket,
                    "]" => TokenKind::RightBracket,
                    "{" => TokenKind::LeftBrace,
                    "}" => TokenKind::RightBrace,
                    "," => TokenKind::Comma,
                    ":" => TokenKind::Colon,
                    p => return Err(anyhow!("Unknown punctuation: {}", p)),
                },

                _ => continue,
            };

            return Ok(Some(Token { kind, span }));
        }

        Ok(None)
    }

    /// Unescape string escape sequences
    fn unescape_string(&self, s: &str) -> Result<String> {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('"') => result.push('"'),
                    Some('\\') => result.push('\\'),
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some(other) => return Err(anyhow!("Invalid escape sequence: \\{}", other)),
                    None => return Err(anyhow!("Unterminated escape sequence")),
                }
            } else {
                result.push(c);
            }
        }

        Ok(result)
    }

    /// Create a Span from a pest Pair
    fn span_from_pair(&self, pair: &pest::iterators::Pair<Rule>) -> Span {
        let pest_span = pair.as_span();
        Span {
            start: self.position_from_offset(pest_span.start()),
            end: self.position_from_offset(pest_span.end()),
            text: pair.as_str().to_string(),
        }
    }

    /// Calculate line and column from byte offset
    fn position_from_offset(&self, offset: usize) -> Position {
        let mut line = 1;
        let mut column = 1;

        for (i, c) in self.source.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Position {
            line,
            column,
            offset,
        }
    }
}

/// Convenience function to tokenize a string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keywords() {
        let tokens = tokenize("true false null").unwrap();
        assert_eq!(tokens.len(), 4); // 3 keywords + EOF
        assert!(matches!(tokens[0].kind, TokenKind::True));
        assert!(matches!(tokens[1].kind, TokenKind::False));
        assert!(matches!(tokens[2].kind, TokenKind::Null));
    }

    #[test]
    fn test_keyword_vs_identifier() {
        // "null" is a keyword, "nullable" is an identifier
        let tokens = tokenize("null nullable").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0].kind, TokenKind::Null));
        assert!(matches!(&tokens[1].kind, TokenKind::Identifier(s) if s == "nullable"));
    }

    #[test]
    fn test_tokenize_assignment() {
        let tokens = tokenize("port = 8080").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "port"));
        assert!(matches!(tokens[1].kind, TokenKind::Equal));
        assert!(matches!(tokens[2].kind, TokenKind::Integer(8080)));
    }

    #[test]
    fn test_tokenize_index_syntax() {
        let tokens = tokenize("servers[0]").unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(matches!(tokens[1].kind, TokenKind::LeftBracket));
        assert!(matches!(tokens[2].kind, TokenKind::Integer(0)));
        assert!(matches!(tokens[3].kind, TokenKind::RightBracket));
    }

    #[test]
    fn test_tokenize_negative_index() {
        let tokens = tokenize("s[-1]").unwrap();
        assert!(matches!(tokens[2].kind, TokenKind::Integer(-1)));
    }

    #[test]
    fn test_tokenize_augmented_assign() {
        let tokens = tokenize("counts[\"a\"] += 1").unwrap();
        assert!(matches!(tokens[4].kind, TokenKind::PlusEqual));
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let tokens = tokenize(r#""a\nb""#).unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::String(s) if s == "a\nb"));
    }

    #[test]
    fn test_tokenize_positions() {
        let tokens = tokenize("a = 1\nb = 2").unwrap();
        // "b" starts on line 2, column 1
        assert_eq!(tokens[3].span.start.line, 2);
        assert_eq!(tokens[3].span.start.column, 1);
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("# a comment\nx = 1").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "x"));
    }
}
