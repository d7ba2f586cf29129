// Core Parser Implementation
//
// This module implements the token cursor shared by the parser components and
// the error type they report.

use std::fmt;
use std::iter::Peekable;
use std::vec::IntoIter;

use log::debug;

use crate::query::parser::ast::Statement;
use crate::query::parser::lexer::{Lexer, ScanError, Token, TokenType};
use super::parser_select::parse_select;

/// SQL Parsing errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The query text could not be scanned
    Scan(ScanError),
    /// A grammar rule required a different token
    UnexpectedToken { token: Token, message: String },
    /// Tokens are well-formed but the construct is not allowed
    InvalidSyntax { token: Token, message: String },
    /// Recognized keyword for a feature the engine does not implement
    Unsupported { token: Token, feature: String },
    EndOfInput,
}

impl ParseError {
    /// Offending token, when the error has one
    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseError::UnexpectedToken { token, .. }
            | ParseError::InvalidSyntax { token, .. }
            | ParseError::Unsupported { token, .. } => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Scan(err) => write!(f, "Scan error: {}", err),
            ParseError::UnexpectedToken { token, message } => write!(f, "{}, found {}", message, token),
            ParseError::InvalidSyntax { token, message } => write!(f, "Invalid syntax at {}: {}", token.position(), message),
            ParseError::Unsupported { token, feature } => {
                write!(f, "'{}' is not supported (at {})", feature, token.position())
            }
            ParseError::EndOfInput => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Scan(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> Self {
        ParseError::Scan(err)
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// SQL Parser for constructing an AST from SQL tokens
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    current_token: Option<Token>,
}

impl Parser {
    /// Create a new parser from a SQL query string
    pub fn new(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::tokenize(input)?;
        Ok(Parser::from_tokens(tokens))
    }

    /// Create a parser from already scanned tokens. Comments are dropped and
    /// a missing EOF token is supplied.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.token_type != TokenType::COMMENT)
            .collect();

        if tokens.last().is_none_or(|t| t.token_type != TokenType::EOF) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.lexeme.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenType::EOF, "", line, column));
        }

        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
            current_token: None,
        };

        parser.next_token();
        parser
    }

    /// Advance to the next token. The cursor never moves past EOF.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.current_token_is(TokenType::EOF) {
            return self.current_token.clone();
        }
        self.current_token = self.tokens.next();
        self.current_token.clone()
    }

    /// Consume the current token and return it
    pub fn advance(&mut self) -> ParseResult<Token> {
        let token = self.current()?.clone();
        self.next_token();
        Ok(token)
    }

    /// Current token, or `EndOfInput` once the stream is exhausted
    pub fn current(&self) -> ParseResult<&Token> {
        self.current_token.as_ref().ok_or(ParseError::EndOfInput)
    }

    /// Peek at the token after the current one without consuming anything
    pub fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// Check if the current token is of the given type
    pub fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token
            .as_ref()
            .is_some_and(|t| t.token_type == token_type)
    }

    /// Check if the current token is any of the given types
    pub fn current_token_in(&self, token_types: &[TokenType]) -> bool {
        token_types.iter().any(|t| self.current_token_is(*t))
    }

    /// Check if the next token is of a specific type
    pub fn peek_token_is(&mut self, token_type: TokenType) -> bool {
        self.tokens.peek().is_some_and(|t| t.token_type == token_type)
    }

    pub fn is_at_end(&self) -> bool {
        self.current_token.is_none() || self.current_token_is(TokenType::EOF)
    }

    /// Consume a token of the expected type or fail with `message`
    pub fn expect_token(&mut self, expected: TokenType, message: &str) -> ParseResult<Token> {
        let token = self.current()?;
        if token.token_type == expected {
            self.advance()
        } else {
            Err(self.unexpected(message))
        }
    }

    /// `UnexpectedToken` error pointing at the current token
    pub fn unexpected(&self, message: &str) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::UnexpectedToken {
                token: token.clone(),
                message: message.to_string(),
            },
            None => ParseError::EndOfInput,
        }
    }

    /// `InvalidSyntax` error pointing at the current token
    pub fn invalid(&self, message: impl Into<String>) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::InvalidSyntax {
                token: token.clone(),
                message: message.into(),
            },
            None => ParseError::EndOfInput,
        }
    }

    /// `Unsupported` error for the feature introduced by the current token
    pub fn unsupported(&self, feature: &str) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::Unsupported {
                token: token.clone(),
                feature: feature.to_string(),
            },
            None => ParseError::EndOfInput,
        }
    }

    /// Parse an identifier token
    pub fn parse_identifier(&mut self) -> ParseResult<Token> {
        self.expect_token(TokenType::IDENTIFIER, "Expected identifier")
    }

    /// Parse a single statement. A `;` is required when anything follows it.
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let select = parse_select(self)?;

        if !self.is_at_end() {
            self.expect_token(TokenType::SEMICOLON, "Expected ';' at the end of a statement")?;
        }

        debug!("parsed {} with {} projections", select.token.position(), select.columns.len());
        Ok(Statement::Select(select))
    }

    /// Parse exactly one statement covering the whole input
    pub fn parse(&mut self) -> ParseResult<Statement> {
        let statement = self.parse_statement()?;

        if !self.is_at_end() {
            return Err(self.unexpected("Expected end of input after statement"));
        }

        Ok(statement)
    }

    /// Parse a `;`-separated script
    pub fn parse_all(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }
}
