// SQL Lexer Implementation
//
// This module implements a lazy lexer that turns query text into tokens with
// line/column tracking. Scanning stops at the first error.

use std::collections::HashMap;
use std::fmt;

use log::trace;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::catalog::value::DataValue;

/// SQL Token types
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TokenType {
    // Keywords
    IS,
    SELECT,
    DISTINCT,
    FROM,
    AS,
    WHERE,
    AND,
    OR,
    NOT,
    IN,
    NULL,
    TRUE,
    FALSE,
    BETWEEN,
    LIKE,
    ILIKE,
    EXISTS,
    ALL,
    ANY,
    UNION,
    INTERSECT,
    EXCEPT,
    GROUP,
    BY,
    HAVING,
    ORDER,
    ASC,
    DESC,
    LIMIT,
    OFFSET,
    CASE,
    WHEN,
    THEN,
    ELSE,
    END,
    JOIN,
    INNER,
    LEFT,
    RIGHT,
    FULL,
    OUTER,
    ON,
    CROSS,

    // Literals
    NUMBER,
    STRING,

    // Identifiers
    IDENTIFIER,

    // Operators
    EQUALS,         // =
    NotEqual,       // <>
    LessThan,       // <
    GreaterThan,    // >
    LessEqual,      // <=
    GreaterEqual,   // >=
    PLUS,           // +
    MINUS,          // -
    MULTIPLY,       // *
    DIVIDE,         // /
    MODULO,         // %

    // Punctuation
    SEMICOLON,      // ;
    COMMA,          // ,
    DOT,            // .
    LeftParen,      // (
    RightParen,     // )
    LeftBracket,    // [
    RightBracket,   // ]

    // Special
    COMMENT,
    EOF,
}

/// Reserved words. Lookup is case-sensitive, callers lowercase the query
/// text first when they want case-insensitive keywords.
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    use TokenType::*;

    HashMap::from([
        ("is", IS),
        ("select", SELECT),
        ("distinct", DISTINCT),
        ("from", FROM),
        ("as", AS),
        ("where", WHERE),
        ("and", AND),
        ("or", OR),
        ("not", NOT),
        ("in", IN),
        ("null", NULL),
        ("true", TRUE),
        ("false", FALSE),
        ("between", BETWEEN),
        ("like", LIKE),
        ("ilike", ILIKE),
        ("exists", EXISTS),
        ("all", ALL),
        ("any", ANY),
        ("union", UNION),
        ("intersect", INTERSECT),
        ("except", EXCEPT),
        ("group", GROUP),
        ("by", BY),
        ("having", HAVING),
        ("order", ORDER),
        ("asc", ASC),
        ("desc", DESC),
        ("limit", LIMIT),
        ("offset", OFFSET),
        ("case", CASE),
        ("when", WHEN),
        ("then", THEN),
        ("else", ELSE),
        ("end", END),
        ("join", JOIN),
        ("inner", INNER),
        ("left", LEFT),
        ("right", RIGHT),
        ("full", FULL),
        ("outer", OUTER),
        ("on", ON),
        ("cross", CROSS),
    ])
});

/// Look up a scanned word in the keyword table
pub fn lookup_keyword(word: &str) -> Option<TokenType> {
    KEYWORDS.get(word).copied()
}

/// A Token represents a lexical unit in the SQL query
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<DataValue>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            token_type,
            lexeme: lexeme.into(),
            literal: None,
            line,
            column,
        }
    }

    pub fn with_literal(mut self, literal: DataValue) -> Self {
        self.literal = Some(literal);
        self
    }

    /// Source position formatted as `line:column`
    pub fn position(&self) -> String {
        format!("{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.token_type == TokenType::EOF {
            write!(f, "end of input at {}", self.position())
        } else {
            write!(f, "'{}' at {}", self.lexeme, self.position())
        }
    }
}

/// Scanning failures. Both are fatal for the whole scan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Unterminated string literal starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("Unexpected character '{character}' at {line}:{column}")]
    UnexpectedCharacter { character: char, line: usize, column: usize },

    #[error("Invalid number literal '{lexeme}' at {line}:{column}")]
    InvalidNumber { lexeme: String, line: usize, column: usize },
}

/// SQL Lexer for breaking a query string into tokens.
///
/// The lexer is an iterator of `Result<Token, ScanError>`: it yields exactly one
/// `EOF` token at the end, or a single error, and then stops.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer from a SQL query string
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Scan the whole input eagerly
    pub fn tokenize(input: &str) -> Result<Vec<Token>, ScanError> {
        Lexer::new(input).collect()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    /// Consume the current character, keeping line/column in sync
    fn read_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn lexeme_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Produce the next token, or the scanning error that ends the stream
    pub fn next_token(&mut self) -> Result<Token, ScanError> {
        self.skip_whitespace();

        let (start, line, column) = (self.position, self.line, self.column);

        let ch = match self.read_char() {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenType::EOF, "", line, column)),
        };

        let token_type = match ch {
            '+' => TokenType::PLUS,
            '-' if self.peek_char() == Some('-') => return Ok(self.read_comment(start, line, column)),
            '-' => TokenType::MINUS,
            '*' => TokenType::MULTIPLY,
            '/' => TokenType::DIVIDE,
            '%' => TokenType::MODULO,
            '=' => TokenType::EQUALS,
            '.' => TokenType::DOT,
            ',' => TokenType::COMMA,
            ';' => TokenType::SEMICOLON,
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '<' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    TokenType::LessEqual
                }
                Some('>') => {
                    self.read_char();
                    TokenType::NotEqual
                }
                _ => TokenType::LessThan,
            },
            '>' => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    TokenType::GreaterEqual
                } else {
                    TokenType::GreaterThan
                }
            }
            '\'' => return self.read_string(start, line, column),
            c if c.is_ascii_digit() => return self.read_number(start, line, column),
            c if c == '_' || c.is_ascii_alphabetic() => return Ok(self.read_identifier(start, line, column)),
            character => return Err(ScanError::UnexpectedCharacter { character, line, column }),
        };

        Ok(Token::new(token_type, self.lexeme_from(start), line, column))
    }

    /// `--` up to (not including) the end of the line
    fn read_comment(&mut self, start: usize, line: usize, column: usize) -> Token {
        self.read_char();

        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.read_char();
        }

        let lexeme = self.lexeme_from(start);
        let body = lexeme[2..].to_string();
        Token::new(TokenType::COMMENT, lexeme, line, column).with_literal(DataValue::Text(body))
    }

    fn read_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.read_char();
        }
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Result<Token, ScanError> {
        self.read_digits();

        if self.peek_char() == Some('.') && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.read_char();
            self.read_digits();
        }

        let lexeme = self.lexeme_from(start);
        let value = lexeme
            .parse::<f64>()
            .map_err(|_| ScanError::InvalidNumber { lexeme: lexeme.clone(), line, column })?;

        Ok(Token::new(TokenType::NUMBER, lexeme, line, column).with_literal(DataValue::Number(value)))
    }

    /// Quoted string, `''` stands for a single quote
    fn read_string(&mut self, start: usize, line: usize, column: usize) -> Result<Token, ScanError> {
        let mut value = String::new();

        loop {
            match self.read_char() {
                Some('\'') if self.peek_char() == Some('\'') => {
                    self.read_char();
                    value.push('\'');
                }
                Some('\'') => break,
                Some('\n') | None => return Err(ScanError::UnterminatedString { line, column }),
                Some(ch) => value.push(ch),
            }
        }

        Ok(Token::new(TokenType::STRING, self.lexeme_from(start), line, column)
            .with_literal(DataValue::Text(value)))
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(ch) = self.peek_char() {
            if !(ch == '_' || ch.is_ascii_alphanumeric()) {
                break;
            }
            self.read_char();
        }

        let lexeme = self.lexeme_from(start);
        let token = match lookup_keyword(&lexeme) {
            Some(TokenType::TRUE) => Token::new(TokenType::TRUE, lexeme, line, column).with_literal(DataValue::Boolean(true)),
            Some(TokenType::FALSE) => Token::new(TokenType::FALSE, lexeme, line, column).with_literal(DataValue::Boolean(false)),
            Some(TokenType::NULL) => Token::new(TokenType::NULL, lexeme, line, column).with_literal(DataValue::Null),
            Some(keyword) => Token::new(keyword, lexeme, line, column),
            None => Token::new(TokenType::IDENTIFIER, lexeme, line, column),
        };

        trace!("scanned {:?} {}", token.token_type, token);
        token
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_token();
        match &result {
            Ok(token) if token.token_type == TokenType::EOF => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }

        Some(result)
    }
}
