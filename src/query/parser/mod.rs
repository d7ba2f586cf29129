// SQL Parser Module
//
// This module is responsible for scanning SQL queries and converting them
// into an abstract syntax tree (AST) representation.

pub mod lexer;
pub mod ast;
pub mod components;
pub mod parser;

// Export key types
pub use self::components::{Parser, ParseError, ParseResult};
pub use self::lexer::{Lexer, ScanError, Token, TokenType};
pub use self::ast::Statement;
pub use self::parser::{parse, parse_all};
