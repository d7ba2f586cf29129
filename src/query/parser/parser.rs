// SQL Parser Entry Points
//
// Convenience functions that scan and parse query text in one step.

use super::ast::Statement;
use super::components::{Parser, ParseResult};

/// Parse a single SELECT statement covering the whole input
pub fn parse(sql: &str) -> ParseResult<Statement> {
    Parser::new(sql)?.parse()
}

/// Parse a `;`-separated sequence of statements
pub fn parse_all(sql: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(sql)?.parse_all()
}
