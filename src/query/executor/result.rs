// Query Result Implementation
//
// This module defines the execution error taxonomy and the textual rendering
// of result tables.

use std::fmt;

use thiserror::Error;

use crate::catalog::table::Table;
use crate::query::parser::components::ParseError;
use crate::query::parser::lexer::ScanError;

/// Errors raised while executing a query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// `select *` is parsed but never evaluated
    #[error("Star select isn't supported")]
    StarSelectUnsupported,
    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    /// Column name matches several tables or columns
    #[error("Ambiguous column: {0}")]
    AmbiguousColumn(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Aggregate function {0} is only allowed in grouped queries")]
    AggregateOutsideGroupBy(String),
    #[error("Function {name} expects {expected} argument(s), got {actual}")]
    InvalidArgumentCount { name: String, expected: String, actual: usize },
    #[error("Malformed group by: {0}")]
    MalformedGroupBy(String),
    #[error("Can't use {0} as a grouping key")]
    InvalidGroupingKey(String),
    /// Limit or offset did not evaluate to a non-negative integer
    #[error("Invalid {clause}: {reason}")]
    InvalidLimit {
        clause: &'static str,
        #[source]
        reason: Box<QueryError>,
    },
    /// Column evaluated with no row bound
    #[error("Unresolved variable: {0}")]
    UnresolvedVariable(String),
    #[error("Unsupported join type: {0}")]
    UnsupportedJoinType(String),
    #[error("Missing 'on' condition for {0} join")]
    MissingJoinCondition(String),
    #[error("Alias {0} is already defined in this scope")]
    DuplicateAlias(String),
    #[error("Missing alias: {0}")]
    MissingAlias(String),
    /// Operand of the wrong type
    #[error("Type error: {0}")]
    TypeMismatch(String),
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Scalar subquery returned {0} rows")]
    ScalarSubquery(usize),
    /// Caller data could not be converted
    #[error("Conversion error: {0}")]
    ConversionError(String),
    /// Error during query execution
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

impl From<ScanError> for QueryError {
    fn from(err: ScanError) -> Self {
        QueryError::ParseError(ParseError::Scan(err))
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Render a table as a pipe-delimited text grid
pub fn to_string_table(table: &Table) -> String {
    if table.fields().is_empty() {
        return "Empty result\n".to_string();
    }

    let cells: Vec<Vec<String>> = table
        .iter()
        .map(|row| row.values().iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.len())
                .chain(std::iter::once(field.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut result = String::new();

    // Add column headers
    result.push('|');
    for (field, width) in table.fields().iter().zip(&widths) {
        result.push_str(&format!(" {:<width$} |", field, width = width));
    }
    result.push('\n');

    // Add separator
    result.push('|');
    for width in &widths {
        result.push_str(&format!("{}|", "-".repeat(width + 2)));
    }
    result.push('\n');

    // Add rows
    for row in &cells {
        result.push('|');
        for (cell, width) in row.iter().zip(&widths) {
            result.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        result.push('\n');
    }

    result
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_string_table(self))
    }
}
