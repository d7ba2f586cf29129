// Abstract Syntax Tree (AST) for SQL
//
// This module defines the AST nodes produced by the parser. Every expression
// variant keeps the token it was built from so that evaluation errors can
// point back at the query text.

use std::fmt;

use crate::catalog::value::DataValue;
use super::lexer::Token;

/// Top-level SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
}

/// SELECT statement representation. Also used for subqueries.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// The `select` keyword token
    pub token: Token,
    /// `select *`
    pub star_select: bool,
    /// Projections in SELECT clause, empty iff `star_select`
    pub columns: Vec<SelectColumn>,
    /// FROM clause table reference
    pub from: Option<TableReference>,
    /// JOIN clauses applied left to right onto `from`
    pub joins: Vec<JoinClause>,
    /// WHERE clause (optional)
    pub where_clause: Option<Box<Expression>>,
    /// GROUP BY keys
    pub group_by: Vec<Expression>,
    /// HAVING clause (optional)
    pub having: Option<Box<Expression>>,
    /// ORDER BY keys
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<Box<Expression>>,
    pub offset: Option<Box<Expression>>,
}

/// A projection with its optional output alias
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expression,
    pub alias: Option<String>,
}

/// Column reference (could be qualified with table name)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    /// Token of the column name
    pub token: Token,
    pub table: Option<String>,
    pub name: String,
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// What a FROM or JOIN clause reads from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A table bound by name
    Table { token: Token, name: String },
    /// A derived table
    Subquery(Box<SelectStatement>),
}

/// Table reference in FROM clause
#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub token: Token,
    pub source: TableSource,
    pub alias: Option<String>,
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Cross => "cross",
        };
        write!(f, "{}", name)
    }
}

/// JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Token that introduced the join (`left`, `inner`, `cross`, `join` or `,`)
    pub token: Token,
    pub join_type: JoinType,
    pub table: TableReference,
    pub condition: Option<Box<Expression>>,
}

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub column: ColumnReference,
    pub direction: SortDirection,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessEquals => "<=",
            Operator::GreaterEquals => ">=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
        };
        write!(f, "{}", symbol)
    }
}

/// Short-circuiting boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// Expression in SQL
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number, string, boolean or null literal
    Literal { token: Token, value: DataValue },
    /// Column reference
    Column(ColumnReference),
    /// Arithmetic or comparison
    Binary {
        token: Token,
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },
    /// `and` / `or`
    Logical {
        token: Token,
        left: Box<Expression>,
        op: LogicalOperator,
        right: Box<Expression>,
    },
    Unary {
        token: Token,
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    /// `value between low and high`, bounds inclusive
    Between {
        token: Token,
        value: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
    },
    /// `value in (a, b, ...)`
    In {
        token: Token,
        value: Box<Expression>,
        list: Vec<Expression>,
    },
    /// `value like pattern`, or `ilike` when `case_insensitive`
    Like {
        token: Token,
        value: Box<Expression>,
        pattern: Box<Expression>,
        case_insensitive: bool,
    },
    /// `expr is null`
    IsNull { token: Token, expr: Box<Expression> },
    Case {
        token: Token,
        whens: Vec<Expression>,
        thens: Vec<Expression>,
        else_branch: Option<Box<Expression>>,
    },
    /// Function call; `star` marks `f(*)`
    Call {
        token: Token,
        callee: Box<Expression>,
        args: Vec<Expression>,
        star: bool,
    },
    /// Parenthesized expression
    Grouping { token: Token, expr: Box<Expression> },
    Exists { token: Token, subquery: Box<SelectStatement> },
    /// Scalar subquery
    Subquery(Box<SelectStatement>),
}

impl Expression {
    /// The token the expression was built from
    pub fn token(&self) -> &Token {
        match self {
            Expression::Literal { token, .. }
            | Expression::Binary { token, .. }
            | Expression::Logical { token, .. }
            | Expression::Unary { token, .. }
            | Expression::Between { token, .. }
            | Expression::In { token, .. }
            | Expression::Like { token, .. }
            | Expression::IsNull { token, .. }
            | Expression::Case { token, .. }
            | Expression::Call { token, .. }
            | Expression::Grouping { token, .. }
            | Expression::Exists { token, .. } => token,
            Expression::Column(column) => &column.token,
            Expression::Subquery(select) => &select.token,
        }
    }

    /// Name of a called function when the callee is a bare identifier
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expression::Call { callee, .. } => match callee.as_ref() {
                Expression::Column(ColumnReference { table: None, name, .. }) => Some(name.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(select) => write!(f, "SELECT statement at {}", select.token.position()),
        }
    }
}
