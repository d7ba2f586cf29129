// SELECT Statement Parser Implementation
//
// This module implements parsing for SQL SELECT statements and their
// FROM / JOIN / GROUP BY / ORDER BY clauses.

use crate::query::parser::ast::*;
use crate::query::parser::lexer::TokenType;
use super::parser_core::{Parser, ParseResult};
use super::parser_expressions::{parse_column_reference, parse_expression, parse_expression_list};

/// Parse a SELECT statement (top level or nested)
pub fn parse_select(parser: &mut Parser) -> ParseResult<SelectStatement> {
    let token = parser.expect_token(TokenType::SELECT, "Expected 'select' at the start of a query")?;

    if parser.current_token_is(TokenType::DISTINCT) {
        return Err(parser.unsupported("select distinct"));
    }

    let star_select = parser.current_token_is(TokenType::MULTIPLY);
    let columns = if star_select {
        parser.advance()?;
        Vec::new()
    } else {
        parse_select_columns(parser)?
    };

    let mut select = SelectStatement {
        token,
        star_select,
        columns,
        from: None,
        joins: Vec::new(),
        where_clause: None,
        group_by: Vec::new(),
        having: None,
        order_by: Vec::new(),
        limit: None,
        offset: None,
    };

    if !parser.current_token_is(TokenType::FROM) {
        if star_select {
            return Err(parser.invalid("Can't select '*' without a 'from' clause"));
        }
        reject_set_operation(parser)?;
        return Ok(select);
    }

    parser.advance()?;
    select.from = Some(parse_table_reference(parser)?);

    while parser.current_token_in(&[
        TokenType::JOIN,
        TokenType::INNER,
        TokenType::LEFT,
        TokenType::RIGHT,
        TokenType::FULL,
        TokenType::CROSS,
        TokenType::COMMA,
    ]) {
        select.joins.push(parse_join_clause(parser)?);
    }

    if parser.current_token_is(TokenType::WHERE) {
        parser.advance()?;
        select.where_clause = Some(Box::new(parse_expression(parser)?));
    }

    if parser.current_token_is(TokenType::GROUP) {
        parser.advance()?;
        parser.expect_token(TokenType::BY, "Expected 'by' after 'group'")?;
        select.group_by = parse_expression_list(parser)?;
    }

    if parser.current_token_is(TokenType::HAVING) {
        parser.advance()?;
        select.having = Some(Box::new(parse_expression(parser)?));
    }

    if parser.current_token_is(TokenType::ORDER) {
        select.order_by = parse_order_by_clause(parser)?;
    }

    if parser.current_token_is(TokenType::LIMIT) {
        parser.advance()?;
        select.limit = Some(Box::new(parse_expression(parser)?));
    }

    if parser.current_token_is(TokenType::OFFSET) {
        parser.advance()?;
        select.offset = Some(Box::new(parse_expression(parser)?));
    }

    reject_set_operation(parser)?;
    Ok(select)
}

fn reject_set_operation(parser: &Parser) -> ParseResult<()> {
    let feature = match parser.current()?.token_type {
        TokenType::UNION => "union",
        TokenType::INTERSECT => "intersect",
        TokenType::EXCEPT => "except",
        _ => return Ok(()),
    };
    Err(parser.unsupported(feature))
}

/// Parse SELECT column list
fn parse_select_columns(parser: &mut Parser) -> ParseResult<Vec<SelectColumn>> {
    let mut columns = Vec::new();

    loop {
        let expr = parse_expression(parser)?;
        let alias = parse_optional_alias(parser)?;
        columns.push(SelectColumn { expr, alias });

        if !parser.current_token_is(TokenType::COMMA) {
            break;
        }
        parser.advance()?;
    }

    Ok(columns)
}

/// `as name` or a bare `name`
fn parse_optional_alias(parser: &mut Parser) -> ParseResult<Option<String>> {
    if parser.current_token_is(TokenType::AS) {
        parser.advance()?;
        let alias = parser.expect_token(TokenType::IDENTIFIER, "Expected alias after 'as'")?;
        return Ok(Some(alias.lexeme));
    }

    if parser.current_token_is(TokenType::IDENTIFIER) {
        return Ok(Some(parser.advance()?.lexeme));
    }

    Ok(None)
}

/// Parse a single table reference: a bound table name or a parenthesized subquery
fn parse_table_reference(parser: &mut Parser) -> ParseResult<TableReference> {
    let token = parser.current()?.clone();

    let source = match token.token_type {
        TokenType::IDENTIFIER => {
            let name = parser.advance()?;
            TableSource::Table { name: name.lexeme.clone(), token: name }
        }
        TokenType::LeftParen if parser.peek_token_is(TokenType::SELECT) => {
            parser.advance()?;
            let select = parse_select(parser)?;
            parser.expect_token(TokenType::RightParen, "Expected ')' after subquery")?;
            TableSource::Subquery(Box::new(select))
        }
        _ => return Err(parser.unexpected("Expected table name or subquery as table reference")),
    };

    let alias = parse_optional_alias(parser)?;

    Ok(TableReference { token, source, alias })
}

/// Parse a JOIN clause; a comma is a cross join
fn parse_join_clause(parser: &mut Parser) -> ParseResult<JoinClause> {
    let token = parser.advance()?;

    let join_type = match token.token_type {
        TokenType::COMMA => JoinType::Cross,
        TokenType::JOIN => JoinType::Inner,
        TokenType::INNER => JoinType::Inner,
        TokenType::CROSS => JoinType::Cross,
        TokenType::LEFT => JoinType::Left,
        TokenType::RIGHT => JoinType::Right,
        TokenType::FULL => JoinType::Full,
        _ => return Err(parser.invalid(format!("'{}' does not start a join", token.lexeme))),
    };

    if matches!(token.token_type, TokenType::LEFT | TokenType::RIGHT | TokenType::FULL)
        && parser.current_token_is(TokenType::OUTER)
    {
        parser.advance()?;
    }

    if !matches!(token.token_type, TokenType::COMMA | TokenType::JOIN) {
        parser.expect_token(TokenType::JOIN, &format!("Expected 'join' after '{}'", token.lexeme))?;
    }

    let table = parse_table_reference(parser)?;

    let condition = if join_type != JoinType::Cross && parser.current_token_is(TokenType::ON) {
        parser.advance()?;
        Some(Box::new(parse_expression(parser)?))
    } else {
        None
    };

    Ok(JoinClause { token, join_type, table, condition })
}

/// Parse an ORDER BY clause
fn parse_order_by_clause(parser: &mut Parser) -> ParseResult<Vec<OrderByExpr>> {
    parser.expect_token(TokenType::ORDER, "Expected 'order'")?;
    parser.expect_token(TokenType::BY, "Expected 'by' after 'order'")?;

    let mut order_by = Vec::new();

    loop {
        let column = parse_column_reference(parser)?;
        let direction = if parser.current_token_is(TokenType::DESC) {
            parser.advance()?;
            SortDirection::Descending
        } else {
            if parser.current_token_is(TokenType::ASC) {
                parser.advance()?;
            }
            SortDirection::Ascending
        };

        order_by.push(OrderByExpr { column, direction });

        if !parser.current_token_is(TokenType::COMMA) {
            break;
        }
        parser.advance()?;
    }

    Ok(order_by)
}
