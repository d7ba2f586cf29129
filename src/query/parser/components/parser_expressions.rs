// Expression Parser Implementation
//
// This module implements recursive descent expression parsing. Precedence,
// lowest first: or, and, equality, comparison, additive, multiplicative,
// unary, postfix (in / between / like / is null), call, primary.

use crate::catalog::value::DataValue;
use crate::query::parser::ast::*;
use crate::query::parser::lexer::TokenType;
use super::parser_core::{Parser, ParseResult};
use super::parser_select::parse_select;

/// Parse a full expression
pub fn parse_expression(parser: &mut Parser) -> ParseResult<Expression> {
    parse_or(parser)
}

fn parse_or(parser: &mut Parser) -> ParseResult<Expression> {
    let mut left = parse_and(parser)?;

    while parser.current_token_is(TokenType::OR) {
        let token = parser.advance()?;
        let right = parse_and(parser)?;
        left = Expression::Logical {
            token,
            left: Box::new(left),
            op: LogicalOperator::Or,
            right: Box::new(right),
        };
    }

    Ok(left)
}

fn parse_and(parser: &mut Parser) -> ParseResult<Expression> {
    let mut left = parse_equality(parser)?;

    while parser.current_token_is(TokenType::AND) {
        let token = parser.advance()?;
        let right = parse_equality(parser)?;
        left = Expression::Logical {
            token,
            left: Box::new(left),
            op: LogicalOperator::And,
            right: Box::new(right),
        };
    }

    Ok(left)
}

/// Map a binary operator token to its operator
fn binary_operator(token_type: TokenType) -> Option<Operator> {
    match token_type {
        TokenType::EQUALS => Some(Operator::Equals),
        TokenType::NotEqual => Some(Operator::NotEquals),
        TokenType::LessThan => Some(Operator::LessThan),
        TokenType::GreaterThan => Some(Operator::GreaterThan),
        TokenType::LessEqual => Some(Operator::LessEquals),
        TokenType::GreaterEqual => Some(Operator::GreaterEquals),
        TokenType::PLUS => Some(Operator::Plus),
        TokenType::MINUS => Some(Operator::Minus),
        TokenType::MULTIPLY => Some(Operator::Multiply),
        TokenType::DIVIDE => Some(Operator::Divide),
        TokenType::MODULO => Some(Operator::Modulo),
        _ => None,
    }
}

/// One left-associative binary precedence level
fn parse_binary_level(
    parser: &mut Parser,
    operators: &[TokenType],
    operand: fn(&mut Parser) -> ParseResult<Expression>,
) -> ParseResult<Expression> {
    let mut left = operand(parser)?;

    while parser.current_token_in(operators) {
        let token = parser.advance()?;
        let op = match binary_operator(token.token_type) {
            Some(op) => op,
            None => return Err(parser.invalid(format!("'{}' is not a binary operator", token.lexeme))),
        };
        let right = operand(parser)?;
        left = Expression::Binary {
            token,
            left: Box::new(left),
            op,
            right: Box::new(right),
        };
    }

    Ok(left)
}

fn parse_equality(parser: &mut Parser) -> ParseResult<Expression> {
    parse_binary_level(parser, &[TokenType::EQUALS, TokenType::NotEqual], parse_comparison)
}

fn parse_comparison(parser: &mut Parser) -> ParseResult<Expression> {
    parse_binary_level(
        parser,
        &[TokenType::LessThan, TokenType::LessEqual, TokenType::GreaterThan, TokenType::GreaterEqual],
        parse_additive,
    )
}

fn parse_additive(parser: &mut Parser) -> ParseResult<Expression> {
    parse_binary_level(parser, &[TokenType::PLUS, TokenType::MINUS], parse_multiplicative)
}

fn parse_multiplicative(parser: &mut Parser) -> ParseResult<Expression> {
    parse_binary_level(
        parser,
        &[TokenType::MULTIPLY, TokenType::DIVIDE, TokenType::MODULO],
        parse_unary,
    )
}

fn parse_unary(parser: &mut Parser) -> ParseResult<Expression> {
    let op = if parser.current_token_is(TokenType::NOT) {
        UnaryOperator::Not
    } else if parser.current_token_is(TokenType::MINUS) {
        UnaryOperator::Minus
    } else {
        return parse_postfix(parser);
    };

    let token = parser.advance()?;
    let expr = parse_unary(parser)?;

    Ok(Expression::Unary { token, op, expr: Box::new(expr) })
}

/// Postfix predicates, optionally negated with a leading `not`
fn parse_postfix(parser: &mut Parser) -> ParseResult<Expression> {
    let mut expr = parse_call(parser)?;

    let not = if parser.current_token_is(TokenType::NOT) {
        Some(parser.advance()?)
    } else {
        None
    };

    let token_type = parser.current()?.token_type;
    expr = match token_type {
        TokenType::IN => parse_in(parser, expr)?,
        TokenType::BETWEEN => parse_between(parser, expr)?,
        TokenType::LIKE | TokenType::ILIKE => parse_like(parser, expr)?,
        _ if not.is_some() => {
            return Err(parser.unexpected("Expected 'in', 'between' or 'like' after 'not'"));
        }
        _ => expr,
    };

    if let Some(token) = not {
        expr = Expression::Unary { token, op: UnaryOperator::Not, expr: Box::new(expr) };
    }

    while parser.current_token_is(TokenType::IS) {
        expr = parse_is_null(parser, expr)?;
    }

    Ok(expr)
}

fn parse_in(parser: &mut Parser, value: Expression) -> ParseResult<Expression> {
    let token = parser.expect_token(TokenType::IN, "Expected 'in' keyword")?;
    parser.expect_token(TokenType::LeftParen, "Expected '(' at the start of 'in' list")?;

    let list = if parser.current_token_is(TokenType::SELECT) {
        vec![Expression::Subquery(Box::new(parse_select(parser)?))]
    } else {
        if parser.current_token_is(TokenType::RightParen) {
            return Err(parser.invalid("'in' list can't be empty"));
        }
        parse_expression_list(parser)?
    };

    parser.expect_token(TokenType::RightParen, "Expected ')' at the end of 'in' list")?;

    Ok(Expression::In { token, value: Box::new(value), list })
}

fn parse_between(parser: &mut Parser, value: Expression) -> ParseResult<Expression> {
    let token = parser.expect_token(TokenType::BETWEEN, "Expected 'between' keyword")?;
    let low = parse_additive(parser)?;
    parser.expect_token(TokenType::AND, "Expected 'and' after the lower 'between' bound")?;
    let high = parse_additive(parser)?;

    Ok(Expression::Between {
        token,
        value: Box::new(value),
        low: Box::new(low),
        high: Box::new(high),
    })
}

fn parse_like(parser: &mut Parser, value: Expression) -> ParseResult<Expression> {
    let token = parser.advance()?;
    let case_insensitive = token.token_type == TokenType::ILIKE;
    let pattern = parse_additive(parser)?;

    Ok(Expression::Like {
        token,
        value: Box::new(value),
        pattern: Box::new(pattern),
        case_insensitive,
    })
}

/// `is null`, and `is not null` as its negation
fn parse_is_null(parser: &mut Parser, expr: Expression) -> ParseResult<Expression> {
    let token = parser.expect_token(TokenType::IS, "Expected 'is' keyword")?;

    let not = if parser.current_token_is(TokenType::NOT) {
        Some(parser.advance()?)
    } else {
        None
    };

    parser.expect_token(TokenType::NULL, "Expected 'null' after 'is'")?;

    let test = Expression::IsNull { token, expr: Box::new(expr) };
    Ok(match not {
        Some(token) => Expression::Unary { token, op: UnaryOperator::Not, expr: Box::new(test) },
        None => test,
    })
}

/// Primary expression followed by any number of call suffixes
fn parse_call(parser: &mut Parser) -> ParseResult<Expression> {
    let mut expr = parse_primary(parser)?;

    while parser.current_token_is(TokenType::LeftParen) {
        let token = parser.advance()?;
        let mut args = Vec::new();
        let mut star = false;

        if parser.current_token_is(TokenType::MULTIPLY) {
            parser.advance()?;
            star = true;
        } else if !parser.current_token_is(TokenType::RightParen) {
            args = parse_expression_list(parser)?;
        }

        parser.expect_token(TokenType::RightParen, "Expected ')' after call arguments")?;

        expr = Expression::Call { token, callee: Box::new(expr), args, star };
    }

    Ok(expr)
}

fn parse_primary(parser: &mut Parser) -> ParseResult<Expression> {
    let token_type = parser.current()?.token_type;

    match token_type {
        TokenType::LeftParen => {
            if parser.peek_token_is(TokenType::SELECT) {
                parser.advance()?;
                let select = parse_select(parser)?;
                parser.expect_token(TokenType::RightParen, "Expected ')' after subquery")?;
                Ok(Expression::Subquery(Box::new(select)))
            } else {
                let token = parser.advance()?;
                let expr = parse_expression(parser)?;
                parser.expect_token(TokenType::RightParen, "Expected ')' at the end of the grouping")?;
                Ok(Expression::Grouping { token, expr: Box::new(expr) })
            }
        }
        TokenType::SELECT => Ok(Expression::Subquery(Box::new(parse_select(parser)?))),
        TokenType::EXISTS => {
            let token = parser.advance()?;
            parser.expect_token(TokenType::LeftParen, "Expected '(' after 'exists'")?;
            let subquery = parse_select(parser)?;
            parser.expect_token(TokenType::RightParen, "Expected ')' after 'exists' subquery")?;
            Ok(Expression::Exists { token, subquery: Box::new(subquery) })
        }
        TokenType::CASE => parse_case(parser),
        TokenType::IDENTIFIER => Ok(Expression::Column(parse_column_reference(parser)?)),
        TokenType::NOT | TokenType::MINUS => parse_unary(parser),
        TokenType::ALL => Err(parser.unsupported("all")),
        TokenType::ANY => Err(parser.unsupported("any")),
        TokenType::NUMBER | TokenType::STRING | TokenType::TRUE | TokenType::FALSE | TokenType::NULL => {
            let token = parser.advance()?;
            let value = token.literal.clone().unwrap_or(DataValue::Null);
            Ok(Expression::Literal { token, value })
        }
        _ => Err(parser.unexpected("Expected expression")),
    }
}

/// `name` or `table.name`
pub fn parse_column_reference(parser: &mut Parser) -> ParseResult<ColumnReference> {
    let first = parser.parse_identifier()?;

    if parser.current_token_is(TokenType::DOT) {
        parser.advance()?;
        let column = parser.expect_token(TokenType::IDENTIFIER, "Expected column name after '.'")?;
        return Ok(ColumnReference {
            name: column.lexeme.clone(),
            token: column,
            table: Some(first.lexeme),
        });
    }

    Ok(ColumnReference {
        name: first.lexeme.clone(),
        token: first,
        table: None,
    })
}

fn parse_case(parser: &mut Parser) -> ParseResult<Expression> {
    let token = parser.expect_token(TokenType::CASE, "Expected 'case' keyword")?;
    let mut whens = Vec::new();
    let mut thens = Vec::new();

    while parser.current_token_is(TokenType::WHEN) {
        parser.advance()?;
        whens.push(parse_expression(parser)?);
        parser.expect_token(TokenType::THEN, "Expected 'then' after 'when' condition")?;
        thens.push(parse_expression(parser)?);
    }

    if whens.is_empty() {
        return Err(parser.unexpected("Expected 'when' branch in 'case' expression"));
    }

    let else_branch = if parser.current_token_is(TokenType::ELSE) {
        parser.advance()?;
        Some(Box::new(parse_expression(parser)?))
    } else {
        None
    };

    parser.expect_token(TokenType::END, "Expected 'end' at the end of 'case' expression")?;

    Ok(Expression::Case { token, whens, thens, else_branch })
}

/// Comma separated expressions, at least one
pub fn parse_expression_list(parser: &mut Parser) -> ParseResult<Vec<Expression>> {
    let mut expressions = vec![parse_expression(parser)?];

    while parser.current_token_is(TokenType::COMMA) {
        parser.advance()?;
        expressions.push(parse_expression(parser)?);
    }

    Ok(expressions)
}
