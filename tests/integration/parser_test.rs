use anyhow::{anyhow, Result};

use dataselector::catalog::DataValue;
use dataselector::query::parser::ast::{
    Expression, JoinType, LogicalOperator, Operator, SelectStatement, SortDirection, Statement, TableSource,
    UnaryOperator,
};
use dataselector::query::parser::{parse, parse_all, ParseError, Parser};

fn select(sql: &str) -> Result<SelectStatement> {
    let statement = parse(sql).map_err(|e| anyhow!("Parse error: {}", e))?;
    let Statement::Select(select) = statement;
    Ok(select)
}

#[test]
fn test_simple_select_query() -> Result<()> {
    let select = select("select field1, field2 from filter_collection where field1 > 5")?;

    assert_eq!(select.columns.len(), 2);
    match &select.from.as_ref().map(|f| &f.source) {
        Some(TableSource::Table { name, .. }) => assert_eq!(name, "filter_collection"),
        other => panic!("Expected table source, got {:?}", other),
    }

    match select.where_clause.as_deref() {
        Some(Expression::Binary { op, .. }) => assert_eq!(*op, Operator::GreaterThan),
        other => panic!("Expected binary operation in WHERE clause, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_operator_precedence() -> Result<()> {
    let select = select("select 1 + 2 * 3 = 7 and not false or true")?;

    // ((1 + (2 * 3)) = 7 and not false) or true
    let Expression::Logical { op: LogicalOperator::Or, left, .. } = &select.columns[0].expr else {
        panic!("Expected 'or' at the top");
    };
    let Expression::Logical { op: LogicalOperator::And, left, right, .. } = left.as_ref() else {
        panic!("Expected 'and' under 'or'");
    };
    assert!(matches!(right.as_ref(), Expression::Unary { op: UnaryOperator::Not, .. }));

    let Expression::Binary { op: Operator::Equals, left, .. } = left.as_ref() else {
        panic!("Expected '=' under 'and'");
    };
    let Expression::Binary { op: Operator::Plus, right, .. } = left.as_ref() else {
        panic!("Expected '+' under '='");
    };
    assert!(matches!(right.as_ref(), Expression::Binary { op: Operator::Multiply, .. }));

    Ok(())
}

#[test]
fn test_postfix_predicates() -> Result<()> {
    let select = select(
        "select a from t where a in (1, 2) and a not between 1 and 3 \
         and b like 'x%' and b not ilike 'y%' and c is null and c is not null",
    )?;

    let mut found = Vec::new();
    collect_kinds(select.where_clause.as_deref().ok_or_else(|| anyhow!("missing where"))?, &mut found);

    assert_eq!(found, vec!["in", "not between", "like", "not ilike", "is null", "not is null"]);
    Ok(())
}

fn collect_kinds(expr: &Expression, found: &mut Vec<&'static str>) {
    match expr {
        Expression::Logical { left, right, .. } => {
            collect_kinds(left, found);
            collect_kinds(right, found);
        }
        Expression::In { .. } => found.push("in"),
        Expression::Like { case_insensitive: false, .. } => found.push("like"),
        Expression::IsNull { .. } => found.push("is null"),
        Expression::Unary { op: UnaryOperator::Not, expr, .. } => match expr.as_ref() {
            Expression::Between { .. } => found.push("not between"),
            Expression::Like { case_insensitive: true, .. } => found.push("not ilike"),
            Expression::IsNull { .. } => found.push("not is null"),
            _ => found.push("not"),
        },
        _ => found.push("other"),
    }
}

#[test]
fn test_case_and_calls() -> Result<()> {
    let select = select("select case when a > 1 then 'big' else 'small' end, round(avg(a), 2), count(*) from t")?;

    match &select.columns[0].expr {
        Expression::Case { whens, thens, else_branch, .. } => {
            assert_eq!(whens.len(), 1);
            assert_eq!(thens.len(), 1);
            assert!(else_branch.is_some());
        }
        other => panic!("Expected case expression, got {:?}", other),
    }

    assert_eq!(select.columns[1].expr.function_name(), Some("round"));
    match &select.columns[2].expr {
        Expression::Call { args, star, .. } => {
            assert!(args.is_empty());
            assert!(*star);
        }
        other => panic!("Expected call, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_joins_and_subqueries() -> Result<()> {
    let select = select(
        "select a.field1, b.field2 from test_collection a \
         inner join filter_collection b on a.field1 = b.field1 \
         left join (select field1 from test_collection) c on c.field1 = a.field1, \
         filter_collection d",
    )?;

    let types: Vec<_> = select.joins.iter().map(|j| j.join_type).collect();
    assert_eq!(types, vec![JoinType::Inner, JoinType::Left, JoinType::Cross]);
    assert!(matches!(select.joins[1].table.source, TableSource::Subquery(_)));
    assert!(select.joins[2].condition.is_none());

    Ok(())
}

#[test]
fn test_order_by_limit_offset() -> Result<()> {
    let select = select("select field1 from t order by t.field1 desc, field2 limit 1 + 1 offset 2")?;

    assert_eq!(select.order_by.len(), 2);
    assert_eq!(select.order_by[0].column.table.as_deref(), Some("t"));
    assert_eq!(select.order_by[0].direction, SortDirection::Descending);
    assert_eq!(select.order_by[1].direction, SortDirection::Ascending);
    assert!(matches!(select.limit.as_deref(), Some(Expression::Binary { .. })));
    assert!(matches!(
        select.offset.as_deref(),
        Some(Expression::Literal { value: DataValue::Number(n), .. }) if *n == 2.0
    ));

    Ok(())
}

#[test]
fn test_syntax_errors_carry_positions() -> Result<()> {
    let err = parse("select field1\nfrom where").unwrap_err();
    let token = err.token().ok_or_else(|| anyhow!("error without token: {}", err))?;
    assert_eq!((token.line, token.column), (2, 6));

    assert!(matches!(parse("select from t"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse("select * "), Err(ParseError::InvalidSyntax { .. })));
    assert!(matches!(parse("select 'open"), Err(ParseError::Scan(_))));
    assert!(matches!(parse("select case end"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse("select a from t x y"), Err(ParseError::UnexpectedToken { .. })));

    Ok(())
}

#[test]
fn test_statement_separators() -> Result<()> {
    assert!(parse("select 1;").is_ok());
    assert!(parse("select 1 select 2").is_err());
    assert_eq!(parse_all("select 1; select 2;")?.len(), 2);

    let mut parser = Parser::new("select 1; select 2")?;
    parser.parse_statement()?;
    parser.parse_statement()?;
    assert!(parser.is_at_end());

    Ok(())
}

#[test]
fn test_reparse_is_structurally_equal() -> Result<()> {
    let sql = "select a.field1 f, count() from test_collection a group by a.field1 having count() > 1 order by f";
    assert_eq!(parse(sql)?, parse(sql)?);
    Ok(())
}
