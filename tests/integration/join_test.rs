#[path = "../common/mod.rs"]
mod common;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{column, create_test_engine, numbers, run, texts};
use dataselector::catalog::{DataValue, Table};
use dataselector::query::executor::QueryError;
use dataselector::ExecutionEngine;

#[test]
fn test_inner_join() -> Result<()> {
    let mut engine = create_test_engine();

    let result = run(
        &mut engine,
        "select a.field1, b.field2 from test_collection a join filter_collection b on a.field1 = b.field1",
    )?;

    assert_eq!(column(&result, 0), numbers(&[6.0, 7.0, 7.0, 8.0]));
    assert_eq!(column(&result, 1), texts(&["test1", "Test2", "Test2", "Test3"]));

    // `inner join` is the same join
    let inner = run(
        &mut engine,
        "select a.field1, b.field2 from test_collection a inner join filter_collection b on a.field1 = b.field1",
    )?;
    assert_eq!(inner.value_rows(), result.value_rows());

    Ok(())
}

#[test]
fn test_left_join_null_extends() -> Result<()> {
    let mut engine = create_test_engine();

    let result = run(
        &mut engine,
        "select a.field1, b.field2 from test_collection a left join filter_collection b on a.field1 = b.field1",
    )?;

    assert_eq!(column(&result, 0), numbers(&[1.0, 6.0, 7.0, 7.0, 8.0]));
    assert_eq!(
        column(&result, 1),
        vec![
            DataValue::Null,
            DataValue::from("test1"),
            DataValue::from("Test2"),
            DataValue::from("Test2"),
            DataValue::from("Test3"),
        ]
    );

    let unmatched = run(
        &mut engine,
        "select a.field1 from test_collection a left outer join filter_collection b on a.field1 = b.field1 \
         where b.field2 is null",
    )?;
    assert_eq!(column(&unmatched, 0), numbers(&[1.0]));

    Ok(())
}

#[test]
fn test_cross_and_comma_joins() -> Result<()> {
    let mut engine = create_test_engine();

    let cross = run(
        &mut engine,
        "select a.field1, b.field1 from test_collection a cross join filter_collection b",
    )?;
    assert_eq!(cross.len(), 20);

    let comma = run(&mut engine, "select a.field1, b.field1 from test_collection a, filter_collection b")?;
    assert_eq!(comma.value_rows(), cross.value_rows());

    // a comma join filtered in where behaves like an inner join
    let filtered = run(
        &mut engine,
        "select a.field1 from test_collection a, filter_collection b where a.field1 = b.field1",
    )?;
    assert_eq!(column(&filtered, 0), numbers(&[6.0, 7.0, 7.0, 8.0]));

    Ok(())
}

#[test]
fn test_self_join() -> Result<()> {
    let mut engine = create_test_engine();

    let result = run(
        &mut engine,
        "select a.field1 from test_collection a join test_collection b on a.field1 = b.field1",
    )?;
    assert_eq!(column(&result, 0), numbers(&[1.0, 6.0, 7.0, 7.0, 7.0, 7.0, 8.0]));

    Ok(())
}

#[test]
fn test_join_on_subquery() -> Result<()> {
    let mut engine = create_test_engine();

    let result = run(
        &mut engine,
        "select b.field2, c.field1 from filter_collection b \
         join (select field1 from test_collection where field1 > 6) c on c.field1 = b.field1",
    )?;

    assert_eq!(column(&result, 0), texts(&["Test2", "Test2", "Test3"]));
    assert_eq!(column(&result, 1), numbers(&[7.0, 7.0, 8.0]));

    Ok(())
}

#[test]
fn test_three_way_join() -> Result<()> {
    let mut engine = create_test_engine();

    let result = run(
        &mut engine,
        "select a.field1, c.field2 from test_collection a \
         join filter_collection b on a.field1 = b.field1 \
         join filter_collection c on c.field1 = b.field1 + 1",
    )?;

    assert_eq!(column(&result, 0), numbers(&[6.0, 7.0, 7.0, 8.0]));
    assert_eq!(column(&result, 1), texts(&["Test2", "Test3", "Test3", "Test4"]));

    Ok(())
}

#[test]
fn test_unqualified_names_across_a_join() -> Result<()> {
    let mut engine = create_test_engine();

    // field2 only exists on one side
    let result = run(
        &mut engine,
        "select field2 from test_collection a join filter_collection b on a.field1 = b.field1 where field2 like 'T%'",
    )?;
    assert_eq!(column(&result, 0), texts(&["Test2", "Test2", "Test3"]));

    assert!(matches!(
        engine.execute_query("select field1 from test_collection a join filter_collection b on a.field1 = b.field1"),
        Err(QueryError::AmbiguousColumn(_))
    ));

    Ok(())
}

#[test]
fn test_join_errors() {
    let mut engine = create_test_engine();

    assert!(matches!(
        engine.execute_query("select a.field1 from test_collection a join filter_collection on a.field1 = 1"),
        Err(QueryError::MissingAlias(_))
    ));
    assert!(matches!(
        engine.execute_query("select a.field1 from test_collection a right join filter_collection b on a.field1 = b.field1"),
        Err(QueryError::UnsupportedJoinType(_))
    ));
    assert!(matches!(
        engine.execute_query("select a.field1 from test_collection a full outer join filter_collection b on a.field1 = b.field1"),
        Err(QueryError::UnsupportedJoinType(_))
    ));
    assert!(matches!(
        engine.execute_query("select a.field1 from test_collection a join filter_collection b"),
        Err(QueryError::MissingJoinCondition(_))
    ));
    assert!(matches!(
        engine.execute_query("select a.field1 from test_collection a join filter_collection a on a.field1 = 1"),
        Err(QueryError::DuplicateAlias(_))
    ));
}

fn random_table(rng: &mut StdRng, name: &str, rows: usize) -> Table {
    let values = (0..rows)
        .map(|_| vec![DataValue::Number(rng.gen_range(0..5) as f64)])
        .collect();
    Table::from_values(name, vec!["k".to_string()], values).expect("one value per row")
}

fn matches_of(value: &DataValue, right: &[DataValue]) -> usize {
    right.iter().filter(|r| *r == value).count()
}

#[test]
fn test_join_cardinality_on_random_tables() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let (left_rows, right_rows) = (rng.gen_range(0..20), rng.gen_range(0..20));
        let left = random_table(&mut rng, "l", left_rows);
        let right = random_table(&mut rng, "r", right_rows);

        let left_keys = column(&left, 0);
        let right_keys = column(&right, 0);
        let expected_inner: usize = left_keys.iter().map(|k| matches_of(k, &right_keys)).sum();
        let expected_left: usize = left_keys.iter().map(|k| matches_of(k, &right_keys).max(1)).sum();

        let mut engine = ExecutionEngine::new(vec![("l".to_string(), left.clone()), ("r".to_string(), right.clone())]);

        let inner = run(&mut engine, "select a.k from l a join r b on a.k = b.k")?;
        assert_eq!(inner.len(), expected_inner);

        let outer = run(&mut engine, "select a.k from l a left join r b on a.k = b.k")?;
        assert_eq!(outer.len(), expected_left);

        let cross = run(&mut engine, "select a.k from l a cross join r b")?;
        assert_eq!(cross.len(), left.len() * right.len());
    }

    Ok(())
}
