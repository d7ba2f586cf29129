#![allow(dead_code)]

use anyhow::{anyhow, Result};
use dataselector::catalog::{DataValue, Table};
use dataselector::query::executor::engine::ExecutionEngine;

// field1 = 1, 6, 7, 7, 8
pub fn test_collection() -> Table {
    Table::from_values(
        "test_collection",
        vec!["field1".to_string()],
        [1.0, 6.0, 7.0, 7.0, 8.0]
            .iter()
            .map(|v| vec![DataValue::Number(*v)])
            .collect(),
    )
    .expect("fixture rows match their fields")
}

// (field1, field2) = (6, test1), (7, Test2), (8, Test3), (9, Test4)
pub fn filter_collection() -> Table {
    let rows = [(6.0, "test1"), (7.0, "Test2"), (8.0, "Test3"), (9.0, "Test4")];
    Table::from_values(
        "filter_collection",
        vec!["field1".to_string(), "field2".to_string()],
        rows.iter()
            .map(|(n, s)| vec![DataValue::Number(*n), DataValue::from(*s)])
            .collect(),
    )
    .expect("fixture rows match their fields")
}

pub fn bindings() -> Vec<(String, Table)> {
    vec![
        ("test_collection".to_string(), test_collection()),
        ("filter_collection".to_string(), filter_collection()),
    ]
}

// Engine with both fixture tables bound
pub fn create_test_engine() -> ExecutionEngine {
    ExecutionEngine::new(bindings())
}

pub fn run(engine: &mut ExecutionEngine, sql: &str) -> Result<Table> {
    engine
        .execute_query(sql)
        .map_err(|e| anyhow!("query '{}' failed: {}", sql, e))
}

// Values of one result column
pub fn column(table: &Table, index: usize) -> Vec<DataValue> {
    table
        .iter()
        .map(|row| row.value(index).cloned().unwrap_or(DataValue::Null))
        .collect()
}

pub fn numbers(values: &[f64]) -> Vec<DataValue> {
    values.iter().map(|v| DataValue::Number(*v)).collect()
}

pub fn texts(values: &[&str]) -> Vec<DataValue> {
    values.iter().map(|v| DataValue::from(*v)).collect()
}
