use std::fs;

use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

use dataselector::catalog::convert::{number_field, text_field};
use dataselector::catalog::{load_json_table, table_from_json, DataValue, Row, Table, TableRecord};
use dataselector::{ExecutionEngine, QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq)]
struct Employee {
    name: String,
    department: Option<String>,
    salary: f64,
}

impl Employee {
    fn new(name: &str, department: Option<&str>, salary: f64) -> Self {
        Employee {
            name: name.to_string(),
            department: department.map(str::to_string),
            salary,
        }
    }
}

impl TableRecord for Employee {
    fn fields() -> Vec<String> {
        vec!["name".to_string(), "department".to_string(), "salary".to_string()]
    }

    fn as_row(&self, table_name: &str) -> QueryResult<Row> {
        Row::from_values(
            table_name,
            &Self::fields(),
            vec![
                DataValue::from(self.name.as_str()),
                DataValue::from(self.department.clone()),
                DataValue::from(self.salary),
            ],
        )
    }

    fn from_row(row: &Row) -> QueryResult<Self> {
        Ok(Employee {
            name: text_field(row, "name")?.unwrap_or_default(),
            department: text_field(row, "department")?,
            salary: number_field(row, "salary")?.unwrap_or_default(),
        })
    }
}

fn staff() -> Vec<Employee> {
    vec![
        Employee::new("ann", Some("ops"), 120.0),
        Employee::new("bob", Some("dev"), 100.0),
        Employee::new("cid", None, 90.0),
        Employee::new("dee", Some("dev"), 140.0),
    ]
}

#[test]
fn test_records_in_and_out_of_a_query() -> Result<()> {
    let table = Table::from_records("staff", &staff())?;
    let mut engine = ExecutionEngine::new(vec![("staff".to_string(), table)]);

    let result = engine.execute_query(
        "select name, department, salary from staff where salary >= 100 order by salary desc",
    )?;
    let records: Vec<Employee> = result.to_records()?;

    assert_eq!(
        records,
        vec![
            Employee::new("dee", Some("dev"), 140.0),
            Employee::new("ann", Some("ops"), 120.0),
            Employee::new("bob", Some("dev"), 100.0),
        ]
    );

    Ok(())
}

#[test]
fn test_records_need_matching_fields() -> Result<()> {
    let table = Table::from_records("staff", &staff())?;
    let mut engine = ExecutionEngine::new(vec![("staff".to_string(), table)]);

    let result = engine.execute_query("select name from staff")?;
    assert!(matches!(
        result.to_records::<Employee>(),
        Err(QueryError::ColumnNotFound(_))
    ));

    let result = engine.execute_query("select salary name, department, salary from staff")?;
    assert!(matches!(
        result.to_records::<Employee>(),
        Err(QueryError::ConversionError(_))
    ));

    Ok(())
}

#[test]
fn test_load_json_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("orders.json");
    fs::write(
        &path,
        r#"[
            {"id": 1, "customer": "ann", "total": 12.5, "paid": true},
            {"id": 2, "customer": "bob", "total": 7},
            {"id": 3, "customer": "ann", "total": 3.25, "paid": false}
        ]"#,
    )?;

    let orders = load_json_table("orders", &path)?;
    assert_eq!(orders.fields(), &["id", "customer", "total", "paid"].map(String::from));
    let paid: Vec<DataValue> = orders.value_rows().into_iter().map(|row| row[3].clone()).collect();
    assert_eq!(paid, vec![DataValue::Boolean(true), DataValue::Null, DataValue::Boolean(false)]);

    let mut engine = ExecutionEngine::new(vec![("orders".to_string(), orders)]);
    let result = engine.execute_query(
        "select customer, sum(total) spent from orders group by customer order by spent desc",
    )?;

    assert_eq!(
        result.to_json(),
        json!([
            {"customer": "ann", "spent": 15.75},
            {"customer": "bob", "spent": 7.0},
        ])
    );

    Ok(())
}

#[test]
fn test_load_errors() -> Result<()> {
    let dir = tempdir()?;

    assert!(matches!(
        load_json_table("missing", dir.path().join("missing.json")),
        Err(QueryError::ConversionError(_))
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "[{\"a\": 1},")?;
    assert!(matches!(load_json_table("broken", &broken), Err(QueryError::ConversionError(_))));

    assert!(matches!(
        table_from_json("nested", &json!([{"a": {"b": 1}}])),
        Err(QueryError::ConversionError(_))
    ));

    Ok(())
}

#[test]
fn test_json_output_keeps_column_order() -> Result<()> {
    let table = table_from_json("t", &json!([{"z": 1, "a": "x"}]))?;
    let mut engine = ExecutionEngine::new(vec![("t".to_string(), table)]);

    let result = engine.execute_query("select a, z, z * 2 twice from t")?;
    let text = serde_json::to_string(&result.to_json())?;

    assert_eq!(text, r#"[{"a":"x","z":1.0,"twice":2.0}]"#);

    Ok(())
}
