// Data Binding Adapters
//
// Conversions between caller data and engine tables: the `TableRecord`
// capability pair for typed records, and JSON loading for ad-hoc data.

use std::fs;
use std::path::Path;

use linked_hash_map::LinkedHashMap;
use log::debug;
use serde_json::{Map, Number, Value};

use super::row::Row;
use super::table::Table;
use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};

/// A record type that can cross into and out of the engine
pub trait TableRecord: Sized {
    /// Field names, in row order
    fn fields() -> Vec<String>;

    /// Convert the record into a row of `table_name`
    fn as_row(&self, table_name: &str) -> QueryResult<Row>;

    /// Populate a record from a row
    fn from_row(row: &Row) -> QueryResult<Self>;
}

/// Value of a named field, or `ColumnNotFound`
pub fn field_value<'r>(row: &'r Row, field: &str) -> QueryResult<&'r DataValue> {
    row.get_by_alias(field)
        .ok_or_else(|| QueryError::ColumnNotFound(field.to_string()))
}

/// Numeric field; null maps to `None`
pub fn number_field(row: &Row, field: &str) -> QueryResult<Option<f64>> {
    match field_value(row, field)? {
        DataValue::Null => Ok(None),
        DataValue::Number(n) => Ok(Some(*n)),
        other => Err(QueryError::ConversionError(format!(
            "field {} holds {} where a number was expected",
            field,
            other.type_name()
        ))),
    }
}

/// Text field; null maps to `None`
pub fn text_field(row: &Row, field: &str) -> QueryResult<Option<String>> {
    match field_value(row, field)? {
        DataValue::Null => Ok(None),
        DataValue::Text(s) => Ok(Some(s.clone())),
        other => Err(QueryError::ConversionError(format!(
            "field {} holds {} where text was expected",
            field,
            other.type_name()
        ))),
    }
}

impl Table {
    /// Bind a slice of records as a table
    pub fn from_records<T: TableRecord>(name: &str, records: &[T]) -> QueryResult<Table> {
        let rows = records
            .iter()
            .map(|record| record.as_row(name))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Table::new(name, T::fields(), rows))
    }

    /// Read every row back into a record
    pub fn to_records<T: TableRecord>(&self) -> QueryResult<Vec<T>> {
        self.iter().map(T::from_row).collect()
    }

    /// Rows as JSON objects keyed by the visible column names
    pub fn to_json(&self) -> Value {
        let rows = self
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (name, value) in row.entries() {
                    object.insert(name.to_string(), json_from_value(value));
                }
                Value::Object(object)
            })
            .collect();

        Value::Array(rows)
    }
}

fn json_from_value(value: &DataValue) -> Value {
    match value {
        DataValue::Null => Value::Null,
        DataValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        DataValue::Text(s) => Value::String(s.clone()),
        DataValue::Boolean(b) => Value::Bool(*b),
    }
}

fn value_from_json(value: &Value) -> QueryResult<DataValue> {
    match value {
        Value::Null => Ok(DataValue::Null),
        Value::Bool(b) => Ok(DataValue::Boolean(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(DataValue::Number)
            .ok_or_else(|| QueryError::ConversionError(format!("number {} does not fit a double", n))),
        Value::String(s) => Ok(DataValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(QueryError::ConversionError(
            "nested arrays and objects can't be stored in a column".to_string(),
        )),
    }
}

/// Build a table from a JSON array of objects. Fields are ordered by first
/// appearance; keys missing from an object read as null.
pub fn table_from_json(name: &str, json: &Value) -> QueryResult<Table> {
    let objects = json
        .as_array()
        .ok_or_else(|| QueryError::ConversionError(format!("table {} must be a JSON array", name)))?;

    let mut fields: LinkedHashMap<String, ()> = LinkedHashMap::new();
    for object in objects {
        let object = object.as_object().ok_or_else(|| {
            QueryError::ConversionError(format!("every row of table {} must be a JSON object", name))
        })?;
        for key in object.keys() {
            if !fields.contains_key(key) {
                fields.insert(key.clone(), ());
            }
        }
    }
    let fields: Vec<String> = fields.keys().cloned().collect();

    let mut rows = Vec::with_capacity(objects.len());
    for object in objects.iter().filter_map(Value::as_object) {
        let values = fields
            .iter()
            .map(|field| object.get(field).map_or(Ok(DataValue::Null), value_from_json))
            .collect::<QueryResult<Vec<_>>>()?;
        rows.push(Row::from_values(name, &fields, values)?);
    }

    debug!("loaded table {} with {} fields and {} rows", name, fields.len(), rows.len());
    Ok(Table::new(name, fields, rows))
}

/// Read a JSON file holding an array of objects
pub fn load_json_table(name: &str, path: impl AsRef<Path>) -> QueryResult<Table> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| QueryError::ConversionError(format!("can't read {}: {}", path.display(), e)))?;
    let json: Value = serde_json::from_str(&text)
        .map_err(|e| QueryError::ConversionError(format!("invalid JSON in {}: {}", path.display(), e)))?;

    table_from_json(name, &json)
}
