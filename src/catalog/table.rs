//! Table Module
//!
//! This module defines the Table type: a named, ordered sequence of rows
//! that is both the engine's input binding and its query result.

use serde::Serialize;

use super::row::Row;
use crate::catalog::value::DataValue;
use crate::query::executor::result::QueryResult;

/// A named, ordered sequence of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Table name, used for alias resolution
    name: String,
    /// Field names visible to unqualified column lookups
    fields: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a new table with the given name, fields and rows
    pub fn new(name: impl Into<String>, fields: Vec<String>, rows: Vec<Row>) -> Self {
        Table {
            name: name.into(),
            fields,
            rows,
        }
    }

    /// Build a table from raw value vectors, one per row
    pub fn from_values(
        name: impl Into<String>,
        fields: Vec<String>,
        values: Vec<Vec<DataValue>>,
    ) -> QueryResult<Self> {
        let name = name.into();
        let rows = values
            .into_iter()
            .map(|row| Row::from_values(&name, &fields, row))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Table::new(name, fields, rows))
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same name and fields over different rows
    pub fn with_rows(&self, rows: Vec<Row>) -> Table {
        Table::new(self.name.clone(), self.fields.clone(), rows)
    }

    /// Rename the table, re-tagging every row's columns with the new name
    pub fn set_table_name(&mut self, name: &str) {
        self.name = name.to_string();
        for row in self.rows.iter_mut() {
            row.set_table_name(name);
        }
    }

    /// Owned rename
    pub fn renamed(mut self, name: &str) -> Table {
        self.set_table_name(name);
        self
    }

    /// All-null row shaped like this table, used for left join extension
    pub fn null_row(&self) -> Row {
        Row::nulls(&self.name, &self.fields)
    }

    /// Row values as plain vectors
    pub fn value_rows(&self) -> Vec<Vec<DataValue>> {
        self.rows.iter().map(|row| row.values().to_vec()).collect()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
