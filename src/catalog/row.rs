// Row Implementation
//
// A row is a positional value vector plus the column descriptors that name
// each slot. Rows produced by joins carry the columns of every joined table,
// each tagged with the table it came from.

use std::fmt;

use linked_hash_map::LinkedHashMap;
use serde::Serialize;

use crate::catalog::column::Column;
use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// First column index of every table contributing to the row
    table_offsets: LinkedHashMap<String, usize>,
    columns: Vec<Column>,
    values: Vec<DataValue>,
}

impl Row {
    /// Create a row. Fails when the column and value counts differ.
    pub fn new(table_name: &str, columns: Vec<Column>, values: Vec<DataValue>) -> QueryResult<Row> {
        if columns.len() != values.len() {
            return Err(QueryError::InvalidRow(format!(
                "{} columns but {} values in row of {}",
                columns.len(),
                values.len(),
                table_name
            )));
        }

        let mut table_offsets = LinkedHashMap::new();
        table_offsets.insert(table_name.to_string(), 0);

        Ok(Row { table_offsets, columns, values })
    }

    /// Row whose columns are named after `fields`
    pub fn from_values<S: AsRef<str>>(table_name: &str, fields: &[S], values: Vec<DataValue>) -> QueryResult<Row> {
        let columns = fields
            .iter()
            .enumerate()
            .map(|(index, field)| Column::named(table_name, field.as_ref(), index))
            .collect();

        Row::new(table_name, columns, values)
    }

    /// All-null row with the given shape
    pub fn nulls<S: AsRef<str>>(table_name: &str, fields: &[S]) -> Row {
        let columns: Vec<Column> = fields
            .iter()
            .enumerate()
            .map(|(index, field)| Column::named(table_name, field.as_ref(), index))
            .collect();
        let values = vec![DataValue::Null; columns.len()];

        let mut table_offsets = LinkedHashMap::new();
        table_offsets.insert(table_name.to_string(), 0);

        Row { table_offsets, columns, values }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<DataValue> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    /// First column index of a contributing table
    pub fn table_offset(&self, table_name: &str) -> Option<usize> {
        self.table_offsets.get(table_name).copied()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.table_offsets.keys().map(String::as_str)
    }

    fn find_column(
        &self,
        name: &str,
        table_alias: &str,
        predicate: impl Fn(&Column) -> bool,
    ) -> QueryResult<Option<&Column>> {
        let mut matches = self
            .columns
            .iter()
            .filter(|c| c.table_alias() == table_alias)
            .filter(|c| predicate(*c));

        let first = matches.next();
        if matches.next().is_some() {
            return Err(QueryError::AmbiguousColumn(format!("{}.{}", table_alias, name)));
        }

        Ok(first)
    }

    pub fn get_column_by_alias(&self, alias: &str, table_alias: &str) -> QueryResult<Option<&Column>> {
        self.find_column(alias, table_alias, |c| c.alias() == alias)
    }

    pub fn get_column_by_name(&self, name: &str, table_alias: &str) -> QueryResult<Option<&Column>> {
        self.find_column(name, table_alias, |c| c.name() == name)
    }

    /// Look a column up within one table's columns: alias match first, then
    /// source name match.
    pub fn get_column(&self, name: &str, table_alias: &str) -> QueryResult<Option<&Column>> {
        match self.get_column_by_alias(name, table_alias)? {
            Some(column) => Ok(Some(column)),
            None => self.get_column_by_name(name, table_alias),
        }
    }

    /// Value of a column within one table's columns
    pub fn get(&self, name: &str, table_alias: &str) -> QueryResult<Option<&DataValue>> {
        Ok(self
            .get_column(name, table_alias)?
            .and_then(|column| self.values.get(column.index())))
    }

    /// Value by visible name regardless of table, first match wins
    pub fn get_by_alias(&self, alias: &str) -> Option<&DataValue> {
        self.columns
            .iter()
            .find(|c| c.alias() == alias)
            .or_else(|| self.columns.iter().find(|c| c.name() == alias))
            .and_then(|c| self.values.get(c.index()))
    }

    /// Concatenate two rows. Right columns are re-indexed after the left ones
    /// and the right tables' offsets are recorded.
    pub fn join(&self, right: &Row) -> Row {
        let offset = self.columns.len();

        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().map(|c| c.with_index(offset + c.index())));

        let mut values = self.values.clone();
        values.extend(right.values.iter().cloned());

        let mut table_offsets = self.table_offsets.clone();
        for (name, start) in right.table_offsets.iter() {
            if !table_offsets.contains_key(name) {
                table_offsets.insert(name.clone(), offset + start);
            }
        }

        Row { table_offsets, columns, values }
    }

    /// Re-tag every column with a single table name
    pub fn set_table_name(&mut self, name: &str) {
        self.table_offsets.clear();
        self.table_offsets.insert(name.to_string(), 0);
        self.columns = self.columns.iter().map(|c| c.with_table_alias(name)).collect();
    }

    /// `(visible name, value)` pairs in column order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.columns
            .iter()
            .filter_map(|c| self.values.get(c.index()).map(|v| (c.alias(), v)))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| format!("{}.{} = {}", c.table_alias(), c.alias(), v))
            .collect();
        write!(f, "Row({})", parts.join("; "))
    }
}
