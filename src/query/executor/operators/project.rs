// Projection Operator Implementation
//
// Maps every input row to a row of result values.

use crate::catalog::row::Row;
use crate::catalog::table::Table;
use crate::catalog::value::DataValue;
use crate::query::executor::result::QueryResult;
use crate::query::parser::ast::{Expression, SelectColumn};

/// Visible names of the result columns: the alias when given, the column
/// name for a bare column reference, the position otherwise
pub fn output_names(columns: &[SelectColumn]) -> Vec<String> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| match (&column.alias, &column.expr) {
            (Some(alias), _) => alias.clone(),
            (None, Expression::Column(reference)) => reference.name.clone(),
            (None, _) => index.to_string(),
        })
        .collect()
}

/// Build a table named `table_name` from one projected row per input row
pub fn project_rows<F>(table_name: &str, fields: &[String], rows: &[Row], mut project: F) -> QueryResult<Table>
where
    F: FnMut(&Row) -> QueryResult<Vec<DataValue>>,
{
    let projected = rows
        .iter()
        .map(|row| Row::from_values(table_name, fields, project(row)?))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(Table::new(table_name, fields.to_vec(), projected))
}
