// Filter Operator Implementation
//
// Row filtering for `where`/`having` and the offset/limit slicing that ends
// the pipeline.

use crate::catalog::row::Row;
use crate::catalog::table::Table;
use crate::query::executor::result::QueryResult;

/// Keep the rows for which `predicate` holds. The first predicate error
/// aborts the filter.
pub fn filter_rows<F>(table: &Table, mut predicate: F) -> QueryResult<Table>
where
    F: FnMut(&Row) -> QueryResult<bool>,
{
    let mut rows = Vec::new();
    for row in table.iter() {
        if predicate(row)? {
            rows.push(row.clone());
        }
    }

    Ok(table.with_rows(rows))
}

/// Drop the first `offset` rows
pub fn apply_offset(table: Table, offset: usize) -> Table {
    let rows: Vec<Row> = table.iter().skip(offset).cloned().collect();
    table.with_rows(rows)
}

/// Keep at most `limit` rows
pub fn apply_limit(table: Table, limit: usize) -> Table {
    if table.len() <= limit {
        return table;
    }
    let rows: Vec<Row> = table.iter().take(limit).cloned().collect();
    table.with_rows(rows)
}
