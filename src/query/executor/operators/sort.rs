// Sort Operator Implementation
//
// Multi-key ORDER BY over a materialized table.

use std::cmp::Ordering;

use crate::catalog::row::Row;
use crate::catalog::table::Table;
use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::parser::ast::SortDirection;

/// Stable sort of `table` by the keys `key` extracts from each row, compared
/// in order with their own direction. Nulls sort first in ascending order.
pub fn sort_table<F>(table: Table, directions: &[SortDirection], mut key: F) -> QueryResult<Table>
where
    F: FnMut(&Row) -> QueryResult<Vec<DataValue>>,
{
    let keys = table.iter().map(&mut key).collect::<QueryResult<Vec<_>>>()?;
    check_comparable(&keys, directions.len())?;

    let mut keyed: Vec<(Vec<DataValue>, Row)> = keys.into_iter().zip(table.iter().cloned()).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, directions));

    let rows = keyed.into_iter().map(|(_, row)| row).collect();
    Ok(table.with_rows(rows))
}

/// Every sort position must hold values of a single type besides null
fn check_comparable(keys: &[Vec<DataValue>], width: usize) -> QueryResult<()> {
    for position in 0..width {
        let mut seen: Option<&'static str> = None;

        for value in keys.iter().filter_map(|k| k.get(position)).filter(|v| !v.is_null()) {
            match seen {
                None => seen = Some(value.type_name()),
                Some(t) if t != value.type_name() => {
                    return Err(QueryError::TypeMismatch(format!(
                        "order by key {} mixes {} and {} values",
                        position + 1,
                        t,
                        value.type_name()
                    )));
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

fn compare_keys(a: &[DataValue], b: &[DataValue], directions: &[SortDirection]) -> Ordering {
    for ((l, r), direction) in a.iter().zip(b).zip(directions) {
        let ordering = l.sort_cmp(r).unwrap_or(Ordering::Equal);
        let ordering = match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
