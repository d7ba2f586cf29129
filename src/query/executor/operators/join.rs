// Join Operator Implementation
//
// Nested loop joins over materialized tables. Every join is O(n*m); the
// condition is evaluated against the concatenated candidate row.

use crate::catalog::row::Row;
use crate::catalog::table::Table;
use crate::query::executor::result::QueryResult;
use crate::query::parser::ast::JoinType;

/// Name of the intermediate table produced by a join
pub fn joined_name(left: &Table, right: &Table, join_type: JoinType) -> String {
    format!("{}_{}_{}_joined", left.name(), right.name(), join_type)
}

fn joined_fields(left: &Table, right: &Table) -> Vec<String> {
    left.fields().iter().chain(right.fields()).cloned().collect()
}

/// Every left row paired with every right row
pub fn cross_join(name: &str, left: &Table, right: &Table) -> Table {
    let rows = left
        .iter()
        .flat_map(|l| right.iter().map(move |r| l.join(r)))
        .collect();

    Table::new(name, joined_fields(left, right), rows)
}

/// Inner join, or left outer join when `left_outer` is set. Left rows
/// without a match are extended with an all-null right row.
pub fn nested_loop_join<F>(
    name: &str,
    left: &Table,
    right: &Table,
    left_outer: bool,
    mut condition: F,
) -> QueryResult<Table>
where
    F: FnMut(&Row) -> QueryResult<bool>,
{
    let null_row = right.null_row();
    let mut rows = Vec::new();

    for left_row in left.iter() {
        let mut matched = false;

        for right_row in right.iter() {
            let candidate = left_row.join(right_row);
            if condition(&candidate)? {
                rows.push(candidate);
                matched = true;
            }
        }

        if left_outer && !matched {
            rows.push(left_row.join(&null_row));
        }
    }

    Ok(Table::new(name, joined_fields(left, right), rows))
}
