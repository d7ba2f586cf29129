// Grouping Operator
//
// Partitions rows by the values of their grouping columns. Groups keep the
// order in which their first row was seen.

use linked_hash_map::LinkedHashMap;

use crate::catalog::column::Column;
use crate::catalog::row::Row;
use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};

/// Type-tagged key of one grouping column. Numbers compare by value, a
/// number never equals a string, and all nulls are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupingKey {
    Null,
    Number(u64),
    Text(String),
}

impl GroupingKey {
    pub fn from_value(value: &DataValue) -> QueryResult<Self> {
        match value {
            DataValue::Null => Ok(GroupingKey::Null),
            // -0.0 and 0.0 are the same group
            DataValue::Number(n) => Ok(GroupingKey::Number(if *n == 0.0 { 0 } else { n.to_bits() })),
            DataValue::Text(s) => Ok(GroupingKey::Text(s.clone())),
            DataValue::Boolean(_) => Err(QueryError::InvalidGroupingKey(format!("{} value {}", value.type_name(), value))),
        }
    }
}

/// Rows sharing one key, plus a row holding just the key columns
#[derive(Debug, Clone)]
pub struct Group {
    pub key_row: Row,
    pub rows: Vec<Row>,
}

/// Group `rows` by the `(column, value)` pairs `key` resolves on each row.
/// The key row of a group is built from its first row.
pub fn group_rows<F>(table_name: &str, rows: &[Row], mut key: F) -> QueryResult<Vec<Group>>
where
    F: FnMut(&Row) -> QueryResult<Vec<(Column, DataValue)>>,
{
    let mut groups: LinkedHashMap<Vec<GroupingKey>, Group> = LinkedHashMap::new();

    for row in rows {
        let cells = key(row)?;
        let grouping_key = cells
            .iter()
            .map(|(_, value)| GroupingKey::from_value(value))
            .collect::<QueryResult<Vec<_>>>()?;

        if let Some(group) = groups.get_mut(&grouping_key) {
            group.rows.push(row.clone());
            continue;
        }

        let (columns, values): (Vec<Column>, Vec<DataValue>) = cells
            .into_iter()
            .enumerate()
            .map(|(index, (column, value))| (column.with_index(index), value))
            .unzip();

        let key_row = Row::new(table_name, columns, values)?;
        groups.insert(grouping_key, Group { key_row, rows: vec![row.clone()] });
    }

    Ok(groups.into_iter().map(|(_, group)| group).collect())
}
