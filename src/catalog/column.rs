// Column Descriptor
//
// This module defines the row-local descriptor of a value slot.

use serde::Serialize;

/// Describes one slot of a row's value vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Name of the table the column belongs to
    table_alias: String,
    /// Externally visible name
    alias: String,
    /// Original source name
    name: String,
    /// Slot in the row's value vector
    index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(
        table_alias: impl Into<String>,
        alias: impl Into<String>,
        name: impl Into<String>,
        index: usize,
    ) -> Self {
        Column {
            table_alias: table_alias.into(),
            alias: alias.into(),
            name: name.into(),
            index,
        }
    }

    /// Column whose alias and name are the same
    pub fn named(table_alias: impl Into<String>, name: impl Into<String>, index: usize) -> Self {
        let name = name.into();
        Column::new(table_alias, name.clone(), name, index)
    }

    pub fn table_alias(&self) -> &str {
        &self.table_alias
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Same column moved to another slot
    pub fn with_index(&self, index: usize) -> Column {
        Column { index, ..self.clone() }
    }

    /// Same column tagged with another table
    pub fn with_table_alias(&self, table_alias: &str) -> Column {
        Column { table_alias: table_alias.to_string(), ..self.clone() }
    }
}
