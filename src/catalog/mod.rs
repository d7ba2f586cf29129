//! Data Model Module
//!
//! This module defines the runtime data model: values, column descriptors,
//! rows and tables, plus the adapters that bind caller data as tables.

pub mod value;
pub mod column;
pub mod row;
pub mod table;
pub mod convert;

// Re-export key types
pub use self::value::DataValue;
pub use self::column::Column;
pub use self::row::Row;
pub use self::table::Table;
pub use self::convert::{TableRecord, load_json_table, table_from_json};
