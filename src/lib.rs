// DataSelector Query Engine

pub mod catalog;
pub mod query;

// Re-export key items for convenient access
pub use catalog::{DataValue, Row, Table, TableRecord};
pub use query::parser::{parse, parse_all, Parser};
pub use query::executor::engine::{EngineConfig, ExecutionEngine};
pub use query::executor::result::{QueryError, QueryResult};
