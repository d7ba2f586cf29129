// Query Executor Module
//
// This module is responsible for evaluating parsed statements against bound
// tables and producing result tables.

pub mod engine;
pub mod expression_eval;
pub mod functions;
pub mod operators;
pub mod result;
pub mod scope;

// Export key types
pub use self::engine::{EngineConfig, ExecutionEngine, RowContext};
pub use self::functions::{AggregateFunction, AggregateInput, FunctionRegistry, ScalarFunction};
pub use self::result::{to_string_table, QueryError, QueryResult};
pub use self::scope::{ExecutionContext, Scope};
