// Query Processing Module
//
// This module contains components for SQL parsing and execution.

pub mod parser;
pub mod executor;

// Export key public interfaces
pub use parser::Parser;
pub use executor::engine::ExecutionEngine;
pub use executor::result::QueryResult;
