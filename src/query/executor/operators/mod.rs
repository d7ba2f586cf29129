// Query Operators Module
//
// Relational steps of the select pipeline. Each operator consumes a
// materialized table and produces a new one; expression evaluation is left
// to the caller through closures so the operators stay independent of the
// interpreter.

pub mod agg;
pub mod filter;
pub mod join;
pub mod project;
pub mod sort;

pub use self::agg::{group_rows, Group, GroupingKey};
pub use self::filter::{apply_limit, apply_offset, filter_rows};
pub use self::join::{cross_join, joined_name, nested_loop_join};
pub use self::project::{output_names, project_rows};
pub use self::sort::sort_table;
