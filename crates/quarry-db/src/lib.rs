//! # quarry-db
//!
//! The quarry query engine: typed values, composable expression trees,
//! predicate operators, column references, and the query-graph resolver
//! that compiles it all into backend-specific SQL.
//!
//! ## Modules
//!
//! - [`value`] - literal values and the sealed type-family set
//! - [`qdt`] - the typed, nullable database value container
//! - [`row`] - generic result rows and typed extraction
//! - [`expr`] - expression trees, typed facades, and in-process evaluation
//! - [`operators`] - predicate operators with invert/null-inclusion flags
//! - [`column`] - column references bound to row descriptions
//! - [`schema`] - row descriptions, field metadata, and the registry
//! - [`graph`] - the query-graph resolver and its safety checks
//! - [`statement`] - SELECT statement assembly
//! - [`dialect`] - the per-backend formatting contract
//!
//! ## Safety model
//!
//! Every check is fail-fast: family mismatches, blank queries, and
//! accidental Cartesian joins are reported while the query is being
//! compiled, before any SQL exists to execute. The opt-in flags on
//! [`graph::QueryGraph`] are the only suppression path.

pub mod column;
pub mod dialect;
pub mod expr;
pub mod graph;
pub mod operators;
pub mod qdt;
pub mod row;
pub mod schema;
pub mod statement;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use column::ColumnReference;
pub use dialect::Dialect;
pub use expr::{
    ArrayExpression, BooleanExpression, DateExpression, Expr, LargeObjectExpression,
    NumberExpression, StringExpression,
};
pub use graph::{QueryGraph, ResolvedQuery, TableRole};
pub use operators::{Operator, OperatorKind, ValueAdaptor};
pub use qdt::DbValue;
pub use row::Row;
pub use schema::{FieldDef, RowDescription, SchemaRegistry};
pub use statement::SelectStatement;
pub use value::{Family, Value};
