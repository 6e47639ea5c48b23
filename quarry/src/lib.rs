//! # quarry
//!
//! A typed, composable SQL condition builder and query-graph resolver.
//!
//! Callers describe their tables once, attach typed operators to columns,
//! and let the query-graph resolver infer joins from foreign-key metadata
//! and refuse unsafe queries — blank queries and accidental Cartesian
//! joins never reach a database. Compilation targets any backend through
//! the stateless [`Dialect`](quarry_db::dialect::Dialect) contract.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access; depend on the individual crates for finer-grained control.
//!
//! ## Example
//!
//! ```
//! use quarry::db::column::ColumnReference;
//! use quarry::db::graph::QueryGraph;
//! use quarry::db::operators::Operator;
//! use quarry::db::schema::{FieldDef, RowDescription, SchemaRegistry};
//! use quarry::db::statement::SelectStatement;
//! use quarry::db::value::Family;
//! use quarry::dialects::PostgresDialect;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     RowDescription::new("villain")
//!         .with_field(FieldDef::new("id", Family::Number).primary_key())
//!         .with_field(FieldDef::new("name", Family::String)),
//! );
//!
//! let villain = registry.get("villain").unwrap();
//! let name = ColumnReference::new(villain, "name").unwrap();
//!
//! let mut graph = QueryGraph::new(&registry);
//! graph.add_required(villain);
//! graph.add_operator(&name, &Operator::is_like("Dr%")).unwrap();
//!
//! let resolved = graph.resolve().unwrap();
//! let sql = SelectStatement::new(&resolved, &registry)
//!     .to_sql(&PostgresDialect)
//!     .unwrap();
//! assert!(sql.contains("WHERE (\"villain\".\"name\" LIKE 'Dr%')"));
//! ```

/// Core types: error taxonomy, settings, and logging.
pub use quarry_core as core;

/// The query engine: values, expressions, operators, and the resolver.
pub use quarry_db as db;

/// Stock SQL dialects: `PostgreSQL`, `MySQL`, `SQLite`.
pub use quarry_dialects as dialects;
