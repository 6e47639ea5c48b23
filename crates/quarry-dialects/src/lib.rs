//! # quarry-dialects
//!
//! Stock [`Dialect`](quarry_db::dialect::Dialect) implementations for
//! quarry: PostgreSQL, MySQL, and SQLite. Each dialect is a stateless,
//! zero-sized formatting policy; adding a new backend means implementing
//! only the trait, nothing else in the engine changes.

pub mod mysql;
pub mod postgresql;
pub mod sqlite;

pub use mysql::MySqlDialect;
pub use postgresql::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Returns all stock dialects, for tests and tools that want to exercise
/// every backend.
pub fn all_dialects() -> Vec<Box<dyn quarry_db::dialect::Dialect>> {
    vec![
        Box::new(PostgresDialect),
        Box::new(SqliteDialect),
        Box::new(MySqlDialect),
    ]
}
