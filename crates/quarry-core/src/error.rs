//! Core error types for quarry.
//!
//! This module provides the [`QuarryError`] enum covering every failure the
//! query engine can report: unsafe-query refusals, type-system violations,
//! metadata lookups, and configuration problems. All checks are fail-fast and
//! raised while a query is being compiled, before any SQL could reach a
//! database. The only way to suppress the safety checks is through the
//! explicit opt-in flags on the query graph; there is no silent fallback.

use thiserror::Error;

/// A convenient result alias used throughout the engine.
pub type QuarryResult<T> = Result<T, QuarryError>;

/// The primary error type for the quarry query engine.
///
/// Each variant corresponds to one distinct failure mode. The unsafe-query
/// variants ([`AccidentalBlankQuery`](Self::AccidentalBlankQuery) and
/// [`AccidentalCartesianJoin`](Self::AccidentalCartesianJoin)) exist to make
/// dangerous queries impossible to execute by accident.
#[derive(Error, Debug)]
pub enum QuarryError {
    // ── Type-system violations ───────────────────────────────────────

    /// A comparison was attempted between two incompatible type families
    /// (e.g. a string operand against a numeric column). Never coerced.
    #[error("comparison between dissimilar types: column is {column_family}, operand is {operand_family}")]
    ComparisonBetweenDissimilarTypes {
        /// The type family of the column being compared.
        column_family: String,
        /// The type family of the supplied operand.
        operand_family: String,
    },

    /// A comparison was attempted on a type family that has no equality
    /// semantics (large objects).
    #[error("values of the {family} family cannot be used in comparisons")]
    IncomparableTypeInComparison {
        /// The offending type family.
        family: String,
    },

    /// A value of the wrong runtime type was supplied to a typed container.
    #[error("type mismatch: expected a {expected} value, got a {actual} value")]
    TypeMismatch {
        /// The declared type family.
        expected: String,
        /// The runtime type family of the supplied value.
        actual: String,
    },

    // ── Unsafe-query refusals ────────────────────────────────────────

    /// The query had no effective conditions and blank queries were not
    /// explicitly allowed. A blank query matches every row of every
    /// required table.
    #[error("blank query refused: no conditions were supplied and blank queries are not allowed")]
    AccidentalBlankQuery,

    /// A pair of tables in the query was linked by no relationship and no
    /// explicit condition, and Cartesian joins were not explicitly allowed.
    #[error("cartesian join refused: no condition links the tables {tables:?}")]
    AccidentalCartesianJoin {
        /// The tables with no relating condition.
        tables: Vec<String>,
    },

    // ── Metadata resolution ──────────────────────────────────────────

    /// A column reference was built against a field that does not belong to
    /// the row description it claimed.
    #[error("field '{field}' does not belong to the row description for table '{table}'")]
    IncorrectRowProvider {
        /// The requested field name.
        field: String,
        /// The table whose row description was supplied.
        table: String,
    },

    /// A table name was not found in the schema registry.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A column was not present in a result row.
    #[error("column '{column}' not found in row")]
    UnknownColumn {
        /// The requested column name.
        column: String,
    },

    // ── Dialect and evaluation ───────────────────────────────────────

    /// The chosen SQL dialect cannot express the requested operation.
    #[error("dialect '{dialect}' does not support {feature}")]
    UnsupportedOnDialect {
        /// The dialect's vendor name.
        dialect: String,
        /// The unsupported feature.
        feature: String,
    },

    /// An expression could not be evaluated in-process (e.g. division by
    /// zero, or an aggregate evaluated outside a result set).
    #[error("expression cannot be evaluated: {0}")]
    Evaluation(String),

    // ── Configuration ────────────────────────────────────────────────

    /// The settings file could not be read or parsed.
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl QuarryError {
    /// Returns `true` if this error is one of the unsafe-query refusals
    /// that can be suppressed by the opt-in flags on the query graph.
    pub const fn is_safety_refusal(&self) -> bool {
        matches!(
            self,
            Self::AccidentalBlankQuery | Self::AccidentalCartesianJoin { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dissimilar_types() {
        let err = QuarryError::ComparisonBetweenDissimilarTypes {
            column_family: "number".to_string(),
            operand_family: "string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "comparison between dissimilar types: column is number, operand is string"
        );
    }

    #[test]
    fn test_display_blank_query() {
        let err = QuarryError::AccidentalBlankQuery;
        assert!(err.to_string().contains("blank query refused"));
    }

    #[test]
    fn test_display_cartesian_join() {
        let err = QuarryError::AccidentalCartesianJoin {
            tables: vec!["villain".to_string(), "professional".to_string()],
        };
        assert!(err.to_string().contains("villain"));
        assert!(err.to_string().contains("professional"));
    }

    #[test]
    fn test_display_incorrect_row_provider() {
        let err = QuarryError::IncorrectRowProvider {
            field: "surname".to_string(),
            table: "villain".to_string(),
        };
        assert!(err.to_string().contains("surname"));
        assert!(err.to_string().contains("villain"));
    }

    #[test]
    fn test_is_safety_refusal() {
        assert!(QuarryError::AccidentalBlankQuery.is_safety_refusal());
        assert!(QuarryError::AccidentalCartesianJoin { tables: vec![] }.is_safety_refusal());
        assert!(!QuarryError::UnknownTable("x".to_string()).is_safety_refusal());
    }
}
