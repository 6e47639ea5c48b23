//! The per-backend formatting contract.
//!
//! [`Dialect`] is the single seam through which all backend variance flows.
//! Expression nodes, operators, and column references never special-case a
//! backend directly; they ask the dialect for tokens and renderings.
//! Implementations are stateless and safely shared across threads. Adding a
//! new backend means implementing only this trait — see the
//! `quarry-dialects` crate for the stock PostgreSQL, SQLite, and MySQL
//! implementations.

use quarry_core::{QuarryError, QuarryResult};

use crate::value::Value;

/// A comparison operator token requested from the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

/// A calendar unit for date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// Whole days.
    Days,
    /// Whole hours.
    Hours,
    /// Whole minutes.
    Minutes,
    /// Whole seconds.
    Seconds,
}

/// A component extractable from a date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    /// Calendar year.
    Year,
    /// Calendar month, 1-12.
    Month,
    /// Day of month, 1-31.
    Day,
}

impl DatePart {
    /// Returns the standard SQL keyword for this part.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
        }
    }
}

/// The stateless, per-backend formatting policy.
///
/// Default method bodies implement standard SQL; dialects override only
/// where their backend deviates. No method performs I/O or consults
/// database state — compilation is a pure function of the tree and this
/// contract.
pub trait Dialect: Send + Sync {
    /// Returns the vendor name (e.g. "postgresql", "sqlite", "mysql").
    fn vendor(&self) -> &'static str;

    // ── Identifiers and literals ─────────────────────────────────────

    /// Quotes a table, alias, or column identifier.
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Formats a qualified column as `qualifier.column`, both quoted.
    fn qualified_column(&self, qualifier: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(qualifier),
            self.quote_identifier(column)
        )
    }

    /// The SQL NULL literal.
    fn null_literal(&self) -> &'static str {
        "NULL"
    }

    /// The literal for boolean true.
    fn true_literal(&self) -> &'static str {
        "TRUE"
    }

    /// The literal for boolean false.
    fn false_literal(&self) -> &'static str {
        "FALSE"
    }

    /// A predicate that no row can ever satisfy. Used to compile empty
    /// set-membership operands into valid, always-false SQL.
    fn unsatisfiable_predicate(&self) -> &'static str {
        "1 = 0"
    }

    /// Escapes the interior of a string literal.
    fn escape_string(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }

    /// Formats a complete string literal, including delimiters.
    fn string_literal(&self, raw: &str) -> String {
        format!("'{}'", self.escape_string(raw))
    }

    /// Formats a date literal.
    fn date_literal(&self, date: &chrono::NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    /// Formats a timestamp literal.
    fn datetime_literal(&self, datetime: &chrono::NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", datetime.format("%Y-%m-%d %H:%M:%S"))
    }

    /// Formats a binary literal.
    fn bytes_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        format!("X'{hex}'")
    }

    /// Formats any literal value for inclusion in SQL.
    ///
    /// The default delegates to [`standard_format_value`]; dialects that
    /// override this for a few value shapes can call that function for
    /// the rest.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::UnsupportedOnDialect`] for value shapes the
    /// backend cannot express (array literals on backends without arrays).
    fn format_value(&self, value: &Value) -> QuarryResult<String> {
        standard_format_value(self, value)
    }

    // ── Comparison and pattern tokens ────────────────────────────────

    /// Returns the token for a comparison operator.
    fn comparison_token(&self, op: ComparisonOp) -> &'static str {
        match op {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }

    /// Returns the pattern-match token.
    fn like_token(&self) -> &'static str {
        "LIKE"
    }

    /// Whether string comparisons on this backend are case-sensitive by
    /// default.
    fn is_case_sensitive(&self) -> bool {
        true
    }

    // ── String functions ─────────────────────────────────────────────

    /// Renders string concatenation.
    fn concat(&self, lhs: &str, rhs: &str) -> String {
        format!("({lhs} || {rhs})")
    }

    /// Renders an uppercase transform.
    fn uppercase_of(&self, expr: &str) -> String {
        format!("UPPER({expr})")
    }

    /// Renders a lowercase transform.
    fn lowercase_of(&self, expr: &str) -> String {
        format!("LOWER({expr})")
    }

    /// Renders a whitespace trim.
    fn trimmed(&self, expr: &str) -> String {
        format!("TRIM({expr})")
    }

    /// Renders a character-length measurement.
    fn string_length(&self, expr: &str) -> String {
        format!("LENGTH({expr})")
    }

    /// Renders the 1-based position of `needle` within `haystack`,
    /// 0 when absent.
    fn position_of(&self, haystack: &str, needle: &str) -> String {
        format!("POSITION({needle} IN {haystack})")
    }

    /// Renders a substring extraction with a 1-based start and optional
    /// length.
    fn substring(&self, expr: &str, start: &str, length: Option<&str>) -> String {
        length.map_or_else(
            || format!("SUBSTRING({expr} FROM {start})"),
            |len| format!("SUBSTRING({expr} FROM {start} FOR {len})"),
        )
    }

    /// Renders a cast of any expression to character data.
    fn cast_to_text(&self, expr: &str) -> String {
        format!("CAST({expr} AS TEXT)")
    }

    // ── Numeric functions ────────────────────────────────────────────

    /// Renders integer division. The default relies on the backend's
    /// native `/` truncating for integer operands.
    fn integer_division(&self, lhs: &str, rhs: &str) -> String {
        format!("({lhs} / {rhs})")
    }

    /// Renders a modulo operation.
    fn modulo(&self, lhs: &str, rhs: &str) -> String {
        format!("({lhs} % {rhs})")
    }

    // ── Date functions ───────────────────────────────────────────────

    /// The expression producing the current date.
    fn current_date(&self) -> &'static str {
        "CURRENT_DATE"
    }

    /// Renders date arithmetic: `expr` shifted by `amount` of `unit`.
    fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String;

    /// Renders extraction of a calendar component from a date expression.
    fn date_part(&self, expr: &str, part: DatePart) -> String {
        format!("EXTRACT({} FROM {expr})", part.sql_keyword())
    }

    // ── Arrays ───────────────────────────────────────────────────────

    /// Whether the backend supports array columns and literals.
    fn supports_arrays(&self) -> bool {
        false
    }

    /// Renders an array membership test.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::UnsupportedOnDialect`] when
    /// [`supports_arrays`](Self::supports_arrays) is false.
    fn array_contains(&self, _array: &str, _element: &str) -> QuarryResult<String> {
        Err(QuarryError::UnsupportedOnDialect {
            dialect: self.vendor().to_string(),
            feature: "array membership".to_string(),
        })
    }

    /// Renders an array length measurement.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::UnsupportedOnDialect`] when
    /// [`supports_arrays`](Self::supports_arrays) is false.
    fn array_length(&self, _array: &str) -> QuarryResult<String> {
        Err(QuarryError::UnsupportedOnDialect {
            dialect: self.vendor().to_string(),
            feature: "array length".to_string(),
        })
    }
}

/// Renders a literal using the standard SQL rules, asking the dialect
/// only for the individual literal renderings. Array literals are
/// rejected; dialects with array support override
/// [`Dialect::format_value`] to handle them.
///
/// # Errors
///
/// Returns [`QuarryError::UnsupportedOnDialect`] for array literals.
pub fn standard_format_value<D: Dialect + ?Sized>(
    dialect: &D,
    value: &Value,
) -> QuarryResult<String> {
    match value {
        Value::Null => Ok(dialect.null_literal().to_string()),
        Value::Bool(true) => Ok(dialect.true_literal().to_string()),
        Value::Bool(false) => Ok(dialect.false_literal().to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::String(s) => Ok(dialect.string_literal(s)),
        Value::Uuid(u) => Ok(dialect.string_literal(&u.to_string())),
        Value::Date(d) => Ok(dialect.date_literal(d)),
        Value::DateTime(dt) => Ok(dialect.datetime_literal(dt)),
        Value::Bytes(b) => Ok(dialect.bytes_literal(b)),
        Value::Json(j) => Ok(dialect.string_literal(&j.to_string())),
        Value::List(_) => Err(QuarryError::UnsupportedOnDialect {
            dialect: dialect.vendor().to_string(),
            feature: "array literals".to_string(),
        }),
    }
}
