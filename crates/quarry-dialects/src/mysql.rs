//! The MySQL dialect.
//!
//! MySQL quotes identifiers with backticks, concatenates with the
//! `CONCAT` function rather than `||`, compares strings
//! case-insensitively under its default collations, and promotes integer
//! `/` to decimal division — the `DIV` operator is the truncating form.

use quarry_db::dialect::{Dialect, IntervalUnit};

/// The MySQL formatting policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn vendor(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn is_case_sensitive(&self) -> bool {
        false
    }

    fn date_literal(&self, date: &chrono::NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    fn datetime_literal(&self, datetime: &chrono::NaiveDateTime) -> String {
        format!("'{}'", datetime.format("%Y-%m-%d %H:%M:%S"))
    }

    fn concat(&self, lhs: &str, rhs: &str) -> String {
        format!("CONCAT({lhs}, {rhs})")
    }

    fn string_length(&self, expr: &str) -> String {
        format!("CHAR_LENGTH({expr})")
    }

    fn position_of(&self, haystack: &str, needle: &str) -> String {
        format!("LOCATE({needle}, {haystack})")
    }

    fn substring(&self, expr: &str, start: &str, length: Option<&str>) -> String {
        length.map_or_else(
            || format!("SUBSTRING({expr}, {start})"),
            |len| format!("SUBSTRING({expr}, {start}, {len})"),
        )
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("CAST({expr} AS CHAR)")
    }

    fn integer_division(&self, lhs: &str, rhs: &str) -> String {
        format!("({lhs} DIV {rhs})")
    }

    fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
        let unit = match unit {
            IntervalUnit::Days => "DAY",
            IntervalUnit::Hours => "HOUR",
            IntervalUnit::Minutes => "MINUTE",
            IntervalUnit::Seconds => "SECOND",
        };
        format!("DATE_ADD({expr}, INTERVAL ({amount}) {unit})")
    }
}
