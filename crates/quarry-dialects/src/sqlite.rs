//! The SQLite dialect.
//!
//! SQLite stores booleans as integers, has no typed date literals, and
//! spells its string functions differently from the standard (`INSTR`,
//! `SUBSTR`, `STRFTIME`). Date arithmetic goes through the `DATETIME`
//! modifier syntax.

use quarry_db::dialect::{DatePart, Dialect, IntervalUnit};

/// The SQLite formatting policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn vendor(&self) -> &'static str {
        "sqlite"
    }

    fn true_literal(&self) -> &'static str {
        "1"
    }

    fn false_literal(&self) -> &'static str {
        "0"
    }

    fn date_literal(&self, date: &chrono::NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    fn datetime_literal(&self, datetime: &chrono::NaiveDateTime) -> String {
        format!("'{}'", datetime.format("%Y-%m-%d %H:%M:%S"))
    }

    fn position_of(&self, haystack: &str, needle: &str) -> String {
        format!("INSTR({haystack}, {needle})")
    }

    fn substring(&self, expr: &str, start: &str, length: Option<&str>) -> String {
        length.map_or_else(
            || format!("SUBSTR({expr}, {start})"),
            |len| format!("SUBSTR({expr}, {start}, {len})"),
        )
    }

    fn current_date(&self) -> &'static str {
        "DATE('now')"
    }

    fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
        let unit = match unit {
            IntervalUnit::Days => "days",
            IntervalUnit::Hours => "hours",
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Seconds => "seconds",
        };
        format!("DATETIME({expr}, ({amount}) || ' {unit}')")
    }

    fn date_part(&self, expr: &str, part: DatePart) -> String {
        let fmt = match part {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
            DatePart::Day => "%d",
        };
        format!("CAST(STRFTIME('{fmt}', {expr}) AS INTEGER)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_db::value::Value;

    #[test]
    fn test_booleans_are_integers() {
        let d = SqliteDialect;
        assert_eq!(d.format_value(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(d.format_value(&Value::Bool(false)).unwrap(), "0");
    }

    #[test]
    fn test_date_literal_is_plain_string() {
        let d = SqliteDialect;
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(d.format_value(&Value::Date(date)).unwrap(), "'2024-01-15'");
    }

    #[test]
    fn test_position_uses_instr() {
        let d = SqliteDialect;
        assert_eq!(d.position_of("\"t\".\"s\"", "' '"), "INSTR(\"t\".\"s\", ' ')");
    }

    #[test]
    fn test_substring_uses_substr() {
        let d = SqliteDialect;
        assert_eq!(d.substring("x", "1", Some("3")), "SUBSTR(x, 1, 3)");
        assert_eq!(d.substring("x", "4", None), "SUBSTR(x, 4)");
    }

    #[test]
    fn test_add_interval_modifier_syntax() {
        let d = SqliteDialect;
        assert_eq!(
            d.add_interval("\"t\".\"d\"", "-3", IntervalUnit::Days),
            "DATETIME(\"t\".\"d\", (-3) || ' days')"
        );
    }

    #[test]
    fn test_date_part_uses_strftime() {
        let d = SqliteDialect;
        assert_eq!(
            d.date_part("\"t\".\"d\"", DatePart::Year),
            "CAST(STRFTIME('%Y', \"t\".\"d\") AS INTEGER)"
        );
    }

    #[test]
    fn test_arrays_unsupported() {
        let d = SqliteDialect;
        assert!(!d.supports_arrays());
        assert!(d.format_value(&Value::List(vec![Value::Int(1)])).is_err());
        assert!(d.array_contains("a", "b").is_err());
    }
}
