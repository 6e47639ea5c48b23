//! The PostgreSQL dialect.
//!
//! PostgreSQL is the closest of the stock dialects to standard SQL, so
//! most renderings come from the trait defaults. It is also the only stock
//! dialect with native array support.

use quarry_core::QuarryResult;
use quarry_db::dialect::{standard_format_value, Dialect, IntervalUnit};
use quarry_db::value::Value;

/// The PostgreSQL formatting policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn vendor(&self) -> &'static str {
        "postgresql"
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!("'\\x{hex}'::bytea")
    }

    fn format_value(&self, value: &Value) -> QuarryResult<String> {
        match value {
            Value::List(items) => {
                let rendered = items
                    .iter()
                    .map(|i| self.format_value(i))
                    .collect::<QuarryResult<Vec<_>>>()?;
                Ok(format!("ARRAY[{}]", rendered.join(", ")))
            }
            other => standard_format_value(self, other),
        }
    }

    fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
        let unit = match unit {
            IntervalUnit::Days => "1 day",
            IntervalUnit::Hours => "1 hour",
            IntervalUnit::Minutes => "1 minute",
            IntervalUnit::Seconds => "1 second",
        };
        format!("({expr} + ({amount} * INTERVAL '{unit}'))")
    }

    fn supports_arrays(&self) -> bool {
        true
    }

    fn array_contains(&self, array: &str, element: &str) -> QuarryResult<String> {
        Ok(format!("({element} = ANY({array}))"))
    }

    fn array_length(&self, array: &str) -> QuarryResult<String> {
        Ok(format!("CARDINALITY({array})"))
    }
}
