//! In-process evaluation of expression trees against a single row.
//!
//! The evaluator mirrors the SQL the tree compiles to, which makes computed
//! columns testable without a database: comparisons involving NULL are
//! false, string positions are 1-based, and integer arithmetic truncates
//! toward zero. Aggregates cannot be evaluated here — they need a result
//! set, which belongs to the statement-execution layer outside this engine.

use std::cmp::Ordering;

use quarry_core::{QuarryError, QuarryResult};

use crate::expr::core::{AggregateFunc, ArithmeticOp, Expr};
use crate::dialect::{ComparisonOp, DatePart, IntervalUnit};
use crate::row::Row;
use crate::value::Value;

impl Expr {
    /// Evaluates this expression against one row.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Evaluation`] for trees that cannot be
    /// evaluated in-process (aggregates, division by zero) and
    /// [`QuarryError::UnknownColumn`] for columns absent from the row.
    pub fn evaluate(&self, row: &Row) -> QuarryResult<Value> {
        match self {
            Self::Column(c) => row
                .get_value(&c.column)
                .cloned()
                .ok_or_else(|| QuarryError::UnknownColumn {
                    column: c.column.clone(),
                }),
            Self::Literal(v) => Ok(v.clone()),
            Self::Arithmetic { op, lhs, rhs } => {
                arithmetic(*op, lhs.evaluate(row)?, rhs.evaluate(row)?)
            }
            Self::Concat(a, b) => {
                match (a.evaluate(row)?, b.evaluate(row)?) {
                    (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
                    (l, r) => Ok(Value::String(format!(
                        "{}{}",
                        string_of(&l)?,
                        string_of(&r)?
                    ))),
                }
            }
            Self::Upper(e) => map_string(e.evaluate(row)?, |s| s.to_uppercase()),
            Self::Lower(e) => map_string(e.evaluate(row)?, |s| s.to_lowercase()),
            Self::Trim(e) => map_string(e.evaluate(row)?, |s| s.trim().to_string()),
            Self::Length(e) => match e.evaluate(row)? {
                Value::Null => Ok(Value::Null),
                v => Ok(Value::Int(string_of(&v)?.chars().count() as i64)),
            },
            Self::Substring { expr, start, length } => {
                let v = expr.evaluate(row)?;
                if v.is_null() {
                    return Ok(Value::Null);
                }
                let s = string_of(&v)?;
                let start = int_of(&start.evaluate(row)?)?.max(1) as usize;
                let chars: Vec<char> = s.chars().collect();
                let from = (start - 1).min(chars.len());
                let taken: String = match length {
                    Some(l) => {
                        let len = int_of(&l.evaluate(row)?)?.max(0) as usize;
                        chars[from..].iter().take(len).collect()
                    }
                    None => chars[from..].iter().collect(),
                };
                Ok(Value::String(taken))
            }
            Self::SubstringBefore { expr, separator } => {
                split_at_separator(expr.evaluate(row)?, separator.evaluate(row)?, true)
            }
            Self::SubstringAfter { expr, separator } => {
                split_at_separator(expr.evaluate(row)?, separator.evaluate(row)?, false)
            }
            Self::Position { haystack, needle } => {
                match (haystack.evaluate(row)?, needle.evaluate(row)?) {
                    (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
                    (h, n) => {
                        let hay = string_of(&h)?;
                        let needle = string_of(&n)?;
                        Ok(Value::Int(hay.find(&needle).map_or(0, |byte_idx| {
                            hay[..byte_idx].chars().count() as i64 + 1
                        })))
                    }
                }
            }
            Self::ToText(e) => match e.evaluate(row)? {
                Value::Null => Ok(Value::Null),
                v => Ok(Value::String(v.to_string())),
            },
            Self::CurrentDate => Ok(Value::Date(chrono::Utc::now().date_naive())),
            Self::AddInterval { expr, amount, unit } => {
                let base = expr.evaluate(row)?;
                if base.is_null() {
                    return Ok(Value::Null);
                }
                let n = int_of(&amount.evaluate(row)?)?;
                shift_date(&base, n, *unit)
            }
            Self::DatePart { expr, part } => {
                use chrono::Datelike;
                let date = match expr.evaluate(row)? {
                    Value::Null => return Ok(Value::Null),
                    Value::Date(d) => d,
                    Value::DateTime(dt) => dt.date(),
                    other => return Err(evaluation_mismatch("date", &other)),
                };
                Ok(Value::Int(match part {
                    DatePart::Year => i64::from(date.year()),
                    DatePart::Month => i64::from(date.month()),
                    DatePart::Day => i64::from(date.day()),
                }))
            }
            Self::Aggregate { func, .. } => Err(QuarryError::Evaluation(format!(
                "{} requires a result set and cannot be evaluated against a single row",
                aggregate_name(*func)
            ))),
            Self::Comparison { op, lhs, rhs } => {
                let ord = compare(&lhs.evaluate(row)?, &rhs.evaluate(row)?)?;
                Ok(Value::Bool(ord.is_some_and(|o| match op {
                    ComparisonOp::Equal => o == Ordering::Equal,
                    ComparisonOp::NotEqual => o != Ordering::Equal,
                    ComparisonOp::LessThan => o == Ordering::Less,
                    ComparisonOp::LessThanOrEqual => o != Ordering::Greater,
                    ComparisonOp::GreaterThan => o == Ordering::Greater,
                    ComparisonOp::GreaterThanOrEqual => o != Ordering::Less,
                })))
            }
            Self::And(children) => {
                for c in children {
                    if !truthy(&c.evaluate(row)?) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Self::Or(children) => {
                for c in children {
                    if truthy(&c.evaluate(row)?) {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Self::Not(e) => Ok(Value::Bool(!truthy(&e.evaluate(row)?))),
            Self::IsNull { expr, negated } => {
                let is_null = expr.evaluate(row)?.is_null();
                Ok(Value::Bool(is_null != *negated))
            }
            Self::InList { expr, items, ignore_case } => {
                let needle = expr.evaluate(row)?;
                if needle.is_null() {
                    return Ok(Value::Bool(false));
                }
                for item in items {
                    let candidate = item.evaluate(row)?;
                    let matched = if *ignore_case {
                        folded_equal(&needle, &candidate)?
                    } else {
                        compare(&needle, &candidate)? == Some(Ordering::Equal)
                    };
                    if matched {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Self::Like { expr, pattern, ignore_case } => {
                match (expr.evaluate(row)?, pattern.evaluate(row)?) {
                    (Value::Null, _) | (_, Value::Null) => Ok(Value::Bool(false)),
                    (v, p) => {
                        let mut text = string_of(&v)?;
                        let mut pat = string_of(&p)?;
                        if *ignore_case {
                            text = text.to_lowercase();
                            pat = pat.to_lowercase();
                        }
                        Ok(Value::Bool(like_match(&text, &pat)))
                    }
                }
            }
            Self::ArrayContains { array, element } => {
                let arr = array.evaluate(row)?;
                let needle = element.evaluate(row)?;
                match arr {
                    Value::Null => Ok(Value::Bool(false)),
                    Value::List(items) => {
                        for item in &items {
                            if compare(&needle, item)? == Some(Ordering::Equal) {
                                return Ok(Value::Bool(true));
                            }
                        }
                        Ok(Value::Bool(false))
                    }
                    other => Err(evaluation_mismatch("array", &other)),
                }
            }
            Self::ArrayLength(e) => match e.evaluate(row)? {
                Value::Null => Ok(Value::Null),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                other => Err(evaluation_mismatch("array", &other)),
            },
        }
    }
}

const fn aggregate_name(func: AggregateFunc) -> &'static str {
    func.sql_name()
}

fn evaluation_mismatch(expected: &str, actual: &Value) -> QuarryError {
    QuarryError::Evaluation(format!("expected a {expected} value, got {actual}"))
}

fn string_of(value: &Value) -> QuarryResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Uuid(u) => Ok(u.to_string()),
        other => Err(evaluation_mismatch("string", other)),
    }
}

fn int_of(value: &Value) -> QuarryResult<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        other => Err(evaluation_mismatch("integer", other)),
    }
}

fn map_string(value: Value, f: impl Fn(&str) -> String) -> QuarryResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        v => Ok(Value::String(f(&string_of(&v)?))),
    }
}

fn split_at_separator(value: Value, separator: Value, before: bool) -> QuarryResult<Value> {
    match (value, separator) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (v, s) => {
            let text = string_of(&v)?;
            let sep = string_of(&s)?;
            let part = text.find(&sep).map_or_else(String::new, |idx| {
                if before {
                    text[..idx].to_string()
                } else {
                    text[idx + sep.len()..].to_string()
                }
            });
            Ok(Value::String(part))
        }
    }
}

fn arithmetic(op: ArithmeticOp, lhs: Value, rhs: Value) -> QuarryResult<Value> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }
    match (&lhs, &rhs) {
        (Value::Int(l), Value::Int(r)) => int_arithmetic(op, *l, *r),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let l = number_of(&lhs)?;
            let r = number_of(&rhs)?;
            float_arithmetic(op, l, r)
        }
        _ => Err(QuarryError::Evaluation(format!(
            "arithmetic requires numeric operands, got {lhs} and {rhs}"
        ))),
    }
}

fn number_of(value: &Value) -> QuarryResult<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(evaluation_mismatch("number", other)),
    }
}

fn int_arithmetic(op: ArithmeticOp, l: i64, r: i64) -> QuarryResult<Value> {
    let divide = |l: i64, r: i64| {
        l.checked_div(r)
            .ok_or_else(|| QuarryError::Evaluation("division by zero".to_string()))
    };
    match op {
        ArithmeticOp::Add => Ok(Value::Int(l.wrapping_add(r))),
        ArithmeticOp::Subtract => Ok(Value::Int(l.wrapping_sub(r))),
        ArithmeticOp::Multiply => Ok(Value::Int(l.wrapping_mul(r))),
        // Integer division truncates toward zero.
        ArithmeticOp::Divide | ArithmeticOp::IntegerDivide => divide(l, r).map(Value::Int),
        ArithmeticOp::Modulo => l
            .checked_rem(r)
            .map(Value::Int)
            .ok_or_else(|| QuarryError::Evaluation("division by zero".to_string())),
    }
}

fn float_arithmetic(op: ArithmeticOp, l: f64, r: f64) -> QuarryResult<Value> {
    match op {
        ArithmeticOp::Add => Ok(Value::Float(l + r)),
        ArithmeticOp::Subtract => Ok(Value::Float(l - r)),
        ArithmeticOp::Multiply => Ok(Value::Float(l * r)),
        ArithmeticOp::Divide => Ok(Value::Float(l / r)),
        ArithmeticOp::IntegerDivide => Ok(Value::Float((l / r).trunc())),
        ArithmeticOp::Modulo => Ok(Value::Float(l % r)),
    }
}

fn shift_date(base: &Value, amount: i64, unit: IntervalUnit) -> QuarryResult<Value> {
    let duration = match unit {
        IntervalUnit::Days => chrono::Duration::days(amount),
        IntervalUnit::Hours => chrono::Duration::hours(amount),
        IntervalUnit::Minutes => chrono::Duration::minutes(amount),
        IntervalUnit::Seconds => chrono::Duration::seconds(amount),
    };
    match (base, unit) {
        // Whole-day shifts keep a date a date.
        (Value::Date(d), IntervalUnit::Days) => Ok(Value::Date(*d + duration)),
        (Value::Date(d), _) => Ok(Value::DateTime(
            d.and_hms_opt(0, 0, 0)
                .ok_or_else(|| QuarryError::Evaluation("invalid date".to_string()))?
                + duration,
        )),
        (Value::DateTime(dt), _) => Ok(Value::DateTime(*dt + duration)),
        (other, _) => Err(evaluation_mismatch("date", other)),
    }
}

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn folded_equal(l: &Value, r: &Value) -> QuarryResult<bool> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Ok(a.to_lowercase() == b.to_lowercase()),
        _ => Ok(compare(l, r)? == Some(Ordering::Equal)),
    }
}

/// Three-valued comparison: `None` when either side is NULL, mirroring
/// SQL's UNKNOWN.
fn compare(l: &Value, r: &Value) -> QuarryResult<Option<Ordering>> {
    let ord = match (l, r) {
        (Value::Null, _) | (_, Value::Null) => return Ok(None),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = number_of(l)?;
            let b = number_of(r)?;
            a.partial_cmp(&b).ok_or_else(|| {
                QuarryError::Evaluation("NaN is not comparable".to_string())
            })?
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        (Value::Date(a), Value::DateTime(b)) => a
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| QuarryError::Evaluation("invalid date".to_string()))?
            .cmp(b),
        (Value::DateTime(a), Value::Date(b)) => a.cmp(
            &b.and_hms_opt(0, 0, 0)
                .ok_or_else(|| QuarryError::Evaluation("invalid date".to_string()))?,
        ),
        (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
        _ => {
            return Err(QuarryError::Evaluation(format!(
                "cannot compare {l} with {r}"
            )))
        }
    };
    Ok(Some(ord))
}

/// Matches SQL LIKE semantics: `%` matches any run of characters, `_`
/// matches exactly one.
fn like_match(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    like_match_inner(&t, &p)
}

fn like_match_inner(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'%', rest)) => {
            (0..=text.len()).any(|skip| like_match_inner(&text[skip..], rest))
        }
        Some((&'_', rest)) => !text.is_empty() && like_match_inner(&text[1..], rest),
        Some((c, rest)) => {
            text.first() == Some(c) && like_match_inner(&text[1..], rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::core::ColumnExpr;
    use crate::value::Family;

    fn col(column: &str, family: Family) -> Expr {
        Expr::Column(ColumnExpr {
            table: "t".to_string(),
            alias: "t".to_string(),
            column: column.to_string(),
            family,
            use_alias: true,
        })
    }

    #[test]
    fn test_substring_before_and_after() {
        let row = Row::from_pairs(vec![("name", Value::from("Dr Nonono"))]);
        let before = Expr::SubstringBefore {
            expr: Box::new(col("name", Family::String)),
            separator: Box::new(Expr::literal(" ")),
        };
        let after = Expr::SubstringAfter {
            expr: Box::new(col("name", Family::String)),
            separator: Box::new(Expr::literal(" ")),
        };
        assert_eq!(before.evaluate(&row).unwrap(), Value::from("Dr"));
        assert_eq!(after.evaluate(&row).unwrap(), Value::from("Nonono"));
    }

    #[test]
    fn test_substring_separator_absent_yields_empty() {
        let row = Row::from_pairs(vec![("name", Value::from("Mononymous"))]);
        let before = Expr::SubstringBefore {
            expr: Box::new(col("name", Family::String)),
            separator: Box::new(Expr::literal(" ")),
        };
        assert_eq!(before.evaluate(&row).unwrap(), Value::from(""));
    }

    #[test]
    fn test_integer_division_truncates() {
        let row = Row::from_pairs(vec![("x", Value::Int(7))]);
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Divide,
            lhs: Box::new(col("x", Family::Number)),
            rhs: Box::new(Expr::literal(2)),
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let row = Row::from_pairs(vec![("x", Value::Int(7))]);
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Divide,
            lhs: Box::new(col("x", Family::Number)),
            rhs: Box::new(Expr::literal(0)),
        };
        assert!(matches!(
            e.evaluate(&row).unwrap_err(),
            QuarryError::Evaluation(_)
        ));
    }

    #[test]
    fn test_float_division_does_not_truncate() {
        let row = Row::from_pairs(vec![("x", Value::Float(7.0))]);
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Divide,
            lhs: Box::new(col("x", Family::Number)),
            rhs: Box::new(Expr::literal(2)),
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn test_null_propagates_through_arithmetic() {
        let row = Row::from_pairs(vec![("x", Value::Null)]);
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Add,
            lhs: Box::new(col("x", Family::Number)),
            rhs: Box::new(Expr::literal(1)),
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Null);
    }

    #[test]
    fn test_comparison_with_null_is_false() {
        let row = Row::from_pairs(vec![("x", Value::Null)]);
        let e = Expr::Comparison {
            op: ComparisonOp::Equal,
            lhs: Box::new(col("x", Family::Number)),
            rhs: Box::new(Expr::literal(1)),
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_position_is_one_based() {
        let row = Row::from_pairs(vec![("s", Value::from("abcdef"))]);
        let e = Expr::Position {
            haystack: Box::new(col("s", Family::String)),
            needle: Box::new(Expr::literal("cd")),
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Int(3));
        let missing = Expr::Position {
            haystack: Box::new(col("s", Family::String)),
            needle: Box::new(Expr::literal("zz")),
        };
        assert_eq!(missing.evaluate(&row).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_like_matching() {
        assert!(like_match("Dr Nonono", "Dr%"));
        assert!(like_match("Dr Nonono", "%Nonono"));
        assert!(like_match("abc", "a_c"));
        assert!(!like_match("abc", "a_d"));
        assert!(!like_match("abc", "abcd"));
        assert!(like_match("", "%"));
    }

    #[test]
    fn test_add_days_keeps_date() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let row = Row::from_pairs(vec![("d", Value::Date(d))]);
        let e = Expr::AddInterval {
            expr: Box::new(col("d", Family::Date)),
            amount: Box::new(Expr::literal(10)),
            unit: IntervalUnit::Days,
        };
        assert_eq!(
            e.evaluate(&row).unwrap(),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 25).unwrap())
        );
    }

    #[test]
    fn test_date_part_extraction() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let row = Row::from_pairs(vec![("d", Value::Date(d))]);
        let year = Expr::DatePart {
            expr: Box::new(col("d", Family::Date)),
            part: DatePart::Year,
        };
        assert_eq!(year.evaluate(&row).unwrap(), Value::Int(2024));
    }

    #[test]
    fn test_aggregate_cannot_evaluate() {
        let row = Row::from_pairs(vec![("x", Value::Int(1))]);
        let e = Expr::Aggregate {
            func: AggregateFunc::Sum,
            arg: Some(Box::new(col("x", Family::Number))),
            distinct: false,
        };
        assert!(matches!(
            e.evaluate(&row).unwrap_err(),
            QuarryError::Evaluation(_)
        ));
    }

    #[test]
    fn test_in_list_ignore_case() {
        let row = Row::from_pairs(vec![("s", Value::from("ALICE"))]);
        let e = Expr::InList {
            expr: Box::new(col("s", Family::String)),
            items: vec![Expr::literal("alice"), Expr::literal("bob")],
            ignore_case: true,
        };
        assert_eq!(e.evaluate(&row).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_array_operations() {
        let row = Row::from_pairs(vec![(
            "tags",
            Value::List(vec![Value::from("red"), Value::from("blue")]),
        )]);
        let contains = Expr::ArrayContains {
            array: Box::new(col("tags", Family::Array)),
            element: Box::new(Expr::literal("blue")),
        };
        assert_eq!(contains.evaluate(&row).unwrap(), Value::Bool(true));
        let len = Expr::ArrayLength(Box::new(col("tags", Family::Array)));
        assert_eq!(len.evaluate(&row).unwrap(), Value::Int(2));
    }
}
