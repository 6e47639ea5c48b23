//! Typed expression facades, one per type family.
//!
//! Each facade is a newtype over [`Expr`] exposing only the operations
//! legal for its family; comparisons return [`BooleanExpression`], so an
//! illegal cross-family composition is a compile error in the caller's
//! code rather than a runtime surprise. Facades are immutable: every method
//! consumes `self` and returns a new expression. Clone a facade to reuse a
//! template — the clone is structurally equal and fully independent.

use std::ops;

use quarry_core::QuarryResult;

use crate::dialect::{ComparisonOp, DatePart, Dialect, IntervalUnit};
use crate::expr::core::{AggregateFunc, ArithmeticOp, Expr};
use crate::value::Value;

macro_rules! facade_common {
    ($name:ident) => {
        impl $name {
            /// Wraps a raw tree. Callers normally obtain instances from
            /// column references or literal conversions instead.
            pub(crate) const fn from_expr(expr: Expr) -> Self {
                Self(expr)
            }

            /// Borrows the underlying tree.
            pub const fn expr(&self) -> &Expr {
                &self.0
            }

            /// Unwraps into the underlying tree.
            pub fn into_expr(self) -> Expr {
                self.0
            }

            /// Compiles this expression to SQL against the given dialect.
            ///
            /// # Errors
            ///
            /// Returns an error when the dialect cannot express a node.
            pub fn to_sql(&self, dialect: &dyn Dialect) -> QuarryResult<String> {
                self.0.to_sql(dialect)
            }

            /// Returns the set of source tables this expression reads from.
            pub fn tables_involved(&self) -> std::collections::BTreeSet<String> {
                self.0.tables_involved()
            }

            /// Returns `true` iff this expression reads from no table.
            pub fn is_purely_functional(&self) -> bool {
                self.0.is_purely_functional()
            }

            /// Returns `true` if any node in this tree aggregates.
            pub fn is_aggregator(&self) -> bool {
                self.0.is_aggregator()
            }

            /// Produces a null test for this expression.
            pub fn is_null(self) -> BooleanExpression {
                BooleanExpression(Expr::IsNull {
                    expr: Box::new(self.0),
                    negated: false,
                })
            }
        }

        impl From<$name> for Expr {
            fn from(facade: $name) -> Self {
                facade.into_expr()
            }
        }
    };
}

fn cmp(op: ComparisonOp, lhs: Expr, rhs: Expr) -> BooleanExpression {
    BooleanExpression(Expr::Comparison {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

// ── Boolean ────────────────────────────────────────────────────────────

/// A boolean-producing expression: a predicate.
///
/// Combine with `&` (AND), `|` (OR), and `!` (NOT); nested conjunctions
/// and disjunctions are flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpression(Expr);

facade_common!(BooleanExpression);

impl BooleanExpression {
    /// Produces an equality test against another boolean expression.
    pub fn is(self, other: impl Into<Self>) -> Self {
        cmp(ComparisonOp::Equal, self.0, other.into().0)
    }
}

impl From<bool> for BooleanExpression {
    fn from(v: bool) -> Self {
        Self(Expr::literal(v))
    }
}

impl ops::BitAnd for BooleanExpression {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self.0, rhs.0) {
            // Flatten nested ANDs
            (Expr::And(mut left), Expr::And(right)) => {
                left.extend(right);
                Self(Expr::And(left))
            }
            (Expr::And(mut left), other) => {
                left.push(other);
                Self(Expr::And(left))
            }
            (other, Expr::And(mut right)) => {
                right.insert(0, other);
                Self(Expr::And(right))
            }
            (left, right) => Self(Expr::And(vec![left, right])),
        }
    }
}

impl ops::BitOr for BooleanExpression {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self.0, rhs.0) {
            // Flatten nested ORs
            (Expr::Or(mut left), Expr::Or(right)) => {
                left.extend(right);
                Self(Expr::Or(left))
            }
            (Expr::Or(mut left), other) => {
                left.push(other);
                Self(Expr::Or(left))
            }
            (other, Expr::Or(mut right)) => {
                right.insert(0, other);
                Self(Expr::Or(right))
            }
            (left, right) => Self(Expr::Or(vec![left, right])),
        }
    }
}

impl ops::Not for BooleanExpression {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self.0 {
            Expr::Not(inner) => Self(*inner),
            other => Self(Expr::Not(Box::new(other))),
        }
    }
}

// ── Number ─────────────────────────────────────────────────────────────

/// A number-producing expression.
///
/// Arithmetic follows the host numeric type's native semantics: integer
/// operands divide with truncation toward zero, floating-point operands do
/// not. See [`divided_by`](Self::divided_by) for the backend caveat.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberExpression(Expr);

facade_common!(NumberExpression);

impl NumberExpression {
    fn arith(op: ArithmeticOp, lhs: Expr, rhs: Expr) -> Self {
        Self(Expr::Arithmetic {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Addition.
    pub fn plus(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::Add, self.0, other.into().0)
    }

    /// Subtraction.
    pub fn minus(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::Subtract, self.0, other.into().0)
    }

    /// Multiplication.
    pub fn times(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::Multiply, self.0, other.into().0)
    }

    /// Division via the backend's native `/` operator.
    ///
    /// For integer operands this truncates toward zero on backends whose
    /// `/` is integer division (PostgreSQL, SQLite). On backends whose `/`
    /// always produces a decimal (MySQL), use
    /// [`integer_divided_by`](Self::integer_divided_by) when truncating
    /// semantics are required.
    pub fn divided_by(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::Divide, self.0, other.into().0)
    }

    /// Division that truncates toward zero on every backend.
    pub fn integer_divided_by(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::IntegerDivide, self.0, other.into().0)
    }

    /// Remainder.
    pub fn modulo(self, other: impl Into<Self>) -> Self {
        Self::arith(ArithmeticOp::Modulo, self.0, other.into().0)
    }

    /// Equality test.
    pub fn is(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::Equal, self.0, other.into().0)
    }

    /// Inequality test.
    pub fn is_not(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::NotEqual, self.0, other.into().0)
    }

    /// Strict less-than test.
    pub fn is_less_than(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::LessThan, self.0, other.into().0)
    }

    /// Less-than-or-equal test.
    pub fn is_less_than_or_equal(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::LessThanOrEqual, self.0, other.into().0)
    }

    /// Strict greater-than test.
    pub fn is_greater_than(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::GreaterThan, self.0, other.into().0)
    }

    /// Greater-than-or-equal test.
    pub fn is_greater_than_or_equal(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::GreaterThanOrEqual, self.0, other.into().0)
    }

    /// The cross-family escape hatch: this number rendered as a string.
    pub fn string_result(self) -> StringExpression {
        StringExpression(Expr::ToText(Box::new(self.0)))
    }

    /// SUM over a result set.
    pub fn sum(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Sum,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// AVG over a result set.
    pub fn average(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Avg,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// MIN over a result set.
    pub fn min(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Min,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// MAX over a result set.
    pub fn max(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Max,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// COUNT(*) over a result set.
    pub fn count_all() -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Count,
            arg: None,
            distinct: false,
        })
    }
}

impl From<i32> for NumberExpression {
    fn from(v: i32) -> Self {
        Self(Expr::literal(v))
    }
}

impl From<i64> for NumberExpression {
    fn from(v: i64) -> Self {
        Self(Expr::literal(v))
    }
}

impl From<f64> for NumberExpression {
    fn from(v: f64) -> Self {
        Self(Expr::literal(v))
    }
}

// ── String ─────────────────────────────────────────────────────────────

/// A string-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub struct StringExpression(Expr);

facade_common!(StringExpression);

impl StringExpression {
    /// Concatenates another string onto the end of this one.
    pub fn append(self, other: impl Into<Self>) -> Self {
        Self(Expr::Concat(Box::new(self.0), Box::new(other.into().0)))
    }

    /// Uppercase transform.
    pub fn uppercase(self) -> Self {
        Self(Expr::Upper(Box::new(self.0)))
    }

    /// Lowercase transform.
    pub fn lowercase(self) -> Self {
        Self(Expr::Lower(Box::new(self.0)))
    }

    /// Whitespace trim.
    pub fn trimmed(self) -> Self {
        Self(Expr::Trim(Box::new(self.0)))
    }

    /// Character length.
    pub fn length(self) -> NumberExpression {
        NumberExpression(Expr::Length(Box::new(self.0)))
    }

    /// Substring with a 1-based start and optional length.
    pub fn substring(
        self,
        start: impl Into<NumberExpression>,
        length: Option<NumberExpression>,
    ) -> Self {
        Self(Expr::Substring {
            expr: Box::new(self.0),
            start: Box::new(start.into().into_expr()),
            length: length.map(|l| Box::new(l.into_expr())),
        })
    }

    /// The portion of this string before the first occurrence of the
    /// separator; empty when the separator is absent.
    pub fn substring_before(self, separator: impl Into<Self>) -> Self {
        Self(Expr::SubstringBefore {
            expr: Box::new(self.0),
            separator: Box::new(separator.into().0),
        })
    }

    /// The portion of this string after the first occurrence of the
    /// separator; empty when the separator is absent.
    pub fn substring_after(self, separator: impl Into<Self>) -> Self {
        Self(Expr::SubstringAfter {
            expr: Box::new(self.0),
            separator: Box::new(separator.into().0),
        })
    }

    /// The 1-based position of the needle inside this string, 0 when
    /// absent.
    pub fn position_of(self, needle: impl Into<Self>) -> NumberExpression {
        NumberExpression(Expr::Position {
            haystack: Box::new(self.0),
            needle: Box::new(needle.into().0),
        })
    }

    /// Equality test. Case-sensitivity follows the backend's collation.
    pub fn is(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::Equal, self.0, other.into().0)
    }

    /// Inequality test.
    pub fn is_not(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::NotEqual, self.0, other.into().0)
    }

    /// Lexicographic less-than test.
    pub fn is_less_than(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::LessThan, self.0, other.into().0)
    }

    /// Lexicographic greater-than test.
    pub fn is_greater_than(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::GreaterThan, self.0, other.into().0)
    }

    /// Pattern match using the backend's `LIKE` semantics.
    pub fn is_like(self, pattern: impl Into<Self>) -> BooleanExpression {
        BooleanExpression(Expr::Like {
            expr: Box::new(self.0),
            pattern: Box::new(pattern.into().0),
            ignore_case: false,
        })
    }

    /// Case-folded pattern match.
    pub fn is_like_ignore_case(self, pattern: impl Into<Self>) -> BooleanExpression {
        BooleanExpression(Expr::Like {
            expr: Box::new(self.0),
            pattern: Box::new(pattern.into().0),
            ignore_case: true,
        })
    }

    /// MIN over a result set.
    pub fn min(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Min,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// MAX over a result set.
    pub fn max(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Max,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }
}

impl From<&str> for StringExpression {
    fn from(v: &str) -> Self {
        Self(Expr::literal(v))
    }
}

impl From<String> for StringExpression {
    fn from(v: String) -> Self {
        Self(Expr::literal(v))
    }
}

// ── Date ───────────────────────────────────────────────────────────────

/// A date-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub struct DateExpression(Expr);

facade_common!(DateExpression);

impl DateExpression {
    /// The current date on the database server.
    pub const fn current_date() -> Self {
        Self(Expr::CurrentDate)
    }

    fn shifted(self, amount: impl Into<NumberExpression>, unit: IntervalUnit) -> Self {
        Self(Expr::AddInterval {
            expr: Box::new(self.0),
            amount: Box::new(amount.into().into_expr()),
            unit,
        })
    }

    /// This date shifted by a number of days.
    pub fn add_days(self, amount: impl Into<NumberExpression>) -> Self {
        self.shifted(amount, IntervalUnit::Days)
    }

    /// This date shifted by a number of hours.
    pub fn add_hours(self, amount: impl Into<NumberExpression>) -> Self {
        self.shifted(amount, IntervalUnit::Hours)
    }

    /// This date shifted by a number of minutes.
    pub fn add_minutes(self, amount: impl Into<NumberExpression>) -> Self {
        self.shifted(amount, IntervalUnit::Minutes)
    }

    /// This date shifted by a number of seconds.
    pub fn add_seconds(self, amount: impl Into<NumberExpression>) -> Self {
        self.shifted(amount, IntervalUnit::Seconds)
    }

    /// The calendar year.
    pub fn year(self) -> NumberExpression {
        NumberExpression(Expr::DatePart {
            expr: Box::new(self.0),
            part: DatePart::Year,
        })
    }

    /// The calendar month, 1-12.
    pub fn month(self) -> NumberExpression {
        NumberExpression(Expr::DatePart {
            expr: Box::new(self.0),
            part: DatePart::Month,
        })
    }

    /// The day of the month, 1-31.
    pub fn day(self) -> NumberExpression {
        NumberExpression(Expr::DatePart {
            expr: Box::new(self.0),
            part: DatePart::Day,
        })
    }

    /// Equality test.
    pub fn is(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::Equal, self.0, other.into().0)
    }

    /// Strictly-earlier test.
    pub fn is_before(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::LessThan, self.0, other.into().0)
    }

    /// Strictly-later test.
    pub fn is_after(self, other: impl Into<Self>) -> BooleanExpression {
        cmp(ComparisonOp::GreaterThan, self.0, other.into().0)
    }

    /// The cross-family escape hatch: this date rendered as a string.
    pub fn string_result(self) -> StringExpression {
        StringExpression(Expr::ToText(Box::new(self.0)))
    }

    /// MIN over a result set.
    pub fn min(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Min,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }

    /// MAX over a result set.
    pub fn max(self) -> Self {
        Self(Expr::Aggregate {
            func: AggregateFunc::Max,
            arg: Some(Box::new(self.0)),
            distinct: false,
        })
    }
}

impl From<chrono::NaiveDate> for DateExpression {
    fn from(v: chrono::NaiveDate) -> Self {
        Self(Expr::literal(v))
    }
}

impl From<chrono::NaiveDateTime> for DateExpression {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self(Expr::literal(v))
    }
}

// ── Large object ───────────────────────────────────────────────────────

/// A large-object expression. Large objects carry no equality semantics,
/// so this facade deliberately exposes no comparisons; the null test is
/// the only predicate available.
#[derive(Debug, Clone, PartialEq)]
pub struct LargeObjectExpression(Expr);

facade_common!(LargeObjectExpression);

// ── Array ──────────────────────────────────────────────────────────────

/// An array expression. Compiling any array operation fails on dialects
/// without native array support.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression(Expr);

facade_common!(ArrayExpression);

impl ArrayExpression {
    /// Membership test for a candidate element.
    pub fn contains(self, element: impl Into<Value>) -> BooleanExpression {
        BooleanExpression(Expr::ArrayContains {
            array: Box::new(self.0),
            element: Box::new(Expr::literal(element)),
        })
    }

    /// The number of elements in the array.
    pub fn length(self) -> NumberExpression {
        NumberExpression(Expr::ArrayLength(Box::new(self.0)))
    }
}
