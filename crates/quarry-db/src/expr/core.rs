//! The expression AST and its compilation to SQL.
//!
//! [`Expr`] is the immutable, composable tree underneath the typed facades
//! in [`families`](crate::expr::families). Every node knows which source
//! tables it reads from ([`tables_involved`](Expr::tables_involved)) and
//! whether it aggregates. Compilation recursively renders children and
//! combines them with dialect-supplied tokens in one exhaustive match — a
//! node never special-cases a backend.

use std::collections::BTreeSet;

use quarry_core::QuarryResult;

use crate::dialect::{ComparisonOp, DatePart, Dialect, IntervalUnit};
use crate::value::{Family, Value};

/// A direct reference to a table column inside an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExpr {
    /// The owning table's name.
    pub table: String,
    /// The owning table's alias.
    pub alias: String,
    /// The column name.
    pub column: String,
    /// The column's declared type family.
    pub family: Family,
    /// Whether compilation qualifies the column with the alias rather than
    /// the table name. Disabled for correlated-subquery disambiguation.
    pub use_alias: bool,
}

/// A binary arithmetic operation on the number family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Addition.
    Add,
    /// Subtraction.
    Subtract,
    /// Multiplication.
    Multiply,
    /// The backend's native `/`. Truncates for integer operands on
    /// backends with integer division; see
    /// [`NumberExpression::divided_by`](crate::expr::NumberExpression::divided_by).
    Divide,
    /// Division that truncates toward zero on every backend.
    IntegerDivide,
    /// Remainder.
    Modulo,
}

impl ArithmeticOp {
    /// Returns the infix symbol for the natively-rendered operators.
    const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+"),
            Self::Subtract => Some("-"),
            Self::Multiply => Some("*"),
            Self::Divide => Some("/"),
            Self::IntegerDivide | Self::Modulo => None,
        }
    }
}

/// An aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunc {
    /// Returns the SQL function name for this aggregate.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// An immutable, typed expression node.
///
/// Cloning an expression yields a structurally equal, independent copy;
/// trees are side-effect-free once constructed and are discarded after
/// compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A table column reference.
    Column(ColumnExpr),
    /// A literal value.
    Literal(Value),
    /// Binary arithmetic between two number expressions.
    Arithmetic {
        /// The operation.
        op: ArithmeticOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// String concatenation.
    Concat(Box<Expr>, Box<Expr>),
    /// Uppercase transform.
    Upper(Box<Expr>),
    /// Lowercase transform.
    Lower(Box<Expr>),
    /// Whitespace trim.
    Trim(Box<Expr>),
    /// Character length of a string.
    Length(Box<Expr>),
    /// Substring extraction with a 1-based start and optional length.
    Substring {
        /// The string operand.
        expr: Box<Expr>,
        /// 1-based start position.
        start: Box<Expr>,
        /// Optional length.
        length: Option<Box<Expr>>,
    },
    /// The portion of a string before the first occurrence of a separator;
    /// the empty string when the separator is absent.
    SubstringBefore {
        /// The string operand.
        expr: Box<Expr>,
        /// The separator.
        separator: Box<Expr>,
    },
    /// The portion of a string after the first occurrence of a separator;
    /// the empty string when the separator is absent.
    SubstringAfter {
        /// The string operand.
        expr: Box<Expr>,
        /// The separator.
        separator: Box<Expr>,
    },
    /// 1-based position of a needle within a haystack, 0 when absent.
    Position {
        /// The string searched in.
        haystack: Box<Expr>,
        /// The string searched for.
        needle: Box<Expr>,
    },
    /// Cross-family coercion of any expression to its string rendering.
    ToText(Box<Expr>),
    /// The current date.
    CurrentDate,
    /// Date arithmetic: a date shifted by an amount of a calendar unit.
    AddInterval {
        /// The date operand.
        expr: Box<Expr>,
        /// The shift amount (a number expression).
        amount: Box<Expr>,
        /// The calendar unit.
        unit: IntervalUnit,
    },
    /// Extraction of a calendar component from a date.
    DatePart {
        /// The date operand.
        expr: Box<Expr>,
        /// The component to extract.
        part: DatePart,
    },
    /// An aggregate over a result set.
    Aggregate {
        /// The aggregate function.
        func: AggregateFunc,
        /// The aggregated expression; `None` means `COUNT(*)`.
        arg: Option<Box<Expr>>,
        /// Whether to aggregate distinct values only.
        distinct: bool,
    },
    /// A binary comparison producing a boolean.
    Comparison {
        /// The comparison operator.
        op: ComparisonOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Logical conjunction.
    And(Vec<Expr>),
    /// Logical disjunction.
    Or(Vec<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// A null test.
    IsNull {
        /// The tested expression.
        expr: Box<Expr>,
        /// `true` renders `IS NOT NULL`.
        negated: bool,
    },
    /// Set membership. An empty item list compiles to the dialect's
    /// unsatisfiable predicate, never to broken SQL.
    InList {
        /// The tested expression.
        expr: Box<Expr>,
        /// The permitted values.
        items: Vec<Expr>,
        /// Whether matching folds case on both sides.
        ignore_case: bool,
    },
    /// Pattern match.
    Like {
        /// The tested expression.
        expr: Box<Expr>,
        /// The pattern operand.
        pattern: Box<Expr>,
        /// Whether matching folds case on both sides.
        ignore_case: bool,
    },
    /// Array membership test; only some dialects support this.
    ArrayContains {
        /// The array operand.
        array: Box<Expr>,
        /// The candidate element.
        element: Box<Expr>,
    },
    /// Array length; only some dialects support this.
    ArrayLength(Box<Expr>),
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Self::Literal(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<chrono::NaiveDate> for Expr {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl From<chrono::NaiveDateTime> for Expr {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::Literal(Value::from(v))
    }
}

impl Expr {
    /// Wraps a literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Returns the type family this expression produces, or `None` for a
    /// bare `NULL` literal, which is compatible with every family.
    pub fn family(&self) -> Option<Family> {
        match self {
            Self::Column(c) => Some(c.family),
            Self::Literal(v) => v.family(),
            Self::Arithmetic { .. }
            | Self::Length(_)
            | Self::Position { .. }
            | Self::DatePart { .. }
            | Self::ArrayLength(_) => Some(Family::Number),
            Self::Aggregate { func, arg, .. } => match func {
                AggregateFunc::Count | AggregateFunc::Sum | AggregateFunc::Avg => {
                    Some(Family::Number)
                }
                AggregateFunc::Min | AggregateFunc::Max => {
                    arg.as_ref().and_then(|a| a.family())
                }
            },
            Self::Concat(_, _)
            | Self::Upper(_)
            | Self::Lower(_)
            | Self::Trim(_)
            | Self::Substring { .. }
            | Self::SubstringBefore { .. }
            | Self::SubstringAfter { .. }
            | Self::ToText(_) => Some(Family::String),
            Self::CurrentDate | Self::AddInterval { .. } => Some(Family::Date),
            Self::Comparison { .. }
            | Self::And(_)
            | Self::Or(_)
            | Self::Not(_)
            | Self::IsNull { .. }
            | Self::InList { .. }
            | Self::Like { .. }
            | Self::ArrayContains { .. } => Some(Family::Boolean),
        }
    }

    /// Returns the set of source tables this expression reads from.
    pub fn tables_involved(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    /// Returns `true` iff this expression reads from no table at all.
    pub fn is_purely_functional(&self) -> bool {
        self.tables_involved().is_empty()
    }

    /// Returns `true` if any node in this tree is an aggregate.
    pub fn is_aggregator(&self) -> bool {
        match self {
            Self::Aggregate { .. } => true,
            Self::Column(_) | Self::Literal(_) | Self::CurrentDate => false,
            Self::Arithmetic { lhs, rhs, .. } | Self::Comparison { lhs, rhs, .. } => {
                lhs.is_aggregator() || rhs.is_aggregator()
            }
            Self::Concat(a, b) => a.is_aggregator() || b.is_aggregator(),
            Self::Upper(e)
            | Self::Lower(e)
            | Self::Trim(e)
            | Self::Length(e)
            | Self::ToText(e)
            | Self::Not(e)
            | Self::ArrayLength(e) => e.is_aggregator(),
            Self::IsNull { expr, .. } | Self::DatePart { expr, .. } => expr.is_aggregator(),
            Self::Substring { expr, start, length } => {
                expr.is_aggregator()
                    || start.is_aggregator()
                    || length.as_ref().is_some_and(|l| l.is_aggregator())
            }
            Self::SubstringBefore { expr, separator }
            | Self::SubstringAfter { expr, separator } => {
                expr.is_aggregator() || separator.is_aggregator()
            }
            Self::Position { haystack, needle } => {
                haystack.is_aggregator() || needle.is_aggregator()
            }
            Self::AddInterval { expr, amount, .. } => {
                expr.is_aggregator() || amount.is_aggregator()
            }
            Self::And(children) | Self::Or(children) => {
                children.iter().any(Self::is_aggregator)
            }
            Self::InList { expr, items, .. } => {
                expr.is_aggregator() || items.iter().any(Self::is_aggregator)
            }
            Self::Like { expr, pattern, .. } => expr.is_aggregator() || pattern.is_aggregator(),
            Self::ArrayContains { array, element } => {
                array.is_aggregator() || element.is_aggregator()
            }
        }
    }

    /// Returns a structurally identical tree whose literal leaves have been
    /// passed through `adapt`. Used when projecting an operator onto a
    /// differently-typed column.
    pub fn map_literals(&self, adapt: &dyn Fn(&Value) -> Value) -> Self {
        let map = |e: &Self| Box::new(e.map_literals(adapt));
        match self {
            Self::Literal(v) => Self::Literal(adapt(v)),
            Self::Column(_) | Self::CurrentDate => self.clone(),
            Self::Arithmetic { op, lhs, rhs } => Self::Arithmetic {
                op: *op,
                lhs: map(lhs),
                rhs: map(rhs),
            },
            Self::Concat(a, b) => Self::Concat(map(a), map(b)),
            Self::Upper(e) => Self::Upper(map(e)),
            Self::Lower(e) => Self::Lower(map(e)),
            Self::Trim(e) => Self::Trim(map(e)),
            Self::Length(e) => Self::Length(map(e)),
            Self::Substring { expr, start, length } => Self::Substring {
                expr: map(expr),
                start: map(start),
                length: length.as_ref().map(|l| map(l)),
            },
            Self::SubstringBefore { expr, separator } => Self::SubstringBefore {
                expr: map(expr),
                separator: map(separator),
            },
            Self::SubstringAfter { expr, separator } => Self::SubstringAfter {
                expr: map(expr),
                separator: map(separator),
            },
            Self::Position { haystack, needle } => Self::Position {
                haystack: map(haystack),
                needle: map(needle),
            },
            Self::ToText(e) => Self::ToText(map(e)),
            Self::AddInterval { expr, amount, unit } => Self::AddInterval {
                expr: map(expr),
                amount: map(amount),
                unit: *unit,
            },
            Self::DatePart { expr, part } => Self::DatePart {
                expr: map(expr),
                part: *part,
            },
            Self::Aggregate { func, arg, distinct } => Self::Aggregate {
                func: *func,
                arg: arg.as_ref().map(|a| map(a)),
                distinct: *distinct,
            },
            Self::Comparison { op, lhs, rhs } => Self::Comparison {
                op: *op,
                lhs: map(lhs),
                rhs: map(rhs),
            },
            Self::And(children) => {
                Self::And(children.iter().map(|c| c.map_literals(adapt)).collect())
            }
            Self::Or(children) => {
                Self::Or(children.iter().map(|c| c.map_literals(adapt)).collect())
            }
            Self::Not(e) => Self::Not(map(e)),
            Self::IsNull { expr, negated } => Self::IsNull {
                expr: map(expr),
                negated: *negated,
            },
            Self::InList { expr, items, ignore_case } => Self::InList {
                expr: map(expr),
                items: items.iter().map(|i| i.map_literals(adapt)).collect(),
                ignore_case: *ignore_case,
            },
            Self::Like { expr, pattern, ignore_case } => Self::Like {
                expr: map(expr),
                pattern: map(pattern),
                ignore_case: *ignore_case,
            },
            Self::ArrayContains { array, element } => Self::ArrayContains {
                array: map(array),
                element: map(element),
            },
            Self::ArrayLength(e) => Self::ArrayLength(map(e)),
        }
    }

    fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Column(c) => {
                out.insert(c.table.clone());
            }
            Self::Literal(_) | Self::CurrentDate => {}
            Self::Arithmetic { lhs, rhs, .. } | Self::Comparison { lhs, rhs, .. } => {
                lhs.collect_tables(out);
                rhs.collect_tables(out);
            }
            Self::Concat(a, b) => {
                a.collect_tables(out);
                b.collect_tables(out);
            }
            Self::Upper(e)
            | Self::Lower(e)
            | Self::Trim(e)
            | Self::Length(e)
            | Self::ToText(e)
            | Self::Not(e)
            | Self::ArrayLength(e) => e.collect_tables(out),
            Self::IsNull { expr, .. } | Self::DatePart { expr, .. } => expr.collect_tables(out),
            Self::Substring { expr, start, length } => {
                expr.collect_tables(out);
                start.collect_tables(out);
                if let Some(l) = length {
                    l.collect_tables(out);
                }
            }
            Self::SubstringBefore { expr, separator }
            | Self::SubstringAfter { expr, separator } => {
                expr.collect_tables(out);
                separator.collect_tables(out);
            }
            Self::Position { haystack, needle } => {
                haystack.collect_tables(out);
                needle.collect_tables(out);
            }
            Self::AddInterval { expr, amount, .. } => {
                expr.collect_tables(out);
                amount.collect_tables(out);
            }
            Self::Aggregate { arg, .. } => {
                if let Some(a) = arg {
                    a.collect_tables(out);
                }
            }
            Self::And(children) | Self::Or(children) => {
                for c in children {
                    c.collect_tables(out);
                }
            }
            Self::InList { expr, items, .. } => {
                expr.collect_tables(out);
                for i in items {
                    i.collect_tables(out);
                }
            }
            Self::Like { expr, pattern, .. } => {
                expr.collect_tables(out);
                pattern.collect_tables(out);
            }
            Self::ArrayContains { array, element } => {
                array.collect_tables(out);
                element.collect_tables(out);
            }
        }
    }

    /// Compiles this expression to SQL text against the given dialect.
    ///
    /// # Errors
    ///
    /// Returns an error when the dialect cannot express a node (array
    /// operations on backends without array support).
    pub fn to_sql(&self, dialect: &dyn Dialect) -> QuarryResult<String> {
        match self {
            Self::Column(c) => {
                let qualifier = if c.use_alias { &c.alias } else { &c.table };
                Ok(dialect.qualified_column(qualifier, &c.column))
            }
            Self::Literal(v) => dialect.format_value(v),
            Self::Arithmetic { op, lhs, rhs } => {
                let l = lhs.to_sql(dialect)?;
                let r = rhs.to_sql(dialect)?;
                op.symbol().map_or_else(
                    || match op {
                        ArithmeticOp::IntegerDivide => Ok(dialect.integer_division(&l, &r)),
                        _ => Ok(dialect.modulo(&l, &r)),
                    },
                    |sym| Ok(format!("({l} {sym} {r})")),
                )
            }
            Self::Concat(a, b) => Ok(dialect.concat(&a.to_sql(dialect)?, &b.to_sql(dialect)?)),
            Self::Upper(e) => Ok(dialect.uppercase_of(&e.to_sql(dialect)?)),
            Self::Lower(e) => Ok(dialect.lowercase_of(&e.to_sql(dialect)?)),
            Self::Trim(e) => Ok(dialect.trimmed(&e.to_sql(dialect)?)),
            Self::Length(e) => Ok(dialect.string_length(&e.to_sql(dialect)?)),
            Self::Substring { expr, start, length } => {
                let e = expr.to_sql(dialect)?;
                let s = start.to_sql(dialect)?;
                let len = length.as_ref().map(|l| l.to_sql(dialect)).transpose()?;
                Ok(dialect.substring(&e, &s, len.as_deref()))
            }
            Self::SubstringBefore { expr, separator } => {
                let e = expr.to_sql(dialect)?;
                let s = separator.to_sql(dialect)?;
                let pos = dialect.position_of(&e, &s);
                let head = dialect.substring(&e, "1", Some(&format!("({pos} - 1)")));
                let empty = dialect.string_literal("");
                Ok(format!(
                    "(CASE WHEN {pos} > 0 THEN {head} ELSE {empty} END)"
                ))
            }
            Self::SubstringAfter { expr, separator } => {
                let e = expr.to_sql(dialect)?;
                let s = separator.to_sql(dialect)?;
                let pos = dialect.position_of(&e, &s);
                let start = format!("({pos} + {})", dialect.string_length(&s));
                let tail = dialect.substring(&e, &start, None);
                let empty = dialect.string_literal("");
                Ok(format!(
                    "(CASE WHEN {pos} > 0 THEN {tail} ELSE {empty} END)"
                ))
            }
            Self::Position { haystack, needle } => {
                let h = haystack.to_sql(dialect)?;
                let n = needle.to_sql(dialect)?;
                Ok(dialect.position_of(&h, &n))
            }
            Self::ToText(e) => Ok(dialect.cast_to_text(&e.to_sql(dialect)?)),
            Self::CurrentDate => Ok(dialect.current_date().to_string()),
            Self::AddInterval { expr, amount, unit } => {
                let e = expr.to_sql(dialect)?;
                let a = amount.to_sql(dialect)?;
                Ok(dialect.add_interval(&e, &a, *unit))
            }
            Self::DatePart { expr, part } => {
                Ok(dialect.date_part(&expr.to_sql(dialect)?, *part))
            }
            Self::Aggregate { func, arg, distinct } => {
                let inner = match arg {
                    None => "*".to_string(),
                    Some(a) => a.to_sql(dialect)?,
                };
                if *distinct {
                    Ok(format!("{}(DISTINCT {inner})", func.sql_name()))
                } else {
                    Ok(format!("{}({inner})", func.sql_name()))
                }
            }
            Self::Comparison { op, lhs, rhs } => {
                let l = lhs.to_sql(dialect)?;
                let r = rhs.to_sql(dialect)?;
                Ok(format!("({l} {} {r})", dialect.comparison_token(*op)))
            }
            Self::And(children) => {
                if children.is_empty() {
                    return Ok(dialect.true_literal().to_string());
                }
                let parts = children
                    .iter()
                    .map(|c| c.to_sql(dialect))
                    .collect::<QuarryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" AND ")))
            }
            Self::Or(children) => {
                if children.is_empty() {
                    return Ok(dialect.false_literal().to_string());
                }
                let parts = children
                    .iter()
                    .map(|c| c.to_sql(dialect))
                    .collect::<QuarryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
            Self::Not(e) => Ok(format!("NOT ({})", e.to_sql(dialect)?)),
            Self::IsNull { expr, negated } => {
                let e = expr.to_sql(dialect)?;
                if *negated {
                    Ok(format!("({e} IS NOT NULL)"))
                } else {
                    Ok(format!("({e} IS NULL)"))
                }
            }
            Self::InList { expr, items, ignore_case } => {
                if items.is_empty() {
                    return Ok(dialect.unsatisfiable_predicate().to_string());
                }
                let fold = |sql: String| {
                    if *ignore_case {
                        dialect.lowercase_of(&sql)
                    } else {
                        sql
                    }
                };
                let e = fold(expr.to_sql(dialect)?);
                let rendered = items
                    .iter()
                    .map(|i| i.to_sql(dialect).map(&fold))
                    .collect::<QuarryResult<Vec<_>>>()?;
                Ok(format!("({e} IN ({}))", rendered.join(", ")))
            }
            Self::Like { expr, pattern, ignore_case } => {
                let mut e = expr.to_sql(dialect)?;
                let mut p = pattern.to_sql(dialect)?;
                if *ignore_case {
                    e = dialect.lowercase_of(&e);
                    p = dialect.lowercase_of(&p);
                }
                Ok(format!("({e} {} {p})", dialect.like_token()))
            }
            Self::ArrayContains { array, element } => {
                let a = array.to_sql(dialect)?;
                let el = element.to_sql(dialect)?;
                dialect.array_contains(&a, &el)
            }
            Self::ArrayLength(e) => dialect.array_length(&e.to_sql(dialect)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestDialect;

    impl Dialect for TestDialect {
        fn vendor(&self) -> &'static str {
            "test"
        }

        fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
            format!("({expr} + {amount} {unit:?})")
        }
    }

    fn col(table: &str, column: &str, family: Family) -> Expr {
        Expr::Column(ColumnExpr {
            table: table.to_string(),
            alias: table.to_string(),
            column: column.to_string(),
            family,
            use_alias: true,
        })
    }

    #[test]
    fn test_column_compiles_qualified() {
        let e = col("villain", "name", Family::String);
        assert_eq!(e.to_sql(&TestDialect).unwrap(), "\"villain\".\"name\"");
    }

    #[test]
    fn test_column_alias_toggle() {
        let mut column = ColumnExpr {
            table: "villain".to_string(),
            alias: "v1".to_string(),
            column: "name".to_string(),
            family: Family::String,
            use_alias: false,
        };
        let plain = Expr::Column(column.clone());
        assert_eq!(plain.to_sql(&TestDialect).unwrap(), "\"villain\".\"name\"");
        column.use_alias = true;
        let aliased = Expr::Column(column);
        assert_eq!(aliased.to_sql(&TestDialect).unwrap(), "\"v1\".\"name\"");
    }

    #[test]
    fn test_arithmetic_chain() {
        // ((x + 2 - 4) * 6) / 3
        let x = col("t", "x", Family::Number);
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Divide,
            lhs: Box::new(Expr::Arithmetic {
                op: ArithmeticOp::Multiply,
                lhs: Box::new(Expr::Arithmetic {
                    op: ArithmeticOp::Subtract,
                    lhs: Box::new(Expr::Arithmetic {
                        op: ArithmeticOp::Add,
                        lhs: Box::new(x),
                        rhs: Box::new(Expr::literal(2)),
                    }),
                    rhs: Box::new(Expr::literal(4)),
                }),
                rhs: Box::new(Expr::literal(6)),
            }),
            rhs: Box::new(Expr::literal(3)),
        };
        assert_eq!(
            e.to_sql(&TestDialect).unwrap(),
            "((((\"t\".\"x\" + 2) - 4) * 6) / 3)"
        );
    }

    #[test]
    fn test_clone_compiles_identically() {
        let e = Expr::Concat(
            Box::new(col("t", "a", Family::String)),
            Box::new(Expr::literal("suffix")),
        );
        assert_eq!(
            e.clone().to_sql(&TestDialect).unwrap(),
            e.to_sql(&TestDialect).unwrap()
        );
    }

    #[test]
    fn test_tables_involved() {
        let e = Expr::Comparison {
            op: ComparisonOp::Equal,
            lhs: Box::new(col("a", "x", Family::Number)),
            rhs: Box::new(col("b", "y", Family::Number)),
        };
        let tables = e.tables_involved();
        assert_eq!(
            tables.into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_purely_functional() {
        let pure = Expr::Arithmetic {
            op: ArithmeticOp::Add,
            lhs: Box::new(Expr::literal(1)),
            rhs: Box::new(Expr::literal(2)),
        };
        assert!(pure.is_purely_functional());
        assert!(!col("t", "x", Family::Number).is_purely_functional());
    }

    #[test]
    fn test_is_aggregator() {
        let agg = Expr::Aggregate {
            func: AggregateFunc::Sum,
            arg: Some(Box::new(col("t", "x", Family::Number))),
            distinct: false,
        };
        assert!(agg.is_aggregator());
        let wrapped = Expr::Arithmetic {
            op: ArithmeticOp::Add,
            lhs: Box::new(agg),
            rhs: Box::new(Expr::literal(1)),
        };
        assert!(wrapped.is_aggregator());
        assert!(!col("t", "x", Family::Number).is_aggregator());
    }

    #[test]
    fn test_aggregate_count_star() {
        let e = Expr::Aggregate {
            func: AggregateFunc::Count,
            arg: None,
            distinct: false,
        };
        assert_eq!(e.to_sql(&TestDialect).unwrap(), "COUNT(*)");
    }

    #[test]
    fn test_aggregate_distinct() {
        let e = Expr::Aggregate {
            func: AggregateFunc::Count,
            arg: Some(Box::new(col("t", "x", Family::Number))),
            distinct: true,
        };
        assert_eq!(e.to_sql(&TestDialect).unwrap(), "COUNT(DISTINCT \"t\".\"x\")");
    }

    #[test]
    fn test_empty_in_list_is_unsatisfiable() {
        let e = Expr::InList {
            expr: Box::new(col("t", "x", Family::Number)),
            items: vec![],
            ignore_case: false,
        };
        assert_eq!(e.to_sql(&TestDialect).unwrap(), "1 = 0");
    }

    #[test]
    fn test_in_list_ignore_case() {
        let e = Expr::InList {
            expr: Box::new(col("t", "name", Family::String)),
            items: vec![Expr::literal("Alice")],
            ignore_case: true,
        };
        assert_eq!(
            e.to_sql(&TestDialect).unwrap(),
            "(LOWER(\"t\".\"name\") IN (LOWER('Alice')))"
        );
    }

    #[test]
    fn test_substring_before_shape() {
        let e = Expr::SubstringBefore {
            expr: Box::new(col("villain", "name", Family::String)),
            separator: Box::new(Expr::literal(" ")),
        };
        let sql = e.to_sql(&TestDialect).unwrap();
        assert!(sql.contains("POSITION(' ' IN \"villain\".\"name\")"));
        assert!(sql.contains("CASE WHEN"));
        assert!(sql.contains("ELSE ''"));
    }

    #[test]
    fn test_family_inference() {
        assert_eq!(col("t", "x", Family::Number).family(), Some(Family::Number));
        assert_eq!(Expr::literal("x").family(), Some(Family::String));
        assert_eq!(Expr::Literal(Value::Null).family(), None);
        let cmp = Expr::Comparison {
            op: ComparisonOp::Equal,
            lhs: Box::new(Expr::literal(1)),
            rhs: Box::new(Expr::literal(2)),
        };
        assert_eq!(cmp.family(), Some(Family::Boolean));
        let len = Expr::Length(Box::new(Expr::literal("abc")));
        assert_eq!(len.family(), Some(Family::Number));
        let max = Expr::Aggregate {
            func: AggregateFunc::Max,
            arg: Some(Box::new(col("t", "d", Family::Date))),
            distinct: false,
        };
        assert_eq!(max.family(), Some(Family::Date));
    }

    #[test]
    fn test_map_literals() {
        let e = Expr::Comparison {
            op: ComparisonOp::Equal,
            lhs: Box::new(col("t", "x", Family::Number)),
            rhs: Box::new(Expr::literal(10)),
        };
        let doubled = e.map_literals(&|v| match v {
            Value::Int(i) => Value::Int(i * 2),
            other => other.clone(),
        });
        assert_eq!(
            doubled.to_sql(&TestDialect).unwrap(),
            "(\"t\".\"x\" = 20)"
        );
        // The original is untouched.
        assert_eq!(e.to_sql(&TestDialect).unwrap(), "(\"t\".\"x\" = 10)");
    }

    #[test]
    fn test_array_ops_rejected_without_support() {
        let e = Expr::ArrayLength(Box::new(col("t", "tags", Family::Array)));
        assert!(e.to_sql(&TestDialect).is_err());
    }
}
