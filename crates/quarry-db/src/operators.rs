//! Predicate operators: the condition-building surface of the engine.
//!
//! An [`Operator`] pairs one predicate shape ([`OperatorKind`]) with two
//! orthogonal flags: `invert`, which flips the produced predicate's sense,
//! and `include_nulls`, which widens it to also match NULL. Operators are
//! immutable value objects — [`not`](Operator::not) and
//! [`include_nulls`](Operator::include_nulls) return new instances — so a
//! template operator can be shared across threads and cloned freely.
//!
//! Applying an operator to a column synthesizes a boolean expression tree;
//! compiling never consults database state. All type-family checking
//! happens here, before any SQL is produced.

use quarry_core::{QuarryError, QuarryResult};

use crate::column::ColumnReference;
use crate::dialect::{ComparisonOp, Dialect};
use crate::expr::{BooleanExpression, Expr};
use crate::value::{Family, Value};

/// Converts operand values when an operator is projected onto a
/// differently-typed column.
pub trait ValueAdaptor {
    /// Maps one operand value to its counterpart in the target type.
    fn adapt(&self, value: &Value) -> Value;
}

impl<F> ValueAdaptor for F
where
    F: Fn(&Value) -> Value,
{
    fn adapt(&self, value: &Value) -> Value {
        self(value)
    }
}

/// The predicate shapes an operator can take, each with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    /// `column = operand`
    Equal(Expr),
    /// `column < operand`
    LessThan(Expr),
    /// `column <= operand`
    LessThanOrEqual(Expr),
    /// `column > operand`
    GreaterThan(Expr),
    /// `column >= operand`
    GreaterThanOrEqual(Expr),
    /// Half-open range: `low <= column < high`.
    Between {
        /// Inclusive lower bound.
        low: Expr,
        /// Exclusive upper bound.
        high: Expr,
    },
    /// Fully-open range: `low < column < high`.
    BetweenExclusive {
        /// Exclusive lower bound.
        low: Expr,
        /// Exclusive upper bound.
        high: Expr,
    },
    /// Set membership. An empty operand set compiles to an unsatisfiable
    /// predicate.
    In(Vec<Expr>),
    /// Case-folded set membership.
    InIgnoreCase(Vec<Expr>),
    /// Pattern match.
    Like(Expr),
    /// Case-folded pattern match.
    LikeIgnoreCase(Expr),
    /// Null test; takes no operands. Inverting switches between
    /// `IS NULL` and `IS NOT NULL`.
    IsNull,
}

impl OperatorKind {
    fn operands(&self) -> Vec<&Expr> {
        match self {
            Self::Equal(e)
            | Self::LessThan(e)
            | Self::LessThanOrEqual(e)
            | Self::GreaterThan(e)
            | Self::GreaterThanOrEqual(e)
            | Self::Like(e)
            | Self::LikeIgnoreCase(e) => vec![e],
            Self::Between { low, high } | Self::BetweenExclusive { low, high } => {
                vec![low, high]
            }
            Self::In(items) | Self::InIgnoreCase(items) => items.iter().collect(),
            Self::IsNull => vec![],
        }
    }

    fn map_operands(&self, adapt: &dyn Fn(&Expr) -> Expr) -> Self {
        match self {
            Self::Equal(e) => Self::Equal(adapt(e)),
            Self::LessThan(e) => Self::LessThan(adapt(e)),
            Self::LessThanOrEqual(e) => Self::LessThanOrEqual(adapt(e)),
            Self::GreaterThan(e) => Self::GreaterThan(adapt(e)),
            Self::GreaterThanOrEqual(e) => Self::GreaterThanOrEqual(adapt(e)),
            Self::Between { low, high } => Self::Between {
                low: adapt(low),
                high: adapt(high),
            },
            Self::BetweenExclusive { low, high } => Self::BetweenExclusive {
                low: adapt(low),
                high: adapt(high),
            },
            Self::In(items) => Self::In(items.iter().map(adapt).collect()),
            Self::InIgnoreCase(items) => Self::InIgnoreCase(items.iter().map(adapt).collect()),
            Self::Like(e) => Self::Like(adapt(e)),
            Self::LikeIgnoreCase(e) => Self::LikeIgnoreCase(adapt(e)),
            Self::IsNull => Self::IsNull,
        }
    }
}

/// An immutable predicate operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    kind: OperatorKind,
    invert: bool,
    include_nulls: bool,
}

impl Operator {
    const fn plain(kind: OperatorKind) -> Self {
        Self {
            kind,
            invert: false,
            include_nulls: false,
        }
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Equality: `column = operand`.
    pub fn is(operand: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::Equal(operand.into()))
    }

    /// Inequality: the inverted equality test.
    pub fn is_not(operand: impl Into<Expr>) -> Self {
        Self::is(operand).not()
    }

    /// Strict ordering: `column < operand`.
    pub fn is_less_than(operand: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::LessThan(operand.into()))
    }

    /// Ordering: `column <= operand`.
    pub fn is_less_than_or_equal(operand: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::LessThanOrEqual(operand.into()))
    }

    /// Strict ordering: `column > operand`.
    pub fn is_greater_than(operand: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::GreaterThan(operand.into()))
    }

    /// Ordering: `column >= operand`.
    pub fn is_greater_than_or_equal(operand: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::GreaterThanOrEqual(operand.into()))
    }

    /// Half-open range: matches when `low <= column < high`.
    pub fn permitted_range(low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::Between {
            low: low.into(),
            high: high.into(),
        })
    }

    /// Fully-open range: matches when `low < column < high`.
    pub fn permitted_range_exclusive(low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::BetweenExclusive {
            low: low.into(),
            high: high.into(),
        })
    }

    /// The inverted half-open range.
    pub fn excluded_range(low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Self::permitted_range(low, high).not()
    }

    /// Set membership: matches when the column equals any operand.
    pub fn permitted_values<I, E>(values: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::plain(OperatorKind::In(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Case-folded set membership.
    pub fn permitted_values_ignore_case<I, E>(values: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::plain(OperatorKind::InIgnoreCase(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// The inverted set membership.
    pub fn excluded_values<I, E>(values: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::permitted_values(values).not()
    }

    /// Pattern match using the backend's `LIKE` semantics.
    pub fn is_like(pattern: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::Like(pattern.into()))
    }

    /// Case-folded pattern match.
    pub fn is_like_ignore_case(pattern: impl Into<Expr>) -> Self {
        Self::plain(OperatorKind::LikeIgnoreCase(pattern.into()))
    }

    /// Null test.
    pub const fn is_null() -> Self {
        Self::plain(OperatorKind::IsNull)
    }

    /// The inverted null test.
    pub const fn is_not_null() -> Self {
        Self {
            kind: OperatorKind::IsNull,
            invert: true,
            include_nulls: false,
        }
    }

    // ── Flags ────────────────────────────────────────────────────────

    /// Returns a copy with the predicate's sense flipped. Operand
    /// semantics are untouched; applying `not` twice restores the
    /// original.
    #[must_use]
    pub const fn not(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Returns a copy that also matches NULL column values.
    #[must_use]
    pub const fn include_nulls(mut self) -> Self {
        self.include_nulls = true;
        self
    }

    /// Returns the predicate shape.
    pub const fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    /// Returns `true` if the predicate's sense is flipped.
    pub const fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Returns `true` if the predicate also matches NULL.
    pub const fn includes_nulls(&self) -> bool {
        self.include_nulls
    }

    /// Returns a structurally identical operator whose operand literals
    /// have been passed through the adaptor. Both flags are preserved.
    pub fn copy_and_adapt(&self, adaptor: &dyn ValueAdaptor) -> Self {
        Self {
            kind: self
                .kind
                .map_operands(&|e| e.map_literals(&|v| adaptor.adapt(v))),
            invert: self.invert,
            include_nulls: self.include_nulls,
        }
    }

    // ── Synthesis and compilation ────────────────────────────────────

    /// Synthesizes the boolean expression this operator represents when
    /// applied to the given column.
    ///
    /// # Errors
    ///
    /// - [`QuarryError::IncomparableTypeInComparison`] when the column's
    ///   family has no equality semantics (large objects; the null test is
    ///   exempt).
    /// - [`QuarryError::ComparisonBetweenDissimilarTypes`] when an operand
    ///   family is incompatible with the column's family.
    pub fn boolean_expression(
        &self,
        column: &ColumnReference,
    ) -> QuarryResult<BooleanExpression> {
        self.check_families(column)?;
        let col = column.expr();
        let base = match &self.kind {
            OperatorKind::Equal(e) => comparison(ComparisonOp::Equal, &col, e),
            OperatorKind::LessThan(e) => comparison(ComparisonOp::LessThan, &col, e),
            OperatorKind::LessThanOrEqual(e) => {
                comparison(ComparisonOp::LessThanOrEqual, &col, e)
            }
            OperatorKind::GreaterThan(e) => comparison(ComparisonOp::GreaterThan, &col, e),
            OperatorKind::GreaterThanOrEqual(e) => {
                comparison(ComparisonOp::GreaterThanOrEqual, &col, e)
            }
            OperatorKind::Between { low, high } => Expr::And(vec![
                comparison(ComparisonOp::GreaterThanOrEqual, &col, low),
                comparison(ComparisonOp::LessThan, &col, high),
            ]),
            OperatorKind::BetweenExclusive { low, high } => Expr::And(vec![
                comparison(ComparisonOp::GreaterThan, &col, low),
                comparison(ComparisonOp::LessThan, &col, high),
            ]),
            OperatorKind::In(items) => Expr::InList {
                expr: Box::new(col.clone()),
                items: items.clone(),
                ignore_case: false,
            },
            OperatorKind::InIgnoreCase(items) => Expr::InList {
                expr: Box::new(col.clone()),
                items: items.clone(),
                ignore_case: true,
            },
            OperatorKind::Like(pattern) => Expr::Like {
                expr: Box::new(col.clone()),
                pattern: Box::new(pattern.clone()),
                ignore_case: false,
            },
            OperatorKind::LikeIgnoreCase(pattern) => Expr::Like {
                expr: Box::new(col.clone()),
                pattern: Box::new(pattern.clone()),
                ignore_case: true,
            },
            OperatorKind::IsNull => Expr::IsNull {
                expr: Box::new(col.clone()),
                negated: self.invert,
            },
        };
        // The null test folds inversion into IS NOT NULL above.
        let inverted = if self.invert && !matches!(self.kind, OperatorKind::IsNull) {
            Expr::Not(Box::new(base))
        } else {
            base
        };
        let widened = if self.include_nulls {
            Expr::Or(vec![
                inverted,
                Expr::IsNull {
                    expr: Box::new(col),
                    negated: false,
                },
            ])
        } else {
            inverted
        };
        Ok(BooleanExpression::from_expr(widened))
    }

    /// Compiles this operator into a WHERE-clause fragment for the given
    /// column.
    ///
    /// This is a pure function of operands, flags, and the dialect.
    ///
    /// # Errors
    ///
    /// Propagates the family checks of
    /// [`boolean_expression`](Self::boolean_expression) and any dialect
    /// rendering failure.
    pub fn generate_where_expression(
        &self,
        dialect: &dyn Dialect,
        column: &ColumnReference,
    ) -> QuarryResult<String> {
        self.boolean_expression(column)?.to_sql(dialect)
    }

    fn check_families(&self, column: &ColumnReference) -> QuarryResult<()> {
        let col_family = column.family();
        if !col_family.is_comparable() && !matches!(self.kind, OperatorKind::IsNull) {
            return Err(QuarryError::IncomparableTypeInComparison {
                family: col_family.to_string(),
            });
        }
        let pattern_op = matches!(
            self.kind,
            OperatorKind::Like(_) | OperatorKind::LikeIgnoreCase(_)
        );
        if pattern_op && col_family != Family::String {
            return Err(QuarryError::ComparisonBetweenDissimilarTypes {
                column_family: col_family.to_string(),
                operand_family: Family::String.to_string(),
            });
        }
        for operand in self.kind.operands() {
            if let Some(family) = operand.family() {
                if family != col_family {
                    return Err(QuarryError::ComparisonBetweenDissimilarTypes {
                        column_family: col_family.to_string(),
                        operand_family: family.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn comparison(op: ComparisonOp, col: &Expr, operand: &Expr) -> Expr {
    Expr::Comparison {
        op,
        lhs: Box::new(col.clone()),
        rhs: Box::new(operand.clone()),
    }
}
