//! The typed, nullable database value container.
//!
//! A [`DbValue`] represents a single mapped database value. It holds
//! exactly one of a literal value or a backing expression, tracks whether
//! it has been defined at all, and can compare its current literal against
//! the last-known persisted literal to answer "has this changed since it
//! was saved?". Setting a literal of the wrong runtime family fails with a
//! type-mismatch error rather than silently coercing.

use quarry_core::{QuarryError, QuarryResult};

use crate::expr::Expr;
use crate::value::{Family, Value};

#[derive(Debug, Clone, PartialEq)]
enum State {
    Undefined,
    Literal(Value),
    Expression(Expr),
}

/// A typed, nullable container for one database value.
///
/// # Examples
///
/// ```
/// use quarry_db::qdt::DbValue;
/// use quarry_db::value::Value;
///
/// let mut qty = DbValue::number();
/// qty.set_value(5_i64).unwrap();
/// assert_eq!(qty.value(), Some(&Value::Int(5)));
/// assert!(qty.set_value("five").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DbValue {
    family: Family,
    state: State,
    persisted: Option<Value>,
}

impl DbValue {
    /// Creates an undefined value of the given family.
    pub const fn new(family: Family) -> Self {
        Self {
            family,
            state: State::Undefined,
            persisted: None,
        }
    }

    /// Shorthand for a boolean value.
    pub const fn boolean() -> Self {
        Self::new(Family::Boolean)
    }

    /// Shorthand for a number value.
    pub const fn number() -> Self {
        Self::new(Family::Number)
    }

    /// Shorthand for a string value.
    pub const fn string() -> Self {
        Self::new(Family::String)
    }

    /// Shorthand for a date value.
    pub const fn date() -> Self {
        Self::new(Family::Date)
    }

    /// Shorthand for a large-object value.
    pub const fn large_object() -> Self {
        Self::new(Family::LargeObject)
    }

    /// Shorthand for an array value.
    pub const fn array() -> Self {
        Self::new(Family::Array)
    }

    /// Returns the declared type family.
    pub const fn family(&self) -> Family {
        self.family
    }

    /// Sets a literal value.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::TypeMismatch`] when the runtime family of
    /// the supplied value is incompatible with the declared family. `Null`
    /// is compatible with every family.
    pub fn set_value(&mut self, value: impl Into<Value>) -> QuarryResult<()> {
        let value = value.into();
        if let Some(actual) = value.family() {
            if actual != self.family {
                return Err(QuarryError::TypeMismatch {
                    expected: self.family.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        self.state = State::Literal(value);
        Ok(())
    }

    /// Backs this value with a computed expression instead of a literal.
    ///
    /// An expression-backed value is defined but has no independent
    /// literal until the database evaluates it, and its change tracking is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::TypeMismatch`] when the expression produces
    /// a different family.
    pub fn set_expression(&mut self, expression: Expr) -> QuarryResult<()> {
        if let Some(actual) = expression.family() {
            if actual != self.family {
                return Err(QuarryError::TypeMismatch {
                    expected: self.family.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        self.state = State::Expression(expression);
        Ok(())
    }

    /// Returns the current literal, or `None` when undefined or backed by
    /// an expression.
    pub const fn value(&self) -> Option<&Value> {
        match &self.state {
            State::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the backing expression, if any.
    pub const fn backing_expression(&self) -> Option<&Expr> {
        match &self.state {
            State::Expression(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` when no literal is present: the value is undefined
    /// or holds an explicit NULL. Expression-backed values are not null.
    pub const fn is_null(&self) -> bool {
        match &self.state {
            State::Undefined => true,
            State::Literal(v) => v.is_null(),
            State::Expression(_) => false,
        }
    }

    /// Returns `true` once a literal or expression has been supplied.
    pub const fn is_defined(&self) -> bool {
        !matches!(self.state, State::Undefined)
    }

    /// Records the current literal as the last-known persisted value.
    ///
    /// Call this after the value has round-tripped through the database;
    /// [`has_changed`](Self::has_changed) is meaningless before then.
    pub fn mark_persisted(&mut self) {
        if let State::Literal(v) = &self.state {
            self.persisted = Some(v.clone());
        }
    }

    /// Returns `true` when the current literal differs, by value equality,
    /// from the last-known persisted literal. Always `false` before
    /// [`mark_persisted`](Self::mark_persisted) has been called, and for
    /// expression-backed values.
    pub fn has_changed(&self) -> bool {
        match (&self.state, &self.persisted) {
            (State::Literal(current), Some(persisted)) => current != persisted,
            _ => false,
        }
    }

    /// Returns this value as an expression operand: the literal wrapped,
    /// or the backing expression itself.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Evaluation`] when the value is undefined.
    pub fn as_operand(&self) -> QuarryResult<Expr> {
        match &self.state {
            State::Undefined => Err(QuarryError::Evaluation(
                "an undefined value cannot be used as an operand".to_string(),
            )),
            State::Literal(v) => Ok(Expr::Literal(v.clone())),
            State::Expression(e) => Ok(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::core::ColumnExpr;

    #[test]
    fn test_round_trip() {
        let mut v = DbValue::string();
        v.set_value("Dr Nonono").unwrap();
        assert_eq!(v.value(), Some(&Value::String("Dr Nonono".to_string())));
        assert!(v.is_defined());
        assert!(!v.is_null());
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut v = DbValue::number();
        let err = v.set_value("not a number").unwrap_err();
        assert!(matches!(
            err,
            QuarryError::TypeMismatch { expected, actual }
                if expected == "number" && actual == "string"
        ));
        // The failed set leaves the value untouched.
        assert!(!v.is_defined());
    }

    #[test]
    fn test_null_is_compatible_with_every_family() {
        let mut v = DbValue::date();
        v.set_value(Value::Null).unwrap();
        assert!(v.is_defined());
        assert!(v.is_null());
    }

    #[test]
    fn test_undefined_is_null_but_not_defined() {
        let v = DbValue::number();
        assert!(v.is_null());
        assert!(!v.is_defined());
        assert_eq!(v.value(), None);
    }

    #[test]
    fn test_change_tracking() {
        let mut v = DbValue::number();
        v.set_value(10_i64).unwrap();
        // Not meaningful until the value has been persisted.
        assert!(!v.has_changed());
        v.mark_persisted();
        assert!(!v.has_changed());
        v.set_value(11_i64).unwrap();
        assert!(v.has_changed());
        // Setting the persisted value back clears the flag: equality is
        // by value, not identity.
        v.set_value(10_i64).unwrap();
        assert!(!v.has_changed());
    }

    #[test]
    fn test_expression_backing() {
        let mut v = DbValue::number();
        let expr = Expr::Column(ColumnExpr {
            table: "t".to_string(),
            alias: "t".to_string(),
            column: "x".to_string(),
            family: Family::Number,
            use_alias: true,
        });
        v.set_expression(expr.clone()).unwrap();
        assert!(v.is_defined());
        assert!(!v.is_null());
        assert_eq!(v.value(), None);
        assert_eq!(v.backing_expression(), Some(&expr));
    }

    #[test]
    fn test_expression_disables_change_tracking() {
        let mut v = DbValue::number();
        v.set_value(1_i64).unwrap();
        v.mark_persisted();
        v.set_expression(Expr::literal(2)).unwrap();
        assert!(!v.has_changed());
    }

    #[test]
    fn test_expression_family_is_checked() {
        let mut v = DbValue::string();
        let err = v.set_expression(Expr::literal(42)).unwrap_err();
        assert!(matches!(err, QuarryError::TypeMismatch { .. }));
    }

    #[test]
    fn test_as_operand() {
        let mut v = DbValue::number();
        assert!(v.as_operand().is_err());
        v.set_value(5_i64).unwrap();
        assert_eq!(v.as_operand().unwrap(), Expr::Literal(Value::Int(5)));
    }
}
