//! Literal value types for representing database values in a
//! backend-agnostic way.
//!
//! The [`Value`] enum is the universal literal type used throughout the
//! engine for operands, computed results, and row contents. [`Family`] is
//! the sealed set of type families the expression system dispatches on: an
//! operation is only legal between operands of compatible families.

use std::fmt;

/// A backend-agnostic representation of a database literal.
///
/// # Examples
///
/// ```
/// use quarry_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// Raw binary data (large objects).
    Bytes(Vec<u8>),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A date and time without timezone.
    DateTime(chrono::NaiveDateTime),
    /// A UUID value, treated as a string for comparison purposes.
    Uuid(uuid::Uuid),
    /// A JSON document, treated as a large object.
    Json(serde_json::Value),
    /// A homogeneous list of values (array columns, IN operands).
    List(Vec<Value>),
}

/// The sealed set of type families understood by the expression system.
///
/// Families are mutually exclusive: a comparison or arithmetic operation is
/// only legal between operands of the same family, and the engine never
/// coerces across families implicitly. The
/// [`string_result`](crate::expr::NumberExpression::string_result) escape
/// hatch is the one explicit crossing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Family {
    /// Boolean predicates and flags.
    Boolean,
    /// Integers and floating-point numbers. Division and modulo follow the
    /// host numeric type's native semantics: integer division truncates
    /// toward zero, floating-point division does not.
    Number,
    /// Character data, including UUIDs in their canonical text form.
    String,
    /// Dates and timestamps.
    Date,
    /// Binary and document data. Large objects carry no equality semantics
    /// and cannot be used in comparisons.
    LargeObject,
    /// Homogeneous arrays. Only some backends support these natively.
    Array,
}

impl Family {
    /// Classifies a literal into its family. `Null` belongs to no family
    /// and is compatible with every one.
    pub const fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Int(_) | Value::Float(_) => Some(Self::Number),
            Value::String(_) | Value::Uuid(_) => Some(Self::String),
            Value::Date(_) | Value::DateTime(_) => Some(Self::Date),
            Value::Bytes(_) | Value::Json(_) => Some(Self::LargeObject),
            Value::List(_) => Some(Self::Array),
        }
    }

    /// Returns `true` if values of this family carry equality semantics
    /// and may appear in comparisons.
    pub const fn is_comparable(&self) -> bool {
        !matches!(self, Self::LargeObject)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
            Self::LargeObject => "large-object",
            Self::Array => "array",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the family this literal belongs to, or `None` for `Null`.
    pub const fn family(&self) -> Option<Family> {
        Family::of(self)
    }

    /// Attempts to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_integers() {
        assert_eq!(Value::from(42_i16), Value::Int(42));
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(42_i64), Value::Int(42));
    }

    #[test]
    fn test_from_floats() {
        assert_eq!(Value::from(1.5_f64), Value::Float(1.5));
        assert_eq!(Value::from(1.5_f32), Value::Float(f64::from(1.5_f32)));
    }

    #[test]
    fn test_from_string() {
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(
            Value::from("hello".to_string()),
            Value::String("hello".to_string())
        );
    }

    #[test]
    fn test_from_option() {
        let some_val: Option<i64> = Some(42);
        assert_eq!(Value::from(some_val), Value::Int(42));

        let none_val: Option<i64> = None;
        assert_eq!(Value::from(none_val), Value::Null);
    }

    #[test]
    fn test_family_of_literals() {
        assert_eq!(Value::from(true).family(), Some(Family::Boolean));
        assert_eq!(Value::from(1_i64).family(), Some(Family::Number));
        assert_eq!(Value::from(1.5).family(), Some(Family::Number));
        assert_eq!(Value::from("x").family(), Some(Family::String));
        assert_eq!(Value::from(uuid::Uuid::nil()).family(), Some(Family::String));
        assert_eq!(
            Value::from(chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).family(),
            Some(Family::Date)
        );
        assert_eq!(Value::from(vec![1_u8, 2]).family(), Some(Family::LargeObject));
        assert_eq!(
            Value::List(vec![Value::Int(1)]).family(),
            Some(Family::Array)
        );
        assert_eq!(Value::Null.family(), None);
    }

    #[test]
    fn test_large_objects_are_not_comparable() {
        assert!(!Family::LargeObject.is_comparable());
        assert!(Family::Number.is_comparable());
        assert!(Family::String.is_comparable());
        assert!(Family::Date.is_comparable());
        assert!(Family::Boolean.is_comparable());
        assert!(Family::Array.is_comparable());
    }

    #[test]
    fn test_family_display() {
        assert_eq!(Family::Number.to_string(), "number");
        assert_eq!(Family::LargeObject.to_string(), "large-object");
    }

    #[test]
    fn test_display_null() {
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_display_list() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_as_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::String("hi".into()).as_str(), Some("hi"));
        assert_eq!(Value::Int(1).as_str(), None);
    }
}
