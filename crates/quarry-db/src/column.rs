//! Column references: the bridge between row descriptions and
//! expression trees.
//!
//! A [`ColumnReference`] binds one field of a [`RowDescription`] and
//! resolves to either a table-qualified column name or, when the field is
//! backed by a computed expression, to that expression's compiled text.

use quarry_core::{QuarryError, QuarryResult};

use crate::dialect::Dialect;
use crate::expr::{
    ArrayExpression, BooleanExpression, ColumnExpr, DateExpression, Expr, LargeObjectExpression,
    NumberExpression, StringExpression,
};
use crate::schema::RowDescription;
use crate::value::Family;

/// A reference to one field of one row description.
///
/// References are cheap to clone and immutable once built; toggling the
/// alias behavior returns a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    table: String,
    alias: String,
    column: String,
    family: Family,
    computed: Option<Expr>,
    use_table_alias: bool,
}

impl ColumnReference {
    /// Binds a field of the given row description.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::IncorrectRowProvider`] if the field does not
    /// belong to the row description supplied.
    pub fn new(row: &RowDescription, field: &str) -> QuarryResult<Self> {
        let def = row
            .field(field)
            .ok_or_else(|| QuarryError::IncorrectRowProvider {
                field: field.to_string(),
                table: row.table_name().to_string(),
            })?;
        Ok(Self {
            table: row.table_name().to_string(),
            alias: row.alias().to_string(),
            column: def.column.clone(),
            family: def.family,
            computed: def.expression.clone(),
            use_table_alias: true,
        })
    }

    /// Returns a copy with the table-alias toggle set as given. With the
    /// toggle off, the column is qualified by the full table name instead
    /// of the alias — needed to disambiguate correlated subqueries.
    #[must_use]
    pub fn with_table_alias(mut self, use_table_alias: bool) -> Self {
        self.use_table_alias = use_table_alias;
        self
    }

    /// Returns the owning table's name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the column name.
    pub fn column_name(&self) -> &str {
        &self.column
    }

    /// Returns the field's type family.
    pub const fn family(&self) -> Family {
        self.family
    }

    /// Returns `true` if the bound field is backed by a computed
    /// expression.
    pub const fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    /// Returns the expression tree this reference stands for: the computed
    /// expression when present, otherwise a plain column node.
    pub fn expr(&self) -> Expr {
        self.computed.clone().map_or_else(
            || {
                Expr::Column(ColumnExpr {
                    table: self.table.clone(),
                    alias: self.alias.clone(),
                    column: self.column.clone(),
                    family: self.family,
                    use_alias: self.use_table_alias,
                })
            },
            |expr| expr,
        )
    }

    /// Compiles this reference to SQL.
    ///
    /// A computed field delegates entirely to its expression's compiled
    /// text; the alias toggle is ignored in that case, since a computed
    /// expression may reference multiple tables.
    ///
    /// # Errors
    ///
    /// Returns an error when a computed expression cannot be rendered on
    /// the given dialect.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> QuarryResult<String> {
        match &self.computed {
            Some(expr) => expr.to_sql(dialect),
            None => {
                let qualifier = if self.use_table_alias {
                    &self.alias
                } else {
                    &self.table
                };
                Ok(dialect.qualified_column(qualifier, &self.column))
            }
        }
    }

    fn typed(&self, family: Family) -> QuarryResult<Expr> {
        if self.family == family {
            Ok(self.expr())
        } else {
            Err(QuarryError::TypeMismatch {
                expected: family.to_string(),
                actual: self.family.to_string(),
            })
        }
    }

    /// Views this reference as a boolean expression.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::TypeMismatch`] if the field belongs to
    /// another family. The same applies to every typed view below.
    pub fn boolean(&self) -> QuarryResult<BooleanExpression> {
        self.typed(Family::Boolean).map(BooleanExpression::from_expr)
    }

    /// Views this reference as a number expression.
    pub fn number(&self) -> QuarryResult<NumberExpression> {
        self.typed(Family::Number).map(NumberExpression::from_expr)
    }

    /// Views this reference as a string expression.
    pub fn string(&self) -> QuarryResult<StringExpression> {
        self.typed(Family::String).map(StringExpression::from_expr)
    }

    /// Views this reference as a date expression.
    pub fn date(&self) -> QuarryResult<DateExpression> {
        self.typed(Family::Date).map(DateExpression::from_expr)
    }

    /// Views this reference as a large-object expression.
    pub fn large_object(&self) -> QuarryResult<LargeObjectExpression> {
        self.typed(Family::LargeObject)
            .map(LargeObjectExpression::from_expr)
    }

    /// Views this reference as an array expression.
    pub fn array(&self) -> QuarryResult<ArrayExpression> {
        self.typed(Family::Array).map(ArrayExpression::from_expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::IntervalUnit;
    use crate::schema::FieldDef;

    struct TestDialect;

    impl Dialect for TestDialect {
        fn vendor(&self) -> &'static str {
            "test"
        }

        fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
            format!("({expr} + {amount} {unit:?})")
        }
    }

    fn villain() -> RowDescription {
        RowDescription::new("villain")
            .with_alias("v1")
            .with_field(FieldDef::new("id", Family::Number).primary_key())
            .with_field(FieldDef::new("name", Family::String))
    }

    #[test]
    fn test_resolves_to_aliased_column() {
        let row = villain();
        let col = ColumnReference::new(&row, "name").unwrap();
        assert_eq!(col.to_sql(&TestDialect).unwrap(), "\"v1\".\"name\"");
    }

    #[test]
    fn test_alias_toggle_uses_table_name() {
        let row = villain();
        let col = ColumnReference::new(&row, "name")
            .unwrap()
            .with_table_alias(false);
        assert_eq!(col.to_sql(&TestDialect).unwrap(), "\"villain\".\"name\"");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let row = villain();
        let err = ColumnReference::new(&row, "surname").unwrap_err();
        assert!(matches!(
            err,
            QuarryError::IncorrectRowProvider { field, table }
                if field == "surname" && table == "villain"
        ));
    }

    #[test]
    fn test_computed_field_delegates_to_expression() {
        let villain = villain();
        let name = ColumnReference::new(&villain, "name").unwrap();
        let professional = RowDescription::new("professional").with_field(
            FieldDef::new("title", Family::String)
                .computed(name.string().unwrap().substring_before(" ").into_expr()),
        );
        let title = ColumnReference::new(&professional, "title").unwrap();
        assert!(title.is_computed());
        let sql = title.to_sql(&TestDialect).unwrap();
        assert!(sql.contains("CASE WHEN"));
        // The alias toggle has no effect on computed fields.
        let toggled = title.with_table_alias(false);
        assert_eq!(toggled.to_sql(&TestDialect).unwrap(), sql);
    }

    #[test]
    fn test_typed_view_checks_family() {
        let row = villain();
        let name = ColumnReference::new(&row, "name").unwrap();
        assert!(name.string().is_ok());
        assert!(matches!(
            name.number().unwrap_err(),
            QuarryError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_expr_for_plain_column() {
        let row = villain();
        let id = ColumnReference::new(&row, "id").unwrap();
        match id.expr() {
            Expr::Column(c) => {
                assert_eq!(c.table, "villain");
                assert_eq!(c.alias, "v1");
                assert_eq!(c.column, "id");
                assert_eq!(c.family, Family::Number);
            }
            other => panic!("Expected Column, got {other:?}"),
        }
    }
}
