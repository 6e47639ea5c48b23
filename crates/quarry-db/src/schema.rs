//! Row descriptions, field metadata, and the schema registry.
//!
//! The engine never introspects structs or scans for definitions at
//! runtime: callers describe each table once with a [`RowDescription`] and
//! register it in a [`SchemaRegistry`] at startup. The registry is the
//! foreign-key metadata source the query-graph resolver consults when
//! inferring join conditions. Descriptions are immutable once registered
//! and safe for concurrent reads.

use std::collections::BTreeMap;

use quarry_core::{QuarryError, QuarryResult};

use crate::expr::Expr;
use crate::value::Family;

/// A foreign-key relationship from one column to another table's column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// The referenced table.
    pub table: String,
    /// The referenced column.
    pub column: String,
}

/// Complete definition of a single field on a row description.
///
/// Constructed with [`FieldDef::new`] and the chainable builder methods.
///
/// # Examples
///
/// ```
/// use quarry_db::schema::FieldDef;
/// use quarry_db::value::Family;
///
/// let field = FieldDef::new("villain_id", Family::Number)
///     .references("villain", "id")
///     .nullable();
/// assert!(field.foreign_key.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The field name as callers refer to it.
    pub name: String,
    /// The database column name (defaults to the field name).
    pub column: String,
    /// The field's type family.
    pub family: Family,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// An optional foreign-key relationship.
    pub foreign_key: Option<ForeignKey>,
    /// An optional computed expression. A field holding an expression has
    /// no stored column of its own; column references to it delegate to
    /// the expression's compiled text.
    pub expression: Option<Expr>,
    /// Whether the field may be read back from the database.
    pub readable: bool,
}

impl FieldDef {
    /// Creates a new field definition with sensible defaults.
    pub fn new(name: impl Into<String>, family: Family) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            family,
            primary_key: false,
            nullable: false,
            foreign_key: None,
            expression: None,
            readable: true,
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declares a foreign-key relationship to another table's column.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Backs this field with a computed expression.
    #[must_use]
    pub fn computed(mut self, expression: Expr) -> Self {
        self.expression = Some(expression);
        self
    }

    /// Marks this field as not readable from the database.
    #[must_use]
    pub const fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }
}

/// The description of one table: its name, alias, and fields.
///
/// This is the explicit, caller-supplied replacement for runtime
/// reflection: everything the engine knows about a table comes from here.
#[derive(Debug, Clone)]
pub struct RowDescription {
    table: String,
    alias: String,
    fields: Vec<FieldDef>,
}

impl RowDescription {
    /// Creates a description for the named table. The alias defaults to
    /// the table name.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            fields: Vec::new(),
        }
    }

    /// Sets an explicit alias, used for correlated-subquery
    /// disambiguation.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Appends a field definition.
    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns all field definitions in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary-key field, if one was declared.
    pub fn primary_key(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Iterates the fields that declare foreign keys.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&FieldDef, &ForeignKey)> {
        self.fields
            .iter()
            .filter_map(|f| f.foreign_key.as_ref().map(|fk| (f, fk)))
    }
}

/// One inferable join: a foreign-key column equated with the column it
/// references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The table holding the foreign key.
    pub fk_table: String,
    /// The foreign-key column.
    pub fk_column: String,
    /// The referenced table.
    pub referenced_table: String,
    /// The referenced column.
    pub referenced_column: String,
}

/// The explicit registry of row descriptions, constructed at startup.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, RowDescription>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row description, replacing any prior description of
    /// the same table.
    pub fn register(&mut self, row: RowDescription) {
        self.tables.insert(row.table_name().to_string(), row);
    }

    /// Looks up a table's description.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::UnknownTable`] if the table was never
    /// registered.
    pub fn get(&self, table: &str) -> QuarryResult<&RowDescription> {
        self.tables
            .get(table)
            .ok_or_else(|| QuarryError::UnknownTable(table.to_string()))
    }

    /// Returns `true` if the table is registered.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Iterates all registered descriptions in table-name order.
    pub fn tables(&self) -> impl Iterator<Item = &RowDescription> {
        self.tables.values()
    }

    /// Finds every foreign-key relationship linking two tables, in either
    /// direction.
    pub fn relationships_between(&self, a: &str, b: &str) -> Vec<Relationship> {
        let mut found = Vec::new();
        for (holder, other) in [(a, b), (b, a)] {
            let Some(row) = self.tables.get(holder) else {
                continue;
            };
            for (field, fk) in row.foreign_keys() {
                if fk.table == other {
                    found.push(Relationship {
                        fk_table: holder.to_string(),
                        fk_column: field.column.clone(),
                        referenced_table: fk.table.clone(),
                        referenced_column: fk.column.clone(),
                    });
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn villain() -> RowDescription {
        RowDescription::new("villain")
            .with_field(FieldDef::new("id", Family::Number).primary_key())
            .with_field(FieldDef::new("name", Family::String))
    }

    fn lair() -> RowDescription {
        RowDescription::new("lair")
            .with_field(FieldDef::new("id", Family::Number).primary_key())
            .with_field(
                FieldDef::new("villain_id", Family::Number).references("villain", "id"),
            )
            .with_field(FieldDef::new("location", Family::String))
    }

    #[test]
    fn test_field_builder() {
        let f = FieldDef::new("villain_id", Family::Number)
            .column("villain_fk")
            .references("villain", "id")
            .nullable();
        assert_eq!(f.name, "villain_id");
        assert_eq!(f.column, "villain_fk");
        assert!(f.nullable);
        assert_eq!(
            f.foreign_key,
            Some(ForeignKey {
                table: "villain".to_string(),
                column: "id".to_string()
            })
        );
    }

    #[test]
    fn test_row_description_lookup() {
        let row = villain();
        assert_eq!(row.table_name(), "villain");
        assert_eq!(row.alias(), "villain");
        assert!(row.field("name").is_some());
        assert!(row.field("missing").is_none());
        assert_eq!(row.primary_key().unwrap().name, "id");
    }

    #[test]
    fn test_row_description_alias() {
        let row = villain().with_alias("v1");
        assert_eq!(row.alias(), "v1");
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register(villain());
        assert!(registry.contains("villain"));
        assert!(registry.get("villain").is_ok());
        assert!(matches!(
            registry.get("unknown").unwrap_err(),
            QuarryError::UnknownTable(_)
        ));
    }

    #[test]
    fn test_relationships_between() {
        let mut registry = SchemaRegistry::new();
        registry.register(villain());
        registry.register(lair());
        let rels = registry.relationships_between("villain", "lair");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].fk_table, "lair");
        assert_eq!(rels[0].fk_column, "villain_id");
        assert_eq!(rels[0].referenced_table, "villain");
        assert_eq!(rels[0].referenced_column, "id");

        // Direction of the arguments does not matter.
        let rels = registry.relationships_between("lair", "villain");
        assert_eq!(rels.len(), 1);
    }

    #[test]
    fn test_no_relationship() {
        let mut registry = SchemaRegistry::new();
        registry.register(villain());
        registry.register(
            RowDescription::new("unrelated")
                .with_field(FieldDef::new("id", Family::Number).primary_key()),
        );
        assert!(registry
            .relationships_between("villain", "unrelated")
            .is_empty());
    }
}
