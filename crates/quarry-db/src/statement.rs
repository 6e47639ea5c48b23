//! SELECT statement assembly.
//!
//! [`SelectStatement`] turns a [`ResolvedQuery`] into final SQL: the
//! classified table list chooses inner versus left joins, inferred and
//! explicit conditions are allocated to ON clauses as their tables become
//! available, and whatever cannot anchor a join lands in the WHERE clause.
//! Assumed tables are joined but contribute no select columns.

use quarry_core::QuarryResult;

use crate::dialect::Dialect;
use crate::expr::Expr;
use crate::graph::{GraphTable, ResolvedQuery, TableRole};
use crate::schema::SchemaRegistry;

/// SQL JOIN types used by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
}

impl JoinType {
    /// Returns the SQL keyword for this join type.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A column ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The ordered expression.
    pub expression: Expr,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(expression: impl Into<Expr>) -> Self {
        Self {
            expression: expression.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(expression: impl Into<Expr>) -> Self {
        Self {
            expression: expression.into(),
            descending: true,
        }
    }
}

/// A SELECT statement assembled from a resolved query graph.
#[derive(Debug)]
pub struct SelectStatement<'a> {
    query: &'a ResolvedQuery,
    registry: &'a SchemaRegistry,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
    distinct: bool,
}

impl<'a> SelectStatement<'a> {
    /// Creates a statement selecting every readable column of the
    /// resolved query's required and optional tables, plus its expression
    /// columns.
    pub const fn new(query: &'a ResolvedQuery, registry: &'a SchemaRegistry) -> Self {
        Self {
            query,
            registry,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    /// Requests DISTINCT rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Appends an ordering.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Limits the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compiles the statement to SQL against the given dialect.
    ///
    /// # Errors
    ///
    /// Propagates dialect rendering failures from any embedded
    /// expression.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> QuarryResult<String> {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select_clause(dialect)?.join(", "));
        self.push_from_clause(&mut sql, dialect)?;

        if !self.order_by.is_empty() {
            let orders = self
                .order_by
                .iter()
                .map(|o| {
                    o.expression.to_sql(dialect).map(|rendered| {
                        let dir = if o.descending { " DESC" } else { " ASC" };
                        format!("{rendered}{dir}")
                    })
                })
                .collect::<QuarryResult<Vec<_>>>()?;
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        tracing::debug!(sql = %sql, "compiled select statement");
        Ok(sql)
    }

    fn select_clause(&self, dialect: &dyn Dialect) -> QuarryResult<Vec<String>> {
        let mut parts = Vec::new();
        for table in self
            .query
            .tables()
            .iter()
            .filter(|t| t.role != TableRole::Assumed)
        {
            let row = self.registry.get(&table.table)?;
            for field in row.fields().iter().filter(|f| f.readable) {
                match &field.expression {
                    Some(expr) => {
                        parts.push(format!(
                            "{} AS {}",
                            expr.to_sql(dialect)?,
                            dialect.quote_identifier(&field.column)
                        ));
                    }
                    None => {
                        parts.push(dialect.qualified_column(&table.alias, &field.column));
                    }
                }
            }
        }
        for (alias, expr) in self.query.expression_columns() {
            parts.push(format!(
                "{} AS {}",
                expr.to_sql(dialect)?,
                dialect.quote_identifier(alias)
            ));
        }
        if parts.is_empty() {
            parts.push("*".to_string());
        }
        Ok(parts)
    }

    fn push_from_clause(&self, sql: &mut String, dialect: &dyn Dialect) -> QuarryResult<()> {
        let tables = self.query.tables();
        let Some(base) = tables
            .iter()
            .find(|t| t.role == TableRole::Required)
            .or_else(|| tables.first())
        else {
            return Ok(());
        };

        sql.push_str(&format!(" FROM {}", table_reference(base, dialect)));

        // Conditions are drained into ON clauses as their tables join;
        // whatever remains becomes the WHERE clause.
        let mut pool: Vec<(Expr, bool)> = self
            .query
            .conditions()
            .iter()
            .map(|c| (c.clone(), false))
            .collect();
        let mut joined: Vec<&str> = vec![base.table.as_str()];

        for table in tables.iter().filter(|t| t.table != base.table) {
            let join_type = match table.role {
                TableRole::Optional => JoinType::Left,
                TableRole::Required | TableRole::Assumed => JoinType::Inner,
            };
            let mut on_parts = Vec::new();
            for (condition, used) in &mut pool {
                if *used {
                    continue;
                }
                let involved = condition.tables_involved();
                if involved.contains(&table.table)
                    && involved
                        .iter()
                        .all(|t| t == &table.table || joined.contains(&t.as_str()))
                {
                    on_parts.push(condition.to_sql(dialect)?);
                    *used = true;
                }
            }
            let on = if on_parts.is_empty() {
                dialect.true_literal().to_string()
            } else {
                on_parts.join(" AND ")
            };
            sql.push_str(&format!(
                " {} {} ON {on}",
                join_type.sql_keyword(),
                table_reference(table, dialect)
            ));
            joined.push(table.table.as_str());
        }

        let where_parts = pool
            .iter()
            .filter(|(_, used)| !used)
            .map(|(c, _)| c.to_sql(dialect))
            .collect::<QuarryResult<Vec<_>>>()?;
        if !where_parts.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_parts.join(" AND ")));
        }
        Ok(())
    }
}

fn table_reference(table: &GraphTable, dialect: &dyn Dialect) -> String {
    if table.alias == table.table {
        dialect.quote_identifier(&table.table)
    } else {
        format!(
            "{} AS {}",
            dialect.quote_identifier(&table.table),
            dialect.quote_identifier(&table.alias)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnReference;
    use crate::dialect::IntervalUnit;
    use crate::graph::QueryGraph;
    use crate::operators::Operator;
    use crate::schema::{FieldDef, RowDescription};
    use crate::value::Family;
    use quarry_core::Settings;

    struct TestDialect;

    impl Dialect for TestDialect {
        fn vendor(&self) -> &'static str {
            "test"
        }

        fn add_interval(&self, expr: &str, amount: &str, unit: IntervalUnit) -> String {
            format!("({expr} + {amount} {unit:?})")
        }
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            RowDescription::new("villain")
                .with_field(FieldDef::new("id", Family::Number).primary_key())
                .with_field(FieldDef::new("name", Family::String)),
        );
        registry.register(
            RowDescription::new("lair")
                .with_field(FieldDef::new("id", Family::Number).primary_key())
                .with_field(
                    FieldDef::new("villain_id", Family::Number).references("villain", "id"),
                ),
        );
        registry
    }

    #[test]
    fn test_joined_select_shape() {
        let registry = registry();
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(registry.get("villain").unwrap());
        graph.add_required(registry.get("lair").unwrap());
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT \"villain\".\"id\", \"villain\".\"name\", \"lair\".\"id\", \
             \"lair\".\"villain_id\" FROM \"villain\" INNER JOIN \"lair\" ON \
             (\"lair\".\"villain_id\" = \"villain\".\"id\")"
        );
    }

    #[test]
    fn test_optional_table_is_left_joined() {
        let registry = registry();
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(registry.get("villain").unwrap());
        graph.add_optional(registry.get("lair").unwrap());
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.contains("LEFT JOIN \"lair\""));
    }

    #[test]
    fn test_filter_lands_in_where() {
        let registry = registry();
        let villain = registry.get("villain").unwrap();
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(villain);
        graph.add_required(registry.get("lair").unwrap());
        let name = ColumnReference::new(villain, "name").unwrap();
        graph.add_operator(&name, &Operator::is("Dr Nonono")).unwrap();
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.contains("WHERE (\"villain\".\"name\" = 'Dr Nonono')"));
        assert!(sql.contains("INNER JOIN \"lair\" ON (\"lair\".\"villain_id\" = \"villain\".\"id\")"));
    }

    #[test]
    fn test_cartesian_opt_in_joins_on_true() {
        let mut registry = registry();
        registry.register(
            RowDescription::new("unrelated")
                .with_field(FieldDef::new("id", Family::Number).primary_key()),
        );
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(registry.get("villain").unwrap());
        graph.add_required(registry.get("unrelated").unwrap());
        graph.allow_cartesian_joins(true);
        graph.allow_blank_queries(true);
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.contains("INNER JOIN \"unrelated\" ON TRUE"));
    }

    #[test]
    fn test_expression_columns_are_aliased() {
        let registry = registry();
        let villain = registry.get("villain").unwrap();
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(villain);
        graph.allow_blank_queries(true);
        let name = ColumnReference::new(villain, "name").unwrap();
        graph.add_expression_column("shouted", name.string().unwrap().uppercase());
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.contains("UPPER(\"villain\".\"name\") AS \"shouted\""));
    }

    #[test]
    fn test_order_limit_offset() {
        let registry = registry();
        let villain = registry.get("villain").unwrap();
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(villain);
        graph.allow_blank_queries(true);
        let resolved = graph.resolve().unwrap();
        let name = ColumnReference::new(villain, "name").unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .order_by(OrderBy::desc(name.string().unwrap()))
            .limit(10)
            .offset(5)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.ends_with(
            "ORDER BY \"villain\".\"name\" DESC LIMIT 10 OFFSET 5"
        ));
    }

    #[test]
    fn test_aliased_table_reference() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            RowDescription::new("villain")
                .with_alias("v1")
                .with_field(FieldDef::new("id", Family::Number).primary_key()),
        );
        let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
        graph.add_required(registry.get("villain").unwrap());
        graph.allow_blank_queries(true);
        let resolved = graph.resolve().unwrap();
        let sql = SelectStatement::new(&resolved, &registry)
            .to_sql(&TestDialect)
            .unwrap();
        assert!(sql.contains("FROM \"villain\" AS \"v1\""));
        assert!(sql.contains("\"v1\".\"id\""));
    }
}
