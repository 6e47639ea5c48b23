//! The query-graph resolver.
//!
//! A [`QueryGraph`] collects the row descriptions participating in one
//! query, the caller's conditions, and the computed columns to select.
//! [`resolve`](QueryGraph::resolve) then infers join conditions from
//! foreign-key metadata, proves that some condition links every selected
//! table, and refuses blank and Cartesian queries unless the caller has
//! explicitly opted in. Resolution is a linear classification plus a
//! pairwise-connectivity check — it proves that *some* relationship links
//! every table, not that the relationship is semantically the right one.
//!
//! The graph is assembled once per query and discarded after compilation;
//! it is not retained between executions.

use quarry_core::{QuarryError, QuarryResult, Settings};

use crate::column::ColumnReference;
use crate::dialect::ComparisonOp;
use crate::expr::{BooleanExpression, ColumnExpr, Expr};
use crate::operators::Operator;
use crate::schema::{RowDescription, SchemaRegistry};
use crate::value::Family;

/// How a table participates in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Rows must match: compiled as an inner join.
    Required,
    /// Rows may be absent: compiled as a left join.
    Optional,
    /// Participates only to supply extra join conditions; joined but not
    /// selected from.
    Assumed,
}

/// One participating table with its resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTable {
    /// The table name.
    pub table: String,
    /// The alias used when compiling column references.
    pub alias: String,
    /// The table's role in this query.
    pub role: TableRole,
}

/// A query graph under construction.
#[derive(Debug)]
pub struct QueryGraph<'a> {
    registry: &'a SchemaRegistry,
    tables: Vec<GraphTable>,
    conditions: Vec<Expr>,
    expression_columns: Vec<(String, Expr)>,
    blank_query_allowed: bool,
    cartesian_join_allowed: bool,
}

impl<'a> QueryGraph<'a> {
    /// Creates an empty graph with safety flags defaulted from the global
    /// [`Settings`].
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self::with_settings(registry, Settings::global())
    }

    /// Creates an empty graph with safety flags taken from the given
    /// settings.
    pub fn with_settings(registry: &'a SchemaRegistry, settings: &Settings) -> Self {
        Self {
            registry,
            tables: Vec::new(),
            conditions: Vec::new(),
            expression_columns: Vec::new(),
            blank_query_allowed: settings.blank_query_allowed,
            cartesian_join_allowed: settings.cartesian_join_allowed,
        }
    }

    fn add(&mut self, row: &RowDescription, role: TableRole) {
        let table = row.table_name().to_string();
        if let Some(existing) = self.tables.iter_mut().find(|t| t.table == table) {
            existing.role = role;
        } else {
            self.tables.push(GraphTable {
                table,
                alias: row.alias().to_string(),
                role,
            });
        }
    }

    /// Adds a table whose rows must match.
    pub fn add_required(&mut self, row: &RowDescription) -> &mut Self {
        self.add(row, TableRole::Required);
        self
    }

    /// Adds a table whose rows may be absent (left-joined).
    pub fn add_optional(&mut self, row: &RowDescription) -> &mut Self {
        self.add(row, TableRole::Optional);
        self
    }

    /// Adds a table that only supplies join conditions and is not
    /// selected from.
    pub fn add_assumed(&mut self, row: &RowDescription) -> &mut Self {
        self.add(row, TableRole::Assumed);
        self
    }

    /// Adds an explicit boolean condition.
    pub fn add_condition(&mut self, condition: BooleanExpression) -> &mut Self {
        self.conditions.push(condition.into_expr());
        self
    }

    /// Applies an operator to a column and adds the synthesized predicate
    /// as a condition.
    ///
    /// # Errors
    ///
    /// Fails fast with the operator's family-check errors; nothing is
    /// added in that case.
    pub fn add_operator(
        &mut self,
        column: &ColumnReference,
        operator: &Operator,
    ) -> QuarryResult<&mut Self> {
        let condition = operator.boolean_expression(column)?;
        self.conditions.push(condition.into_expr());
        Ok(self)
    }

    /// Adds a computed column to select under the given alias.
    pub fn add_expression_column(
        &mut self,
        alias: impl Into<String>,
        expression: impl Into<Expr>,
    ) -> &mut Self {
        self.expression_columns.push((alias.into(), expression.into()));
        self
    }

    /// Permits resolution with zero conditions.
    pub fn allow_blank_queries(&mut self, allowed: bool) -> &mut Self {
        self.blank_query_allowed = allowed;
        self
    }

    /// Permits unlinked table pairs (full cross-products).
    pub fn allow_cartesian_joins(&mut self, allowed: bool) -> &mut Self {
        self.cartesian_join_allowed = allowed;
        self
    }

    /// Resolves the graph: infers join conditions, verifies connectivity,
    /// and enforces the blank-query and Cartesian-join protections.
    ///
    /// # Errors
    ///
    /// - [`QuarryError::AccidentalCartesianJoin`] when a selected table
    ///   pair has no relating condition and Cartesian joins are not
    ///   allowed.
    /// - [`QuarryError::AccidentalBlankQuery`] when the final condition
    ///   list is empty and blank queries are not allowed.
    pub fn resolve(&self) -> QuarryResult<ResolvedQuery> {
        let inferred = self.infer_join_conditions();
        tracing::debug!(
            tables = self.tables.len(),
            explicit = self.conditions.len(),
            inferred = inferred.len(),
            "resolving query graph"
        );

        let mut conditions = self.conditions.clone();
        conditions.extend(inferred);

        self.check_connectivity(&conditions)?;

        if conditions.is_empty() && !self.blank_query_allowed {
            return Err(QuarryError::AccidentalBlankQuery);
        }

        Ok(ResolvedQuery {
            tables: self.tables.clone(),
            conditions,
            expression_columns: self.expression_columns.clone(),
        })
    }

    /// Searches the registry for foreign keys between every pair of
    /// participating tables; each relationship found contributes one
    /// `fk_column = referenced_column` condition.
    fn infer_join_conditions(&self) -> Vec<Expr> {
        let mut inferred = Vec::new();
        for (i, a) in self.tables.iter().enumerate() {
            for b in &self.tables[i + 1..] {
                for rel in self.registry.relationships_between(&a.table, &b.table) {
                    tracing::debug!(
                        fk = %format!("{}.{}", rel.fk_table, rel.fk_column),
                        referenced = %format!("{}.{}", rel.referenced_table, rel.referenced_column),
                        "inferred join condition"
                    );
                    inferred.push(Expr::Comparison {
                        op: ComparisonOp::Equal,
                        lhs: Box::new(self.column_node(&rel.fk_table, &rel.fk_column)),
                        rhs: Box::new(
                            self.column_node(&rel.referenced_table, &rel.referenced_column),
                        ),
                    });
                }
            }
        }
        inferred
    }

    fn column_node(&self, table: &str, column: &str) -> Expr {
        let alias = self
            .tables
            .iter()
            .find(|t| t.table == table)
            .map_or(table, |t| t.alias.as_str())
            .to_string();
        let family = self
            .registry
            .get(table)
            .ok()
            .and_then(|row| row.fields().iter().find(|f| f.column == column))
            .map_or(Family::Number, |f| f.family);
        Expr::Column(ColumnExpr {
            table: table.to_string(),
            alias,
            column: column.to_string(),
            family,
            use_alias: true,
        })
    }

    /// Verifies that every pair of selected (required or optional) tables
    /// is linked, directly or transitively, by some condition. Assumed
    /// tables may provide the link but are not themselves required to be
    /// reachable.
    fn check_connectivity(&self, conditions: &[Expr]) -> QuarryResult<()> {
        if self.cartesian_join_allowed {
            return Ok(());
        }
        let selected: Vec<&GraphTable> = self
            .tables
            .iter()
            .filter(|t| t.role != TableRole::Assumed)
            .collect();
        if selected.len() < 2 {
            return Ok(());
        }

        let names: Vec<&str> = self.tables.iter().map(|t| t.table.as_str()).collect();
        let mut components = UnionFind::new(names.len());
        for condition in conditions {
            let involved: Vec<usize> = condition
                .tables_involved()
                .iter()
                .filter_map(|t| names.iter().position(|n| *n == t.as_str()))
                .collect();
            for pair in involved.windows(2) {
                components.union(pair[0], pair[1]);
            }
        }

        let first = names
            .iter()
            .position(|n| *n == selected[0].table)
            .unwrap_or(0);
        let unlinked: Vec<String> = selected
            .iter()
            .filter(|t| {
                let idx = names.iter().position(|n| *n == t.table).unwrap_or(0);
                !components.connected(first, idx)
            })
            .map(|t| t.table.clone())
            .collect();
        if unlinked.is_empty() {
            Ok(())
        } else {
            let mut tables = vec![selected[0].table.clone()];
            tables.extend(unlinked);
            Err(QuarryError::AccidentalCartesianJoin { tables })
        }
    }
}

/// The outcome of a successful resolution: the classified table list and
/// the full condition list, ready for statement assembly.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    tables: Vec<GraphTable>,
    conditions: Vec<Expr>,
    expression_columns: Vec<(String, Expr)>,
}

impl ResolvedQuery {
    /// Returns every participating table with its role.
    pub fn tables(&self) -> &[GraphTable] {
        &self.tables
    }

    /// Returns the tables with the given role.
    pub fn tables_with_role(&self, role: TableRole) -> impl Iterator<Item = &GraphTable> {
        self.tables.iter().filter(move |t| t.role == role)
    }

    /// Returns the full condition list: explicit conditions followed by
    /// inferred join conditions.
    pub fn conditions(&self) -> &[Expr] {
        &self.conditions
    }

    /// Returns the computed columns to select, as `(alias, expression)`
    /// pairs.
    pub fn expression_columns(&self) -> &[(String, Expr)] {
        &self.expression_columns
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }

    fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}
