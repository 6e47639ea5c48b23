//! Query-graph resolution and statement assembly against the stock
//! dialects, exercising the blank-query and Cartesian-join protections
//! end to end.

use quarry_core::{QuarryError, Settings};
use quarry_db::column::ColumnReference;
use quarry_db::graph::QueryGraph;
use quarry_db::operators::Operator;
use quarry_db::schema::{FieldDef, RowDescription, SchemaRegistry};
use quarry_db::statement::SelectStatement;
use quarry_db::value::Family;
use quarry_dialects::{MySqlDialect, PostgresDialect, SqliteDialect};

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
            .with_field(FieldDef::new("villain_id", Family::Number).references("villain", "id"))
            .with_field(FieldDef::new("location", Family::String)),
    );
    registry.register(
        RowDescription::new("professional")
            .with_field(FieldDef::new("id", Family::Number).primary_key())
            .with_field(FieldDef::new("title", Family::String)),
    );
    registry
}

#[test]
fn test_unrelated_tables_raise_cartesian_join() {
    let registry = registry();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(registry.get("villain").unwrap());
    graph.add_required(registry.get("professional").unwrap());
    let err = graph.resolve().unwrap_err();
    assert!(matches!(err, QuarryError::AccidentalCartesianJoin { .. }));
}

#[test]
fn test_cartesian_opt_in_yields_combined_condition_set() {
    let registry = registry();
    let villain = registry.get("villain").unwrap();
    let professional = registry.get("professional").unwrap();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(villain);
    graph.add_required(professional);
    graph.allow_cartesian_joins(true);

    let name = ColumnReference::new(villain, "name").unwrap();
    let title = ColumnReference::new(professional, "title").unwrap();
    graph.add_operator(&name, &Operator::is("Dr Nonono")).unwrap();
    graph.add_operator(&title, &Operator::is("Dr")).unwrap();

    let resolved = graph.resolve().unwrap();
    assert_eq!(resolved.conditions().len(), 2);

    let sql = SelectStatement::new(&resolved, &registry)
        .to_sql(&PostgresDialect)
        .unwrap();
    assert!(sql.contains("INNER JOIN \"professional\""));
    assert!(sql.contains("WHERE (\"villain\".\"name\" = 'Dr Nonono')"));
}

#[test]
fn test_blank_query_refused_then_permitted() {
    let registry = registry();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(registry.get("villain").unwrap());
    assert!(matches!(
        graph.resolve().unwrap_err(),
        QuarryError::AccidentalBlankQuery
    ));

    graph.allow_blank_queries(true);
    let resolved = graph.resolve().unwrap();
    let sql = SelectStatement::new(&resolved, &registry)
        .to_sql(&SqliteDialect)
        .unwrap();
    // An allowed blank query simply has no WHERE clause.
    assert_eq!(
        sql,
        "SELECT \"villain\".\"id\", \"villain\".\"name\" FROM \"villain\""
    );
}

#[test]
fn test_settings_defaults_feed_new_graphs() {
    let registry = registry();
    let permissive = Settings {
        blank_query_allowed: true,
        cartesian_join_allowed: true,
        ..Settings::default()
    };
    let mut graph = QueryGraph::with_settings(&registry, &permissive);
    graph.add_required(registry.get("villain").unwrap());
    graph.add_required(registry.get("professional").unwrap());
    assert!(graph.resolve().is_ok());
}

#[test]
fn test_inferred_join_compiles_on_every_dialect() {
    let registry = registry();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(registry.get("villain").unwrap());
    graph.add_required(registry.get("lair").unwrap());
    let resolved = graph.resolve().unwrap();

    let pg = SelectStatement::new(&resolved, &registry)
        .to_sql(&PostgresDialect)
        .unwrap();
    assert!(pg.contains(
        "INNER JOIN \"lair\" ON (\"lair\".\"villain_id\" = \"villain\".\"id\")"
    ));

    let my = SelectStatement::new(&resolved, &registry)
        .to_sql(&MySqlDialect)
        .unwrap();
    assert!(my.contains("INNER JOIN `lair` ON (`lair`.`villain_id` = `villain`.`id`)"));
}

#[test]
fn test_optional_table_compiles_to_left_join() {
    let registry = registry();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(registry.get("villain").unwrap());
    graph.add_optional(registry.get("lair").unwrap());
    let resolved = graph.resolve().unwrap();
    let sql = SelectStatement::new(&resolved, &registry)
        .to_sql(&PostgresDialect)
        .unwrap();
    assert!(sql.contains("LEFT JOIN \"lair\" ON (\"lair\".\"villain_id\" = \"villain\".\"id\")"));
}

#[test]
fn test_operator_conditions_and_joins_compose() {
    let registry = registry();
    let villain = registry.get("villain").unwrap();
    let lair = registry.get("lair").unwrap();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(villain);
    graph.add_required(lair);

    let location = ColumnReference::new(lair, "location").unwrap();
    graph
        .add_operator(&location, &Operator::permitted_values(["volcano", "moon base"]))
        .unwrap();

    let resolved = graph.resolve().unwrap();
    let sql = SelectStatement::new(&resolved, &registry)
        .to_sql(&PostgresDialect)
        .unwrap();
    assert!(sql.contains("\"lair\".\"location\" IN ('volcano', 'moon base')"));
    assert!(sql.contains("INNER JOIN \"lair\""));
}

#[test]
fn test_family_violation_surfaces_before_any_sql() {
    let registry = registry();
    let villain = registry.get("villain").unwrap();
    let mut graph = QueryGraph::with_settings(&registry, &Settings::default());
    graph.add_required(villain);
    let name = ColumnReference::new(villain, "name").unwrap();
    let err = graph
        .add_operator(&name, &Operator::permitted_range(1_i64, 10_i64))
        .unwrap_err();
    assert!(matches!(
        err,
        QuarryError::ComparisonBetweenDissimilarTypes { .. }
    ));
}
