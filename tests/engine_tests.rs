//! End-to-end tests running built queries against file-backed sources.

use flatsql::engine::{ColumnType, Connection, CsvSource, JsonSource, RowSource, Schema};
use flatsql::processor::{FilterCondition, FilterLogic, FilterOp};
use flatsql::query::QueryBuilder;
use flatsql::row::row_from_pairs;
use flatsql::statement::FetchMode;
use flatsql::FlatSqlError;
use serde_json::json;

fn seed_json(dir: &std::path::Path) -> JsonSource {
    let source = JsonSource::new(dir);
    source
        .save(
            "users",
            &[
                row_from_pairs(vec![
                    ("id", json!(1)),
                    ("name", json!("Alice")),
                    ("city", json!("Rio Grande")),
                ]),
                row_from_pairs(vec![
                    ("id", json!(2)),
                    ("name", json!("Bob")),
                    ("city", json!("Bahia")),
                ]),
                row_from_pairs(vec![
                    ("id", json!(3)),
                    ("name", json!("Carol")),
                    ("city", json!("Rio de Janeiro")),
                ]),
            ],
        )
        .unwrap();
    source
}

#[test]
fn query_against_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::new(seed_json(dir.path()));

    let query = QueryBuilder::new()
        .select(["id", "name"])
        .from(["users"])
        .filter(["city LIKE '%Rio%'"])
        .order_by(["id DESC"])
        .into_query();

    let mut stmt = conn.execute(&query).unwrap();
    assert_eq!(stmt.row_count(), 2);
    let first = stmt.fetch(FetchMode::Assoc).unwrap();
    assert_eq!(first["name"], json!("Carol"));
}

#[test]
fn csv_source_needs_schema_for_typed_filters() {
    let dir = tempfile::tempdir().unwrap();
    let source = CsvSource::new(dir.path());
    source
        .save(
            "scores",
            &[
                row_from_pairs(vec![("player", json!("a")), ("points", json!(90))]),
                row_from_pairs(vec![("player", json!("b")), ("points", json!(120))]),
            ],
        )
        .unwrap();

    let conn = Connection::new(source)
        .with_schema("scores", Schema::new().column("points", ColumnType::Integer));

    let query = QueryBuilder::new()
        .select(["player"])
        .from(["scores"])
        .filter(["points > 100"])
        .into_query();

    let mut stmt = conn.execute(&query).unwrap();
    assert_eq!(stmt.row_count(), 1);
    let row = stmt.fetch(FetchMode::Assoc).unwrap();
    assert_eq!(row["player"], json!("b"));
}

#[test]
fn first_load_auto_creates_table_files() {
    let dir = tempfile::tempdir().unwrap();
    let json = JsonSource::new(dir.path());
    assert!(json.load("fresh").unwrap().is_empty());
    assert!(dir.path().join("fresh.json").exists());

    let csv = CsvSource::new(dir.path());
    assert!(csv.load("fresh").unwrap().is_empty());
    assert!(dir.path().join("fresh.csv").exists());
}

#[test]
fn malformed_json_reports_decoder_message() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("users.json"), "[{\"id\": }]").unwrap();
    let conn = Connection::new(JsonSource::new(dir.path()));

    let query = QueryBuilder::new().select(["*"]).from(["users"]).into_query();
    let err = conn.execute(&query).unwrap_err();
    assert!(matches!(err, FlatSqlError::MalformedData(_)));
    assert!(err.to_string().contains("users.json"));
}

#[test]
fn mutations_persist_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::new(seed_json(dir.path()));

    conn.insert(
        "users",
        row_from_pairs(vec![("id", json!(4)), ("name", json!("Dave"))]),
    )
    .unwrap();

    let conditions = vec![FilterCondition::new("id", FilterOp::Eq, json!(2))];
    assert_eq!(
        conn.delete_where("users", &conditions, FilterLogic::And).unwrap(),
        1
    );

    // Reopen from the same directory: changes survived
    let reopened = Connection::new(JsonSource::new(dir.path()));
    let query = QueryBuilder::new().select(["*"]).from(["users"]).into_query();
    let stmt = reopened.execute(&query).unwrap();
    assert_eq!(stmt.row_count(), 3);
    assert!(stmt.rows().iter().all(|r| r["id"] != json!(2)));
}

#[test]
fn group_query_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonSource::new(dir.path());
    source
        .save(
            "orders",
            &[
                row_from_pairs(vec![("customer", json!("a")), ("total", json!(10))]),
                row_from_pairs(vec![("customer", json!("a")), ("total", json!(20))]),
                row_from_pairs(vec![("customer", json!("b")), ("total", json!(5))]),
            ],
        )
        .unwrap();
    let conn = Connection::new(source);

    let query = QueryBuilder::new()
        .select(["sum(total) AS spent"])
        .from(["orders"])
        .group_by(["customer"])
        .having(["spent > 10"])
        .into_query();

    let mut stmt = conn.execute(&query).unwrap();
    assert_eq!(stmt.row_count(), 1);
    let row = stmt.fetch(FetchMode::Assoc).unwrap();
    assert_eq!(row["customer"], json!("a"));
    assert_eq!(row["spent"], json!(30));
}
