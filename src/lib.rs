//! flatsql - Storage-independent SQL-like query core for flat tabular data.
//!
//! This crate provides a regex-driven clause parser, a fluent query builder
//! with an SQL renderer, and an in-memory row-set evaluator, so SQL-style
//! queries can run against row sets loaded from flat files (JSON, CSV) or
//! any other [`engine::RowSource`] implementation.
//!
//! # Main Components
//!
//! - **Criteria**: anchored regex grammars turning clause fragments into
//!   structured criteria
//! - **Query**: the `QueryObject` AST, fluent `QueryBuilder`, and SQL text
//!   rendering
//! - **Processor**: the `DataProcessor` evaluator executing
//!   select/filter/order/aggregate directly over rows
//! - **Engine**: `RowSource` trait plus JSON/CSV/in-memory sources and the
//!   `Connection` that runs queries against them
//! - **Statement**: cursor-style fetching with assoc/num/both/column shapes
//!
//! # Example
//!
//! ```rust
//! use flatsql::engine::{Connection, MemorySource};
//! use flatsql::query::QueryBuilder;
//! use flatsql::row::row_from_pairs;
//! use flatsql::statement::FetchMode;
//! use serde_json::json;
//!
//! let source = MemorySource::new();
//! source.add_table(
//!     "users",
//!     vec![
//!         row_from_pairs(vec![("id", json!(1)), ("name", json!("Alice"))]),
//!         row_from_pairs(vec![("id", json!(2)), ("name", json!("Bob"))]),
//!     ],
//! );
//!
//! let conn = Connection::new(source);
//! let query = QueryBuilder::new()
//!     .select(["name"])
//!     .from(["users"])
//!     .filter(["id >= 2"])
//!     .into_query();
//!
//! let mut stmt = conn.execute(&query).unwrap();
//! let row = stmt.fetch(FetchMode::Assoc).unwrap();
//! assert_eq!(row["name"], json!("Bob"));
//! ```

pub mod criteria;
pub mod engine;
pub mod processor;
pub mod query;
pub mod row;
pub mod statement;

mod error;

pub use criteria::{
    Aggregation, AggregationKind, Assertion, ColumnCriterion, Condition, CriterionKind,
    JoinCriterion, LimitCriterion, OnCriterion, PredicateCriterion, Signal, SortCriterion,
    Sorting, TableCriterion,
};
pub use engine::{
    ColumnType, Connection, CsvSource, JsonSource, MemorySource, RowSource, Schema,
};
pub use error::{FlatSqlError, FlatSqlResult};
pub use processor::{
    AggregateFunction, DataProcessor, FilterCondition, FilterLogic, FilterOp,
};
pub use query::{QueryBuilder, QueryObject};
pub use row::{Row, Rows};
pub use statement::{FetchMode, Statement};
