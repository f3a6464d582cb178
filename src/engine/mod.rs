//! Flat-file engine layer.
//!
//! A [`RowSource`] produces and persists row sets for named tables; the
//! [`Connection`] executes built queries against one. File formats beyond
//! JSON and CSV (XML, YAML, INI, native drivers) integrate by implementing
//! `RowSource` themselves.

mod connection;
mod csv_source;
mod json_source;

pub use connection::Connection;
pub use csv_source::CsvSource;
pub use json_source::JsonSource;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FlatSqlResult;
use crate::row::{Row, Rows};

/// Trait for table-shaped data sources.
///
/// `load` returns all rows for a table; `save` overwrites the table in one
/// shot (no partial-write recovery, no locking; concurrent writers to the
/// same backing file are unsupported).
pub trait RowSource {
    /// Load all rows of a table. Sources backed by files may auto-create an
    /// empty table on first load instead of failing.
    fn load(&self, table: &str) -> FlatSqlResult<Rows>;

    /// Overwrite the table with the given rows.
    fn save(&self, table: &str, rows: &[Row]) -> FlatSqlResult<()>;

    /// Check whether the table exists.
    fn table_exists(&self, table: &str) -> bool;

    /// List all table names.
    fn list_tables(&self) -> Vec<String> {
        vec![]
    }
}

/// Declared type of a column, used to coerce raw string values from file
/// parsing into typed values before they enter the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Optional per-table column typing. Columns without a declared type pass
/// through untouched.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: HashMap<String, ColumnType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name.into(), column_type);
        self
    }

    fn coerce_value(column_type: ColumnType, value: Value) -> Value {
        let text = match &value {
            Value::String(s) => s.trim().to_string(),
            // Already typed values pass through
            _ => return value,
        };
        match column_type {
            ColumnType::Integer => text.parse::<i64>().map(Value::from).unwrap_or(value),
            ColumnType::Float => text.parse::<f64>().map(Value::from).unwrap_or(value),
            ColumnType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => value,
            },
            ColumnType::Text => value,
        }
    }

    /// Coerce every declared column of a row in place. Column order is
    /// preserved.
    pub fn coerce_row(&self, row: &mut Row) {
        for (column, column_type) in &self.columns {
            if let Some(slot) = row.get_mut(column) {
                let value = std::mem::replace(slot, Value::Null);
                *slot = Self::coerce_value(*column_type, value);
            }
        }
    }
}

/// In-memory row source for testing and scratch data.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: std::sync::Arc<std::sync::RwLock<HashMap<String, Rows>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with rows.
    pub fn add_table(&self, name: &str, rows: Rows) {
        self.tables.write().unwrap().insert(name.to_string(), rows);
    }
}

impl RowSource for MemorySource {
    fn load(&self, table: &str) -> FlatSqlResult<Rows> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, table: &str, rows: &[Row]) -> FlatSqlResult<()> {
        self.tables
            .write()
            .unwrap()
            .insert(table.to_string(), rows.to_vec());
        Ok(())
    }

    fn table_exists(&self, table: &str) -> bool {
        self.tables.read().unwrap().contains_key(table)
    }

    fn list_tables(&self) -> Vec<String> {
        self.tables.read().unwrap().keys().cloned().collect()
    }
}
