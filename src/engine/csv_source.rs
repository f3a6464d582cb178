//! CSV flat-file row source: one `<table>.csv` file per table with a header
//! row. Values load as strings; pair with a [`super::Schema`] to get typed
//! values into the evaluator.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::FlatSqlResult;
use crate::row::{value_to_text, Row, Rows};

use super::RowSource;

/// File-per-table CSV source rooted at a directory. Auto-creates an empty
/// file (no header yet) on first load, matching the JSON source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", table))
    }
}

impl RowSource for CsvSource {
    fn load(&self, table: &str) -> FlatSqlResult<Rows> {
        let path = self.table_path(table);
        if !path.exists() {
            tracing::debug!("load: auto-creating empty table file {}", path.display());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "")?;
            return Ok(Rows::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;

        let headers: Vec<String> = match reader.headers() {
            Ok(h) if !h.is_empty() => h.iter().map(|s| s.to_string()).collect(),
            _ => return Ok(Rows::new()),
        };

        let mut rows = Rows::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Row::new();
            for (i, header) in headers.iter().enumerate() {
                let value = record
                    .get(i)
                    .map(|s| Value::String(s.to_string()))
                    .unwrap_or(Value::Null);
                row.insert(header.clone(), value);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn save(&self, table: &str, rows: &[Row]) -> FlatSqlResult<()> {
        let path = self.table_path(table);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&path)?;
        if let Some(first) = rows.first() {
            let headers: Vec<&String> = first.keys().collect();
            writer.write_record(&headers)?;
            for row in rows {
                let record: Vec<String> = headers
                    .iter()
                    .map(|h| value_to_text(row.get(h.as_str()).unwrap_or(&Value::Null)))
                    .collect();
                writer.write_record(&record)?;
            }
        }
        writer.flush()?;
        tracing::debug!("save: wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }

    fn table_exists(&self, table: &str) -> bool {
        self.table_path(table).exists()
    }

    fn list_tables(&self) -> Vec<String> {
        let mut tables = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "csv").unwrap_or(false) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        tables.push(stem.to_string());
                    }
                }
            }
        }
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnType, Schema};
    use crate::row::row_from_pairs;
    use serde_json::json;

    #[test]
    fn test_load_auto_creates() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(dir.path());
        assert!(source.load("users").unwrap().is_empty());
        assert!(source.table_exists("users"));
    }

    #[test]
    fn test_round_trip_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(dir.path());

        let rows = vec![
            row_from_pairs(vec![("id", json!(1)), ("name", json!("Alice"))]),
            row_from_pairs(vec![("id", json!(2)), ("name", json!("Bob"))]),
        ];
        source.save("users", &rows).unwrap();

        let loaded = source.load("users").unwrap();
        assert_eq!(loaded.len(), 2);
        // CSV is untyped: values come back as strings
        assert_eq!(loaded[0]["id"], json!("1"));
        assert_eq!(loaded[1]["name"], json!("Bob"));
    }

    #[test]
    fn test_schema_coerces_loaded_strings() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(dir.path());
        source
            .save("t", &[row_from_pairs(vec![("n", json!(7))])])
            .unwrap();

        let mut loaded = source.load("t").unwrap();
        let schema = Schema::new().column("n", ColumnType::Integer);
        for row in &mut loaded {
            schema.coerce_row(row);
        }
        assert_eq!(loaded[0]["n"], json!(7));
    }
}
