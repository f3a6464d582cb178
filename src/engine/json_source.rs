//! JSON flat-file row source: one `<table>.json` file per table, holding an
//! array of objects.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{FlatSqlError, FlatSqlResult};
use crate::row::{Row, Rows};

use super::RowSource;

/// File-per-table JSON source rooted at a directory.
///
/// A missing table file is auto-created empty on first load. Malformed JSON
/// is fatal and carries the decoder's message.
#[derive(Debug, Clone)]
pub struct JsonSource {
    dir: PathBuf,
}

impl JsonSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }

    fn decode(path: &Path, text: &str) -> FlatSqlResult<Rows> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            FlatSqlError::MalformedData(format!("{}: {}", path.display(), e))
        })?;
        let items = match value {
            Value::Array(items) => items,
            _ => {
                return Err(FlatSqlError::MalformedData(format!(
                    "{}: expected a top-level array of objects",
                    path.display()
                )))
            }
        };
        let mut rows = Rows::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(FlatSqlError::MalformedData(format!(
                        "{}: expected an object row, found {}",
                        path.display(),
                        other
                    )))
                }
            }
        }
        Ok(rows)
    }
}

impl RowSource for JsonSource {
    fn load(&self, table: &str) -> FlatSqlResult<Rows> {
        let path = self.table_path(table);
        if !path.exists() {
            tracing::debug!("load: auto-creating empty table file {}", path.display());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "[]")?;
            return Ok(Rows::new());
        }
        let text = fs::read_to_string(&path)?;
        Self::decode(&path, &text)
    }

    fn save(&self, table: &str, rows: &[Row]) -> FlatSqlResult<()> {
        let path = self.table_path(table);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let items: Vec<Value> = rows.iter().cloned().map(Value::Object).collect();
        let text = serde_json::to_string_pretty(&Value::Array(items))?;
        tracing::debug!("save: writing {} rows to {}", rows.len(), path.display());
        fs::write(&path, text)?;
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
                if path.extension().map(|e| e == "json").unwrap_or(false) {
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
    use crate::row::row_from_pairs;
    use serde_json::json;

    #[test]
    fn test_load_auto_creates() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonSource::new(dir.path());

        assert!(!source.table_exists("users"));
        let rows = source.load("users").unwrap();
        assert!(rows.is_empty());
        assert!(source.table_exists("users"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonSource::new(dir.path());

        let rows = vec![row_from_pairs(vec![
            ("id", json!(1)),
            ("name", json!("Alice")),
        ])];
        source.save("users", &rows).unwrap();

        let loaded = source.load("users").unwrap();
        assert_eq!(loaded, rows);
        assert_eq!(source.list_tables(), ["users"]);
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let source = JsonSource::new(dir.path());

        let err = source.load("bad").unwrap_err();
        assert!(matches!(err, FlatSqlError::MalformedData(_)));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_non_array_top_level_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{\"a\": 1}").unwrap();
        let source = JsonSource::new(dir.path());
        assert!(source.load("bad").is_err());
    }
}
