//! Cursor-style fetch abstraction over a materialized result set.
//!
//! A `Statement` owns the rows produced by one query execution, independent
//! of which source produced them. `fetch` advances a cursor by one and
//! returns `None` once exhausted (never an error); `fetch_all` returns the
//! whole cached set and stays idempotent because the cache is owned by the
//! statement, not consumed by reads.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FlatSqlError, FlatSqlResult};
use crate::row::{value_to_text, Row};

/// Output shape of a fetched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Column name -> value object.
    Assoc,
    /// 0-indexed array of string-cast values.
    Num,
    /// Assoc merged with numeric string keys.
    Both,
    /// One column by position, string-cast.
    Column(usize),
}

impl FetchMode {
    /// Parse a fetch-style name (`assoc`, `num`, `both`, `column`). The
    /// `column` style addresses position 0; use [`FetchMode::Column`]
    /// directly for other positions.
    pub fn parse(name: &str) -> FlatSqlResult<FetchMode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "assoc" => Ok(FetchMode::Assoc),
            "num" => Ok(FetchMode::Num),
            "both" => Ok(FetchMode::Both),
            "column" => Ok(FetchMode::Column(0)),
            _ => Err(FlatSqlError::UnknownOption(name.to_string())),
        }
    }
}

/// Result cursor for one executed query.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    rows: Vec<Row>,
    cursor: usize,
}

impl Statement {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, cursor: 0 }
    }

    /// Number of rows in the result set.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Direct access to the underlying rows (does not move the cursor).
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn shape(row: &Row, mode: FetchMode) -> Value {
        match mode {
            FetchMode::Assoc => Value::Object(row.clone()),
            FetchMode::Num => Value::Array(
                row.values()
                    .map(|v| Value::String(value_to_text(v)))
                    .collect(),
            ),
            FetchMode::Both => {
                let mut both: Map<String, Value> = row.clone();
                for (i, value) in row.values().enumerate() {
                    both.insert(i.to_string(), Value::String(value_to_text(value)));
                }
                Value::Object(both)
            }
            FetchMode::Column(index) => row
                .values()
                .nth(index)
                .map(|v| Value::String(value_to_text(v)))
                .unwrap_or(Value::Null),
        }
    }

    /// Fetch the next row in the given shape, advancing the cursor. Returns
    /// `None` once the result set is exhausted.
    pub fn fetch(&mut self, mode: FetchMode) -> Option<Value> {
        let row = self.rows.get(self.cursor)?;
        let shaped = Self::shape(row, mode);
        self.cursor += 1;
        Some(shaped)
    }

    /// Fetch every row in the given shape. Moves the cursor to the end, but
    /// repeated calls still return the full set: the cache is per statement
    /// and is not consumed by reads.
    pub fn fetch_all(&mut self, mode: FetchMode) -> Vec<Value> {
        self.cursor = self.rows.len();
        self.rows.iter().map(|row| Self::shape(row, mode)).collect()
    }

    /// Fetch the next row hydrated into a typed value. Row keys are matched
    /// against the target's fields case-insensitively (ASCII folding): keys
    /// are lower-cased before deserialization.
    pub fn fetch_into<T: DeserializeOwned>(&mut self) -> FlatSqlResult<Option<T>> {
        let row = match self.rows.get(self.cursor) {
            Some(row) => row,
            None => return Ok(None),
        };
        let mut folded = Map::new();
        for (key, value) in row {
            folded.insert(key.to_ascii_lowercase(), value.clone());
        }
        let hydrated: T = serde_json::from_value(Value::Object(folded))
            .map_err(FlatSqlError::JsonError)?;
        self.cursor += 1;
        Ok(Some(hydrated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::row_from_pairs;
    use serde::Deserialize;
    use serde_json::json;

    fn sample() -> Statement {
        Statement::new(vec![
            row_from_pairs(vec![("id", json!(1)), ("name", json!("Alice"))]),
            row_from_pairs(vec![("id", json!(2)), ("name", json!("Bob"))]),
            row_from_pairs(vec![("id", json!(3)), ("name", json!("Carol"))]),
        ])
    }

    #[test]
    fn test_fetch_assoc_advances_cursor() {
        let mut stmt = sample();
        let first = stmt.fetch(FetchMode::Assoc).unwrap();
        assert_eq!(first["name"], json!("Alice"));
        let second = stmt.fetch(FetchMode::Assoc).unwrap();
        assert_eq!(second["name"], json!("Bob"));
    }

    #[test]
    fn test_fetch_num_string_casts() {
        let mut stmt = sample();
        let row = stmt.fetch(FetchMode::Num).unwrap();
        assert_eq!(row, json!(["1", "Alice"]));
    }

    #[test]
    fn test_fetch_both_merges_shapes() {
        let mut stmt = sample();
        let row = stmt.fetch(FetchMode::Both).unwrap();
        assert_eq!(row["name"], json!("Alice"));
        assert_eq!(row["0"], json!("1"));
        assert_eq!(row["1"], json!("Alice"));
    }

    #[test]
    fn test_fetch_column() {
        let mut stmt = sample();
        assert_eq!(stmt.fetch(FetchMode::Column(1)).unwrap(), json!("Alice"));
        assert_eq!(stmt.fetch(FetchMode::Column(1)).unwrap(), json!("Bob"));
        // Out-of-range column is null, not an error
        assert_eq!(stmt.fetch(FetchMode::Column(9)).unwrap(), Value::Null);
    }

    #[test]
    fn test_exhaustion_and_idempotent_fetch_all() {
        let mut stmt = sample();
        let all = stmt.fetch_all(FetchMode::Assoc);
        assert_eq!(all.len(), 3);

        // Cursor is spent: fetch returns None, never an error
        assert!(stmt.fetch(FetchMode::Assoc).is_none());

        // But the cache is not consumed: fetch_all still returns everything
        let again = stmt.fetch_all(FetchMode::Assoc);
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_fetch_mode_parse() {
        assert_eq!(FetchMode::parse("assoc").unwrap(), FetchMode::Assoc);
        assert_eq!(FetchMode::parse(" BOTH ").unwrap(), FetchMode::Both);
        assert_eq!(FetchMode::parse("num").unwrap(), FetchMode::Num);
        assert_eq!(FetchMode::parse("column").unwrap(), FetchMode::Column(0));

        let err = FetchMode::parse("lazy").unwrap_err();
        assert!(matches!(err, FlatSqlError::UnknownOption(_)));
        assert_eq!(err.to_string(), "Unknown option: lazy");
    }

    #[test]
    fn test_fetch_into_case_insensitive() {
        #[derive(Deserialize)]
        struct User {
            id: i64,
            name: String,
        }

        let mut stmt = Statement::new(vec![row_from_pairs(vec![
            ("ID", json!(7)),
            ("Name", json!("Dora")),
        ])]);
        let user: User = stmt.fetch_into().unwrap().unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.name, "Dora");

        let done: Option<User> = stmt.fetch_into().unwrap();
        assert!(done.is_none());
    }
}
