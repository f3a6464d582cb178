//! Row representation for flat tabular data.
//!
//! A row is an ordered mapping from column name to a JSON scalar. Ordering
//! matters: numeric and single-column fetch shapes address columns by
//! position, so `serde_json` is used with `preserve_order`.

use serde_json::{Map, Value};

/// One record: ordered column name -> scalar value.
pub type Row = Map<String, Value>;

/// An owned sequence of rows, as produced by a [`crate::engine::RowSource`].
pub type Rows = Vec<Row>;

/// Render a value the way it appears in a text-oriented result set.
///
/// Strings pass through without quotes; everything else uses its JSON
/// representation. Null becomes the empty string.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a row from (column, value) pairs, preserving order.
pub fn row_from_pairs<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let mut row = Row::new();
    for (k, v) in pairs {
        row.insert(k.into(), v);
    }
    row
}
