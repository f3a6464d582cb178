//! In-memory row-set evaluator.
//!
//! `DataProcessor` executes the semantic equivalent of a built query
//! directly against an owned row sequence, used when the backend is a flat
//! file rather than a real SQL engine. Each query execution constructs its
//! own processor from a freshly loaded snapshot; instances are never shared
//! across concurrent callers.

mod helpers;

pub use helpers::{as_numeric, compare_values, is_numeric, like_to_regex, matches_like, values_equal_ci};

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use crate::row::{value_to_text, Row};

/// Comparison/membership operator of one filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Like,
    NotLike,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl FilterOp {
    /// Parse the textual operator names accepted in condition maps.
    pub fn parse(text: &str) -> Option<FilterOp> {
        let t = text.trim().to_ascii_uppercase();
        match t.as_str() {
            "=" | "==" => Some(FilterOp::Eq),
            "!=" | "<>" => Some(FilterOp::Ne),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Ge),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Le),
            "IN" => Some(FilterOp::In),
            "NOT IN" => Some(FilterOp::NotIn),
            "LIKE" => Some(FilterOp::Like),
            "NOT LIKE" => Some(FilterOp::NotLike),
            "BETWEEN" => Some(FilterOp::Between),
            "NOT BETWEEN" => Some(FilterOp::NotBetween),
            "IS NULL" => Some(FilterOp::IsNull),
            "IS NOT NULL" => Some(FilterOp::IsNotNull),
            _ => None,
        }
    }
}

/// How multiple conditions combine. The default is `Or`: any condition
/// matching keeps the row. Callers needing conjunctive filtering pass `And`
/// explicitly. (Unusual but deliberate; see DESIGN.md.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterLogic {
    And,
    #[default]
    Or,
}

/// One filter condition. For LIKE operators a precompiled regex can stand
/// in for the wildcard pattern.
#[derive(Debug, Clone)]
pub struct FilterCondition {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
    pub pattern: Option<Regex>,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
            pattern: None,
        }
    }

    /// LIKE condition backed by an already-compiled regex.
    pub fn with_regex(column: impl Into<String>, op: FilterOp, pattern: Regex) -> Self {
        Self {
            column: column.into(),
            op,
            value: Value::Null,
            pattern: Some(pattern),
        }
    }
}

/// Normalize an associative condition map: `column => value` means equality,
/// `column => {"operator": op, "value": v}` selects the operator explicitly.
/// Entries with an unrecognized operator are skipped.
pub fn conditions_from_map(map: &Map<String, Value>) -> Vec<FilterCondition> {
    let mut out = Vec::new();
    for (column, spec) in map {
        match spec {
            Value::Object(obj) if obj.contains_key("operator") => {
                let op = obj
                    .get("operator")
                    .and_then(Value::as_str)
                    .and_then(FilterOp::parse);
                if let Some(op) = op {
                    let value = obj.get("value").cloned().unwrap_or(Value::Null);
                    out.push(FilterCondition::new(column.clone(), op, value));
                }
            }
            other => out.push(FilterCondition::new(
                column.clone(),
                FilterOp::Eq,
                other.clone(),
            )),
        }
    }
    out
}

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    pub fn parse(name: &str) -> Option<AggregateFunction> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SUM" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            "COUNT" => Some(AggregateFunction::Count),
            _ => None,
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Owns one row-set snapshot for the duration of a query pipeline. Chained
/// operations mutate the owned sequence in place and return `self`.
#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    rows: Vec<Row>,
}

impl DataProcessor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project named columns, with `column AS alias` renaming. `*` anywhere
    /// in the list, or an empty list, is an identity projection. Missing
    /// columns project as null.
    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        if columns.is_empty() || columns.iter().any(|c| c.as_ref().trim() == "*") {
            return self;
        }
        let spec: Vec<(String, String)> = columns
            .iter()
            .map(|c| {
                let c = c.as_ref().trim();
                let lower = c.to_ascii_lowercase();
                match lower.find(" as ") {
                    Some(pos) => (
                        c[..pos].trim().to_string(),
                        c[pos + 4..].trim().to_string(),
                    ),
                    None => (c.to_string(), c.to_string()),
                }
            })
            .collect();

        for row in &mut self.rows {
            let mut projected = Row::new();
            for (source, target) in &spec {
                let value = row.get(source).cloned().unwrap_or(Value::Null);
                projected.insert(target.clone(), value);
            }
            *row = projected;
        }
        self
    }

    fn matches_condition(row: &Row, condition: &FilterCondition) -> bool {
        let cell = row.get(&condition.column).unwrap_or(&Value::Null);
        match condition.op {
            FilterOp::Eq => values_equal_ci(cell, &condition.value),
            FilterOp::Ne => !values_equal_ci(cell, &condition.value),
            FilterOp::Gt => compare_values(cell, &condition.value) == Ordering::Greater,
            FilterOp::Ge => compare_values(cell, &condition.value) != Ordering::Less,
            FilterOp::Lt => compare_values(cell, &condition.value) == Ordering::Less,
            FilterOp::Le => compare_values(cell, &condition.value) != Ordering::Greater,
            FilterOp::In | FilterOp::NotIn => {
                let found = match &condition.value {
                    Value::Array(items) => items.iter().any(|v| values_equal_ci(cell, v)),
                    single => values_equal_ci(cell, single),
                };
                if condition.op == FilterOp::In {
                    found
                } else {
                    !found
                }
            }
            FilterOp::Like | FilterOp::NotLike => {
                let matched = match &condition.pattern {
                    Some(re) => re.is_match(&value_to_text(cell)),
                    None => matches_like(cell, condition.value.as_str().unwrap_or("")),
                };
                if condition.op == FilterOp::Like {
                    matched
                } else {
                    !matched
                }
            }
            FilterOp::Between | FilterOp::NotBetween => {
                let (min, max) = match &condition.value {
                    Value::Object(bounds) => (
                        bounds.get("min").cloned().unwrap_or(Value::Null),
                        bounds.get("max").cloned().unwrap_or(Value::Null),
                    ),
                    Value::Array(bounds) if bounds.len() == 2 => {
                        (bounds[0].clone(), bounds[1].clone())
                    }
                    _ => return condition.op == FilterOp::NotBetween,
                };
                // Inclusive range
                let inside = compare_values(cell, &min) != Ordering::Less
                    && compare_values(cell, &max) != Ordering::Greater;
                if condition.op == FilterOp::Between {
                    inside
                } else {
                    !inside
                }
            }
            FilterOp::IsNull => cell.is_null(),
            FilterOp::IsNotNull => !cell.is_null(),
        }
    }

    fn row_matches(row: &Row, conditions: &[FilterCondition], logic: FilterLogic) -> bool {
        if conditions.is_empty() {
            return true;
        }
        match logic {
            FilterLogic::And => conditions.iter().all(|c| Self::matches_condition(row, c)),
            FilterLogic::Or => conditions.iter().any(|c| Self::matches_condition(row, c)),
        }
    }

    /// Keep rows matching the condition set under the given logic.
    pub fn filter(&mut self, conditions: &[FilterCondition], logic: FilterLogic) -> &mut Self {
        self.rows
            .retain(|row| Self::row_matches(row, conditions, logic));
        self
    }

    /// Keep rows matching any one AND-group in full, for predicate lists
    /// where AND binds tighter than OR. An empty group list keeps all rows.
    pub fn filter_groups(&mut self, groups: &[Vec<FilterCondition>]) -> &mut Self {
        if groups.is_empty() {
            return self;
        }
        self.rows.retain(|row| {
            groups
                .iter()
                .any(|group| Self::row_matches(row, group, FilterLogic::And))
        });
        self
    }

    /// Stable comparator sort on one column. Nulls compare through the same
    /// tie-break as any other value (no special null ordering).
    pub fn order_by(&mut self, column: &str, ascending: bool) -> &mut Self {
        self.rows.sort_by(|a, b| {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        self
    }

    /// Slice `count` rows starting at `offset`.
    pub fn limit(&mut self, count: usize, offset: usize) -> &mut Self {
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows.into_iter().skip(offset).take(count).collect();
        self
    }

    /// Remove exact-duplicate rows (full-row equality), preserving first
    /// occurrence order.
    pub fn distinct(&mut self) -> &mut Self {
        let mut seen: Vec<Row> = Vec::new();
        self.rows.retain(|row| {
            if seen.iter().any(|s| s == row) {
                false
            } else {
                seen.push(row.clone());
                true
            }
        });
        self
    }

    /// Partition rows by the stringified value of one column, preserving
    /// first-seen group order. No aggregation is applied.
    pub fn group_by(&self, column: &str) -> Vec<(String, Vec<Row>)> {
        let mut groups: Vec<(String, Vec<Row>)> = Vec::new();
        for row in &self.rows {
            let key = value_to_text(row.get(column).unwrap_or(&Value::Null));
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, rows)) => rows.push(row.clone()),
                None => groups.push((key, vec![row.clone()])),
            }
        }
        groups
    }

    /// Aggregate over the non-null values of one column. AVG of zero values
    /// yields 0; MIN/MAX of zero values yield null.
    pub fn aggregate(&self, function: AggregateFunction, column: &str) -> Value {
        let values: Vec<&Value> = self
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null())
            .collect();

        match function {
            AggregateFunction::Count => Value::from(values.len() as i64),
            AggregateFunction::Sum => {
                let sum: f64 = values.iter().filter_map(|v| as_numeric(v)).sum();
                number_value(sum)
            }
            AggregateFunction::Avg => {
                if values.is_empty() {
                    return Value::from(0);
                }
                let sum: f64 = values.iter().filter_map(|v| as_numeric(v)).sum();
                number_value(sum / values.len() as f64)
            }
            AggregateFunction::Min => values
                .iter()
                .min_by(|a, b| compare_values(a, b))
                .map(|v| (*v).clone())
                .unwrap_or(Value::Null),
            AggregateFunction::Max => values
                .iter()
                .max_by(|a, b| compare_values(a, b))
                .map(|v| (*v).clone())
                .unwrap_or(Value::Null),
        }
    }

    /// Append a row, back-filling columns missing relative to the FIRST
    /// existing row's column set with null. A soft shape check only; rows
    /// heterogeneous beyond the first are not validated further.
    pub fn insert(&mut self, mut row: Row) -> &mut Self {
        if let Some(first) = self.rows.first() {
            let reference: Vec<String> = first.keys().cloned().collect();
            for column in reference {
                row.entry(column).or_insert(Value::Null);
            }
        }
        self.rows.push(row);
        self
    }

    /// Overwrite the given columns on matching rows; returns the affected
    /// row count.
    pub fn update(
        &mut self,
        data: &Row,
        conditions: &[FilterCondition],
        logic: FilterLogic,
    ) -> usize {
        let mut affected = 0;
        for row in &mut self.rows {
            if Self::row_matches(row, conditions, logic) {
                for (column, value) in data {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        affected
    }

    /// Remove matching rows; returns the removed count. With no conditions
    /// the entire row-set is cleared.
    pub fn delete(&mut self, conditions: &[FilterCondition], logic: FilterLogic) -> usize {
        if conditions.is_empty() {
            let removed = self.rows.len();
            self.rows.clear();
            return removed;
        }
        let before = self.rows.len();
        self.rows
            .retain(|row| !Self::row_matches(row, conditions, logic));
        before - self.rows.len()
    }
}
