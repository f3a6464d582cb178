//! Connection: executes built queries against a row source.
//!
//! For flat-file engines this is the whole "database": `execute` loads a
//! fresh table snapshot, runs the evaluator pipeline over it, and hands the
//! materialized result to a [`Statement`]. Mutating operations load, apply,
//! and save the full table. One connection serves one caller at a time;
//! share nothing across threads without external synchronization.

use std::collections::HashMap;

use serde_json::Value;

use crate::criteria::{
    AggregationKind, Assertion, ColumnCriterion, Condition, PredicateCriterion, Signal,
    SortCriterion, Sorting,
};
use crate::error::{FlatSqlError, FlatSqlResult};
use crate::processor::{
    AggregateFunction, DataProcessor, FilterCondition, FilterLogic, FilterOp,
};
use crate::query::{literal_value, QueryObject, SelectKind};
use crate::row::{Row, Rows};
use crate::statement::Statement;

use super::{RowSource, Schema};

/// Convert a parsed predicate into an evaluator filter condition.
fn predicate_to_condition(predicate: &PredicateCriterion) -> Option<FilterCondition> {
    // Having predicates in function form address the aggregate's result
    // column (`count(id)`), not the source column
    let column = match &predicate.function {
        Some(func) => format!("{}({})", func.name, predicate.column),
        None => predicate.column.clone(),
    };

    let negated = predicate.aggregation.assert == Assertion::Negation;
    match predicate.aggregation.kind {
        AggregationKind::In => {
            let values: Vec<Value> = predicate
                .arguments
                .all()
                .into_iter()
                .map(literal_value)
                .collect();
            let op = if negated { FilterOp::NotIn } else { FilterOp::In };
            Some(FilterCondition::new(column, op, Value::Array(values)))
        }
        AggregationKind::Between => {
            let bounds: Vec<Value> = predicate
                .arguments
                .all()
                .into_iter()
                .map(literal_value)
                .collect();
            if bounds.len() != 2 {
                return None;
            }
            let op = if negated {
                FilterOp::NotBetween
            } else {
                FilterOp::Between
            };
            Some(FilterCondition::new(column, op, Value::Array(bounds)))
        }
        AggregationKind::Like => {
            let pattern = predicate.arguments.default.clone()?;
            let op = if negated {
                FilterOp::NotLike
            } else {
                FilterOp::Like
            };
            Some(FilterCondition::new(column, op, Value::String(pattern)))
        }
        AggregationKind::None => {
            let op = match predicate.signal? {
                Signal::Equal => FilterOp::Eq,
                Signal::NotEqualAngle | Signal::NotEqualBang => FilterOp::Ne,
                Signal::Greater => FilterOp::Gt,
                Signal::GreaterOrEqual => FilterOp::Ge,
                Signal::Less => FilterOp::Lt,
                Signal::LessOrEqual => FilterOp::Le,
            };
            let value = literal_value(predicate.arguments.all().first()?);
            Some(FilterCondition::new(column, op, value))
        }
    }
}

/// Split a predicate slot at disjunction boundaries into AND-groups that
/// combine with OR. AND binds tighter than OR, so the rendered text
/// `a = 1 AND b = 2 OR c = 3` evaluates as `(a AND b) OR c`.
fn condition_groups(predicates: &[PredicateCriterion]) -> Vec<Vec<FilterCondition>> {
    let mut groups: Vec<Vec<FilterCondition>> = Vec::new();
    let mut current: Vec<FilterCondition> = Vec::new();
    for predicate in predicates {
        if predicate.condition == Condition::Disjunction && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        if let Some(condition) = predicate_to_condition(predicate) {
            current.push(condition);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Apply ORDER terms in reverse declaration order; the stable sort makes
/// the first term the primary key.
fn apply_order(processor: &mut DataProcessor, terms: &[SortCriterion]) {
    for term in terms.iter().rev() {
        if let Some(column) = &term.column {
            processor.order_by(column, term.sorting != Sorting::Descending);
        }
    }
}

struct SelectAggregate {
    function: AggregateFunction,
    column: String,
    target: String,
}

fn select_aggregates(columns: &[ColumnCriterion]) -> Vec<SelectAggregate> {
    columns
        .iter()
        .filter_map(|col| {
            let func = col.function.as_ref()?;
            let function = AggregateFunction::parse(&func.name)?;
            let column = func.arguments.first().cloned().unwrap_or_default();
            let target = col
                .alias
                .clone()
                .unwrap_or_else(|| format!("{}({})", func.name, column));
            Some(SelectAggregate {
                function,
                column,
                target,
            })
        })
        .collect()
}

fn aggregate_value(processor: &DataProcessor, spec: &SelectAggregate) -> Value {
    // COUNT(*) counts rows, not non-null values of a column
    if spec.function == AggregateFunction::Count && spec.column == "*" {
        return Value::from(processor.len() as i64);
    }
    processor.aggregate(spec.function, &spec.column)
}

/// Connection over one row source, with optional per-table schemas.
pub struct Connection {
    source: Box<dyn RowSource>,
    schemas: HashMap<String, Schema>,
    strict: bool,
}

impl Connection {
    pub fn new(source: impl RowSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            schemas: HashMap::new(),
            strict: false,
        }
    }

    /// Require tables to exist up front: a missing table errors instead of
    /// being auto-created empty by the source.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Declare a schema for a table; loaded rows are coerced before they
    /// enter the evaluator.
    pub fn with_schema(mut self, table: impl Into<String>, schema: Schema) -> Self {
        self.schemas.insert(table.into(), schema);
        self
    }

    pub fn source(&self) -> &dyn RowSource {
        self.source.as_ref()
    }

    fn load_table(&self, table: &str) -> FlatSqlResult<Rows> {
        if self.strict && !self.source.table_exists(table) {
            return Err(FlatSqlError::TableNotFound(table.to_string()));
        }
        let mut rows = self.source.load(table)?;
        if let Some(schema) = self.schemas.get(table) {
            for row in &mut rows {
                schema.coerce_row(row);
            }
        }
        Ok(rows)
    }

    fn from_table<'q>(&self, query: &'q QueryObject) -> FlatSqlResult<&'q str> {
        query
            .from()
            .and_then(|from| from.first())
            .map(|t| t.name.as_str())
            .ok_or_else(|| {
                FlatSqlError::ExecutionError("query has no FROM table".to_string())
            })
    }

    /// Execute a built query and return a result cursor.
    ///
    /// The pipeline runs over a fresh snapshot: filter, group/aggregate (or
    /// order + distinct + projection), then limit. Each execution gets its
    /// own evaluator instance.
    pub fn execute(&self, query: &QueryObject) -> FlatSqlResult<Statement> {
        let table = self.from_table(query)?;
        tracing::debug!("execute: loading snapshot of table '{}'", table);

        let mut processor = DataProcessor::new(self.load_table(table)?);

        if let Some(predicates) = query.where_() {
            processor.filter_groups(&condition_groups(predicates));
        }

        let select = query.select();
        let aggregates = select
            .map(|s| select_aggregates(&s.columns))
            .unwrap_or_default();

        let mut result: Rows;

        if let Some(group) = query.group().filter(|g| !g.is_empty()) {
            let group_column = group[0]
                .column
                .clone()
                .ok_or_else(|| {
                    FlatSqlError::ExecutionError(
                        "GROUP BY requires a plain column term".to_string(),
                    )
                })?;

            result = Rows::new();
            for (_, group_rows) in processor.group_by(&group_column) {
                let group_processor = DataProcessor::new(group_rows);
                let mut row = Row::new();
                let key_value = group_processor.rows()[0]
                    .get(&group_column)
                    .cloned()
                    .unwrap_or(Value::Null);
                row.insert(group_column.clone(), key_value);
                for spec in &aggregates {
                    row.insert(spec.target.clone(), aggregate_value(&group_processor, spec));
                }
                result.push(row);
            }

            if let Some(predicates) = query.having() {
                let mut having = DataProcessor::new(result);
                having.filter_groups(&condition_groups(predicates));
                result = having.into_rows();
            }

            // The aggregated rows carry the group column, so ORDER terms
            // apply to them directly
            if let Some(order) = query.order() {
                let mut sorter = DataProcessor::new(result);
                apply_order(&mut sorter, order);
                result = sorter.into_rows();
            }
        } else if !aggregates.is_empty() {
            // Aggregate-only select collapses to a single row
            let mut row = Row::new();
            for spec in &aggregates {
                row.insert(spec.target.clone(), aggregate_value(&processor, spec));
            }
            result = vec![row];
        } else {
            if let Some(order) = query.order() {
                apply_order(&mut processor, order);
            }

            if let Some(select) = select {
                if select.kind == SelectKind::Distinct {
                    processor.distinct();
                }
                let spec: Vec<String> = select
                    .columns
                    .iter()
                    .filter_map(|col| {
                        let name = col.column.as_ref()?;
                        Some(match &col.alias {
                            Some(alias) => format!("{} AS {}", name, alias),
                            None => name.clone(),
                        })
                    })
                    .collect();
                processor.select(&spec);
            }
            result = processor.into_rows();
        }

        if let Some(limit) = query.limit() {
            let mut limiter = DataProcessor::new(result);
            limiter.limit(limit.limit as usize, limit.offset.unwrap_or(0) as usize);
            result = limiter.into_rows();
        }

        tracing::debug!("execute: {} result rows", result.len());
        Ok(Statement::new(result))
    }

    /// Append one row to a table, back-filling missing columns, and save.
    pub fn insert(&self, table: &str, row: Row) -> FlatSqlResult<usize> {
        let mut processor = DataProcessor::new(self.load_table(table)?);
        processor.insert(row);
        self.source.save(table, processor.rows())?;
        Ok(1)
    }

    /// Update matching rows and save; returns the affected count.
    pub fn update_where(
        &self,
        table: &str,
        data: &Row,
        conditions: &[FilterCondition],
        logic: FilterLogic,
    ) -> FlatSqlResult<usize> {
        let mut processor = DataProcessor::new(self.load_table(table)?);
        let affected = processor.update(data, conditions, logic);
        if affected > 0 {
            self.source.save(table, processor.rows())?;
        }
        Ok(affected)
    }

    /// Delete matching rows and save; returns the removed count. Empty
    /// conditions clear the whole table.
    pub fn delete_where(
        &self,
        table: &str,
        conditions: &[FilterCondition],
        logic: FilterLogic,
    ) -> FlatSqlResult<usize> {
        let mut processor = DataProcessor::new(self.load_table(table)?);
        let removed = processor.delete(conditions, logic);
        if removed > 0 {
            self.source.save(table, processor.rows())?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemorySource;
    use crate::query::QueryBuilder;
    use crate::row::row_from_pairs;
    use crate::statement::FetchMode;
    use serde_json::json;

    fn users_source() -> MemorySource {
        let source = MemorySource::new();
        source.add_table(
            "users",
            vec![
                row_from_pairs(vec![
                    ("id", json!(1)),
                    ("name", json!("Alice")),
                    ("dept", json!("eng")),
                ]),
                row_from_pairs(vec![
                    ("id", json!(2)),
                    ("name", json!("Bob")),
                    ("dept", json!("ops")),
                ]),
                row_from_pairs(vec![
                    ("id", json!(3)),
                    ("name", json!("Carol")),
                    ("dept", json!("eng")),
                ]),
            ],
        );
        source
    }

    #[test]
    fn test_execute_filter_order_limit() {
        let conn = Connection::new(users_source());
        let query = QueryBuilder::new()
            .select(["id", "name"])
            .from(["users"])
            .filter(["id >= 2"])
            .order_by(["id DESC"])
            .limit(1)
            .into_query();

        let mut stmt = conn.execute(&query).unwrap();
        assert_eq!(stmt.row_count(), 1);
        let row = stmt.fetch(FetchMode::Assoc).unwrap();
        assert_eq!(row["id"], json!(3));
        // Projection dropped the dept column
        assert!(row.get("dept").is_none());
    }

    #[test]
    fn test_execute_no_from_is_error() {
        let conn = Connection::new(MemorySource::new());
        let query = QueryBuilder::new().select(["id"]).into_query();
        assert!(conn.execute(&query).is_err());
    }

    #[test]
    fn test_execute_aggregate_only() {
        let conn = Connection::new(users_source());
        let query = QueryBuilder::new()
            .select(["count(*) AS total", "max(id) AS top"])
            .from(["users"])
            .into_query();

        let mut stmt = conn.execute(&query).unwrap();
        let row = stmt.fetch(FetchMode::Assoc).unwrap();
        assert_eq!(row["total"], json!(3));
        assert_eq!(row["top"], json!(3));
    }

    #[test]
    fn test_execute_group_with_having() {
        let conn = Connection::new(users_source());
        let query = QueryBuilder::new()
            .select(["count(id) AS members"])
            .from(["users"])
            .group_by(["dept"])
            .having(["members >= 2"])
            .into_query();

        let mut stmt = conn.execute(&query).unwrap();
        assert_eq!(stmt.row_count(), 1);
        let row = stmt.fetch(FetchMode::Assoc).unwrap();
        assert_eq!(row["dept"], json!("eng"));
        assert_eq!(row["members"], json!(2));
    }

    #[test]
    fn test_mutations_persist() {
        let source = users_source();
        let conn = Connection::new(source.clone());

        conn.insert("users", row_from_pairs(vec![("id", json!(4))]))
            .unwrap();
        assert_eq!(source.load("users").unwrap().len(), 4);
        // Missing columns were back-filled
        assert_eq!(source.load("users").unwrap()[3]["name"], Value::Null);

        let conditions = vec![FilterCondition::new("id", FilterOp::Eq, json!(4))];
        let affected = conn
            .update_where(
                "users",
                &row_from_pairs(vec![("name", json!("Dave"))]),
                &conditions,
                FilterLogic::And,
            )
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(source.load("users").unwrap()[3]["name"], json!("Dave"));

        let removed = conn
            .delete_where("users", &conditions, FilterLogic::And)
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(source.load("users").unwrap().len(), 3);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let source = MemorySource::new();
        source.add_table(
            "t",
            vec![
                row_from_pairs(vec![("a", json!(1)), ("b", json!(0)), ("c", json!(0))]),
                row_from_pairs(vec![("a", json!(1)), ("b", json!(2)), ("c", json!(0))]),
                row_from_pairs(vec![("a", json!(0)), ("b", json!(0)), ("c", json!(3))]),
            ],
        );
        let conn = Connection::new(source);
        let query = QueryBuilder::new()
            .select(["*"])
            .from(["t"])
            .filter_group(Condition::None, ["a = 1"])
            .filter_group(Condition::Conjunction, ["b = 2"])
            .filter_group(Condition::Disjunction, ["c = 3"])
            .into_query();

        // Renders as `a = 1 AND b = 2 OR c = 3`; the row with a=1 but b=0
        // fails the AND arm and must not survive
        let stmt = conn.execute(&query).unwrap();
        assert_eq!(stmt.row_count(), 2);
        assert!(stmt
            .rows()
            .iter()
            .all(|r| r["b"] == json!(2) || r["c"] == json!(3)));
    }

    #[test]
    fn test_grouped_results_honor_order_by() {
        let source = MemorySource::new();
        source.add_table(
            "staff",
            vec![
                row_from_pairs(vec![("dept", json!("zeta")), ("id", json!(1))]),
                row_from_pairs(vec![("dept", json!("alpha")), ("id", json!(2))]),
                row_from_pairs(vec![("dept", json!("alpha")), ("id", json!(3))]),
            ],
        );
        let conn = Connection::new(source);
        let query = QueryBuilder::new()
            .select(["count(id) AS members"])
            .from(["staff"])
            .group_by(["dept"])
            .order_by(["dept ASC"])
            .into_query();

        let stmt = conn.execute(&query).unwrap();
        assert_eq!(stmt.row_count(), 2);
        assert_eq!(stmt.rows()[0]["dept"], json!("alpha"));
        assert_eq!(stmt.rows()[0]["members"], json!(2));
        assert_eq!(stmt.rows()[1]["dept"], json!("zeta"));
    }

    #[test]
    fn test_strict_connection_rejects_missing_table() {
        let query = QueryBuilder::new().select(["*"]).from(["ghost"]).into_query();

        let conn = Connection::new(MemorySource::new()).strict();
        let err = conn.execute(&query).unwrap_err();
        assert!(matches!(err, FlatSqlError::TableNotFound(_)));
        assert_eq!(err.to_string(), "Table not found: ghost");

        // Non-strict keeps the load-as-empty behavior
        let conn = Connection::new(MemorySource::new());
        assert_eq!(conn.execute(&query).unwrap().row_count(), 0);
    }

    #[test]
    fn test_or_tagged_predicates_are_disjunctive() {
        let conn = Connection::new(users_source());
        let query = QueryBuilder::new()
            .select(["*"])
            .from(["users"])
            .filter_group(crate::criteria::Condition::None, ["id = 1"])
            .filter_group(crate::criteria::Condition::Disjunction, ["id = 3"])
            .into_query();

        let stmt = conn.execute(&query).unwrap();
        assert_eq!(stmt.row_count(), 2);
    }
}
