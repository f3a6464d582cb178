//! Fluent clause accumulator.
//!
//! `QueryBuilder` normalizes heterogeneous inputs (single fragments,
//! comma-joined strings, lists, grouped AND/OR batches) into parsed criteria
//! appended to the right `QueryObject` slot. Fragments that fail their
//! grammar contribute nothing; the builder never errors on input shape.

use serde_json::Value;

use crate::criteria::{
    parse_condition, parse_from, parse_group, parse_join_merged, parse_join_pair, parse_limit,
    parse_order, parse_select, Condition, LimitCriterion, LimitKind, PredicateCriterion,
};

use super::object::{QueryObject, SelectKind};
use super::render;

/// Split a comma-joined fragment at top-level commas only, so argument
/// lists like `IN (1, 2)` stay intact.
fn split_fragments(input: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);
    pieces.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Fluent query builder. Create one per query; consume it with
/// [`QueryBuilder::into_query`] or render it in place.
///
/// ```
/// use flatsql::query::QueryBuilder;
///
/// let sql = QueryBuilder::new()
///     .select(["id", "name"])
///     .from(["users"])
///     .filter(["id >= 10"])
///     .order_by(["name ASC"])
///     .limit_offset(0, 5)
///     .build();
/// assert!(sql.starts_with("SELECT"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: QueryObject,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append SELECT columns. Comma-joined items are split and each piece
    /// parsed on its own.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in columns {
            for piece in split_fragments(item.as_ref()) {
                if let Some(column) = parse_select(piece) {
                    self.query.select_mut().columns.push(column);
                }
            }
        }
        self
    }

    /// Mark the select list as DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.query.select_mut().kind = SelectKind::Distinct;
        self
    }

    pub fn from<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in tables {
            for piece in split_fragments(item.as_ref()) {
                if let Some(table) = parse_from(piece) {
                    self.query.from_mut().push(table);
                }
            }
        }
        self
    }

    /// Join a single table without a condition.
    pub fn join(mut self, table: &str) -> Self {
        if let Some(join) = parse_join_pair(table, "") {
            self.query.join_mut().push(join);
        }
        self
    }

    /// Join a table with an ON condition. The condition is also recorded in
    /// the `on` slot so renderers can interleave JOIN/ON pairs.
    pub fn join_on(mut self, table: &str, on: &str) -> Self {
        if let Some(join) = parse_join_pair(table, on) {
            if let Some(on) = &join.on {
                self.query.on_mut().push(on.clone());
            }
            self.query.join_mut().push(join);
        }
        self
    }

    /// Join from a merged token list: tokens containing `=` are parsed as ON
    /// conditions and attach to the most recent table token.
    pub fn join_merged<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for join in parse_join_merged(tokens) {
            if let Some(on) = &join.on {
                self.query.on_mut().push(on.clone());
            }
            self.query.join_mut().push(join);
        }
        self
    }

    fn append_conditions<I, S>(
        slot: &mut Vec<PredicateCriterion>,
        fragments: I,
        condition: Condition,
    ) where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in fragments {
            for piece in split_fragments(item.as_ref()) {
                if let Some(predicate) = parse_condition(piece, condition) {
                    slot.push(predicate);
                }
            }
        }
    }

    /// Append WHERE predicates in the flat form: every predicate carries the
    /// `None` conjunction tag (clause opener semantics).
    pub fn filter<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::append_conditions(self.query.where_mut(), fragments, Condition::None);
        self
    }

    /// Append one WHERE group with an explicit conjunction tag, for ordered
    /// AND/OR composition. Renderers join groups left to right.
    pub fn filter_group<I, S>(mut self, condition: Condition, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::append_conditions(self.query.where_mut(), fragments, condition);
        self
    }

    /// Append HAVING predicates (flat form).
    pub fn having<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::append_conditions(self.query.having_mut(), fragments, Condition::None);
        self
    }

    /// Append one HAVING group with an explicit conjunction tag.
    pub fn having_group<I, S>(mut self, condition: Condition, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::append_conditions(self.query.having_mut(), fragments, condition);
        self
    }

    pub fn group_by<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in terms {
            for piece in split_fragments(item.as_ref()) {
                if let Some(term) = parse_group(piece) {
                    self.query.group_mut().push(term);
                }
            }
        }
        self
    }

    pub fn order_by<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in terms {
            for piece in split_fragments(item.as_ref()) {
                if let Some(term) = parse_order(piece) {
                    self.query.order_mut().push(term);
                }
            }
        }
        self
    }

    /// `LIMIT count` with no offset.
    pub fn limit(mut self, count: u64) -> Self {
        self.query.set_limit(Some(LimitCriterion {
            raw: count.to_string(),
            limit: count,
            offset: None,
            kind: LimitKind::Default,
        }));
        self
    }

    /// `LIMIT offset, count`.
    pub fn limit_offset(mut self, offset: u64, count: u64) -> Self {
        self.query.set_limit(Some(LimitCriterion {
            raw: format!("{}, {}", offset, count),
            limit: count,
            offset: Some(offset),
            kind: LimitKind::Offset,
        }));
        self
    }

    /// Parse a textual limit spec (`"20"` or `"0, 20"`). A non-matching
    /// fragment leaves the slot untouched.
    pub fn limit_fragment(mut self, fragment: &str) -> Self {
        if let Some(limit) = parse_limit(fragment) {
            self.query.set_limit(Some(limit));
        }
        self
    }

    /// Render the dialect-normalized SQL text.
    pub fn build(&self) -> String {
        render::build(&self.query)
    }

    /// Render the literal clause text as supplied.
    pub fn build_raw(&self) -> String {
        render::build_raw(&self.query)
    }

    /// Ordered bound-parameter values from WHERE/HAVING arguments.
    pub fn values(&self) -> Vec<Value> {
        render::values(&self.query)
    }

    pub fn query(&self) -> &QueryObject {
        &self.query
    }

    pub fn into_query(self) -> QueryObject {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::AggregationKind;

    #[test]
    fn test_comma_joined_select() {
        let builder = QueryBuilder::new().select(["id, name, email"]);
        let select = builder.query().select().unwrap();
        assert_eq!(select.columns.len(), 3);
    }

    #[test]
    fn test_top_level_split_keeps_argument_lists() {
        let builder = QueryBuilder::new().filter(["status IN (1, 2, 3)"]);
        let conditions = builder.query().where_().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].aggregation.kind, AggregationKind::In);
    }

    #[test]
    fn test_parse_miss_contributes_nothing() {
        let builder = QueryBuilder::new().select(["id", "!!not valid!!"]);
        assert_eq!(builder.query().select().unwrap().columns.len(), 1);

        let builder = QueryBuilder::new().filter(["garbage with no operator"]);
        // The slot was materialized by the append path but holds nothing
        assert!(builder
            .query()
            .where_()
            .map(|w| w.is_empty())
            .unwrap_or(true));
    }

    #[test]
    fn test_grouped_conditions_keep_order() {
        let builder = QueryBuilder::new()
            .filter_group(Condition::None, ["a = 1"])
            .filter_group(Condition::Disjunction, ["b = 2"])
            .filter_group(Condition::Conjunction, ["c = 3"]);
        let conditions = builder.query().where_().unwrap();
        assert_eq!(conditions.len(), 3);
        assert_eq!(conditions[0].condition, Condition::None);
        assert_eq!(conditions[1].condition, Condition::Disjunction);
        assert_eq!(conditions[2].condition, Condition::Conjunction);
    }

    #[test]
    fn test_join_routes_tokens() {
        let builder =
            QueryBuilder::new().join_merged(["orders", "users.id = orders.user_id"]);
        let joins = builder.query().join().unwrap();
        assert_eq!(joins.len(), 1);
        assert!(joins[0].on.is_some());
        assert!(builder.query().has_on());
    }

    #[test]
    fn test_limit_fragment() {
        let builder = QueryBuilder::new().limit_fragment("0, 20");
        let limit = builder.query().limit().unwrap();
        assert_eq!(limit.limit, 20);
        assert_eq!(limit.offset, Some(0));

        // Non-matching fragment leaves the slot untouched
        let builder = QueryBuilder::new().limit_fragment("bogus");
        assert!(!builder.query().has_limit());
    }
}
