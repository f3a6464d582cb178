//! The in-memory query AST.
//!
//! `QueryObject` holds nine named clause slots. A slot is absent (`None`)
//! until first written: the `*_mut` accessors materialize an empty container
//! so callers can unconditionally append, and the `set_*` writers clear the
//! slot entirely when handed an empty value. "Was this clause ever touched"
//! is therefore observable through the `has_*` checks right after a write,
//! not after a materializing read.

use crate::criteria::{
    ColumnCriterion, JoinCriterion, LimitCriterion, OnCriterion, PredicateCriterion,
    SortCriterion, TableCriterion,
};

/// Whether the select list keeps duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectKind {
    #[default]
    All,
    Distinct,
}

/// The SELECT slot: list kind plus parsed columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectClause {
    pub kind: SelectKind,
    pub columns: Vec<ColumnCriterion>,
}

/// AST for one query, built up by [`crate::query::QueryBuilder`] and
/// consumed by the renderer or a connection. Owned by a single builder
/// instance; never shared across concurrent callers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryObject {
    select: Option<SelectClause>,
    from: Option<Vec<TableCriterion>>,
    join: Option<Vec<JoinCriterion>>,
    on: Option<Vec<OnCriterion>>,
    where_: Option<Vec<PredicateCriterion>>,
    having: Option<Vec<PredicateCriterion>>,
    group: Option<Vec<SortCriterion>>,
    order: Option<Vec<SortCriterion>>,
    limit: Option<LimitCriterion>,
}

macro_rules! slot_accessors {
    ($name:ident, $mut_name:ident, $set_name:ident, $has_name:ident, Vec<$item:ty>) => {
        pub fn $name(&self) -> Option<&Vec<$item>> {
            self.$name.as_ref()
        }

        /// Materializes an empty container on first access.
        pub fn $mut_name(&mut self) -> &mut Vec<$item> {
            self.$name.get_or_insert_with(Vec::new)
        }

        /// Assigning an empty value removes the slot entirely.
        pub fn $set_name(&mut self, value: Vec<$item>) {
            self.$name = if value.is_empty() { None } else { Some(value) };
        }

        pub fn $has_name(&self) -> bool {
            self.$name.is_some()
        }
    };
}

impl QueryObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self) -> Option<&SelectClause> {
        self.select.as_ref()
    }

    /// Materializes an empty select clause on first access.
    pub fn select_mut(&mut self) -> &mut SelectClause {
        self.select.get_or_insert_with(SelectClause::default)
    }

    /// Assigning a clause with no columns removes the slot entirely.
    pub fn set_select(&mut self, clause: SelectClause) {
        self.select = if clause.columns.is_empty() {
            None
        } else {
            Some(clause)
        };
    }

    pub fn has_select(&self) -> bool {
        self.select.is_some()
    }

    slot_accessors!(from, from_mut, set_from, has_from, Vec<TableCriterion>);
    slot_accessors!(join, join_mut, set_join, has_join, Vec<JoinCriterion>);
    slot_accessors!(on, on_mut, set_on, has_on, Vec<OnCriterion>);
    slot_accessors!(where_, where_mut, set_where, has_where, Vec<PredicateCriterion>);
    slot_accessors!(having, having_mut, set_having, has_having, Vec<PredicateCriterion>);
    slot_accessors!(group, group_mut, set_group, has_group, Vec<SortCriterion>);
    slot_accessors!(order, order_mut, set_order, has_order, Vec<SortCriterion>);

    pub fn limit(&self) -> Option<&LimitCriterion> {
        self.limit.as_ref()
    }

    pub fn set_limit(&mut self, limit: Option<LimitCriterion>) {
        self.limit = limit;
    }

    pub fn has_limit(&self) -> bool {
        self.limit.is_some()
    }
}
