//! Criterion data model and clause-fragment parsers.
//!
//! A criterion is one parsed clause fragment (a select column, a from table,
//! a predicate, a sort term, ...) in structured form. Fragments are matched
//! by fixed anchored regexes, one grammar per clause kind; there is no
//! general SQL tokenizer. A fragment that fails its grammar simply yields
//! `None` and contributes nothing to the query.

mod grammar;
mod parser;

pub use parser::{
    parse_condition, parse_from, parse_group, parse_join_merged, parse_join_pair, parse_limit,
    parse_on, parse_order, parse_select,
};
pub(crate) use parser::trim_quotes;

/// How a fragment was recognized: a plain column/table reference, a function
/// call, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    Metadata,
    Function,
    Default,
}

/// Comparison operator in a predicate or join condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Equal,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    /// `<>`
    NotEqualAngle,
    /// `!=`
    NotEqualBang,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Equal => "=",
            Signal::Less => "<",
            Signal::Greater => ">",
            Signal::LessOrEqual => "<=",
            Signal::GreaterOrEqual => ">=",
            Signal::NotEqualAngle => "<>",
            Signal::NotEqualBang => "!=",
        }
    }

    pub fn parse(text: &str) -> Option<Signal> {
        match text {
            "=" => Some(Signal::Equal),
            "<" => Some(Signal::Less),
            ">" => Some(Signal::Greater),
            "<=" => Some(Signal::LessOrEqual),
            ">=" => Some(Signal::GreaterOrEqual),
            "<>" => Some(Signal::NotEqualAngle),
            "!=" => Some(Signal::NotEqualBang),
            _ => None,
        }
    }
}

/// IN / LIKE / BETWEEN keyword classification of a predicate. Distinct from
/// SUM/AVG/COUNT aggregate *functions*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationKind {
    #[default]
    None,
    In,
    Like,
    Between,
}

/// Whether the predicate is negated (`NOT IN`, `NOT LIKE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assertion {
    #[default]
    Affirmation,
    Negation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aggregation {
    pub kind: AggregationKind,
    pub assert: Assertion,
}

/// How a predicate joins to the one before it: clause opener, AND, or OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    #[default]
    None,
    Conjunction,
    Disjunction,
}

/// Sort direction on an ORDER term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sorting {
    #[default]
    None,
    Ascending,
    Descending,
}

/// A parsed `name(arg, arg, ...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<String>,
}

/// SELECT-list entry: `[table.]column [AS alias]` or `func(args) [AS alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCriterion {
    pub raw: String,
    pub kind: CriterionKind,
    pub table: Option<String>,
    /// Set for the metadata form; `None` when the entry is a function call.
    pub column: Option<String>,
    pub alias: Option<String>,
    pub function: Option<FunctionCall>,
}

/// FROM entry: `table [AS alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCriterion {
    pub raw: String,
    pub name: String,
    pub alias: Option<String>,
}

/// A possibly table-qualified column reference inside an ON condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

/// ON condition: `[host_table.]host_column <signal> [consumer_table.]consumer_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnCriterion {
    pub raw: String,
    pub host: ColumnRef,
    pub signal: Signal,
    pub consumer: ColumnRef,
}

/// One JOIN: the joined table plus an optional ON condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCriterion {
    pub table: TableCriterion,
    pub on: Option<OnCriterion>,
}

/// Argument lists captured from a predicate: the first token (`default`), an
/// optional trailing token after a comma (`extra`), and a parenthesized
/// comma-joined list (`unlimited`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Arguments {
    pub default: Option<String>,
    pub extra: Option<String>,
    pub unlimited: Vec<String>,
}

impl Arguments {
    /// All argument tokens in order, whichever sub-field captured them.
    pub fn all(&self) -> Vec<&str> {
        if !self.unlimited.is_empty() {
            return self.unlimited.iter().map(String::as_str).collect();
        }
        let mut out = Vec::new();
        if let Some(d) = &self.default {
            out.push(d.as_str());
        }
        if let Some(e) = &self.extra {
            out.push(e.as_str());
        }
        out
    }
}

/// WHERE/HAVING predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateCriterion {
    pub raw: String,
    pub kind: CriterionKind,
    pub table: Option<String>,
    pub column: String,
    pub function: Option<FunctionCall>,
    pub aggregation: Aggregation,
    pub signal: Option<Signal>,
    pub arguments: Arguments,
    pub condition: Condition,
}

/// GROUP BY / ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub raw: String,
    pub kind: CriterionKind,
    pub table: Option<String>,
    /// Set for the metadata form; `None` when the term is a function call.
    pub column: Option<String>,
    pub function: Option<FunctionCall>,
    pub sorting: Sorting,
}

/// With an explicit offset the kind is `Offset`, otherwise `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Default,
    Offset,
}

/// LIMIT spec: `count` or `offset, count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitCriterion {
    pub raw: String,
    pub limit: u64,
    pub offset: Option<u64>,
    pub kind: LimitKind,
}
