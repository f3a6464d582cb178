//! Fragment parsers: one function per clause kind.
//!
//! Every parser trims its fragment, applies the anchored grammar for its
//! clause, and returns `None` on a non-match. Callers treat `None` as "this
//! fragment contributed nothing", never as an error.

use super::grammar;
use super::{
    Aggregation, AggregationKind, Arguments, Assertion, ColumnCriterion, ColumnRef, Condition,
    CriterionKind, FunctionCall, JoinCriterion, LimitCriterion, LimitKind, OnCriterion,
    PredicateCriterion, Signal, SortCriterion, Sorting, TableCriterion,
};

/// Strip one layer of matching single or double quotes.
pub(crate) fn trim_quotes(text: &str) -> &str {
    let t = text.trim();
    if t.len() >= 2 {
        let bytes = t.as_bytes();
        if (bytes[0] == b'\'' && bytes[t.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[t.len() - 1] == b'"')
        {
            return &t[1..t.len() - 1];
        }
    }
    t
}

fn split_args(list: &str) -> Vec<String> {
    list.split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Parse a SELECT-list fragment: `func(args) [AS alias]` or
/// `[table.]column [AS alias]`.
pub fn parse_select(fragment: &str) -> Option<ColumnCriterion> {
    let fragment = fragment.trim();

    if let Some(caps) = grammar::SELECT_FUNCTION.captures(fragment) {
        return Some(ColumnCriterion {
            raw: fragment.to_string(),
            kind: CriterionKind::Function,
            table: None,
            column: None,
            alias: caps.name("alias").map(|m| m.as_str().to_string()),
            function: Some(FunctionCall {
                name: caps["func"].to_string(),
                arguments: split_args(&caps["args"]),
            }),
        });
    }

    let caps = grammar::SELECT_METADATA.captures(fragment)?;
    Some(ColumnCriterion {
        raw: fragment.to_string(),
        kind: CriterionKind::Metadata,
        table: caps.name("table").map(|m| m.as_str().to_string()),
        column: Some(caps["column"].to_string()),
        alias: caps.name("alias").map(|m| m.as_str().to_string()),
        function: None,
    })
}

/// Parse a FROM fragment: `table [AS alias]`.
pub fn parse_from(fragment: &str) -> Option<TableCriterion> {
    let fragment = fragment.trim();
    let caps = grammar::FROM_TABLE.captures(fragment)?;
    Some(TableCriterion {
        raw: fragment.to_string(),
        name: caps["table"].to_string(),
        alias: caps.name("alias").map(|m| m.as_str().to_string()),
    })
}

/// Parse an ON fragment: `[t.]col <signal> [t.]col`.
pub fn parse_on(fragment: &str) -> Option<OnCriterion> {
    let fragment = fragment.trim();
    let caps = grammar::ON_CONDITION.captures(fragment)?;
    let signal = Signal::parse(&caps["signal"])?;
    Some(OnCriterion {
        raw: fragment.to_string(),
        host: ColumnRef {
            table: caps.name("host_table").map(|m| m.as_str().to_string()),
            column: caps["host_column"].to_string(),
        },
        signal,
        consumer: ColumnRef {
            table: caps.name("consumer_table").map(|m| m.as_str().to_string()),
            column: caps["consumer_column"].to_string(),
        },
    })
}

/// Classify the operator text of a predicate. Detection is by keyword
/// substring: `IN` / `LIKE` / `BETWEEN` select the aggregation kind, a
/// leading `NOT` flips the assertion, anything else is a comparison signal.
fn classify_operator(operator: &str) -> (Aggregation, Option<Signal>) {
    let upper = operator.to_ascii_uppercase();
    let assert = if upper.contains("NOT") {
        Assertion::Negation
    } else {
        Assertion::Affirmation
    };
    let kind = if upper.contains("BETWEEN") {
        AggregationKind::Between
    } else if upper.contains("LIKE") {
        AggregationKind::Like
    } else if upper.contains("IN") {
        AggregationKind::In
    } else {
        AggregationKind::None
    };
    if kind == AggregationKind::None {
        (
            Aggregation {
                kind,
                assert: Assertion::Affirmation,
            },
            Signal::parse(operator.trim()),
        )
    } else {
        (Aggregation { kind, assert }, None)
    }
}

fn capture_arguments(caps: &regex::Captures<'_>) -> Arguments {
    if let Some(unlimited) = caps.name("unlimited") {
        return Arguments {
            default: None,
            extra: None,
            unlimited: split_args(unlimited.as_str()),
        };
    }
    Arguments {
        default: caps.name("default").map(|m| m.as_str().to_string()),
        extra: caps.name("extra").map(|m| m.as_str().to_string()),
        unlimited: Vec::new(),
    }
}

/// Parse a WHERE/HAVING fragment with the given conjunction tag.
///
/// The function grammar takes precedence, but only counts when its
/// `function_name` capture is populated; BETWEEN/IN predicates also use
/// parentheses, so parenthesis presence alone decides nothing.
pub fn parse_condition(fragment: &str, condition: Condition) -> Option<PredicateCriterion> {
    let fragment = fragment.trim();

    let (caps, kind, function) = match grammar::PREDICATE_FUNCTION.captures(fragment) {
        Some(caps) if caps.name("function_name").is_some() => {
            let function = FunctionCall {
                name: caps["function_name"].to_string(),
                arguments: vec![caps["column"].to_string()],
            };
            (caps, CriterionKind::Function, Some(function))
        }
        _ => {
            let caps = grammar::PREDICATE_PLAIN.captures(fragment)?;
            (caps, CriterionKind::Metadata, None)
        }
    };

    let (aggregation, signal) = classify_operator(&caps["operator"]);
    let mut arguments = capture_arguments(&caps);

    // The first-token capture truncates a LIKE pattern at the first space;
    // recover the complete pattern from the raw fragment.
    if aggregation.kind == AggregationKind::Like {
        if let Some(like) = grammar::LIKE_RECOVERY.captures(fragment) {
            arguments.default = Some(trim_quotes(&like["pattern"]).to_string());
            arguments.extra = None;
            arguments.unlimited = Vec::new();
        }
    }

    Some(PredicateCriterion {
        raw: fragment.to_string(),
        kind,
        table: caps.name("table").map(|m| m.as_str().to_string()),
        column: caps["column"].to_string(),
        function,
        aggregation,
        signal,
        arguments,
        condition,
    })
}

fn parse_sort_base(fragment: &str, sorting: Sorting) -> Option<SortCriterion> {
    if let Some(caps) = grammar::SELECT_FUNCTION.captures(fragment) {
        return Some(SortCriterion {
            raw: fragment.to_string(),
            kind: CriterionKind::Function,
            table: None,
            column: None,
            function: Some(FunctionCall {
                name: caps["func"].to_string(),
                arguments: split_args(&caps["args"]),
            }),
            sorting,
        });
    }
    let caps = grammar::SELECT_METADATA.captures(fragment)?;
    // An alias capture makes no sense on a sort term
    if caps.name("alias").is_some() {
        return None;
    }
    Some(SortCriterion {
        raw: fragment.to_string(),
        kind: CriterionKind::Metadata,
        table: caps.name("table").map(|m| m.as_str().to_string()),
        column: Some(caps["column"].to_string()),
        function: None,
        sorting,
    })
}

/// Parse a GROUP BY term: `func(args)` or `[table.]column`.
pub fn parse_group(fragment: &str) -> Option<SortCriterion> {
    parse_sort_base(fragment.trim(), Sorting::None)
}

/// Parse an ORDER BY term: like GROUP, with a trailing `ASC`/`DESC`
/// stripped first (default is no explicit direction).
pub fn parse_order(fragment: &str) -> Option<SortCriterion> {
    let fragment = fragment.trim();
    let (base, sorting) = match grammar::ORDER_DIRECTION.captures(fragment) {
        Some(caps) => {
            let sorting = if caps["direction"].eq_ignore_ascii_case("DESC") {
                Sorting::Descending
            } else {
                Sorting::Ascending
            };
            let base = grammar::ORDER_DIRECTION.replace(fragment, "");
            (base.trim().to_string(), sorting)
        }
        None => (fragment.to_string(), Sorting::None),
    };
    parse_sort_base(&base, sorting)
}

/// Parse a LIMIT fragment: `count` or `offset, count`.
pub fn parse_limit(fragment: &str) -> Option<LimitCriterion> {
    let fragment = fragment.trim();
    let caps = grammar::LIMIT_SPEC.captures(fragment)?;
    let first: u64 = caps["first"].parse().ok()?;
    match caps.name("second") {
        Some(second) => Some(LimitCriterion {
            raw: fragment.to_string(),
            limit: second.as_str().parse().ok()?,
            offset: Some(first),
            kind: LimitKind::Offset,
        }),
        None => Some(LimitCriterion {
            raw: fragment.to_string(),
            limit: first,
            offset: None,
            kind: LimitKind::Default,
        }),
    }
}

/// Parse a `(table, condition)` join pair. An empty condition yields a
/// FROM-only join entry.
pub fn parse_join_pair(table: &str, on: &str) -> Option<JoinCriterion> {
    let table = parse_from(table)?;
    let on = if on.trim().is_empty() {
        None
    } else {
        parse_on(on)
    };
    Some(JoinCriterion { table, on })
}

/// Parse a merged token list of join targets and conditions. Tokens with an
/// `=` route to the ON grammar and attach to the most recent table; the rest
/// route to the FROM grammar and open a new join.
pub fn parse_join_merged<I, S>(tokens: I) -> Vec<JoinCriterion>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joins: Vec<JoinCriterion> = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        if token.contains('=') {
            if let (Some(last), Some(on)) = (joins.last_mut(), parse_on(token)) {
                last.on = Some(on);
            }
        } else if let Some(table) = parse_from(token) {
            joins.push(JoinCriterion { table, on: None });
        }
    }
    joins
}
