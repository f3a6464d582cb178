//! SQL text rendering for a populated [`QueryObject`].
//!
//! Two modes: [`build`] re-quotes identifiers for the target grammar,
//! [`build_raw`] reconstructs the clause text literally as supplied.
//! Rendering order is fixed: SELECT, FROM, JOIN/ON (interleaved per join),
//! WHERE, GROUP BY, HAVING, ORDER BY, LIMIT/OFFSET. Invoked on an empty
//! AST this produces a bare `SELECT`; that degenerate statement is the
//! accepted behavior.

use serde_json::Value;

use crate::criteria::{
    AggregationKind, Assertion, ColumnCriterion, ColumnRef, Condition, PredicateCriterion,
    SortCriterion, Sorting,
};

use super::object::{QueryObject, SelectKind};

fn quote_ident(name: &str) -> String {
    if name == "*" {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

fn quote_ref(table: Option<&str>, column: &str) -> String {
    match table {
        Some(t) => format!("{}.{}", quote_ident(t), quote_ident(column)),
        None => quote_ident(column),
    }
}

fn render_column(column: &ColumnCriterion, quoted: bool) -> String {
    if !quoted {
        return column.raw.clone();
    }
    let base = match (&column.function, &column.column) {
        (Some(func), _) => format!(
            "{}({})",
            func.name.to_ascii_uppercase(),
            func.arguments
                .iter()
                .map(|a| quote_ident(a))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        (None, Some(name)) => quote_ref(column.table.as_deref(), name),
        (None, None) => column.raw.clone(),
    };
    match &column.alias {
        Some(alias) => format!("{} AS {}", base, quote_ident(alias)),
        None => base,
    }
}

fn render_sort(term: &SortCriterion, quoted: bool, with_direction: bool) -> String {
    let base = if !quoted {
        // Raw mode still re-appends the direction below, so use the
        // direction-stripped base for ORDER terms
        match (&term.function, &term.column) {
            (Some(func), _) => format!("{}({})", func.name, func.arguments.join(", ")),
            (None, Some(name)) => match &term.table {
                Some(t) => format!("{}.{}", t, name),
                None => name.clone(),
            },
            (None, None) => term.raw.clone(),
        }
    } else {
        match (&term.function, &term.column) {
            (Some(func), _) => format!(
                "{}({})",
                func.name.to_ascii_uppercase(),
                func.arguments
                    .iter()
                    .map(|a| quote_ident(a))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            (None, Some(name)) => quote_ref(term.table.as_deref(), name),
            (None, None) => term.raw.clone(),
        }
    };
    if !with_direction {
        return base;
    }
    match term.sorting {
        Sorting::Ascending => format!("{} ASC", base),
        Sorting::Descending => format!("{} DESC", base),
        Sorting::None => base,
    }
}

fn render_predicate(predicate: &PredicateCriterion, quoted: bool) -> String {
    if !quoted {
        return predicate.raw.clone();
    }

    let subject = match &predicate.function {
        Some(func) => format!(
            "{}({})",
            func.name.to_ascii_uppercase(),
            quote_ref(predicate.table.as_deref(), &predicate.column)
        ),
        None => quote_ref(predicate.table.as_deref(), &predicate.column),
    };

    let not = match predicate.aggregation.assert {
        Assertion::Negation => "NOT ",
        Assertion::Affirmation => "",
    };

    match predicate.aggregation.kind {
        AggregationKind::In => format!(
            "{} {}IN ({})",
            subject,
            not,
            predicate.arguments.all().join(", ")
        ),
        AggregationKind::Between => format!(
            "{} {}BETWEEN ({})",
            subject,
            not,
            predicate.arguments.all().join(", ")
        ),
        AggregationKind::Like => format!(
            "{} {}LIKE '{}'",
            subject,
            not,
            predicate.arguments.default.as_deref().unwrap_or("")
        ),
        AggregationKind::None => {
            let signal = predicate.signal.map(|s| s.as_str()).unwrap_or("=");
            format!(
                "{} {} {}",
                subject,
                signal,
                predicate.arguments.all().join(", ")
            )
        }
    }
}

fn render_conditions(conditions: &[PredicateCriterion], quoted: bool) -> String {
    let mut out = String::new();
    for (i, predicate) in conditions.iter().enumerate() {
        if i > 0 {
            out.push_str(match predicate.condition {
                Condition::Disjunction => " OR ",
                // A non-opening predicate without an explicit tag joins
                // conjunctively
                Condition::Conjunction | Condition::None => " AND ",
            });
        }
        out.push_str(&render_predicate(predicate, quoted));
    }
    out
}

fn render_into(query: &QueryObject, quoted: bool) -> String {
    let mut parts: Vec<String> = Vec::new();

    let mut select_part = String::from("SELECT");
    if let Some(select) = query.select() {
        if select.kind == SelectKind::Distinct {
            select_part.push_str(" DISTINCT");
        }
        if !select.columns.is_empty() {
            let cols: Vec<String> = select
                .columns
                .iter()
                .map(|c| render_column(c, quoted))
                .collect();
            select_part.push(' ');
            select_part.push_str(&cols.join(", "));
        }
    }
    parts.push(select_part);

    if let Some(from) = query.from() {
        let tables: Vec<String> = from
            .iter()
            .map(|t| {
                if !quoted {
                    t.raw.clone()
                } else {
                    match &t.alias {
                        Some(alias) => format!("{} AS {}", quote_ident(&t.name), quote_ident(alias)),
                        None => quote_ident(&t.name),
                    }
                }
            })
            .collect();
        parts.push(format!("FROM {}", tables.join(", ")));
    }

    if let Some(joins) = query.join() {
        for join in joins {
            let table = if !quoted {
                join.table.raw.clone()
            } else {
                match &join.table.alias {
                    Some(alias) => format!(
                        "{} AS {}",
                        quote_ident(&join.table.name),
                        quote_ident(alias)
                    ),
                    None => quote_ident(&join.table.name),
                }
            };
            match &join.on {
                Some(on) => {
                    let on_text = if !quoted {
                        on.raw.clone()
                    } else {
                        let host = render_ref(&on.host);
                        let consumer = render_ref(&on.consumer);
                        format!("{} {} {}", host, on.signal.as_str(), consumer)
                    };
                    parts.push(format!("JOIN {} ON {}", table, on_text));
                }
                None => parts.push(format!("JOIN {}", table)),
            }
        }
    }

    if let Some(conditions) = query.where_() {
        if !conditions.is_empty() {
            parts.push(format!("WHERE {}", render_conditions(conditions, quoted)));
        }
    }

    if let Some(group) = query.group() {
        if !group.is_empty() {
            let terms: Vec<String> = group
                .iter()
                .map(|t| render_sort(t, quoted, false))
                .collect();
            parts.push(format!("GROUP BY {}", terms.join(", ")));
        }
    }

    if let Some(conditions) = query.having() {
        if !conditions.is_empty() {
            parts.push(format!("HAVING {}", render_conditions(conditions, quoted)));
        }
    }

    if let Some(order) = query.order() {
        if !order.is_empty() {
            let terms: Vec<String> = order
                .iter()
                .map(|t| render_sort(t, quoted, true))
                .collect();
            parts.push(format!("ORDER BY {}", terms.join(", ")));
        }
    }

    if let Some(limit) = query.limit() {
        match limit.offset {
            Some(offset) => parts.push(format!("LIMIT {}, {}", offset, limit.limit)),
            None => parts.push(format!("LIMIT {}", limit.limit)),
        }
    }

    parts.join(" ")
}

fn render_ref(column: &ColumnRef) -> String {
    quote_ref(column.table.as_deref(), &column.column)
}

/// Serialize with identifiers re-quoted for the target grammar.
pub fn build(query: &QueryObject) -> String {
    render_into(query, true)
}

/// Serialize reconstructing the clause text as supplied.
pub fn build_raw(query: &QueryObject) -> String {
    render_into(query, false)
}

/// Convert one argument token to a bound value: numbers stay numeric,
/// quoted text is stripped, `true`/`false`/`NULL` map to their JSON
/// counterparts, anything else passes through as a string.
pub(crate) fn literal_value(token: &str) -> Value {
    let token = token.trim();
    if let Ok(n) = token.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::from(f);
    }
    if token.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if token.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    Value::String(crate::criteria::trim_quotes(token).to_string())
}

/// Ordered bound-parameter values from WHERE then HAVING arguments, for
/// placeholder-style execution.
pub fn values(query: &QueryObject) -> Vec<Value> {
    let mut out = Vec::new();
    let slots = [query.where_(), query.having()];
    for conditions in slots.into_iter().flatten() {
        for predicate in conditions {
            for token in predicate.arguments.all() {
                out.push(literal_value(token));
            }
        }
    }
    out
}
