//! Anchored regex grammars, one per clause kind.
//!
//! All grammars are case-insensitive and anchored at the start of the
//! (trimmed) fragment. Predicate grammars deliberately do not anchor the
//! end: the first-token argument capture may truncate at a space, and the
//! LIKE recovery pattern re-extracts the full pattern afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const SIGNAL: &str = r"<=|>=|<>|!=|=|<|>";

/// `func(args) [AS alias]`
pub static SELECT_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<func>{IDENT})\s*\(\s*(?P<args>[^)]*?)\s*\)(?:\s+AS\s+(?P<alias>{IDENT}))?\s*$"
    ))
    .unwrap()
});

/// `[table.]column [AS alias]`, `*` allowed as column
pub static SELECT_METADATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:(?P<table>{IDENT})\.)?(?P<column>\*|{IDENT})(?:\s+AS\s+(?P<alias>{IDENT}))?\s*$"
    ))
    .unwrap()
});

/// `table [AS alias]`
pub static FROM_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<table>{IDENT})(?:\s+AS\s+(?P<alias>{IDENT}))?\s*$"
    ))
    .unwrap()
});

/// `[host_table.]host_column <signal> [consumer_table.]consumer_column`
pub static ON_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:(?P<host_table>{IDENT})\.)?(?P<host_column>{IDENT})\s*(?P<signal>{SIGNAL})\s*(?:(?P<consumer_table>{IDENT})\.)?(?P<consumer_column>{IDENT})\s*$"
    ))
    .unwrap()
});

/// Operator half shared by the predicate grammars: an aggregation keyword
/// (optionally negated) or a comparison signal, then the argument capture.
/// `unlimited` takes a parenthesized list; `default` takes the first
/// non-space token and `extra` an optional token after a comma.
const PREDICATE_TAIL: &str = r"\s*(?P<operator>(?:NOT\s+)?(?:IN|BETWEEN|LIKE)\b|<=|>=|<>|!=|=|<|>)\s*(?:\(\s*(?P<unlimited>[^)]*?)\s*\)|(?P<default>[^,\s]+)(?:\s*,\s*(?P<extra>\S+))?)";

/// Plain predicate: `[alias.]column <operator> args`
pub static PREDICATE_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:(?P<table>{IDENT})\.)?(?P<column>{IDENT}){PREDICATE_TAIL}"
    ))
    .unwrap()
});

/// Function predicate: `func([alias.]column) <operator> args`
pub static PREDICATE_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<function_name>{IDENT})\s*\(\s*(?:(?P<table>{IDENT})\.)?(?P<column>\*|{IDENT})\s*\){PREDICATE_TAIL}"
    ))
    .unwrap()
});

/// Secondary LIKE extraction: the anchored grammar truncates the argument at
/// the first space, so the full pattern is recovered from the raw fragment.
pub static LIKE_RECOVERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+LIKE\s+(?P<pattern>.+)$").unwrap());

/// Trailing `ASC` / `DESC` on an ORDER term.
pub static ORDER_DIRECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?P<direction>ASC|DESC)\s*$").unwrap());

/// `count[, offset]`
pub static LIMIT_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<first>\d+)\s*(?:,\s*(?P<second>\d+))?\s*$").unwrap()
});
