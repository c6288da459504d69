//! Run-time helpers shared by generated Rust code and the renderer.
//!
//! Generated code refers to these through the configured runtime path
//! (`::sqltmpl::runtime::append_clause`), so their signatures are part of
//! the public surface.

use std::sync::LazyLock;

use regex::Regex;

use crate::compiler::ast::ClauseKind;

/// Leading or trailing `AND`/`OR` of a `where` body, case-insensitive.
///
/// The Go back end embeds the same pattern in generated code; it only uses
/// syntax that RE2 and the `regex` crate agree on.
pub const CONJUNCTION_PATTERN: &str = r"(?i)^\s*(?:and|or)(?:\s+|$)|\s+(?:and|or)\s*$";

static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONJUNCTION_PATTERN).expect("conjunction pattern is valid"));

/// Trims a clause body. Returns `None` when nothing is left to emit.
pub fn finish_clause(kind: ClauseKind, body: &str) -> Option<String> {
    let body = body.trim();
    let text = match kind {
        ClauseKind::Where => CONJUNCTION.replace_all(body, "").trim().to_string(),
        ClauseKind::Set => body.strip_suffix(',').unwrap_or(body).trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Splices a finished clause into the enclosing buffer and parameter list.
///
/// Writes nothing, and drops `params`, when the body trims to empty.
/// Returns whether the clause was written.
pub fn append_clause<P>(
    kind: ClauseKind,
    body: &str,
    params: Vec<P>,
    sql: &mut String,
    out: &mut Vec<P>,
) -> bool {
    let Some(text) = finish_clause(kind, body) else {
        return false;
    };
    if sql.ends_with(|c: char| !c.is_whitespace()) {
        sql.push(' ');
    }
    sql.push_str(kind.prefix());
    sql.push_str(&text);
    out.extend(params);
    true
}
