//! Placeholder extraction for literal SQL spans.
//!
//! Recognized forms, most specific first:
//!
//! - `\@` - escaped sigil, kept as-is (becomes a literal `@` on output)
//! - `@@table` - the current table
//! - `@@expr` - a raw SQL expression
//! - `@expr` - a plain bind value
//!
//! Every bind is replaced with the positional marker `?`, so the markers
//! produced here always match the binds one to one. A `?` already present
//! in the template text is passed through untouched and is not counted:
//! the driver will still treat it as a positional marker, so templates must
//! not contain one outside a placeholder (operators like the PostgreSQL
//! JSON `?` have to go through a `@@expr` raw bind instead).

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// The positional marker written in place of a bind.
pub const MARKER: &str = "?";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\\@|@@table\b|@@(?P<raw>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)|@(?P<value>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)",
    )
    .expect("placeholder pattern is valid")
});

/// A bind expression attached to one positional marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bind {
    /// The current table sentinel (`@@table`).
    Table,
    /// A raw SQL expression (`@@name`); the value is spliced as SQL, not quoted.
    Raw(String),
    /// A plain value (`@name`).
    Value(String),
}

impl Bind {
    /// The host expression text, if any.
    pub fn expr(&self) -> Option<&str> {
        match self {
            Bind::Table => None,
            Bind::Raw(expr) | Bind::Value(expr) => Some(expr),
        }
    }
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bind::Table => f.write_str("@@table"),
            Bind::Raw(expr) => write!(f, "@@{expr}"),
            Bind::Value(expr) => write!(f, "@{expr}"),
        }
    }
}

/// Result of extracting placeholders from one literal span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub sql: String,
    pub binds: Vec<Bind>,
}

/// Rewrites placeholders to markers and collects their binds in order.
///
/// Escaped sigils stay escaped in the output, so extracting an already
/// extracted string returns it unchanged with no binds.
pub fn extract(literal: &str) -> Extracted {
    let mut binds = Vec::new();
    let sql = PLACEHOLDER.replace_all(literal, |caps: &Captures<'_>| {
        let whole = &caps[0];
        if whole == r"\@" {
            return whole.to_string();
        }
        let bind = if let Some(raw) = caps.name("raw") {
            Bind::Raw(raw.as_str().to_string())
        } else if let Some(value) = caps.name("value") {
            Bind::Value(value.as_str().to_string())
        } else {
            Bind::Table
        };
        binds.push(bind);
        MARKER.to_string()
    });

    Extracted {
        sql: sql.into_owned(),
        binds,
    }
}

/// Turns escaped sigils into literal `@` for output.
pub fn unescape(sql: &str) -> String {
    sql.replace(r"\@", "@")
}
