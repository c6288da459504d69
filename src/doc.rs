//! Template extraction from interface method doc comments.
//!
//! A method documents its SQL either as a raw statement:
//!
//! ```text
//! // GetByID query data by id and return it as *struct*
//! //
//! // SELECT * FROM @@table WHERE id=@id
//! ```
//!
//! or as a chainable fragment, `where("...")` or `select("...")`.

use thiserror::Error;

use crate::compiler::codegen::go::MethodShape;

/// The template found in a method comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSql {
    /// A complete statement, run by a finishing method.
    Raw(String),
    /// A `where("...")` condition fragment.
    Where(String),
    /// A `select("...")` column fragment.
    Select(String),
    /// No template.
    Empty,
}

impl DocSql {
    /// The template text, if any.
    pub fn template(&self) -> Option<&str> {
        match self {
            DocSql::Raw(sql) | DocSql::Where(sql) | DocSql::Select(sql) => Some(sql),
            DocSql::Empty => None,
        }
    }

    /// Picks the method shape from the declared result types.
    ///
    /// Finishing methods must return `error` last, optionally preceded by
    /// one data type. Chainable fragments accept any result list.
    pub fn shape(&self, results: &[&str]) -> Result<MethodShape, SignatureError> {
        match self {
            DocSql::Where(_) => return Ok(MethodShape::Where),
            DocSql::Select(_) => return Ok(MethodShape::Select),
            DocSql::Raw(_) | DocSql::Empty => {}
        }

        let returns_error = results
            .last()
            .is_some_and(|ty| ty.trim().eq_ignore_ascii_case("error"));
        match results {
            [] => Err(SignatureError::MissingResult),
            [_] if returns_error => Ok(MethodShape::Exec),
            [_] => Err(SignatureError::SingleResultNotError),
            [data, _] if returns_error => Ok(MethodShape::Scan {
                result_type: data.trim().to_string(),
            }),
            [_, _] => Err(SignatureError::SecondResultNotError),
            _ => Err(SignatureError::TooManyResults(results.len())),
        }
    }
}

/// A method signature that cannot carry its template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("finish method must return at least one value (last return value must be error)")]
    MissingResult,
    #[error("maximum number of return values allowed is 2 (first as data, second as error), found {0}")]
    TooManyResults(usize),
    #[error("when only one return value is defined, its type must be error")]
    SingleResultNotError,
    #[error("when two return values are defined, the second must be error")]
    SecondResultNotError,
}

/// Extracts the template for `method` from its doc comment.
///
/// When the comment has a blank-line separated second paragraph, the first
/// paragraph is kept if the second mentions the method name, otherwise the
/// second. A leading method name is stripped.
pub fn extract_sql(comment: &str, method: &str) -> DocSql {
    let mut comment = comment.trim();

    if let Some((head, tail)) = comment.split_once("\n\n") {
        comment = if tail.contains(method) { head } else { tail };
    }

    let sql = comment.strip_prefix(method).unwrap_or(comment).trim();

    if let Some(inner) = fragment(sql, "where(") {
        return DocSql::Where(inner);
    }
    if let Some(inner) = fragment(sql, "select(") {
        return DocSql::Select(inner);
    }
    if sql.is_empty() {
        DocSql::Empty
    } else {
        DocSql::Raw(sql.to_string())
    }
}

/// Unwraps `name("...")` into its unquoted, trimmed body.
fn fragment(sql: &str, open: &str) -> Option<String> {
    let inner = sql.strip_prefix(open)?.strip_suffix(')')?;
    Some(inner.trim_matches('"').trim().to_string())
}
