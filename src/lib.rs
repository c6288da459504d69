//! Compiler for SQL query templates written in interface doc comments.
//!
//! A template is SQL text with placeholders and block directives:
//!
//! - `@@table` binds the current table, `@@expr` a raw SQL expression,
//!   `@expr` a plain value, and `\@` is a literal `@`
//! - `{{where}}` / `{{set}}` wrap a body that is trimmed and prefixed with
//!   `WHERE ` / `SET `, or dropped when it ends up empty
//! - `{{if cond}}`, `{{else if cond}}`, `{{else}}`, `{{for header}}` and
//!   `{{end}}` control which fragments are emitted
//!
//! Every placeholder becomes a positional `?` marker and a parameter, in
//! source order. A compiled [`Template`] can be printed as a Go method body
//! ([`Template::to_go`]), as a Rust block expression
//! ([`Template::to_rust`]), or executed directly ([`Template::render`]).
//!
//! ```
//! use sqltmpl::{Bindings, Template, Value};
//!
//! let template = Template::compile("SELECT * FROM @@table WHERE id=@id")?;
//! let rendered = template.render(&mut Bindings::new().with("id", 7))?;
//!
//! assert_eq!(rendered.sql, "SELECT * FROM ? WHERE id=?");
//! assert_eq!(rendered.params, vec![Value::Table, Value::Int(7)]);
//! # Ok::<(), sqltmpl::Error>(())
//! ```

pub mod compiler;
pub mod doc;
pub mod render;
pub mod runtime;
pub mod value;

use thiserror::Error;

pub use compiler::Template;
pub use compiler::ast::ClauseKind;
pub use compiler::codegen::go::{GoCode, MethodShape};
pub use compiler::codegen::{CodegenConfig, GenError, GenErrorKind};
pub use compiler::error::{SyntaxError, SyntaxErrorKind};
pub use compiler::placeholder::Bind;
pub use doc::{DocSql, SignatureError, extract_sql};
pub use render::{Bindings, RenderError, RenderedSql, Scope};
pub use value::Value;

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Gen(#[from] GenError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Compiles `source` with the default configuration.
pub fn compile(source: &str) -> Result<Template> {
    Ok(Template::compile(source)?)
}

/// Compiles `source` into the Go statements that build `sb` and `params`.
pub fn render_go(source: &str) -> Result<String> {
    Ok(compile(source)?.to_go().body)
}

/// Builds the Go method body for an interface method from its doc comment
/// and declared result types.
///
/// Returns `Ok(None)` when the comment holds no template.
pub fn go_method(comment: &str, method: &str, results: &[&str]) -> Result<Option<GoCode>> {
    let doc = extract_sql(comment, method);
    let Some(sql) = doc.template() else {
        return Ok(None);
    };
    let shape = doc.shape(results)?;
    Ok(Some(compile(sql)?.to_go_method(&shape)))
}
