//! Error types for code generation.
//!
//! Only the Rust back end can fail: it has to turn expression text into
//! tokens, so text that is not a valid Rust expression is reported here.

use thiserror::Error;

/// Result type for code generation.
pub type GenResult<T> = Result<T, GenError>;

/// The kind of codegen error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenErrorKind {
    /// An `if` / `else if` condition is not a valid expression.
    InvalidCondition,
    /// A `for` header is not of the form `<pat> in <expr>`.
    InvalidLoopHeader,
    /// A placeholder expression is not a valid expression.
    InvalidBindExpression,
    /// The configured runtime path is not a valid path.
    InvalidRuntimePath,
    /// Block instructions are not balanced (internal bug).
    UnbalancedProgram,
}

impl GenErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidCondition => "invalid condition expression",
            Self::InvalidLoopHeader => "invalid loop header",
            Self::InvalidBindExpression => "invalid placeholder expression",
            Self::InvalidRuntimePath => "invalid runtime path",
            Self::UnbalancedProgram => "unbalanced block instructions (this is a bug)",
        }
    }

    /// Returns a suggested fix for this error kind.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidCondition => Some("write the condition as a Rust boolean expression"),
            Self::InvalidLoopHeader => Some("write the header as `item in items`"),
            Self::InvalidBindExpression => Some("use a path such as @user.name"),
            Self::InvalidRuntimePath => Some("use a path such as ::sqltmpl"),
            Self::UnbalancedProgram => None,
        }
    }
}

/// A codegen error with context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.to_message())]
pub struct GenError {
    pub kind: GenErrorKind,
    /// The offending expression text.
    pub found: Option<String>,
    /// Detail from the expression parser.
    pub detail: Option<String>,
}

impl GenError {
    pub fn new(kind: GenErrorKind) -> Self {
        Self {
            kind,
            found: None,
            detail: None,
        }
    }

    pub(crate) fn from_syn(kind: GenErrorKind, found: &str, err: &syn::Error) -> Self {
        Self {
            kind,
            found: Some(found.to_string()),
            detail: Some(err.to_string()),
        }
    }

    /// Converts the error to a user-friendly message.
    pub fn to_message(&self) -> String {
        let mut msg = self.kind.description().to_string();
        if let Some(found) = &self.found {
            msg.push_str(&format!(" `{found}`"));
        }
        if let Some(detail) = &self.detail {
            msg.push_str(&format!(": {detail}"));
        }
        if let Some(help) = self.kind.suggestion() {
            msg.push_str(&format!(" (help: {help})"));
        }
        msg
    }
}
