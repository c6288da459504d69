//! Error types for template scanning and parsing.
//!
//! Every syntax error is fatal for the template being compiled and carries
//! the 1-based line (and column) of the offending construct.

use std::fmt;

use thiserror::Error;

use super::ast::BlockKind;

/// The kind of syntax error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// `{{` without a closing `}}` on the same line.
    UnterminatedDirective,
    /// A directive whose keyword is not recognized.
    UnknownDirective,
    /// `{{else}}` with no open `{{if}}`.
    ElseWithoutIf,
    /// `{{else if}}` with no open `{{if}}`.
    ElseIfWithoutIf,
    /// A second `{{else}}` in the same conditional.
    DuplicateElse,
    /// `{{else if}}` after the `{{else}}` of the same conditional.
    ElseIfAfterElse,
    /// `{{end}}` with no open block.
    UnmatchedEnd,
    /// End of template reached with blocks still open.
    UnclosedBlock,
}

impl SyntaxErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnterminatedDirective => "unterminated directive",
            Self::UnknownDirective => "unknown directive",
            Self::ElseWithoutIf => "`else` without an open `if` block",
            Self::ElseIfWithoutIf => "`else if` without an open `if` block",
            Self::DuplicateElse => "multiple `else` in the same `if` block",
            Self::ElseIfAfterElse => "`else if` after `else`",
            Self::UnmatchedEnd => "unmatched `end`",
            Self::UnclosedBlock => "unclosed block at end of template",
        }
    }

    /// Returns a suggested fix for this error kind.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnterminatedDirective => Some("close the directive with }} on the same line"),
            Self::UnknownDirective => Some(
                "use {{where}}, {{set}}, {{for <expr>}}, {{if <cond>}}, {{else if <cond>}}, {{else}} or {{end}}",
            ),
            Self::ElseWithoutIf | Self::ElseIfWithoutIf => {
                Some("open the conditional with {{if <cond>}} first")
            }
            Self::DuplicateElse => Some("merge the bodies into a single {{else}}"),
            Self::ElseIfAfterElse => Some("move the {{else if}} branch before {{else}}"),
            Self::UnmatchedEnd => Some("remove the extra {{end}}"),
            Self::UnclosedBlock => Some("add {{end}} to close the block"),
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A syntax error in a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {}", self.message())]
pub struct SyntaxError {
    /// The kind of error.
    pub kind: SyntaxErrorKind,
    /// 1-based line of the offending construct.
    pub line: usize,
    /// 1-based column of the offending construct.
    pub column: usize,
    /// The directive text involved, when there is one.
    pub found: Option<String>,
    /// The block left open, for [`SyntaxErrorKind::UnclosedBlock`].
    pub block: Option<BlockKind>,
}

impl SyntaxError {
    /// Creates a new syntax error at the given position.
    pub fn new(kind: SyntaxErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            found: None,
            block: None,
        }
    }

    /// Adds the offending directive text.
    pub fn with_found(mut self, found: &str) -> Self {
        self.found = Some(found.to_string());
        self
    }

    /// Records which block was left open.
    pub fn with_block(mut self, block: BlockKind) -> Self {
        self.block = Some(block);
        self
    }

    /// The user-facing message, without position.
    pub fn message(&self) -> String {
        match (self.kind, &self.found, self.block) {
            (SyntaxErrorKind::UnclosedBlock, _, Some(block)) => {
                format!("unclosed `{}` block at end of template", block.keyword())
            }
            (SyntaxErrorKind::UnknownDirective, Some(found), _) => {
                format!("unknown directive {{{{{found}}}}}")
            }
            (SyntaxErrorKind::UnterminatedDirective, _, _) => "missing }}".to_string(),
            _ => self.kind.description().to_string(),
        }
    }
}
