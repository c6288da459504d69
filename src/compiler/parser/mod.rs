//! Block parser for the template language.
//!
//! Consumes the lexer's token stream and builds the block tree with an
//! explicit stack of open frames. Frames are addressed by index, and a
//! finished block is moved into its parent when its `{{end}}` is seen.

#[cfg(test)]
mod tests;

use tracing::trace;

use super::ast::{BlockKind, Branch, ClauseKind, Node, Program, Text};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::lexer::{Lexer, Token, TokenKind};
use super::placeholder;

/// A block under construction.
#[derive(Debug)]
enum Open {
    Clause {
        kind: ClauseKind,
        body: Vec<Node>,
    },
    For {
        header: String,
        body: Vec<Node>,
    },
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Node>>,
    },
}

impl Open {
    fn kind(&self) -> BlockKind {
        match self {
            Open::Clause { kind, .. } => BlockKind::Clause(*kind),
            Open::For { .. } => BlockKind::For,
            Open::If { .. } => BlockKind::If,
        }
    }

    /// The body currently receiving content.
    fn active_body(&mut self) -> &mut Vec<Node> {
        match self {
            Open::Clause { body, .. } | Open::For { body, .. } => body,
            Open::If {
                else_body: Some(body),
                ..
            } => body,
            Open::If { branches, .. } => {
                let last = branches.len() - 1;
                &mut branches[last].body
            }
        }
    }

    fn finish(self) -> Node {
        match self {
            Open::Clause { kind, body } => Node::Clause { kind, body },
            Open::For { header, body } => Node::For { header, body },
            Open::If {
                branches,
                else_body,
            } => Node::If {
                branches,
                else_body,
            },
        }
    }
}

/// An open block plus where it was opened.
#[derive(Debug)]
struct Frame {
    open: Open,
    line: usize,
    column: usize,
}

/// A parsed directive.
#[derive(Debug, PartialEq, Eq)]
enum Directive<'a> {
    Clause(ClauseKind),
    For(&'a str),
    If(&'a str),
    ElseIf(&'a str),
    Else,
    End,
}

impl<'a> Directive<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        match text {
            "where" => return Some(Self::Clause(ClauseKind::Where)),
            "set" => return Some(Self::Clause(ClauseKind::Set)),
            "else" => return Some(Self::Else),
            "end" => return Some(Self::End),
            _ => {}
        }

        if let Some(header) = keyword_arg(text, "for") {
            return Some(Self::For(header));
        }
        if let Some(cond) = keyword_arg(text, "if") {
            return Some(Self::If(cond));
        }
        let rest = keyword_rest(text, "else")?;
        keyword_arg(rest, "if").map(Self::ElseIf)
    }
}

/// Returns the text after `keyword` when it is followed by whitespace.
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

/// Like [`keyword_rest`], but the argument must be non-empty.
fn keyword_arg<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    keyword_rest(text, keyword)
        .map(str::trim_end)
        .filter(|arg| !arg.is_empty())
}

/// The parser for template input.
pub struct Parser<'a> {
    source: &'a str,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Parses the template into a [`Program`].
    pub fn parse(mut self) -> Result<Program, SyntaxError> {
        let tokens = Lexer::new(self.source).tokenize()?;

        for token in &tokens {
            match token.kind {
                TokenKind::Literal => self.push_text(token),
                TokenKind::Directive => self.handle_directive(token)?,
            }
        }

        if let Some(frame) = self.stack.first() {
            let block = frame.open.kind();
            return Err(
                SyntaxError::new(SyntaxErrorKind::UnclosedBlock, frame.line, frame.column)
                    .with_block(block),
            );
        }

        Ok(Program::new(self.root))
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    fn active_body(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => frame.open.active_body(),
            None => &mut self.root,
        }
    }

    /// Appends a literal to the active body, merging it into a preceding
    /// text node.
    ///
    /// Whitespace between directives is kept: it may be the only separator
    /// between two fragments. A line break, plus the next line's
    /// indentation, becomes one space unless the body already ends in
    /// whitespace.
    fn push_text(&mut self, token: &Token) {
        let body = self.active_body();
        let trailing_space = matches!(
            body.last(),
            Some(Node::Text(prev)) if prev.sql.ends_with(char::is_whitespace)
        );

        let text = if token.line_start {
            let rest = token.text.trim_start();
            match (trailing_space, rest.is_empty()) {
                (true, true) => return,
                (true, false) => rest.to_string(),
                (false, _) => format!(" {rest}"),
            }
        } else if token.text.is_empty() {
            return;
        } else {
            token.text.clone()
        };

        let extracted = placeholder::extract(&text);
        if let Some(Node::Text(prev)) = body.last_mut() {
            prev.sql.push_str(&extracted.sql);
            prev.binds.extend(extracted.binds);
            return;
        }
        body.push(Node::Text(Text {
            sql: extracted.sql,
            binds: extracted.binds,
            line: token.line,
        }));
    }

    fn push_frame(&mut self, open: Open, token: &Token) {
        self.stack.push(Frame {
            open,
            line: token.line,
            column: token.column,
        });
    }

    // =========================================================================
    // Directives
    // =========================================================================

    fn handle_directive(&mut self, token: &Token) -> Result<(), SyntaxError> {
        trace!(line = token.line, directive = %token.text, "directive");

        let Some(directive) = Directive::parse(&token.text) else {
            return Err(Self::error(SyntaxErrorKind::UnknownDirective, token));
        };

        match directive {
            Directive::Clause(kind) => {
                self.push_frame(
                    Open::Clause {
                        kind,
                        body: Vec::new(),
                    },
                    token,
                );
            }
            Directive::For(header) => {
                self.push_frame(
                    Open::For {
                        header: header.to_string(),
                        body: Vec::new(),
                    },
                    token,
                );
            }
            Directive::If(condition) => {
                self.push_frame(
                    Open::If {
                        branches: vec![Branch {
                            condition: condition.to_string(),
                            body: Vec::new(),
                        }],
                        else_body: None,
                    },
                    token,
                );
            }
            Directive::ElseIf(condition) => self.handle_else_if(condition, token)?,
            Directive::Else => self.handle_else(token)?,
            Directive::End => self.handle_end(token)?,
        }

        Ok(())
    }

    fn handle_else_if(&mut self, condition: &str, token: &Token) -> Result<(), SyntaxError> {
        match self.stack.last_mut().map(|f| &mut f.open) {
            Some(Open::If {
                else_body: Some(_), ..
            }) => Err(Self::error(SyntaxErrorKind::ElseIfAfterElse, token)),
            Some(Open::If { branches, .. }) => {
                branches.push(Branch {
                    condition: condition.to_string(),
                    body: Vec::new(),
                });
                Ok(())
            }
            _ => Err(Self::error(SyntaxErrorKind::ElseIfWithoutIf, token)),
        }
    }

    fn handle_else(&mut self, token: &Token) -> Result<(), SyntaxError> {
        match self.stack.last_mut().map(|f| &mut f.open) {
            Some(Open::If {
                else_body: Some(_), ..
            }) => Err(Self::error(SyntaxErrorKind::DuplicateElse, token)),
            Some(Open::If { else_body, .. }) => {
                *else_body = Some(Vec::new());
                Ok(())
            }
            _ => Err(Self::error(SyntaxErrorKind::ElseWithoutIf, token)),
        }
    }

    fn handle_end(&mut self, token: &Token) -> Result<(), SyntaxError> {
        let Some(frame) = self.stack.pop() else {
            return Err(Self::error(SyntaxErrorKind::UnmatchedEnd, token));
        };
        let node = frame.open.finish();
        self.active_body().push(node);
        Ok(())
    }

    fn error(kind: SyntaxErrorKind, token: &Token) -> SyntaxError {
        SyntaxError::new(kind, token.line, token.column).with_found(&token.text)
    }
}
