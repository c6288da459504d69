//! Block tree produced by the parser.
//!
//! The tree is built once per template and is immutable afterwards; every
//! node exclusively owns its children.

use super::placeholder::Bind;

/// Wrapper directive kind: `{{where}}` or `{{set}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Where,
    Set,
}

impl ClauseKind {
    /// The directive keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Where => "where",
            Self::Set => "set",
        }
    }

    /// The SQL prefix written before a non-empty body.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Where => "WHERE ",
            Self::Set => "SET ",
        }
    }
}

/// Kind of an open block, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Clause(ClauseKind),
    For,
    If,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Clause(kind) => kind.keyword(),
            Self::For => "for",
            Self::If => "if",
        }
    }
}

/// A literal SQL span with placeholders rewritten to `?` markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    /// SQL text; escaped sigils (`\@`) are still escaped here.
    pub sql: String,
    /// Bind expressions, one per marker, in source order.
    pub binds: Vec<Bind>,
    /// Source line the span came from.
    pub line: usize,
}

/// One `if` / `else if` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub condition: String,
    pub body: Vec<Node>,
}

/// A node in the block tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal SQL.
    Text(Text),
    /// `{{where}}` / `{{set}}` wrapper. The body may be empty.
    Clause { kind: ClauseKind, body: Vec<Node> },
    /// `{{for header}}`; the header is reproduced, never evaluated.
    For { header: String, body: Vec<Node> },
    /// `{{if}}` chain. `branches` is never empty.
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Node>>,
    },
}

impl Node {
    /// Visits this node's bind expressions in source order.
    fn collect_binds<'a>(&'a self, out: &mut Vec<&'a Bind>) {
        match self {
            Node::Text(text) => out.extend(text.binds.iter()),
            Node::Clause { body, .. } | Node::For { body, .. } => {
                body.iter().for_each(|n| n.collect_binds(out));
            }
            Node::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    branch.body.iter().for_each(|n| n.collect_binds(out));
                }
                if let Some(body) = else_body {
                    body.iter().for_each(|n| n.collect_binds(out));
                }
            }
        }
    }

    /// Returns true if this node is, or contains, a `for` loop.
    pub fn has_loop(&self) -> bool {
        match self {
            Node::Text(_) => false,
            Node::For { .. } => true,
            Node::Clause { body, .. } => body.iter().any(Node::has_loop),
            Node::If {
                branches,
                else_body,
            } => {
                branches.iter().any(|b| b.body.iter().any(Node::has_loop))
                    || else_body
                        .as_ref()
                        .is_some_and(|body| body.iter().any(Node::has_loop))
            }
        }
    }
}

/// A parsed template: the ordered root nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub nodes: Vec<Node>,
}

impl Program {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// All bind expressions in depth-first, left-to-right source order.
    pub fn binds(&self) -> Vec<&Bind> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.collect_binds(&mut out);
        }
        out
    }

    pub fn has_loop(&self) -> bool {
        self.nodes.iter().any(Node::has_loop)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
