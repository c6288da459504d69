//! Flat instruction program produced from the block tree.
//!
//! The IR records what the compiled template does at run time, independent of
//! how a back end prints it. Block instructions always come in balanced
//! pairs (`BeginIf` .. `ElseIf`* .. `Else`? .. `EndIf`, `BeginLoop` ..
//! `EndLoop`, `BeginClause` .. `EndClause`); the only way to build an [`Ir`]
//! is [`lower`](super::lower::lower), which guarantees it.

use super::ast::ClauseKind;
use super::placeholder::Bind;

/// One instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Append SQL text (escapes already resolved) to the current buffer.
    Literal(String),
    /// Append parameters to the current parameter list.
    Bind(Vec<Bind>),
    /// Open a conditional; the condition is host-expression text.
    BeginIf(String),
    ElseIf(String),
    Else,
    EndIf,
    /// Open a loop; the header is host-expression text.
    BeginLoop(String),
    EndLoop,
    /// Open a scoped sub-buffer for a `where`/`set` body.
    BeginClause(ClauseKind),
    /// Trim the sub-buffer and splice it into the enclosing one.
    EndClause(ClauseKind),
}

/// A lowered template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ir {
    pub(crate) ops: Vec<Op>,
    pub(crate) param_capacity: usize,
}

impl Ir {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Static estimate of the parameter count, used as a capacity hint.
    pub fn param_capacity(&self) -> usize {
        self.param_capacity
    }

    /// All binds in instruction order.
    pub fn binds(&self) -> impl Iterator<Item = &Bind> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Bind(binds) => Some(binds),
                _ => None,
            })
            .flatten()
    }

    pub fn has_clause(&self, kind: ClauseKind) -> bool {
        self.ops.contains(&Op::BeginClause(kind))
    }
}
