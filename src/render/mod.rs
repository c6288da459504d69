//! In-process execution of a compiled template.
//!
//! The renderer walks the instruction program with a program counter. A
//! jump table computed up front links every conditional arm to the next arm
//! and to the end of its chain, and every loop head to its tail. Host
//! expressions are evaluated through the [`Scope`] trait.

mod bindings;

pub use bindings::Bindings;

use thiserror::Error;
use tracing::trace;

use crate::compiler::ir::{Ir, Op};
use crate::compiler::placeholder::Bind;
use crate::runtime::append_clause;
use crate::value::Value;

/// Evaluates host expressions for the renderer.
pub trait Scope {
    /// Evaluates an `if` / `else if` condition.
    fn condition(&mut self, expr: &str) -> Result<bool, RenderError>;

    /// Starts a loop and returns its iteration count.
    fn enter_loop(&mut self, header: &str) -> Result<usize, RenderError>;

    /// Binds the loop variables for iteration `index`.
    fn iteration(&mut self, header: &str, index: usize) -> Result<(), RenderError>;

    fn exit_loop(&mut self, header: &str);

    /// Evaluates a placeholder expression.
    fn value(&mut self, expr: &str) -> Result<Value, RenderError>;
}

/// Errors raised while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("`{0}` is not a list")]
    NotIterable(String),
    #[error("unsupported loop header `{0}`")]
    UnsupportedLoopHeader(String),
    #[error("unsupported condition `{0}` (register it with `Bindings::when`)")]
    UnsupportedCondition(String),
    #[error("malformed instruction program at op {0}")]
    MalformedProgram(usize),
}

/// SQL text with its positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Jump targets, indexed by op position.
///
/// For `BeginIf`/`ElseIf`/`Else`, `next` is the following arm (or the
/// `EndIf`) and `end` is the chain's `EndIf`. `BeginLoop` and `EndLoop`
/// point at each other through `next`.
struct Jumps {
    next: Vec<usize>,
    end: Vec<usize>,
}

enum Open {
    If(Vec<usize>),
    Loop(usize),
    Clause,
}

impl Jumps {
    fn build(ops: &[Op]) -> Result<Self, RenderError> {
        let mut next = vec![0; ops.len()];
        let mut end = vec![0; ops.len()];
        let mut stack: Vec<Open> = Vec::new();

        for (pc, op) in ops.iter().enumerate() {
            match op {
                Op::BeginIf(_) => stack.push(Open::If(vec![pc])),
                Op::ElseIf(_) | Op::Else => match stack.last_mut() {
                    Some(Open::If(arms)) => {
                        if let Some(&prev) = arms.last() {
                            next[prev] = pc;
                        }
                        arms.push(pc);
                    }
                    _ => return Err(RenderError::MalformedProgram(pc)),
                },
                Op::EndIf => match stack.pop() {
                    Some(Open::If(arms)) => {
                        if let Some(&last) = arms.last() {
                            next[last] = pc;
                        }
                        for arm in arms {
                            end[arm] = pc;
                        }
                    }
                    _ => return Err(RenderError::MalformedProgram(pc)),
                },
                Op::BeginLoop(_) => stack.push(Open::Loop(pc)),
                Op::EndLoop => match stack.pop() {
                    Some(Open::Loop(head)) => {
                        next[head] = pc;
                        next[pc] = head;
                    }
                    _ => return Err(RenderError::MalformedProgram(pc)),
                },
                Op::BeginClause(_) => stack.push(Open::Clause),
                Op::EndClause(_) => match stack.pop() {
                    Some(Open::Clause) => {}
                    _ => return Err(RenderError::MalformedProgram(pc)),
                },
                Op::Literal(_) | Op::Bind(_) => {}
            }
        }

        if stack.is_empty() {
            Ok(Self { next, end })
        } else {
            Err(RenderError::MalformedProgram(ops.len()))
        }
    }
}

struct LoopState {
    index: usize,
    count: usize,
}

/// Executes `ir` against `scope`.
pub fn render(ir: &Ir, scope: &mut impl Scope) -> Result<RenderedSql, RenderError> {
    let ops = ir.ops();
    let jumps = Jumps::build(ops)?;

    let mut buffers = vec![RenderedSql {
        sql: String::new(),
        params: Vec::with_capacity(ir.param_capacity()),
    }];
    let mut loops: Vec<LoopState> = Vec::new();
    let mut pc = 0;

    while let Some(op) = ops.get(pc) {
        let current = buffers
            .last_mut()
            .ok_or(RenderError::MalformedProgram(pc))?;
        match op {
            Op::Literal(sql) => current.sql.push_str(sql),
            Op::Bind(binds) => {
                for bind in binds {
                    let value = match bind {
                        Bind::Table => Value::Table,
                        Bind::Raw(expr) => scope.value(expr)?.into_raw(),
                        Bind::Value(expr) => scope.value(expr)?,
                    };
                    current.params.push(value);
                }
            }
            Op::BeginIf(_) => {
                pc = select_arm(ops, &jumps, pc, scope)?;
                continue;
            }
            // Reached by falling off the end of a taken arm.
            Op::ElseIf(_) | Op::Else => {
                pc = jumps.end[pc] + 1;
                continue;
            }
            Op::EndIf => {}
            Op::BeginLoop(header) => {
                let count = scope.enter_loop(header)?;
                trace!(header = %header, count, "loop");
                if count == 0 {
                    scope.exit_loop(header);
                    pc = jumps.next[pc] + 1;
                    continue;
                }
                scope.iteration(header, 0)?;
                loops.push(LoopState { index: 0, count });
            }
            Op::EndLoop => {
                let head = jumps.next[pc];
                let Some(Op::BeginLoop(header)) = ops.get(head) else {
                    return Err(RenderError::MalformedProgram(pc));
                };
                let state = loops
                    .last_mut()
                    .ok_or(RenderError::MalformedProgram(pc))?;
                state.index += 1;
                if state.index < state.count {
                    scope.iteration(header, state.index)?;
                    pc = head + 1;
                    continue;
                }
                loops.pop();
                scope.exit_loop(header);
            }
            Op::BeginClause(_) => buffers.push(RenderedSql::default()),
            Op::EndClause(kind) => {
                let body = buffers.pop().ok_or(RenderError::MalformedProgram(pc))?;
                let parent = buffers
                    .last_mut()
                    .ok_or(RenderError::MalformedProgram(pc))?;
                append_clause(
                    *kind,
                    &body.sql,
                    body.params,
                    &mut parent.sql,
                    &mut parent.params,
                );
            }
        }
        pc += 1;
    }

    match (buffers.pop(), buffers.is_empty()) {
        (Some(out), true) => Ok(out),
        _ => Err(RenderError::MalformedProgram(pc)),
    }
}

/// Evaluates the arms of the chain starting at `pc` and returns the first
/// op of the taken arm, or the op after `EndIf` when none is taken.
fn select_arm(
    ops: &[Op],
    jumps: &Jumps,
    mut pc: usize,
    scope: &mut impl Scope,
) -> Result<usize, RenderError> {
    loop {
        match ops.get(pc) {
            Some(Op::BeginIf(cond) | Op::ElseIf(cond)) => {
                if scope.condition(cond)? {
                    return Ok(pc + 1);
                }
                pc = jumps.next[pc];
            }
            Some(Op::Else | Op::EndIf) => return Ok(pc + 1),
            _ => return Err(RenderError::MalformedProgram(pc)),
        }
    }
}
