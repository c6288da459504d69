//! Lowers the block tree into the flat instruction program.

use super::ast::{Node, Program};
use super::codegen::CodegenConfig;
use super::ir::{Ir, Op};
use super::placeholder::unescape;

/// Lowers `program` into an [`Ir`], estimating the parameter capacity.
///
/// A bind counts once outside loops and `loop_multiplier` times per
/// enclosing loop, since iteration counts are unknown until run time.
pub fn lower(program: &Program, config: &CodegenConfig) -> Ir {
    let mut lowering = Lowering {
        ops: Vec::new(),
        capacity: 0,
        multiplier: config.loop_multiplier.max(1),
    };
    lowering.nodes(&program.nodes, 1);

    Ir {
        ops: lowering.ops,
        param_capacity: lowering.capacity,
    }
}

struct Lowering {
    ops: Vec<Op>,
    capacity: usize,
    multiplier: usize,
}

impl Lowering {
    fn nodes(&mut self, nodes: &[Node], weight: usize) {
        for node in nodes {
            self.node(node, weight);
        }
    }

    fn node(&mut self, node: &Node, weight: usize) {
        match node {
            Node::Text(text) => {
                self.ops.push(Op::Literal(unescape(&text.sql)));
                if !text.binds.is_empty() {
                    self.capacity = self
                        .capacity
                        .saturating_add(text.binds.len().saturating_mul(weight));
                    self.ops.push(Op::Bind(text.binds.clone()));
                }
            }
            Node::For { header, body } => {
                self.ops.push(Op::BeginLoop(header.clone()));
                self.nodes(body, weight.saturating_mul(self.multiplier));
                self.ops.push(Op::EndLoop);
            }
            Node::If {
                branches,
                else_body,
            } => {
                for (idx, branch) in branches.iter().enumerate() {
                    let cond = branch.condition.clone();
                    self.ops
                        .push(if idx == 0 { Op::BeginIf(cond) } else { Op::ElseIf(cond) });
                    self.nodes(&branch.body, weight);
                }
                if let Some(body) = else_body.as_ref().filter(|body| !body.is_empty()) {
                    self.ops.push(Op::Else);
                    self.nodes(body, weight);
                }
                self.ops.push(Op::EndIf);
            }
            Node::Clause { kind, body } => {
                self.ops.push(Op::BeginClause(*kind));
                self.nodes(body, weight);
                self.ops.push(Op::EndClause(*kind));
            }
        }
    }
}
