//! Code generation from IR.
//!
//! A [`Backend`] receives the instruction program one op at a time and
//! produces its own output: Go source text ([`go::GoBackend`]) or a Rust
//! `TokenStream` ([`rust::RustBackend`]). The in-process renderer in
//! [`crate::render`] executes the same program directly.

mod error;
pub mod go;
pub mod rust;

pub use error::{GenError, GenErrorKind, GenResult};

use super::ir::{Ir, Op};

/// Configuration for lowering and code generation.
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Name of the output buffer variable.
    pub buffer_var: String,
    /// Name of the parameter list variable.
    pub params_var: String,
    /// Base name for clause sub-buffers; nested clauses get a numeric suffix.
    pub scratch_var: String,
    /// Capacity weight applied per enclosing loop.
    pub loop_multiplier: usize,
    /// Path of this crate as seen from generated Rust code.
    pub runtime_path: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            buffer_var: "sb".to_string(),
            params_var: "params".to_string(),
            scratch_var: "tmp".to_string(),
            loop_multiplier: 4,
            runtime_path: "::sqltmpl".to_string(),
        }
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_var(mut self, name: impl Into<String>) -> Self {
        self.buffer_var = name.into();
        self
    }

    pub fn params_var(mut self, name: impl Into<String>) -> Self {
        self.params_var = name.into();
        self
    }

    pub fn scratch_var(mut self, name: impl Into<String>) -> Self {
        self.scratch_var = name.into();
        self
    }

    pub fn loop_multiplier(mut self, multiplier: usize) -> Self {
        self.loop_multiplier = multiplier;
        self
    }

    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Scratch names for a clause opened at `depth` (1 = outermost).
    pub(crate) fn scratch_names(&self, depth: usize) -> (String, String) {
        let suffix = if depth <= 1 {
            String::new()
        } else {
            depth.to_string()
        };
        (
            format!("{}{}", self.scratch_var, suffix),
            format!("{}Params{}", self.scratch_var, suffix),
        )
    }
}

/// A code generation target.
pub trait Backend {
    type Output;
    type Error;

    /// Called once before any op, with the parameter capacity hint.
    fn begin(&mut self, param_capacity: usize) -> Result<(), Self::Error>;

    fn op(&mut self, op: &Op) -> Result<(), Self::Error>;

    fn finish(self) -> Result<Self::Output, Self::Error>;
}

/// Feeds `ir` through `backend`.
pub fn generate<B: Backend>(ir: &Ir, mut backend: B) -> Result<B::Output, B::Error> {
    backend.begin(ir.param_capacity())?;
    for op in ir.ops() {
        backend.op(op)?;
    }
    backend.finish()
}
