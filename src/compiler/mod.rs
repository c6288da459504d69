//! Compiler for the SQL template language.
//!
//! The pipeline has four stages:
//! - Lexer: splits each template line into literal and directive tokens
//! - Parser: extracts placeholders and builds the block tree
//! - Lowering: flattens the tree into an instruction program ([`ir::Ir`])
//! - Codegen: prints the program as Go or Rust, or [`crate::render`] runs it

pub mod ast;
pub mod codegen;
pub mod error;
mod error_fmt;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod placeholder;
#[cfg(test)]
mod tests;

use proc_macro2::TokenStream;
use tracing::debug;

use self::ast::Program;
use self::codegen::go::{GoBackend, GoCode, MethodShape, method_body};
use self::codegen::rust::RustBackend;
use self::codegen::{CodegenConfig, GenResult, generate};
use self::error::SyntaxError;
use self::ir::Ir;
use self::lower::lower;
use self::parser::Parser;
use crate::render::{self, RenderError, RenderedSql, Scope};

pub use self::error_fmt::ErrorFormat;

/// A compiled template.
///
/// Compilation either succeeds completely or fails with the first syntax
/// error; a `Template` is immutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    program: Program,
    ir: Ir,
    config: CodegenConfig,
}

impl Template {
    /// Compiles `source` with the default configuration.
    pub fn compile(source: &str) -> Result<Self, SyntaxError> {
        Self::compile_with(source, CodegenConfig::default())
    }

    pub fn compile_with(source: &str, config: CodegenConfig) -> Result<Self, SyntaxError> {
        let program = Parser::new(source).parse()?;
        let ir = lower(&program, &config);

        debug!(
            lines = source.lines().count(),
            nodes = program.nodes.len(),
            ops = ir.ops().len(),
            capacity = ir.param_capacity(),
            "compiled template"
        );

        Ok(Self {
            source: source.to_string(),
            program,
            ir,
            config,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn ir(&self) -> &Ir {
        &self.ir
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Go statements that build `sb` and `params`.
    pub fn to_go(&self) -> GoCode {
        match generate(&self.ir, GoBackend::new(&self.config)) {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }

    /// A complete Go method body of the given shape.
    pub fn to_go_method(&self, shape: &MethodShape) -> GoCode {
        method_body(&self.to_go(), shape)
    }

    /// A Rust block expression evaluating to `(String, Vec<Value>)`.
    pub fn to_rust(&self) -> GenResult<TokenStream> {
        generate(&self.ir, RustBackend::new(&self.config)?)
    }

    /// Runs the template against `scope`.
    pub fn render(&self, scope: &mut impl Scope) -> Result<RenderedSql, RenderError> {
        render::render(&self.ir, scope)
    }
}
