//! Rust back end.
//!
//! Produces a block expression that evaluates to `(String, Vec<Value>)`.
//! Conditions, loop headers and bind expressions are host Rust code, so
//! they are parsed with `syn` here and spliced as tokens.

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use tracing::trace;

use super::error::{GenError, GenErrorKind, GenResult};
use super::{Backend, CodegenConfig};
use crate::compiler::ast::ClauseKind;
use crate::compiler::ir::Op;
use crate::compiler::placeholder::Bind;

/// An open block whose statements are still being collected.
enum Frame {
    Root,
    If {
        /// Finished arms; `None` marks the `else` arm.
        arms: Vec<(Option<syn::Expr>, Vec<TokenStream>)>,
        current: Option<syn::Expr>,
    },
    Loop {
        pat: Box<syn::Pat>,
        expr: Box<syn::Expr>,
    },
    Clause {
        kind: ClauseKind,
        buf: Ident,
        params: Ident,
    },
}

/// Rust back end state.
pub struct RustBackend {
    runtime: syn::Path,
    frames: Vec<(Frame, Vec<TokenStream>)>,
    capacity: usize,
}

impl RustBackend {
    pub fn new(config: &CodegenConfig) -> GenResult<Self> {
        let runtime = syn::parse_str::<syn::Path>(&config.runtime_path).map_err(|e| {
            GenError::from_syn(GenErrorKind::InvalidRuntimePath, &config.runtime_path, &e)
        })?;
        Ok(Self {
            runtime,
            frames: vec![(Frame::Root, Vec::new())],
            capacity: 0,
        })
    }

    fn root_buf() -> Ident {
        Ident::new("__sb", Span::call_site())
    }

    fn root_params() -> Ident {
        Ident::new("__params", Span::call_site())
    }

    /// Buffer and parameter list of the innermost clause, or the root ones.
    fn target(&self) -> (Ident, Ident) {
        self.frames
            .iter()
            .rev()
            .find_map(|(frame, _)| match frame {
                Frame::Clause { buf, params, .. } => Some((buf.clone(), params.clone())),
                _ => None,
            })
            .unwrap_or_else(|| (Self::root_buf(), Self::root_params()))
    }

    fn clause_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|(frame, _)| matches!(frame, Frame::Clause { .. }))
            .count()
    }

    fn emit(&mut self, stmt: TokenStream) {
        if let Some((_, stmts)) = self.frames.last_mut() {
            stmts.push(stmt);
        }
    }

    fn pop(&mut self) -> GenResult<(Frame, Vec<TokenStream>)> {
        if self.frames.len() <= 1 {
            return Err(GenError::new(GenErrorKind::UnbalancedProgram));
        }
        self.frames
            .pop()
            .ok_or_else(|| GenError::new(GenErrorKind::UnbalancedProgram))
    }

    fn parse_expr(kind: GenErrorKind, text: &str) -> GenResult<syn::Expr> {
        syn::parse_str::<syn::Expr>(text).map_err(|e| GenError::from_syn(kind, text, &e))
    }

    /// Parses `<pat> in <expr>` by wrapping it in an empty `for` loop.
    fn parse_header(header: &str) -> GenResult<(Box<syn::Pat>, Box<syn::Expr>)> {
        let source = format!("for {header} {{}}");
        let parsed = syn::parse_str::<syn::ExprForLoop>(&source)
            .map_err(|e| GenError::from_syn(GenErrorKind::InvalidLoopHeader, header, &e))?;
        Ok((parsed.pat, parsed.expr))
    }

    fn bind_value(&self, bind: &Bind) -> GenResult<TokenStream> {
        let rt = &self.runtime;
        Ok(match bind {
            Bind::Table => quote! { #rt::Value::table() },
            Bind::Raw(expr) => {
                let expr = Self::parse_expr(GenErrorKind::InvalidBindExpression, expr)?;
                quote! { #rt::Value::raw(&(#expr)) }
            }
            Bind::Value(expr) => {
                let expr = Self::parse_expr(GenErrorKind::InvalidBindExpression, expr)?;
                quote! { #rt::Value::from(::std::clone::Clone::clone(&(#expr))) }
            }
        })
    }

    fn clause_kind(&self, kind: ClauseKind) -> TokenStream {
        let rt = &self.runtime;
        match kind {
            ClauseKind::Where => quote! { #rt::ClauseKind::Where },
            ClauseKind::Set => quote! { #rt::ClauseKind::Set },
        }
    }

    fn close_if(&mut self) -> GenResult<TokenStream> {
        let (frame, stmts) = self.pop()?;
        let Frame::If { mut arms, current } = frame else {
            return Err(GenError::new(GenErrorKind::UnbalancedProgram));
        };
        arms.push((current, stmts));

        let mut out = TokenStream::new();
        for (idx, (cond, body)) in arms.into_iter().enumerate() {
            out.extend(match (idx, cond) {
                (0, Some(cond)) => quote! { if #cond { #(#body)* } },
                (_, Some(cond)) => quote! { else if #cond { #(#body)* } },
                (_, None) => quote! { else { #(#body)* } },
            });
        }
        Ok(out)
    }

    /// Moves the current arm into the finished list and opens the next one.
    fn next_arm(&mut self, cond: Option<syn::Expr>) -> GenResult<()> {
        let Some((Frame::If { arms, current }, stmts)) = self.frames.last_mut() else {
            return Err(GenError::new(GenErrorKind::UnbalancedProgram));
        };
        arms.push((current.take(), std::mem::take(stmts)));
        *current = cond;
        Ok(())
    }
}

impl Backend for RustBackend {
    type Output = TokenStream;
    type Error = GenError;

    fn begin(&mut self, param_capacity: usize) -> GenResult<()> {
        self.capacity = param_capacity;
        Ok(())
    }

    fn op(&mut self, op: &Op) -> GenResult<()> {
        match op {
            Op::Literal(sql) => {
                if !sql.is_empty() {
                    let (buf, _) = self.target();
                    self.emit(quote! { #buf.push_str(#sql); });
                }
            }
            Op::Bind(binds) => {
                let (_, params) = self.target();
                let values = binds
                    .iter()
                    .map(|b| self.bind_value(b))
                    .collect::<GenResult<Vec<_>>>()?;
                let pushes = values.iter().map(|value| quote! { #params.push(#value); });
                let stmt = quote! { #(#pushes)* };
                self.emit(stmt);
            }
            Op::BeginIf(cond) => {
                let cond = Self::parse_expr(GenErrorKind::InvalidCondition, cond)?;
                self.frames.push((
                    Frame::If {
                        arms: Vec::new(),
                        current: Some(cond),
                    },
                    Vec::new(),
                ));
            }
            Op::ElseIf(cond) => {
                let cond = Self::parse_expr(GenErrorKind::InvalidCondition, cond)?;
                self.next_arm(Some(cond))?;
            }
            Op::Else => self.next_arm(None)?,
            Op::EndIf => {
                let chain = self.close_if()?;
                self.emit(chain);
            }
            Op::BeginLoop(header) => {
                let (pat, expr) = Self::parse_header(header)?;
                self.frames.push((Frame::Loop { pat, expr }, Vec::new()));
            }
            Op::EndLoop => {
                let (frame, body) = self.pop()?;
                let Frame::Loop { pat, expr } = frame else {
                    return Err(GenError::new(GenErrorKind::UnbalancedProgram));
                };
                self.emit(quote! {
                    for #pat in #expr {
                        #(#body)*
                    }
                });
            }
            Op::BeginClause(kind) => {
                let depth = self.clause_depth() + 1;
                let buf = format_ident!("__tmp{}", depth);
                let params = format_ident!("__tmp_params{}", depth);
                self.frames.push((
                    Frame::Clause {
                        kind: *kind,
                        buf,
                        params,
                    },
                    Vec::new(),
                ));
            }
            Op::EndClause(_) => {
                let (frame, body) = self.pop()?;
                let Frame::Clause { kind, buf, params } = frame else {
                    return Err(GenError::new(GenErrorKind::UnbalancedProgram));
                };
                let (outer_buf, outer_params) = self.target();
                let rt = &self.runtime;
                let kind = self.clause_kind(kind);
                let block = quote! {
                    {
                        #[allow(unused_mut)]
                        let mut #buf = ::std::string::String::new();
                        #[allow(unused_mut)]
                        let mut #params: ::std::vec::Vec<#rt::Value> = ::std::vec::Vec::new();
                        #(#body)*
                        #rt::runtime::append_clause(#kind, &#buf, #params, &mut #outer_buf, &mut #outer_params);
                    }
                };
                self.emit(block);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> GenResult<TokenStream> {
        if self.frames.len() != 1 {
            return Err(GenError::new(GenErrorKind::UnbalancedProgram));
        }
        let (_, stmts) = self
            .frames
            .pop()
            .ok_or_else(|| GenError::new(GenErrorKind::UnbalancedProgram))?;

        let rt = &self.runtime;
        let buf = Self::root_buf();
        let params = Self::root_params();
        let capacity = self.capacity;
        let tokens = quote! {
            {
                #[allow(unused_mut)]
                let mut #buf = ::std::string::String::new();
                #[allow(unused_mut)]
                let mut #params: ::std::vec::Vec<#rt::Value> = ::std::vec::Vec::with_capacity(#capacity);
                #(#stmts)*
                (#buf, #params)
            }
        };
        trace!(code = %tokens, "generated rust");
        Ok(tokens)
    }
}
