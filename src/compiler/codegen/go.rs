//! Go back end.
//!
//! Emits the statement block that the query generator splices into a
//! generated Go method: a `strings.Builder`, a capacity-hinted `[]any`
//! parameter slice, and the statements that fill both.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt::{self, Write as _};

use tracing::trace;

use super::{Backend, CodegenConfig};
use crate::compiler::ast::ClauseKind;
use crate::compiler::ir::Op;
use crate::compiler::placeholder::Bind;
use crate::runtime::CONJUNCTION_PATTERN;

const IMPORT_STRINGS: &str = "strings";
const IMPORT_REGEXP: &str = "regexp";
const IMPORT_UNICODE: &str = "unicode";
const IMPORT_GORM: &str = "gorm.io/gorm";
const IMPORT_CLAUSE: &str = "gorm.io/gorm/clause";

/// Generated Go statements plus the imports they need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoCode {
    pub body: String,
    imports: BTreeSet<&'static str>,
    buffer_var: String,
    params_var: String,
}

impl GoCode {
    /// Import paths the body refers to, sorted.
    pub fn imports(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.imports.iter().copied()
    }

    /// Non-empty lines, trimmed.
    pub fn lines(&self) -> Vec<&str> {
        self.body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl fmt::Display for GoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// Go back end state.
pub struct GoBackend<'a> {
    config: &'a CodegenConfig,
    out: String,
    indent: usize,
    /// `(buffer, params)` names; the last entry receives output.
    targets: Vec<(String, String)>,
    imports: BTreeSet<&'static str>,
}

impl<'a> GoBackend<'a> {
    pub fn new(config: &'a CodegenConfig) -> Self {
        Self {
            config,
            out: String::new(),
            indent: 0,
            targets: vec![(config.buffer_var.clone(), config.params_var.clone())],
            imports: BTreeSet::from([IMPORT_STRINGS]),
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    /// Closes the current arm and opens the next one.
    fn reopen(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.open(text);
    }

    fn target(&self) -> (String, String) {
        self.targets.last().cloned().unwrap_or_else(|| {
            (
                self.config.buffer_var.clone(),
                self.config.params_var.clone(),
            )
        })
    }

    fn bind_expr(&mut self, bind: &Bind) -> String {
        match bind {
            Bind::Table => {
                self.imports.insert(IMPORT_CLAUSE);
                "clause.Table{Name: clause.CurrentTable}".to_string()
            }
            Bind::Raw(expr) => {
                self.imports.insert(IMPORT_GORM);
                format!("gorm.Expr({expr})")
            }
            Bind::Value(expr) => expr.clone(),
        }
    }

    fn begin_clause(&mut self) {
        let (tmp, tmp_params) = self.config.scratch_names(self.targets.len());
        self.open("{");
        self.line(format!("var {tmp} strings.Builder"));
        self.line(format!("var {tmp_params} []any"));
        self.targets.push((tmp, tmp_params));
    }

    fn end_clause(&mut self, kind: ClauseKind) {
        let (tmp, tmp_params) = self.targets.pop().unwrap_or_default();
        let (buf, params) = self.target();

        self.line(format!("c := strings.TrimSpace({tmp}.String())"));
        match kind {
            ClauseKind::Where => {
                self.imports.insert(IMPORT_REGEXP);
                self.line(format!(
                    "reTrim := regexp.MustCompile(`{CONJUNCTION_PATTERN}`)"
                ));
                self.line("c = strings.TrimSpace(reTrim.ReplaceAllString(c, \"\"))");
            }
            ClauseKind::Set => {
                self.line("c = strings.TrimSpace(strings.TrimSuffix(c, \",\"))");
            }
        }

        self.imports.insert(IMPORT_UNICODE);
        self.open("if c != \"\" {");
        self.open(format!(
            "if n := {buf}.Len(); n > 0 && !unicode.IsSpace(rune({buf}.String()[n-1])) {{"
        ));
        self.line(format!("{buf}.WriteString(\" \")"));
        self.close();
        self.line(format!("{buf}.WriteString({})", go_quote(kind.prefix())));
        self.line(format!("{buf}.WriteString(c)"));
        self.line(format!("{params} = append({params}, {tmp_params}...)"));
        self.close();
        self.close();
    }
}

impl Backend for GoBackend<'_> {
    type Output = GoCode;
    type Error = Infallible;

    fn begin(&mut self, param_capacity: usize) -> Result<(), Infallible> {
        let (buf, params) = self.target();
        self.line(format!("var {buf} strings.Builder"));
        self.line(format!("{params} := make([]any, 0, {param_capacity})"));
        self.out.push('\n');
        Ok(())
    }

    fn op(&mut self, op: &Op) -> Result<(), Infallible> {
        match op {
            Op::Literal(sql) => {
                if !sql.is_empty() {
                    let (buf, _) = self.target();
                    self.line(format!("{buf}.WriteString({})", go_quote(sql)));
                }
            }
            Op::Bind(binds) => {
                let (_, params) = self.target();
                let exprs: Vec<String> = binds.iter().map(|b| self.bind_expr(b)).collect();
                self.line(format!("{params} = append({params}, {})", exprs.join(", ")));
            }
            Op::BeginIf(cond) => self.open(format!("if {cond} {{")),
            Op::ElseIf(cond) => self.reopen(format!("}} else if {cond} {{")),
            Op::Else => self.reopen("} else {"),
            Op::EndIf | Op::EndLoop => self.close(),
            Op::BeginLoop(header) => self.open(format!("for {header} {{")),
            Op::BeginClause(_) => self.begin_clause(),
            Op::EndClause(kind) => self.end_clause(*kind),
        }
        Ok(())
    }

    fn finish(self) -> Result<GoCode, Infallible> {
        trace!(code = %self.out, "generated go");
        Ok(GoCode {
            body: self.out,
            imports: self.imports,
            buffer_var: self.config.buffer_var.clone(),
            params_var: self.config.params_var.clone(),
        })
    }
}

/// Quotes `s` as a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// How a generated method consumes the assembled SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodShape {
    /// Statement without a result row: `return e.Exec(...)`.
    Exec,
    /// Query scanned into a value of `result_type`.
    Scan { result_type: String },
    /// Chainable `where(...)` condition.
    Where,
    /// Chainable `select(...)` column list.
    Select,
}

/// Wraps a compiled snippet into a complete Go method body.
pub fn method_body(code: &GoCode, shape: &MethodShape) -> GoCode {
    let buf = &code.buffer_var;
    let params = &code.params_var;
    let mut imports = code.imports.clone();

    let tail = match shape {
        MethodShape::Exec => format!("return e.Exec(ctx, {buf}.String(), {params}...)"),
        MethodShape::Scan { result_type } => format!(
            "var result {result_type}\nerr := e.Raw({buf}.String(), {params}...).Scan(ctx, &result)\nreturn result, err"
        ),
        MethodShape::Where => {
            imports.insert(IMPORT_CLAUSE);
            format!("e.Where(clause.Expr{{SQL: {buf}.String(), Vars: {params}}})\n\nreturn e")
        }
        MethodShape::Select => format!("e.Select({buf}.String(), {params}...)\n\nreturn e"),
    };

    GoCode {
        body: format!("{}\n{tail}\n", code.body.trim_end()),
        imports,
        buffer_var: buf.clone(),
        params_var: params.clone(),
    }
}
