use std::fmt;

use rustc_hash::FxHashMap;

use super::{RenderError, Scope};
use crate::value::Value;

type Predicate = Box<dyn Fn(&Bindings) -> bool + Send + Sync>;

/// Variables for rendering, looked up by dotted path.
///
/// Loop headers may be written Go style (`[idx, ]item := range path`) or
/// Rust style (`item in path`). Conditions that are a plain path test its
/// truthiness; anything else must be registered with [`Bindings::when`].
///
/// ```
/// use sqltmpl::{Bindings, Value};
///
/// let vars = Bindings::new()
///     .with("x", 5)
///     .when("x > 0", |b| b.lookup("x").and_then(Value::as_int).is_some_and(|x| x > 0));
/// assert_eq!(vars.lookup("x"), Some(&Value::Int(5)));
/// ```
#[derive(Default)]
pub struct Bindings {
    scopes: Vec<FxHashMap<String, Value>>,
    predicates: FxHashMap<String, Predicate>,
    loops: Vec<ActiveLoop>,
}

struct ActiveLoop {
    header: LoopHeader,
    items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoopHeader {
    index: Option<String>,
    item: Option<String>,
    path: String,
}

impl LoopHeader {
    fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        if let Some((lhs, rhs)) = header.split_once(":=") {
            let path = rhs.trim().strip_prefix("range ")?;
            let names: Vec<&str> = lhs.split(',').map(str::trim).collect();
            let (index, item) = match names.as_slice() {
                [item] => (None, *item),
                [index, item] => (binding_name(index), *item),
                _ => return None,
            };
            return Self::build(index, item, path);
        }
        let (item, path) = header.split_once(" in ")?;
        Self::build(None, item.trim(), path)
    }

    fn build(index: Option<String>, item: &str, path: &str) -> Option<Self> {
        let path = path.trim().trim_start_matches('&');
        if !is_path(path) || !(item == "_" || is_ident(item)) {
            return None;
        }
        Some(Self {
            index,
            item: binding_name(item),
            path: path.to_string(),
        })
    }
}

fn binding_name(name: &str) -> Option<String> {
    (name != "_" && is_ident(name)).then(|| name.to_string())
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_path(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_ident)
}

impl Bindings {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
            ..Self::default()
        }
    }

    /// Sets a top-level variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        if self.scopes.is_empty() {
            self.scopes.push(FxHashMap::default());
        }
        if let Some(globals) = self.scopes.first_mut() {
            globals.insert(name.into(), value.into());
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Registers a predicate for the condition written exactly as `text`.
    pub fn when(
        mut self,
        text: impl Into<String>,
        predicate: impl Fn(&Bindings) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicates.insert(text.into(), Box::new(predicate));
        self
    }

    /// Resolves a dotted path, innermost scope first.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.trim().split('.');
        let root = segments.next()?;
        let mut value = self.scopes.iter().rev().find_map(|scope| scope.get(root))?;
        for segment in segments {
            value = value.field(segment)?;
        }
        Some(value)
    }

    fn require(&self, path: &str) -> Result<&Value, RenderError> {
        self.lookup(path)
            .ok_or_else(|| RenderError::UnknownVariable(path.trim().to_string()))
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("scopes", &self.scopes)
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Scope for Bindings {
    fn condition(&mut self, expr: &str) -> Result<bool, RenderError> {
        if let Some(predicate) = self.predicates.get(expr) {
            return Ok(predicate(self));
        }
        let expr = expr.trim();
        let (negate, path) = match expr.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, expr),
        };
        if !is_path(path) {
            return Err(RenderError::UnsupportedCondition(expr.to_string()));
        }
        Ok(self.require(path)?.is_truthy() != negate)
    }

    fn enter_loop(&mut self, header: &str) -> Result<usize, RenderError> {
        let parsed = LoopHeader::parse(header)
            .ok_or_else(|| RenderError::UnsupportedLoopHeader(header.to_string()))?;
        let items = match self.require(&parsed.path)? {
            Value::List(items) => items.clone(),
            Value::Null => Vec::new(),
            _ => return Err(RenderError::NotIterable(parsed.path)),
        };
        let count = items.len();
        self.loops.push(ActiveLoop {
            header: parsed,
            items,
        });
        self.scopes.push(FxHashMap::default());
        Ok(count)
    }

    fn iteration(&mut self, header: &str, index: usize) -> Result<(), RenderError> {
        let (Some(active), Some(scope)) = (self.loops.last(), self.scopes.last_mut()) else {
            return Err(RenderError::UnsupportedLoopHeader(header.to_string()));
        };
        scope.clear();
        if let Some(name) = &active.header.index {
            scope.insert(name.clone(), Value::Int(index as i64));
        }
        if let Some(name) = &active.header.item {
            let item = active.items.get(index).cloned().unwrap_or_default();
            scope.insert(name.clone(), item);
        }
        Ok(())
    }

    fn exit_loop(&mut self, _header: &str) {
        if self.loops.pop().is_some() {
            self.scopes.pop();
        }
    }

    fn value(&mut self, expr: &str) -> Result<Value, RenderError> {
        self.require(expr).cloned()
    }
}
