//! Dynamic parameter values.

use std::fmt;

use rustc_hash::FxHashMap;

/// A bound parameter, or a variable visible to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Record(FxHashMap<String, Value>),
    /// The current table of the query (`@@table`).
    Table,
    /// SQL expression text spliced unquoted by the driver (`@@expr`).
    Raw(String),
}

impl Value {
    pub fn table() -> Self {
        Value::Table
    }

    /// Wraps the display form of `expr` as raw SQL.
    pub fn raw(expr: impl ToString) -> Self {
        Value::Raw(expr.to_string())
    }

    /// Builds a record from field/value pairs.
    pub fn record<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Converts a looked-up value into raw SQL. Text is taken verbatim.
    pub fn into_raw(self) -> Self {
        match self {
            Value::Raw(_) => self,
            Value::Text(text) => Value::Raw(text),
            other => Value::Raw(other.to_string()),
        }
    }

    /// Go-style zero-value test: `false`, `0`, `""`, empty lists and
    /// records, and null are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) | Value::Raw(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Record(fields) => !fields.is_empty(),
            Value::Table => true,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) | Value::Raw(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(_) => f.write_str("{..}"),
            Value::Table => f.write_str("@@table"),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(Vec::<i32>::new()).is_truthy());
        assert!(Value::from(3).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Table.is_truthy());
    }

    #[test]
    fn test_into_raw() {
        assert_eq!(Value::from("name").into_raw(), Value::Raw("name".into()));
        assert_eq!(Value::from(4).into_raw(), Value::Raw("4".into()));
        assert_eq!(Value::raw("x").into_raw(), Value::Raw("x".into()));
    }

    #[test]
    fn test_record_field() {
        let user = Value::record([("name", Value::from("ann")), ("age", Value::from(30))]);
        assert_eq!(user.field("age"), Some(&Value::Int(30)));
        assert_eq!(user.field("missing"), None);
        assert_eq!(Value::from(1).field("age"), None);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
