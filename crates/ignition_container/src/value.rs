//! Parameter and argument values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configuration value: parameters and definition arguments are trees of
/// these.
///
/// `Ref` names another component in the graph and is checked by the
/// reference-validation pass during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A reference to another component definition by identifier.
    Ref(String),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string content if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean content if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Visits every `Ref` identifier contained in this value tree.
    pub fn for_each_ref<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        match self {
            Value::Ref(id) => f(id),
            Value::Seq(items) => {
                for item in items {
                    item.for_each_ref(f);
                }
            }
            Value::Map(entries) => {
                for item in entries.values() {
                    item.for_each_ref(f);
                }
            }
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str() {
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::Bool(true).as_str(), None);
    }

    #[test]
    fn as_bool() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("true").as_bool(), None);
    }

    #[test]
    fn collects_nested_refs() {
        let mut map = BTreeMap::new();
        map.insert("inner".to_string(), Value::Ref("b".to_string()));
        let v = Value::Seq(vec![
            Value::Ref("a".to_string()),
            Value::Map(map),
            Value::Int(3),
        ]);

        let mut refs = Vec::new();
        v.for_each_ref(&mut |id| refs.push(id.to_string()));
        assert_eq!(refs, vec!["a", "b"]);
    }

    #[test]
    fn serde_roundtrip() {
        let v = Value::Seq(vec![Value::Null, Value::Int(7), Value::from("x")]);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
