//! Runtime value representation for Sable
//!
//! Lists and maps are shared handles: evaluating an expression that names a
//! container yields a reference to the same underlying storage, so an
//! assignment target only ever needs to evaluate its object sub-expression
//! once. Host-defined objects participate through the [`Indexable`] trait.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::index::Indexable;

/// Value representation (runtime values)
#[derive(Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<String, Value>>>),
    /// Host-defined object implementing the [`Indexable`] capability
    Object(Rc<dyn Indexable>),
    Null,
}

impl Value {
    /// Create a list value from a vector of elements
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    /// Create a map value from key/value pairs
    pub fn map(entries: HashMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Wrap a host object so it can flow through evaluation
    pub fn object<T: Indexable + 'static>(object: T) -> Value {
        Value::Object(Rc::new(object))
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stable human-readable type name, used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(obj) => obj.type_name(),
            Value::Null => "null",
        }
    }

    /// Convert to string representation
    pub fn to_string_repr(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::List(items) => {
                let strs: Vec<_> = items.borrow().iter().map(|v| v.to_string_repr()).collect();
                format!("[{}]", strs.join(", "))
            }
            Value::Map(m) => {
                let mut pairs: Vec<_> = m
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_string_repr()))
                    .collect();
                pairs.sort();
                format!("{{{}}}", pairs.join(", "))
            }
            Value::Object(obj) => format!("<{}>", obj.type_name()),
        }
    }

    /// Render as JSON for evaluated-configuration output
    ///
    /// Host objects are opaque and render as their type name.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
            Value::List(items) => {
                serde_json::Value::Array(items.borrow().iter().map(|v| v.to_json()).collect())
            }
            Value::Map(m) => {
                let mut entries: Vec<_> = m.borrow().iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                serde_json::Value::Object(entries.into_iter().collect())
            }
            Value::Object(obj) => serde_json::Value::String(format!("<{}>", obj.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => *a.borrow() == *b.borrow(),
            // Host objects are opaque; identity is the only sound equality
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::List(items) => write!(f, "List({:?})", items.borrow()),
            Value::Map(m) => write!(f, "Map({:?})", m.borrow()),
            Value::Object(obj) => write!(f, "Object(<{}>)", obj.type_name()),
            Value::Null => write!(f, "Null"),
        }
    }
}
