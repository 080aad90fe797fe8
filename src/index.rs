//! The indexing capability and shared index utilities
//!
//! `object[key]` dispatches on the runtime type of `object`. Strings, lists
//! and maps are handled by the evaluator directly; any host type can join
//! in by implementing [`Indexable`] and wrapping itself in
//! [`Value::object`](crate::value::Value::object). Results come back as a
//! [`RawValue`] and are normalized into the interpreter's canonical
//! representation before they reach the language.

use std::collections::HashMap;

use crate::ast::SourceSpan;
use crate::error::EvalError;
use crate::value::Value;

/// Capability contract for values that support `object[key]` syntax.
///
/// Implementations must not mutate `key` and must return span-tagged
/// errors for invalid key types, out-of-range keys, or missing entries.
pub trait Indexable {
    /// Stable type name, used in error messages
    fn type_name(&self) -> &str;

    /// Look up `key`, returning a raw host value to be normalized
    fn get_index(&self, key: &Value, span: Option<&SourceSpan>) -> Result<RawValue, EvalError>;

    /// Store `value` at `key`. Host objects are read-only unless they
    /// override this.
    fn set_index(
        &self,
        key: Value,
        value: Value,
        span: Option<&SourceSpan>,
    ) -> Result<(), EvalError> {
        let _ = (key, value);
        Err(EvalError::type_error(
            format!("type '{}' does not support index assignment", self.type_name()),
            span,
        ))
    }
}

/// A host-native value as returned by [`Indexable::get_index`].
///
/// Host code returns whatever representation is convenient; the evaluator
/// calls [`canonicalize`] so that only canonical [`Value`]s circulate
/// through the language.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<RawValue>),
    Entries(Vec<(String, RawValue)>),
    /// Already in canonical form
    Value(Value),
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Str(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Str(s)
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Value(value)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::Seq(items.into_iter().map(Into::into).collect())
    }
}

/// Normalize a raw host value into the canonical runtime representation
pub fn canonicalize(raw: RawValue) -> Value {
    match raw {
        RawValue::Unit => Value::Null,
        RawValue::Bool(b) => Value::Bool(b),
        RawValue::Int(i) => Value::Int(i),
        RawValue::Float(f) => Value::Float(f),
        RawValue::Str(s) => Value::String(s),
        RawValue::Seq(items) => Value::list(items.into_iter().map(canonicalize).collect()),
        RawValue::Entries(entries) => {
            let map: HashMap<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::map(map)
        }
        RawValue::Value(value) => value,
    }
}

/// Resolve a key value against a sequence of the given length.
///
/// The key must be an int in `[-length, length)`; negative keys address
/// from the end, so `-1` is the last element. Shared by strings, lists,
/// and any host sequence type.
pub fn resolve_sequence_index(
    key: &Value,
    length: usize,
    span: Option<&SourceSpan>,
) -> Result<usize, EvalError> {
    let index = match key {
        Value::Int(i) => *i,
        other => {
            return Err(EvalError::index_error(
                format!("sequence index must be an int, got {}", other.type_name()),
                span,
            ))
        }
    };

    let adjusted = if index < 0 {
        index + length as i64
    } else {
        index
    };

    if adjusted < 0 || adjusted >= length as i64 {
        return Err(EvalError::index_error(
            format!(
                "index {} out of range for sequence of length {}",
                index, length
            ),
            span,
        ));
    }

    Ok(adjusted as usize)
}
