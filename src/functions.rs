//! Built-in functions for Sable
//!
//! A small standard library plus the registration point through which hosts
//! expose their own functions (and, through returned values, their own
//! indexable objects) to evaluated programs.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalError;
use crate::value::Value;

/// Function signature for native (host) functions
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, NativeFn>,
}

impl FunctionRegistry {
    /// Create a new function registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register("len", |args| fn_len(args));
        registry.register("upper", |args| fn_upper(args));
        registry.register("lower", |args| fn_lower(args));
        registry.register("str", |args| fn_str(args));
        registry.register("keys", |args| fn_keys(args));

        registry
    }

    /// Register a function
    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.functions.insert(name.to_string(), Rc::new(func));
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<NativeFn> {
        self.functions.get(name).cloned()
    }

    /// Check if a function exists
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// List all function names
    pub fn list_functions(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn require_args(args: &[Value], count: usize, name: &str) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::eval_error(
            format!("{} expects {} argument(s), got {}", name, count, args.len()),
            None,
        ));
    }
    Ok(())
}

fn as_string(value: &Value, name: &str) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(EvalError::type_error(
            format!("{} expects a string, got {}", name, other.type_name()),
            None,
        )),
    }
}

fn fn_len(args: &[Value]) -> Result<Value, EvalError> {
    require_args(args, 1, "len")?;
    match &args[0] {
        Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(items) => Ok(Value::Int(items.borrow().len() as i64)),
        Value::Map(m) => Ok(Value::Int(m.borrow().len() as i64)),
        other => Err(EvalError::type_error(
            format!("len expects a string, list or map, got {}", other.type_name()),
            None,
        )),
    }
}

fn fn_upper(args: &[Value]) -> Result<Value, EvalError> {
    require_args(args, 1, "upper")?;
    let s = as_string(&args[0], "upper")?;
    Ok(Value::String(s.to_uppercase()))
}

fn fn_lower(args: &[Value]) -> Result<Value, EvalError> {
    require_args(args, 1, "lower")?;
    let s = as_string(&args[0], "lower")?;
    Ok(Value::String(s.to_lowercase()))
}

fn fn_str(args: &[Value]) -> Result<Value, EvalError> {
    require_args(args, 1, "str")?;
    Ok(Value::String(args[0].to_string_repr()))
}

fn fn_keys(args: &[Value]) -> Result<Value, EvalError> {
    require_args(args, 1, "keys")?;
    match &args[0] {
        Value::Map(m) => {
            let mut keys: Vec<String> = m.borrow().keys().cloned().collect();
            keys.sort();
            Ok(Value::list(keys.into_iter().map(Value::String).collect()))
        }
        other => Err(EvalError::type_error(
            format!("keys expects a map, got {}", other.type_name()),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        let registry = FunctionRegistry::new();
        let len = registry.get("len").unwrap();
        assert_eq!(
            len(&[Value::String("hello".to_string())]).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            len(&[Value::list(vec![Value::Int(1), Value::Int(2)])]).unwrap(),
            Value::Int(2)
        );
        assert!(len(&[Value::Int(1)]).is_err());
    }

    #[test]
    fn test_upper_lower() {
        let registry = FunctionRegistry::new();
        let upper = registry.get("upper").unwrap();
        assert_eq!(
            upper(&[Value::String("abc".to_string())]).unwrap(),
            Value::String("ABC".to_string())
        );
        let lower = registry.get("lower").unwrap();
        assert_eq!(
            lower(&[Value::String("ABC".to_string())]).unwrap(),
            Value::String("abc".to_string())
        );
    }

    #[test]
    fn test_keys_sorted() {
        let registry = FunctionRegistry::new();
        let keys = registry.get("keys").unwrap();
        let mut m = HashMap::new();
        m.insert("b".to_string(), Value::Int(2));
        m.insert("a".to_string(), Value::Int(1));
        assert_eq!(
            keys(&[Value::map(m)]).unwrap(),
            Value::list(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string())
            ])
        );
    }

    #[test]
    fn test_arity_error() {
        let registry = FunctionRegistry::new();
        let upper = registry.get("upper").unwrap();
        let err = upper(&[]).unwrap_err();
        assert!(err.to_string().contains("expects 1 argument(s)"));
    }

    #[test]
    fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("nope").is_none());
        assert!(registry.has_function("len"));
    }
}
