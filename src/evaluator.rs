//! Evaluator for Sable - resolves variables, functions, and expressions
//!
//! Evaluation is single-threaded synchronous tree recursion. The one piece
//! of shared state is the interrupt flag: any thread may set it, and every
//! evaluation step observes it and aborts with
//! [`EvalError::Interrupted`] before doing further work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{AssignOp, AssignTarget, Expression, Module, SourceSpan, Statement};
use crate::error::EvalError;
use crate::functions::FunctionRegistry;
use crate::index::{canonicalize, resolve_sequence_index};
use crate::value::Value;

/// Evaluated module with all expressions resolved
#[derive(Debug)]
pub struct EvaluatedModule {
    pub bindings: HashMap<String, Value>,
}

impl EvaluatedModule {
    /// Render the top-level bindings as a JSON object (keys sorted)
    pub fn to_json(&self) -> serde_json::Value {
        let mut entries: Vec<_> = self
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        serde_json::Value::Object(entries.into_iter().collect())
    }
}

/// Evaluation context: variable bindings, native functions, interrupt flag
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: FunctionRegistry,
    interrupt: Arc<AtomicBool>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create a new environment with the built-in functions registered
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            functions: FunctionRegistry::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Define (or overwrite) a variable binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Look up a variable binding
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Register a native (host) function
    pub fn register_native<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.functions.register(name, func);
    }

    /// Names resolvable without evaluation: variables plus native functions
    pub fn resolvable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.extend(self.functions.list_functions());
        names
    }

    /// Handle to the cooperative-cancellation flag.
    ///
    /// Setting the flag makes the next evaluation step fail with
    /// [`EvalError::Interrupted`].
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    fn check_interrupt(&self) -> Result<(), EvalError> {
        if self.interrupt.load(Ordering::Relaxed) {
            debug!("interrupt flag observed, aborting evaluation");
            return Err(EvalError::Interrupted);
        }
        Ok(())
    }

    /// Evaluate a module
    pub fn evaluate(&mut self, module: &Module) -> Result<EvaluatedModule, EvalError> {
        trace!(statements = module.statements.len(), "evaluating module");
        let mut bindings = HashMap::new();

        for statement in &module.statements {
            self.eval_statement(statement, &mut bindings)?;
        }

        Ok(EvaluatedModule { bindings })
    }

    fn eval_statement(
        &mut self,
        statement: &Statement,
        bindings: &mut HashMap<String, Value>,
    ) -> Result<(), EvalError> {
        self.check_interrupt()?;

        match statement {
            Statement::Assignment {
                target,
                op,
                value,
                span,
            } => match (target, op) {
                (AssignTarget::Name(name), AssignOp::Assign) => {
                    let evaluated = self.eval_expression(value)?;
                    self.variables.insert(name.clone(), evaluated.clone());
                    bindings.insert(name.clone(), evaluated);
                }
                (AssignTarget::Name(name), AssignOp::Add) => {
                    let current = self.variables.get(name).cloned().ok_or_else(|| {
                        EvalError::Undefined {
                            name: name.clone(),
                            span: span.clone(),
                        }
                    })?;
                    let rhs = self.eval_expression(value)?;
                    let evaluated = add_values(&current, &rhs, span.as_ref())?;
                    self.variables.insert(name.clone(), evaluated.clone());
                    bindings.insert(name.clone(), evaluated);
                }
                (
                    AssignTarget::Index {
                        object,
                        key,
                        span: target_span,
                    },
                    AssignOp::Assign,
                ) => {
                    // Right-hand side first, then the target; the object
                    // sub-expression is evaluated exactly once.
                    let rhs = self.eval_expression(value)?;
                    let obj = self.eval_expression(object)?;
                    let key_value = self.eval_expression(key)?;
                    self.store_index(&obj, key_value, rhs, target_span.as_ref(), key.span())?;
                }
                (
                    AssignTarget::Index {
                        object,
                        key,
                        span: target_span,
                    },
                    AssignOp::Add,
                ) => {
                    // Read-modify-write through one evaluation of object
                    // and key apiece.
                    let obj = self.eval_expression(object)?;
                    let key_value = self.eval_expression(key)?;
                    let current =
                        self.index_value(&obj, &key_value, target_span.as_ref(), key.span())?;
                    let rhs = self.eval_expression(value)?;
                    let evaluated = add_values(&current, &rhs, span.as_ref())?;
                    self.store_index(&obj, key_value, evaluated, target_span.as_ref(), key.span())?;
                }
            },

            Statement::Expression { expr, .. } => {
                self.eval_expression(expr)?;
            }
        }

        Ok(())
    }

    /// Evaluate an expression
    pub fn eval_expression(&self, expr: &Expression) -> Result<Value, EvalError> {
        self.check_interrupt()?;

        match expr {
            Expression::Literal { value, .. } => Ok(value.clone()),

            Expression::Variable { name, span } => {
                self.variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::Undefined {
                        name: name.clone(),
                        span: span.clone(),
                    })
            }

            Expression::List { elements, .. } => {
                let mut values = Vec::new();
                for item in elements {
                    values.push(self.eval_expression(item)?);
                }
                Ok(Value::list(values))
            }

            Expression::Map { entries, .. } => {
                let mut map = HashMap::new();
                for (key, value_expr) in entries {
                    let value = self.eval_expression(value_expr)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::map(map))
            }

            Expression::Call { name, args, span } => {
                let func = self.functions.get(name).ok_or_else(|| {
                    EvalError::eval_error(format!("unknown function: {}", name), span.as_ref())
                })?;
                let mut values = Vec::new();
                for arg in args {
                    values.push(self.eval_expression(arg)?);
                }
                func(&values)
            }

            Expression::Index { object, key, span } => {
                self.eval_index(object, key, span.as_ref())
            }
        }
    }

    /// Evaluate `object[key]`, evaluating the object sub-expression first.
    pub fn eval_index(
        &self,
        object: &Expression,
        key: &Expression,
        span: Option<&SourceSpan>,
    ) -> Result<Value, EvalError> {
        let obj_value = self.eval_expression(object)?;
        self.eval_index_with_object(obj_value, key, span)
    }

    /// Evaluate `object[key]` when the object value is already known.
    ///
    /// Callers that must not evaluate the object sub-expression a second
    /// time (assignment-target handlers in particular) use this entry
    /// point. Evaluates the key, then dispatches on the object's runtime
    /// type.
    pub fn eval_index_with_object(
        &self,
        obj_value: Value,
        key: &Expression,
        span: Option<&SourceSpan>,
    ) -> Result<Value, EvalError> {
        let key_value = self.eval_expression(key)?;
        self.index_value(&obj_value, &key_value, span, key.span())
    }

    /// Dispatch an index read on the runtime type of `object`.
    ///
    /// Range and key errors carry the key's span when one is available
    /// (the most specific location); type errors carry the whole index
    /// expression's span.
    fn index_value(
        &self,
        object: &Value,
        key: &Value,
        span: Option<&SourceSpan>,
        key_span: Option<&SourceSpan>,
    ) -> Result<Value, EvalError> {
        let key_span = key_span.or(span);

        match object {
            Value::Object(handle) => {
                let raw = handle.get_index(key, span)?;
                Ok(canonicalize(raw))
            }

            Value::List(items) => {
                let items = items.borrow();
                let index = resolve_sequence_index(key, items.len(), key_span)?;
                Ok(items[index].clone())
            }

            Value::Map(map) => {
                let Value::String(k) = key else {
                    return Err(EvalError::index_error(
                        format!("map keys must be strings, got {}", key.type_name()),
                        key_span,
                    ));
                };
                map.borrow().get(k).cloned().ok_or_else(|| {
                    EvalError::index_error(format!("key '{}' not found in map", k), key_span)
                })
            }

            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let index = resolve_sequence_index(key, chars.len(), key_span)?;
                Ok(Value::String(chars[index].to_string()))
            }

            other => Err(EvalError::type_error(
                format!(
                    "type '{}' has no operator []({})",
                    other.type_name(),
                    key.type_name()
                ),
                span,
            )),
        }
    }

    /// Dispatch an index write on the runtime type of `object`.
    fn store_index(
        &self,
        object: &Value,
        key: Value,
        value: Value,
        span: Option<&SourceSpan>,
        key_span: Option<&SourceSpan>,
    ) -> Result<(), EvalError> {
        let key_span = key_span.or(span);

        match object {
            Value::Object(handle) => handle.set_index(key, value, span),

            Value::List(items) => {
                let mut items = items.borrow_mut();
                let index = resolve_sequence_index(&key, items.len(), key_span)?;
                items[index] = value;
                Ok(())
            }

            Value::Map(map) => {
                let Value::String(k) = key else {
                    return Err(EvalError::index_error(
                        format!("map keys must be strings, got {}", key.type_name()),
                        key_span,
                    ));
                };
                map.borrow_mut().insert(k, value);
                Ok(())
            }

            other => Err(EvalError::type_error(
                format!("type '{}' does not support index assignment", other.type_name()),
                span,
            )),
        }
    }
}

/// Addition for the `+=` assignment form
fn add_values(left: &Value, right: &Value, span: Option<&SourceSpan>) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l + r)),
        (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
        (Value::Int(l), Value::Float(r)) => Ok(Value::Float(*l as f64 + r)),
        (Value::Float(l), Value::Int(r)) => Ok(Value::Float(l + *r as f64)),
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
        (Value::List(l), Value::List(r)) => {
            let mut combined = l.borrow().clone();
            combined.extend(r.borrow().iter().cloned());
            Ok(Value::list(combined))
        }
        _ => Err(EvalError::type_error(
            format!(
                "invalid operands for +=: {} and {}",
                left.type_name(),
                right.type_name()
            ),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Indexable, RawValue};
    use std::cell::Cell;
    use std::rc::Rc;

    fn lit(value: Value) -> Expression {
        Expression::Literal { value, span: None }
    }

    fn var(name: &str) -> Expression {
        Expression::Variable {
            name: name.to_string(),
            span: None,
        }
    }

    fn index(object: Expression, key: Expression) -> Expression {
        Expression::Index {
            object: Box::new(object),
            key: Box::new(key),
            span: None,
        }
    }

    struct Lookup {
        entries: HashMap<String, i64>,
    }

    impl Indexable for Lookup {
        fn type_name(&self) -> &str {
            "lookup"
        }

        fn get_index(
            &self,
            key: &Value,
            span: Option<&SourceSpan>,
        ) -> Result<RawValue, EvalError> {
            let Value::String(k) = key else {
                return Err(EvalError::index_error(
                    format!("lookup keys must be strings, got {}", key.type_name()),
                    span,
                ));
            };
            match self.entries.get(k) {
                Some(v) => Ok((*v).into()),
                None => Err(EvalError::index_error(
                    format!("key '{}' not found in lookup", k),
                    span,
                )),
            }
        }
    }

    #[test]
    fn test_string_positive_index() {
        let env = Environment::new();
        let expr = index(lit(Value::String("hello".to_string())), lit(Value::Int(1)));
        assert_eq!(
            env.eval_expression(&expr).unwrap(),
            Value::String("e".to_string())
        );
    }

    #[test]
    fn test_string_negative_index() {
        let env = Environment::new();
        let expr = index(lit(Value::String("hello".to_string())), lit(Value::Int(-1)));
        assert_eq!(
            env.eval_expression(&expr).unwrap(),
            Value::String("o".to_string())
        );
    }

    #[test]
    fn test_string_index_out_of_range() {
        let env = Environment::new();
        let expr = index(lit(Value::String("hello".to_string())), lit(Value::Int(10)));
        let err = env.eval_expression(&expr).unwrap_err();
        assert!(matches!(err, EvalError::Index { .. }));
        assert!(err.to_string().contains("index 10 out of range"));
    }

    #[test]
    fn test_list_index() {
        let mut env = Environment::new();
        env.define("xs", Value::list(vec![Value::Int(10), Value::Int(20)]));
        let expr = index(var("xs"), lit(Value::Int(-1)));
        assert_eq!(env.eval_expression(&expr).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_map_index_and_missing_key() {
        let mut env = Environment::new();
        let mut m = HashMap::new();
        m.insert("a".to_string(), Value::Int(1));
        env.define("cfg", Value::map(m));

        let hit = index(var("cfg"), lit(Value::String("a".to_string())));
        assert_eq!(env.eval_expression(&hit).unwrap(), Value::Int(1));

        let miss = index(var("cfg"), lit(Value::String("b".to_string())));
        let err = env.eval_expression(&miss).unwrap_err();
        assert!(err.to_string().contains("key 'b' not found"));
    }

    #[test]
    fn test_type_error_names_both_types() {
        let env = Environment::new();
        let expr = index(lit(Value::Int(42)), lit(Value::String("x".to_string())));
        let err = env.eval_expression(&expr).unwrap_err();
        assert_eq!(err.to_string(), "type 'int' has no operator [](string)");
    }

    #[test]
    fn test_host_object_result_is_canonicalized() {
        let mut env = Environment::new();
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), 1);
        env.define("obj", Value::object(Lookup { entries }));

        let expr = index(var("obj"), lit(Value::String("a".to_string())));
        assert_eq!(env.eval_expression(&expr).unwrap(), Value::Int(1));

        let miss = index(var("obj"), lit(Value::String("z".to_string())));
        let err = env.eval_expression(&miss).unwrap_err();
        assert!(err.to_string().contains("key 'z' not found in lookup"));
    }

    #[test]
    fn test_object_failure_propagates_before_key_eval() {
        let mut env = Environment::new();
        let key_evaluated = Rc::new(Cell::new(false));
        let observed = Rc::clone(&key_evaluated);
        env.register_native("observe", move |_args| {
            observed.set(true);
            Ok(Value::Int(0))
        });

        // object is undefined, so its failure must surface before the
        // key's call runs
        let expr = index(
            var("missing"),
            Expression::Call {
                name: "observe".to_string(),
                args: vec![],
                span: None,
            },
        );
        let err = env.eval_expression(&expr).unwrap_err();
        assert!(matches!(err, EvalError::Undefined { .. }));
        assert!(!key_evaluated.get());
    }

    #[test]
    fn test_eval_index_with_object_skips_object_eval() {
        let env = Environment::new();
        // The object expression is never consulted: the known value wins.
        let value = Value::String("hi".to_string());
        let result = env
            .eval_index_with_object(value, &lit(Value::Int(0)), None)
            .unwrap();
        assert_eq!(result, Value::String("h".to_string()));
    }

    #[test]
    fn test_index_assignment_to_list() {
        let mut env = Environment::new();
        env.define("xs", Value::list(vec![Value::Int(1), Value::Int(2)]));

        let module = Module {
            statements: vec![Statement::Assignment {
                target: AssignTarget::Index {
                    object: var("xs"),
                    key: lit(Value::Int(0)),
                    span: None,
                },
                op: AssignOp::Assign,
                value: lit(Value::Int(99)),
                span: None,
            }],
        };
        env.evaluate(&module).unwrap();
        assert_eq!(
            env.lookup("xs").unwrap(),
            &Value::list(vec![Value::Int(99), Value::Int(2)])
        );
    }

    #[test]
    fn test_augmented_index_assignment_evaluates_object_once() {
        let mut env = Environment::new();
        let counter = Rc::new(Cell::new(0));
        let shared = Value::list(vec![Value::Int(5)]);

        let count = Rc::clone(&counter);
        let handle = shared.clone();
        env.register_native("tick", move |_args| {
            count.set(count.get() + 1);
            Ok(handle.clone())
        });

        // tick()[0] += 1
        let module = Module {
            statements: vec![Statement::Assignment {
                target: AssignTarget::Index {
                    object: Expression::Call {
                        name: "tick".to_string(),
                        args: vec![],
                        span: None,
                    },
                    key: lit(Value::Int(0)),
                    span: None,
                },
                op: AssignOp::Add,
                value: lit(Value::Int(1)),
                span: None,
            }],
        };
        env.evaluate(&module).unwrap();

        assert_eq!(counter.get(), 1);
        assert_eq!(shared, Value::list(vec![Value::Int(6)]));
    }

    #[test]
    fn test_string_does_not_support_index_assignment() {
        let mut env = Environment::new();
        env.define("s", Value::String("abc".to_string()));

        let module = Module {
            statements: vec![Statement::Assignment {
                target: AssignTarget::Index {
                    object: var("s"),
                    key: lit(Value::Int(0)),
                    span: None,
                },
                op: AssignOp::Assign,
                value: lit(Value::String("x".to_string())),
                span: None,
            }],
        };
        let err = env.evaluate(&module).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type 'string' does not support index assignment"
        );
    }

    #[test]
    fn test_interrupt_aborts_evaluation() {
        let env = Environment::new();
        env.interrupt_flag().store(true, Ordering::Relaxed);
        let err = env.eval_expression(&lit(Value::Int(1))).unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_evaluated_module_to_json() {
        let mut env = Environment::new();
        let module = Module {
            statements: vec![Statement::Assignment {
                target: AssignTarget::Name("port".to_string()),
                op: AssignOp::Assign,
                value: lit(Value::Int(8080)),
                span: None,
            }],
        };
        let evaluated = env.evaluate(&module).unwrap();
        assert_eq!(evaluated.to_json(), serde_json::json!({"port": 8080}));
    }
}
