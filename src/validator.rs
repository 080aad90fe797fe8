//! Static validation pass for Sable
//!
//! Walks a module before execution and checks that every name an
//! expression relies on can resolve. Nothing is evaluated: validation is a
//! cheap best-effort pass, and the dynamic dispatch at evaluation time
//! remains the authority on type errors.
//!
//! Index expressions only have their object sub-expression validated; the
//! key is inherently dynamic and is checked when the index is evaluated.

use std::collections::HashSet;

use crate::ast::{AssignOp, AssignTarget, Expression, Module, Statement};
use crate::error::ValidationError;
use crate::evaluator::Environment;
use crate::functions::FunctionRegistry;

/// Validator with the set of names that are resolvable without evaluation
pub struct Validator {
    defined: HashSet<String>,
    errors: Vec<ValidationError>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator that knows the built-in function names
    pub fn new() -> Self {
        Self {
            defined: FunctionRegistry::new().list_functions().into_iter().collect(),
            errors: Vec::new(),
        }
    }

    /// Create a validator seeded with an environment's resolvable names
    pub fn with_environment(env: &Environment) -> Self {
        Self {
            defined: env.resolvable_names().into_iter().collect(),
            errors: Vec::new(),
        }
    }

    /// Validate a module, collecting every resolution error
    pub fn check_module(&mut self, module: &Module) -> Result<(), Vec<ValidationError>> {
        self.errors.clear();

        for statement in &module.statements {
            self.check_statement(statement);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Assignment {
                target,
                op,
                value,
                span,
            } => {
                self.check_expression(value);

                match target {
                    AssignTarget::Name(name) => {
                        if *op == AssignOp::Add && !self.defined.contains(name) {
                            self.errors.push(ValidationError::new(
                                format!("cannot apply += to undefined variable '{}'", name),
                                span.as_ref(),
                            ));
                        }
                        // The binding exists for every later statement
                        self.defined.insert(name.clone());
                    }
                    AssignTarget::Index { object, .. } => {
                        // Same asymmetry as index reads: the key is not
                        // statically validated.
                        self.check_expression(object);
                    }
                }
            }

            Statement::Expression { expr, .. } => self.check_expression(expr),
        }
    }

    fn check_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal { .. } => {}

            Expression::Variable { name, span } => {
                if !self.defined.contains(name) {
                    self.errors.push(ValidationError::new(
                        format!("undefined variable: {}", name),
                        span.as_ref(),
                    ));
                }
            }

            Expression::Index { object, .. } => {
                self.check_expression(object);
            }

            Expression::Call { name, args, span } => {
                if !self.defined.contains(name) {
                    self.errors.push(ValidationError::new(
                        format!("unknown function: {}", name),
                        span.as_ref(),
                    ));
                }
                for arg in args {
                    self.check_expression(arg);
                }
            }

            Expression::List { elements, .. } => {
                for element in elements {
                    self.check_expression(element);
                }
            }

            Expression::Map { entries, .. } => {
                for (_, value) in entries {
                    self.check_expression(value);
                }
            }
        }
    }
}
