use crate::LispError;
use crate::ast::{Expr, Function, Value};
use crate::builtinops::{OpKind, find_special_form, get_builtin_ops};
use crate::parser::parse;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Environment for variable bindings
///
/// A handle to a flat symbol table. The root environment is created once and
/// mutated in place by top-level `setq` and `defun`. A [`Function`] keeps a
/// shared handle to the environment it was defined in; every call works on a
/// [`snapshot`](Environment::snapshot) of that table, so nothing a call body
/// binds is visible outside the call.
#[derive(Default)]
pub struct Environment {
    bindings: Rc<RefCell<HashMap<String, Value>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// All bindings, sorted by name
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<_> = self
            .bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// An independent copy of every binding
    ///
    /// Lists are copied by value. A bound function keeps its own closure
    /// handle, the copy does not descend into it.
    pub fn snapshot(&self) -> Environment {
        Environment {
            bindings: Rc::new(RefCell::new(self.bindings.borrow().clone())),
        }
    }

    /// A second handle onto the same table
    pub(crate) fn share(&self) -> Environment {
        Environment {
            bindings: Rc::clone(&self.bindings),
        }
    }

    /// True when both handles refer to the same table
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.bindings, &other.bindings)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment").field("names", &names).finish()
    }
}

/// Evaluate an expression in the given environment
pub fn eval(expr: &Expr, env: &mut Environment) -> Result<Value, LispError> {
    match expr {
        Expr::Integer(n) => Ok(Value::Integer(*n)),
        Expr::T => Ok(Value::T),
        Expr::Nil => Ok(Value::Nil),
        Expr::Symbol(name) => env
            .get(name)
            .ok_or_else(|| LispError::UndefinedSymbol(name.clone())),
        Expr::List(elements) => eval_list(elements, env),
    }
}

/// Parse and evaluate one expression
pub fn eval_str(input: &str, env: &mut Environment) -> Result<Value, LispError> {
    let expr = parse(input)?;
    eval(&expr, env)
}

/// Evaluate a list expression (special form or function application)
fn eval_list(elements: &[Expr], env: &mut Environment) -> Result<Value, LispError> {
    match elements {
        [] => unreachable!("empty list expression reached the evaluator"),
        [Expr::Symbol(name), args @ ..] => {
            if let Some(op) = find_special_form(name) {
                op.validate_arity(args.len())?;
                if let OpKind::SpecialForm(special_form) = op.op_kind {
                    return special_form(args, env);
                }
            }
            eval_application(&elements[0], args, env)
        }
        [func_expr, arg_exprs @ ..] => eval_application(func_expr, arg_exprs, env),
    }
}

/// Helper function to evaluate a list of argument expressions
fn eval_args(args: &[Expr], env: &mut Environment) -> Result<Vec<Value>, LispError> {
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg_expr in args {
        evaluated_args.push(eval(arg_expr, env)?);
    }
    Ok(evaluated_args)
}

/// Evaluate quote special form
pub fn eval_quote(args: &[Expr], _env: &mut Environment) -> Result<Value, LispError> {
    match args {
        [expr] => Ok(expr.to_value()),
        _ => Err(LispError::arity_error("quote", 1, args.len())),
    }
}

/// Evaluate setq special form
pub fn eval_setq(args: &[Expr], env: &mut Environment) -> Result<Value, LispError> {
    match args {
        [Expr::Symbol(name), expr] => {
            let value = eval(expr, env)?;
            tracing::debug!(symbol = %name, value = %value, "setq");
            env.define(name.clone(), value.clone());
            Ok(value)
        }
        [target, _] => Err(LispError::NotASymbol(target.to_string())),
        _ => Err(LispError::arity_error("setq", 2, args.len())),
    }
}

/// Parameter names of a defun form; `nil` / `()` is the empty list
fn parameter_names(params: &Expr) -> Result<Vec<String>, LispError> {
    match params {
        Expr::Nil => Ok(Vec::new()),
        Expr::List(items) => items
            .iter()
            .map(|param| match param {
                Expr::Symbol(name) => Ok(name.clone()),
                other => Err(LispError::NotASymbol(other.to_string())),
            })
            .collect(),
        other => Err(LispError::NotAList(other.to_string())),
    }
}

/// Evaluate defun special form
pub fn eval_defun(args: &[Expr], env: &mut Environment) -> Result<Value, LispError> {
    match args {
        [Expr::Symbol(name), params, body] => {
            let function = Function {
                name: name.clone(),
                params: parameter_names(params)?,
                body: body.clone(),
                closure: env.share(),
            };
            tracing::debug!(symbol = %name, arity = function.arity(), "defun");
            env.define(name.clone(), Value::Function(function));
            Ok(Value::Symbol(name.clone()))
        }
        [target, _, _] => Err(LispError::NotASymbol(target.to_string())),
        _ => Err(LispError::arity_error("defun", 3, args.len())),
    }
}

/// Evaluate if special form. Only nil is false.
pub fn eval_if(args: &[Expr], env: &mut Environment) -> Result<Value, LispError> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            if eval(condition_expr, env)?.is_nil() {
                eval(else_expr, env)
            } else {
                eval(then_expr, env)
            }
        }
        _ => Err(LispError::arity_error("if", 3, args.len())),
    }
}

/// Evaluate function application
fn eval_application(
    func_expr: &Expr,
    arg_exprs: &[Expr],
    env: &mut Environment,
) -> Result<Value, LispError> {
    let func = eval(func_expr, env)?;
    let args = eval_args(arg_exprs, env)?;
    apply_function(&func, &args)
}

/// Apply a callable value to evaluated arguments
pub fn apply_function(func: &Value, args: &[Value]) -> Result<Value, LispError> {
    match func {
        Value::Builtin(op) => op.call(args),
        Value::Function(function) => call_function(function, args),
        other => Err(LispError::NotCallable(other.to_string())),
    }
}

/// Call a user function
///
/// The body runs in a fresh snapshot of the defining environment with the
/// parameters bound on top, so it sees that environment as it is now and
/// cannot change it.
pub fn call_function(function: &Function, args: &[Value]) -> Result<Value, LispError> {
    if function.arity() != args.len() {
        return Err(LispError::arity_error(
            &function.name,
            function.arity(),
            args.len(),
        ));
    }
    tracing::trace!(function = %function.name, args = args.len(), "call");

    let mut call_env = function.closure.snapshot();
    for (param, arg) in function.params.iter().zip(args) {
        call_env.define(param.clone(), arg.clone());
    }
    eval(&function.body, &mut call_env).map(Value::normalize)
}

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();
    for op in get_builtin_ops() {
        if let OpKind::Function(_) = op.op_kind {
            env.define(op.name, Value::Builtin(op));
        }
    }
    env
}
