//! Built-in operations registry.
//!
//! Every name the interpreter knows before any user input lives here, in one
//! table. Entries come in two kinds:
//!
//! - **Functions**: receive evaluated arguments (e.g. `+`, `car`, `equal`).
//!   [`crate::evaluator::create_global_env`] binds each of them in the root
//!   environment, so user code can rebind or pass them around like any value.
//! - **Special forms**: receive the unevaluated argument expressions and the
//!   current environment (`quote`, `setq`, `defun`, `if`). They are never
//!   bound in an environment; the evaluator recognizes them by the head symbol.
//!
//! Arity is fixed per entry and checked before the implementation runs, so a
//! wrong argument count always surfaces as [`LispError::ArityMismatch`] naming
//! the operation.
//!
//! All integer operations are checked: overflow and division by zero are
//! reported as [`LispError::EvalError`] rather than wrapping or panicking.
//! Booleans are not integers, `(+ t 1)` is a type error.

use crate::LispError;
use crate::ast::{Expr, Value};
use crate::evaluator::{Environment, eval_defun, eval_if, eval_quote, eval_setq};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Represents the expected number of arguments for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments required
    Exact(usize),
    /// Any number of arguments (0 or more)
    Any,
}

impl Arity {
    /// Check if the given number of arguments is valid for this arity constraint
    pub fn validate(&self, name: &str, arg_count: usize) -> Result<(), LispError> {
        match self {
            Arity::Exact(n) if *n != arg_count => {
                Err(LispError::arity_error(name, *n, arg_count))
            }
            _ => Ok(()),
        }
    }
}

/// Signature of a primitive taking evaluated arguments
pub type BuiltinFn = fn(&[Value]) -> Result<Value, LispError>;

/// Signature of a special form taking unevaluated arguments
pub type SpecialFormFn = fn(&[Expr], &mut Environment) -> Result<Value, LispError>;

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone, Copy)]
pub enum OpKind {
    Function(BuiltinFn),
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// Lower-case name the operation is bound under
    pub name: &'static str,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl BuiltinOp {
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    pub fn validate_arity(&self, arg_count: usize) -> Result<(), LispError> {
        self.arity.validate(self.name, arg_count)
    }

    /// Apply a function op to evaluated arguments. The result is nil-normalized.
    pub fn call(&self, args: &[Value]) -> Result<Value, LispError> {
        self.validate_arity(args.len())?;
        match self.op_kind {
            OpKind::Function(func) => func(args).map(Value::normalize),
            OpKind::SpecialForm(_) => Err(LispError::NotCallable(self.name.to_uppercase())),
        }
    }
}

//
// Builtin Function Implementations
//

fn integer_type_error(id: &str, args: &[Value]) -> LispError {
    let got = args
        .iter()
        .find(|arg| !matches!(arg, Value::Integer(_)))
        .map_or("nothing", Value::type_name);
    LispError::TypeError(format!("{} requires integers, got {}", id, got))
}

fn list_arg<'a>(id: &str, value: &'a Value) -> Result<&'a [Value], LispError> {
    value.as_list().ok_or_else(|| {
        LispError::TypeError(format!("{} requires a list, got {}", id, value.type_name()))
    })
}

macro_rules! checked_arithmetic {
    ($name:ident, $method:ident, $op_str:expr, $what:expr) => {
        pub fn $name(args: &[Value]) -> Result<Value, LispError> {
            match args {
                [Value::Integer(a), Value::Integer(b)] => {
                    a.$method(*b).map(Value::Integer).ok_or_else(|| {
                        LispError::EvalError(concat!("integer overflow in ", $what).to_string())
                    })
                }
                [_, _] => Err(integer_type_error($op_str, args)),
                _ => Err(LispError::arity_error($op_str, 2, args.len())),
            }
        }
    };
}

checked_arithmetic!(builtin_add, checked_add, "+", "addition");
checked_arithmetic!(builtin_sub, checked_sub, "-", "subtraction");
checked_arithmetic!(builtin_mul, checked_mul, "*", "multiplication");

// Macro to generate numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        pub fn $name(args: &[Value]) -> Result<Value, LispError> {
            match args {
                [Value::Integer(a), Value::Integer(b)] => Ok(Value::boolean(a $op b)),
                [_, _] => Err(integer_type_error($op_str, args)),
                _ => Err(LispError::arity_error($op_str, 2, args.len())),
            }
        }
    };
}

numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_le, <=, "<=");
numeric_comparison!(builtin_gt, >, ">");
numeric_comparison!(builtin_ge, >=, ">=");
numeric_comparison!(builtin_eq, ==, "=");
numeric_comparison!(builtin_ne, !=, "/=");

/// Floor division: the quotient rounds toward negative infinity
pub fn builtin_div(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [Value::Integer(_), Value::Integer(0)] => {
            Err(LispError::EvalError("division by zero".to_string()))
        }
        [Value::Integer(a), Value::Integer(b)] => {
            let quotient = a.checked_div(*b).ok_or_else(|| {
                LispError::EvalError("integer overflow in division".to_string())
            })?;
            if a % b != 0 && ((*a < 0) != (*b < 0)) {
                Ok(Value::Integer(quotient - 1))
            } else {
                Ok(Value::Integer(quotient))
            }
        }
        [_, _] => Err(integer_type_error("/", args)),
        _ => Err(LispError::arity_error("/", 2, args.len())),
    }
}

pub fn builtin_abs(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [Value::Integer(n)] => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| LispError::EvalError("integer overflow in abs".to_string())),
        [_] => Err(integer_type_error("abs", args)),
        _ => Err(LispError::arity_error("abs", 1, args.len())),
    }
}

pub fn builtin_and(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [a, b] => Ok(Value::boolean(!a.is_nil() && !b.is_nil())),
        _ => Err(LispError::arity_error("and", 2, args.len())),
    }
}

pub fn builtin_or(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [a, b] => Ok(Value::boolean(!a.is_nil() || !b.is_nil())),
        _ => Err(LispError::arity_error("or", 2, args.len())),
    }
}

/// Shared by `not` and `null`: only nil is false
pub fn builtin_null(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [value] => Ok(Value::boolean(value.is_nil())),
        _ => Err(LispError::arity_error("null", 1, args.len())),
    }
}

pub fn builtin_atom(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [Value::List(items)] => Ok(Value::boolean(items.is_empty())),
        [_] => Ok(Value::T),
        _ => Err(LispError::arity_error("atom", 1, args.len())),
    }
}

pub fn builtin_equal(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [first, second] => Ok(Value::boolean(first == second)),
        _ => Err(LispError::arity_error("equal", 2, args.len())),
    }
}

fn head_of(id: &str, args: &[Value]) -> Result<Value, LispError> {
    match args {
        [value] => list_arg(id, value)?
            .first()
            .cloned()
            .ok_or_else(|| LispError::EvalError(format!("{} of nil", id))),
        _ => Err(LispError::arity_error(id, 1, args.len())),
    }
}

pub fn builtin_car(args: &[Value]) -> Result<Value, LispError> {
    head_of("car", args)
}

pub fn builtin_first(args: &[Value]) -> Result<Value, LispError> {
    head_of("first", args)
}

pub fn builtin_cdr(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [value] => match list_arg("cdr", value)? {
            [] => Ok(Value::Nil),
            [_, rest @ ..] => Ok(Value::list(rest.to_vec())),
        },
        _ => Err(LispError::arity_error("cdr", 1, args.len())),
    }
}

pub fn builtin_cons(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [first, rest] => {
            let rest = list_arg("cons", rest)?;
            let mut new_list = Vec::with_capacity(rest.len() + 1);
            new_list.push(first.clone());
            new_list.extend_from_slice(rest);
            Ok(Value::List(new_list))
        }
        _ => Err(LispError::arity_error("cons", 2, args.len())),
    }
}

pub fn builtin_append(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [first, second] => {
            let mut joined = list_arg("append", first)?.to_vec();
            joined.extend_from_slice(list_arg("append", second)?);
            Ok(Value::list(joined))
        }
        _ => Err(LispError::arity_error("append", 2, args.len())),
    }
}

pub fn builtin_list(args: &[Value]) -> Result<Value, LispError> {
    Ok(Value::list(args.to_vec()))
}

/// The last element wrapped in a one-element list
pub fn builtin_last(args: &[Value]) -> Result<Value, LispError> {
    match args {
        [value] => list_arg("last", value)?
            .last()
            .map(|last| Value::List(vec![last.clone()]))
            .ok_or_else(|| LispError::EvalError("last of nil".to_string())),
        _ => Err(LispError::arity_error("last", 1, args.len())),
    }
}

/// Global registry of all built-in operations as a simple array
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Special forms
    BuiltinOp {
        name: "quote",
        op_kind: OpKind::SpecialForm(eval_quote),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "setq",
        op_kind: OpKind::SpecialForm(eval_setq),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "defun",
        op_kind: OpKind::SpecialForm(eval_defun),
        arity: Arity::Exact(3),
    },
    BuiltinOp {
        name: "if",
        op_kind: OpKind::SpecialForm(eval_if),
        arity: Arity::Exact(3),
    },
    // Arithmetic operations
    BuiltinOp {
        name: "+",
        op_kind: OpKind::Function(builtin_add),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "-",
        op_kind: OpKind::Function(builtin_sub),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "*",
        op_kind: OpKind::Function(builtin_mul),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "/",
        op_kind: OpKind::Function(builtin_div),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "abs",
        op_kind: OpKind::Function(builtin_abs),
        arity: Arity::Exact(1),
    },
    // Comparison operations
    BuiltinOp {
        name: "<",
        op_kind: OpKind::Function(builtin_lt),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "<=",
        op_kind: OpKind::Function(builtin_le),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: ">",
        op_kind: OpKind::Function(builtin_gt),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: ">=",
        op_kind: OpKind::Function(builtin_ge),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "=",
        op_kind: OpKind::Function(builtin_eq),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "/=",
        op_kind: OpKind::Function(builtin_ne),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "equal",
        op_kind: OpKind::Function(builtin_equal),
        arity: Arity::Exact(2),
    },
    // Logical operations (both arguments are evaluated)
    BuiltinOp {
        name: "and",
        op_kind: OpKind::Function(builtin_and),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "or",
        op_kind: OpKind::Function(builtin_or),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "not",
        op_kind: OpKind::Function(builtin_null),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "null",
        op_kind: OpKind::Function(builtin_null),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "atom",
        op_kind: OpKind::Function(builtin_atom),
        arity: Arity::Exact(1),
    },
    // List operations
    BuiltinOp {
        name: "car",
        op_kind: OpKind::Function(builtin_car),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "first",
        op_kind: OpKind::Function(builtin_first),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "cdr",
        op_kind: OpKind::Function(builtin_cdr),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "cons",
        op_kind: OpKind::Function(builtin_cons),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "append",
        op_kind: OpKind::Function(builtin_append),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "list",
        op_kind: OpKind::Function(builtin_list),
        arity: Arity::Any,
    },
    BuiltinOp {
        name: "last",
        op_kind: OpKind::Function(builtin_last),
        arity: Arity::Exact(1),
    },
];

/// Lazy static map from name to BuiltinOp (private - use find_builtin_op)
static BUILTIN_BY_NAME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, op)).collect());

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find a builtin op (function or special form) by name
pub fn find_builtin_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_NAME.get(name).copied()
}

/// Find a special form by the head symbol of a list
pub fn find_special_form(name: &str) -> Option<&'static BuiltinOp> {
    find_builtin_op(name).filter(|op| op.is_special_form())
}
