use crate::builtinops::BuiltinOp;
use crate::evaluator::Environment;
use std::fmt;

/// Parsed, not yet evaluated expression tree
///
/// Nil, boolean false and the empty list are one variant. The parser never
/// produces an empty `List`; `()` and `nil` both become `Nil`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer literals
    Integer(i64),
    /// The truth literal `t`
    T,
    /// `nil`, `()`, false
    Nil,
    /// Identifiers, stored lower-cased
    Symbol(String),
    /// Non-empty lists of sub-expressions
    List(Vec<Expr>),
}

impl Expr {
    /// Build a list node, collapsing the empty list to `Nil`
    pub fn list(items: Vec<Expr>) -> Expr {
        if items.is_empty() {
            Expr::Nil
        } else {
            Expr::List(items)
        }
    }

    pub fn symbol(name: &str) -> Expr {
        Expr::Symbol(name.to_lowercase())
    }

    /// The tree as data, for `quote`
    pub fn to_value(&self) -> Value {
        match self {
            Expr::Integer(n) => Value::Integer(*n),
            Expr::T => Value::T,
            Expr::Nil => Value::Nil,
            Expr::Symbol(name) => Value::Symbol(name.clone()),
            Expr::List(items) => Value::list(items.iter().map(Expr::to_value).collect()),
        }
    }
}

/// Result of evaluation
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    T,
    /// The single false / empty-list value
    Nil,
    /// Only produced by quoting
    Symbol(String),
    /// Non-empty once normalized, see [`Value::normalize`]
    List(Vec<Value>),
    /// Host primitive from the builtin registry
    Builtin(&'static BuiltinOp),
    /// User function created by `defun`
    Function(Function),
}

impl Value {
    pub fn boolean(b: bool) -> Value {
        if b {
            Value::T
        } else {
            Value::Nil
        }
    }

    /// Build a list value, collapsing the empty list to `Nil`
    pub fn list(items: Vec<Value>) -> Value {
        if items.is_empty() {
            Value::Nil
        } else {
            Value::List(items)
        }
    }

    /// Map an empty list to the canonical `Nil`
    pub fn normalize(self) -> Value {
        match self {
            Value::List(items) if items.is_empty() => Value::Nil,
            other => other,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil) || matches!(self, Value::List(items) if items.is_empty())
    }

    /// View nil or a list as a slice of elements
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::Nil => Some(&[]),
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::T => "boolean",
            Value::Nil => "nil",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Builtin(_) => "builtin",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_nil() || other.is_nil() {
            return self.is_nil() && other.is_nil();
        }
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::T, Value::T) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Builtins are unique per name in the registry
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// A user-defined function
///
/// `closure` aliases the environment `defun` ran in rather than copying it,
/// so later bindings in that environment are visible at call time. Cloning a
/// `Function` copies the parameters and body but keeps the same alias.
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    /// When `defun` runs inside a call body, the new function is bound into
    /// the very snapshot it aliases. That `Rc` cycle is never freed, so each
    /// such call leaks one copy of the environment.
    pub(crate) closure: Environment,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The defining environment, shared
    pub fn closure(&self) -> &Environment {
        &self.closure
    }
}

impl Clone for Function {
    fn clone(&self) -> Self {
        Function {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            closure: self.closure.share(),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.body == other.body
            && self.closure.ptr_eq(&other.closure)
    }
}

// The closure usually contains this function again; printing it would recurse.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::T => write!(f, "T"),
            Expr::Nil => write!(f, "NIL"),
            Expr::Symbol(name) => write!(f, "{}", name.to_uppercase()),
            Expr::List(items) if items.is_empty() => write!(f, "NIL"),
            Expr::List(items) => write_list(f, items),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::T => write!(f, "T"),
            Value::Nil => write!(f, "NIL"),
            Value::Symbol(name) => write!(f, "{}", name.to_uppercase()),
            Value::List(items) if items.is_empty() => write!(f, "NIL"),
            Value::List(items) => write_list(f, items),
            Value::Builtin(op) => write!(f, "#<BUILTIN {}>", op.name.to_uppercase()),
            Value::Function(func) => write!(f, "#<FUNCTION {}>", func.name.to_uppercase()),
        }
    }
}
