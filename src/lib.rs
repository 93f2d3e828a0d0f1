//! A minimal Lisp interpreter.
//!
//! Source text goes through [`parser::parse`] (tokenize, validate, build) to an
//! [`Expr`] tree, which [`evaluator::eval`] reduces to a [`Value`] against a
//! mutable [`Environment`]. Values render through their `Display` impl.
//!
//! ```
//! use tinylisp::{evaluator, parser};
//!
//! let mut env = evaluator::create_global_env();
//! let expr = parser::parse("(defun sq (x) (* x x))").unwrap();
//! evaluator::eval(&expr, &mut env).unwrap();
//!
//! let expr = parser::parse("(SQ 7)").unwrap();
//! assert_eq!(evaluator::eval(&expr, &mut env).unwrap().to_string(), "49");
//! ```

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LispError {
    #[error("unpaired \"(\"")]
    UnbalancedOpen,

    #[error("unpaired \")\"")]
    UnbalancedClose,

    #[error("parens nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("need exactly one top-level item, found {found}")]
    MultipleTopLevelForms { found: usize },

    #[error("integer literal out of range: {0}")]
    IntegerOverflow(String),

    #[error("{} expected {expected} arguments, got {got}", .name.to_uppercase())]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{0} is not a symbol")]
    NotASymbol(String),

    #[error("{0} is not a list")]
    NotAList(String),

    #[error("cannot find symbol {}", .0.to_uppercase())]
    UndefinedSymbol(String),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("evaluation error: {0}")]
    EvalError(String),
}

impl LispError {
    pub fn arity_error(name: &str, expected: usize, got: usize) -> Self {
        LispError::ArityMismatch {
            name: name.to_string(),
            expected,
            got,
        }
    }

    /// True for errors raised before evaluation starts.
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            LispError::UnbalancedOpen
                | LispError::UnbalancedClose
                | LispError::TooDeep { .. }
                | LispError::MultipleTopLevelForms { .. }
                | LispError::IntegerOverflow(_)
        )
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;

pub use ast::{Expr, Function, Value};
pub use evaluator::Environment;
