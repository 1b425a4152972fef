//! Restricted arithmetic/boolean expression language used by KPI rule conditions
//! and the weights-editor formulas.
//!
//! Source text is tokenized with `logos`, parsed into an [`Expr`] tree by a Pratt
//! parser and interpreted against a [`Variables`] table. The only callable names
//! are the helpers `min`, `max`, `clamp` and `if`; nothing else is reachable from
//! an expression.

pub mod ast;
mod eval;
mod lexer;
mod parser;
mod value;

use std::fmt;
use std::str::FromStr;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use value::{Value, Variables};

/// A parsed expression together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn evaluate(&self, variables: &Variables) -> Result<Value, EvalError> {
        eval::evaluate(&self.root, variables)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(source: &str, variables: &Variables) -> Result<Value, ExpressionError> {
    let expression = Expression::parse(source)?;
    Ok(expression.evaluate(variables)?)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{fragment}' at offset {offset}")]
    UnexpectedCharacter { offset: usize, fragment: String },
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { offset: usize, found: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nests too deeply at offset {offset}")]
    TooDeep { offset: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UnresolvedVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },
    #[error("'{operation}' cannot be applied to a {found}")]
    TypeMismatch {
        operation: String,
        found: &'static str,
    },
    #[error("'{operation}' produced a non-finite result")]
    NonFinite { operation: &'static str },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}
