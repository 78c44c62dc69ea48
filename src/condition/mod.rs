//! The safe condition grammar used by event triggers and control blocks.
//!
//! Condition strings written in the designer (`score >= 10 and name contains
//! "vip"`) are compiled to a small [`Expr`] AST and interpreted directly
//! against the execution context. No string is ever handed to a
//! general-purpose evaluator.

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{CmpOp, Expr, Value};
pub use eval::evaluate;
pub use parser::parse;

use crate::error::ConditionError;
use ahash::AHashMap;

/// A parsed condition, keeping its source text for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the condition and collapses the result to a boolean.
    pub fn eval_truthy(&self, variables: &AHashMap<String, Value>) -> Result<bool, ConditionError> {
        Ok(eval::evaluate(&self.expr, variables)?.is_truthy())
    }
}
