//! Error taxonomy for expression evaluation and solving.

use thiserror::Error;

/// Failure to turn an expression into a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Expected ')'")]
    ExpectedClosingParen,
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Function {name} expects {expected} argument(s), got {found}")]
    WrongArgumentCount {
        name: String,
        expected: &'static str,
        found: usize,
    },
    #[error("Expression evaluated to NaN")]
    NotANumber,
    #[error("Malformed bytecode: stack underflow")]
    StackUnderflow,
    /// Raised by evaluators other than the bundled engine.
    #[error("{0}")]
    Custom(String),
}

/// Malformed or out-of-domain user input, detected before any stepping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("Field `{field}` is not a number: {text:?}")]
    NotANumber { field: &'static str, text: String },
    #[error("Correction count must be a non-negative integer: {0:?}")]
    InvalidCorrectionCount(String),
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("Step size h must be non-zero")]
    ZeroStepSize,
}

/// Terminal failure of a solve call. No partial trace accompanies it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("Failed to evaluate '{expression}' at x = {x}, y = {y}: {source}")]
    Evaluation {
        expression: String,
        x: f64,
        y: f64,
        #[source]
        source: EvalError,
    },
    #[error("Solve interrupted after {completed} of {total} steps")]
    Interrupted { completed: usize, total: usize },
}

impl SolveError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SolveError::InvalidInput(_))
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, SolveError::Evaluation { .. })
    }
}
