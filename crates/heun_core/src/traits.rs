use crate::error::{EvalError, SolveError};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types the equation VM can evaluate over.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Variable binding handed to an expression evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bindings {
    pub x: f64,
    pub y: f64,
}

impl Bindings {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Capability that turns an expression over `x` and `y` into a number.
///
/// The stepper only ever talks to this trait, so any engine (or a test stub)
/// can stand in for the bundled [`crate::equation_engine::EngineEvaluator`].
pub trait ExpressionEvaluator {
    fn evaluate(&self, expression: &str, bindings: Bindings) -> Result<f64, EvalError>;
}

impl<E: ExpressionEvaluator + ?Sized> ExpressionEvaluator for &E {
    fn evaluate(&self, expression: &str, bindings: Bindings) -> Result<f64, EvalError> {
        (**self).evaluate(expression, bindings)
    }
}

/// A scalar first-order ODE `y' = f(x, y)`.
pub trait ScalarOde {
    /// Evaluates the right-hand side at `(x, y)`.
    fn slope(&self, x: f64, y: f64) -> Result<f64, SolveError>;
}
