//! Adapter between the user's equation text and an [`ExpressionEvaluator`].

use crate::error::SolveError;
use crate::traits::{Bindings, ExpressionEvaluator, ScalarOde};

/// Turns `y' = <expr>` into `<expr>`.
///
/// Removes the first `y'`, then the first `=`, then surrounding whitespace.
/// Text without the markers passes through trimmed.
pub fn strip_equation_markers(equation: &str) -> String {
    equation
        .replacen("y'", "", 1)
        .replacen('=', "", 1)
        .trim()
        .to_string()
}

/// Evaluates the right-hand side of `equation` at `(x, y)`.
pub fn evaluate_f<E: ExpressionEvaluator + ?Sized>(
    evaluator: &E,
    equation: &str,
    x: f64,
    y: f64,
) -> Result<f64, SolveError> {
    let expression = strip_equation_markers(equation);
    evaluator
        .evaluate(&expression, Bindings::new(x, y))
        .map_err(|source| SolveError::Evaluation {
            expression,
            x,
            y,
            source,
        })
}

/// `f(x, y)` backed by an evaluator and the raw equation text.
pub struct RightHandSide<'a, E: ?Sized> {
    evaluator: &'a E,
    equation: &'a str,
}

impl<'a, E: ExpressionEvaluator + ?Sized> RightHandSide<'a, E> {
    pub fn new(evaluator: &'a E, equation: &'a str) -> Self {
        Self {
            evaluator,
            equation,
        }
    }

    pub fn equation(&self) -> &str {
        self.equation
    }
}

impl<E: ExpressionEvaluator + ?Sized> ScalarOde for RightHandSide<'_, E> {
    fn slope(&self, x: f64, y: f64) -> Result<f64, SolveError> {
        evaluate_f(self.evaluator, self.equation, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use std::cell::RefCell;

    /// Records every expression it is asked to evaluate.
    struct RecordingEvaluator {
        seen: RefCell<Vec<(String, Bindings)>>,
    }

    impl ExpressionEvaluator for RecordingEvaluator {
        fn evaluate(&self, expression: &str, bindings: Bindings) -> Result<f64, EvalError> {
            self.seen
                .borrow_mut()
                .push((expression.to_string(), bindings));
            if expression.is_empty() {
                return Err(EvalError::EmptyExpression);
            }
            Ok(bindings.x * 10.0 + bindings.y)
        }
    }

    fn recorder() -> RecordingEvaluator {
        RecordingEvaluator {
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn strips_prime_and_equals_markers() {
        assert_eq!(strip_equation_markers("y' = x + y"), "x + y");
        assert_eq!(strip_equation_markers("  y'=x*y  "), "x*y");
        assert_eq!(strip_equation_markers("x - y"), "x - y");
    }

    #[test]
    fn strips_only_first_occurrence_of_each_marker() {
        assert_eq!(strip_equation_markers("y' = x = y"), "x = y");
        assert_eq!(strip_equation_markers("y' = y'"), "y'");
    }

    #[test]
    fn evaluate_f_passes_stripped_expression_and_bindings() {
        let evaluator = recorder();
        let value = evaluate_f(&evaluator, "y' = x + y", 1.0, 2.0).expect("evaluation");
        assert_eq!(value, 12.0);

        let seen = evaluator.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "x + y");
        assert_eq!(seen[0].1, Bindings::new(1.0, 2.0));
    }

    #[test]
    fn evaluate_f_wraps_failures_with_expression_and_point() {
        let evaluator = recorder();
        let err = evaluate_f(&evaluator, "y' =", 0.5, -1.0).expect_err("empty rhs");
        match err {
            SolveError::Evaluation {
                expression,
                x,
                y,
                source,
            } => {
                assert_eq!(expression, "");
                assert_eq!(x, 0.5);
                assert_eq!(y, -1.0);
                assert_eq!(source, EvalError::EmptyExpression);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn right_hand_side_evaluates_on_every_call() {
        let evaluator = recorder();
        let rhs = RightHandSide::new(&evaluator, "y' = x");
        rhs.slope(1.0, 0.0).unwrap();
        rhs.slope(1.0, 0.0).unwrap();
        assert_eq!(evaluator.seen.borrow().len(), 2);
        assert_eq!(rhs.equation(), "y' = x");
    }
}
