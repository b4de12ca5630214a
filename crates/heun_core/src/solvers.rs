use crate::error::SolveError;
use crate::input::{FormFields, SolverInput};
use crate::rhs::RightHandSide;
use crate::settings::Settings;
use crate::trace::{StepTrace, TraceBuilder};
use crate::traits::{ExpressionEvaluator, ScalarOde};
use log::{debug, error, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// The single line shown in place of a trace when a solve fails.
pub const FAILURE_MESSAGE: &str = "Error solving equation. Please check your inputs.";

/// Modified Euler (Heun) predictor-corrector with a fixed number of corrector passes.
///
/// Each step evaluates `f` once for the predictor and once per correction:
///
/// ```text
///   slope1 = f(x, y)
///   y_c    = y + h * slope1
///   repeat corrections times:
///     slope2 = f(x + h, y_c)
///     y_c    = y + h/2 * (slope1 + slope2)
/// ```
///
/// `slope1` is never re-evaluated; the corrector is a fixed-point iteration on `y_c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiedEuler {
    h: f64,
    corrections: u32,
}

impl ModifiedEuler {
    pub fn new(h: f64, corrections: u32) -> Self {
        Self { h, corrections }
    }

    /// Performs one step, updating `x` and `y` in place.
    pub(crate) fn step(
        &self,
        ode: &impl ScalarOde,
        x: &mut f64,
        y: &mut f64,
        trace: &mut TraceBuilder,
    ) -> Result<(), SolveError> {
        let x0 = *x;
        let y0 = *y;

        let slope1 = ode.slope(x0, y0)?;
        let predicted = y0 + self.h * slope1;
        trace.predictor(x0, y0, slope1, predicted);

        let x1 = x0 + self.h;
        let mut corrected = predicted;
        for j in 0..self.corrections {
            let eval_y = corrected;
            let slope2 = ode.slope(x1, eval_y)?;
            corrected = y0 + (self.h / 2.0) * (slope1 + slope2);
            trace.correction(j, x1, eval_y, slope2, corrected);
        }

        *x = x1;
        *y = corrected;
        Ok(())
    }
}

/// Integrates `ode` from `input.x0` to `input.x_final`.
///
/// Any failure discards the partial trace. When `interrupt` is given it is
/// checked before every step.
pub fn integrate(
    ode: &impl ScalarOde,
    input: &SolverInput,
    settings: Settings,
    interrupt: Option<&AtomicBool>,
) -> Result<StepTrace, SolveError> {
    input.validate()?;

    let steps = input.step_count();
    let h = input.step_size;
    let mut trace = TraceBuilder::new(settings);
    trace.header(
        input.x0,
        input.y0,
        input.x_final,
        h,
        steps,
        input.correction_count,
    );

    let method = ModifiedEuler::new(h, input.correction_count);
    let mut x = input.x0;
    let mut y = input.y0;

    for i in 0..steps {
        if interrupt.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!("Solve interrupted after {i} of {steps} steps");
            return Err(SolveError::Interrupted {
                completed: i,
                total: steps,
            });
        }
        trace.step_divider(i);
        method.step(ode, &mut x, &mut y, &mut trace)?;
    }

    debug!("Solved in {steps} steps: y({x}) = {y}");
    Ok(trace.finish(x, y, steps))
}

/// Solves `input.equation` with the modified Euler method.
pub fn solve<E: ExpressionEvaluator + ?Sized>(
    input: &SolverInput,
    settings: Settings,
    evaluator: &E,
) -> Result<StepTrace, SolveError> {
    let rhs = RightHandSide::new(evaluator, &input.equation);
    debug!(
        "Solving '{}' from x = {} to x = {} with h = {}",
        rhs.equation(),
        input.x0,
        input.x_final,
        input.step_size
    );
    integrate(&rhs, input, settings, None)
}

/// Like [`solve`], but stops between steps once `interrupt` is raised.
pub fn solve_with_interrupt<E: ExpressionEvaluator + ?Sized>(
    input: &SolverInput,
    settings: Settings,
    evaluator: &E,
    interrupt: &AtomicBool,
) -> Result<StepTrace, SolveError> {
    let rhs = RightHandSide::new(evaluator, &input.equation);
    integrate(&rhs, input, settings, Some(interrupt))
}

/// What the calculator screen shows after the solve button is pressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SolveOutcome {
    Solved { trace: StepTrace },
    /// `detail` is for diagnostics only; the screen shows `message`.
    Failed { message: String, detail: String },
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved { .. })
    }

    /// Lines to render: the full trace, or the single failure message.
    pub fn lines(&self) -> Vec<String> {
        match self {
            SolveOutcome::Solved { trace } => trace.texts(),
            SolveOutcome::Failed { message, .. } => vec![message.clone()],
        }
    }
}

impl From<Result<StepTrace, SolveError>> for SolveOutcome {
    fn from(result: Result<StepTrace, SolveError>) -> Self {
        match result {
            Ok(trace) => SolveOutcome::Solved { trace },
            Err(err) => {
                error!("Error solving equation: {err}");
                SolveOutcome::Failed {
                    message: FAILURE_MESSAGE.to_string(),
                    detail: err.to_string(),
                }
            }
        }
    }
}

/// Parses the form, solves, and folds any failure into the display message.
pub fn solve_form<E: ExpressionEvaluator + ?Sized>(
    fields: &FormFields,
    settings: Settings,
    evaluator: &E,
) -> SolveOutcome {
    SolverInput::from_fields(fields)
        .map_err(SolveError::from)
        .and_then(|input| solve(&input, settings, evaluator))
        .into()
}
