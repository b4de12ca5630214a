pub mod equation_engine;
pub mod error;
pub mod input;
pub mod rhs;
pub mod settings;
pub mod solvers;
pub mod trace;
/// The `heun_core` crate solves `y' = f(x, y)` with the modified Euler
/// (Heun) predictor-corrector method and records every intermediate value.
///
/// Key components:
/// - **Traits**: `ExpressionEvaluator` (the injected `f(x, y)` capability), `ScalarOde`.
/// - **Equation Engine**: A bytecode VM that evaluates user-typed right-hand sides.
/// - **Rhs**: Strips the `y' =` markers and routes evaluation through the engine.
/// - **Solvers**: The fixed-step modified Euler stepper and the form-to-outcome pipeline.
/// - **Trace / Settings**: Display lines and the precision they are rendered with.
pub mod traits;

pub use error::{EvalError, InvalidInput, SolveError};
pub use input::{FormFields, SolverInput};
pub use settings::Settings;
pub use solvers::{solve, solve_form, SolveOutcome, FAILURE_MESSAGE};
pub use trace::{StepTrace, TraceLine, TraceLineKind};
