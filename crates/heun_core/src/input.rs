//! Solver input and parsing of the calculator's text fields.

use crate::error::InvalidInput;
use serde::{Deserialize, Serialize};

/// Raw text of the calculator form, exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub equation: String,
    pub initial_x: String,
    pub initial_y: String,
    pub step_size: String,
    pub final_x: String,
    pub corrections: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            equation: "y' = x + y".to_string(),
            initial_x: "0".to_string(),
            initial_y: "0".to_string(),
            step_size: "0.1".to_string(),
            final_x: "1".to_string(),
            corrections: "1".to_string(),
        }
    }
}

/// Parameters of one modified Euler solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverInput {
    /// Raw equation text, expected as `y' = <expression in x, y>`.
    pub equation: String,
    pub x0: f64,
    pub y0: f64,
    pub step_size: f64,
    pub x_final: f64,
    pub correction_count: u32,
}

impl SolverInput {
    pub fn new(
        equation: impl Into<String>,
        x0: f64,
        y0: f64,
        step_size: f64,
        x_final: f64,
        correction_count: u32,
    ) -> Self {
        Self {
            equation: equation.into(),
            x0,
            y0,
            step_size,
            x_final,
            correction_count,
        }
    }

    /// Parses and validates the form's text fields.
    pub fn from_fields(fields: &FormFields) -> Result<Self, InvalidInput> {
        let input = Self {
            equation: fields.equation.clone(),
            x0: parse_number("initialX", &fields.initial_x)?,
            y0: parse_number("initialY", &fields.initial_y)?,
            step_size: parse_number("stepSize", &fields.step_size)?,
            x_final: parse_number("finalX", &fields.final_x)?,
            correction_count: parse_corrections(&fields.corrections)?,
        };
        input.validate()?;
        Ok(input)
    }

    /// Rejects non-finite numbers and a zero step size.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        let fields = [
            ("x0", self.x0),
            ("y0", self.y0),
            ("h", self.step_size),
            ("xFinal", self.x_final),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(InvalidInput::NonFinite { field, value });
            }
        }
        if self.step_size == 0.0 {
            return Err(InvalidInput::ZeroStepSize);
        }
        Ok(())
    }

    /// Number of steps, `ceil((xFinal - x0) / h)` clamped at zero.
    ///
    /// A target behind `x0` (relative to the sign of `h`) yields zero steps.
    pub fn step_count(&self) -> usize {
        let raw = ((self.x_final - self.x0) / self.step_size).ceil();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            raw as usize
        }
    }
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, InvalidInput> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| InvalidInput::NotANumber {
            field,
            text: text.to_string(),
        })
}

fn parse_corrections(text: &str) -> Result<u32, InvalidInput> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| InvalidInput::InvalidCorrectionCount(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(step_size: &str, final_x: &str, corrections: &str) -> FormFields {
        FormFields {
            step_size: step_size.to_string(),
            final_x: final_x.to_string(),
            corrections: corrections.to_string(),
            ..FormFields::default()
        }
    }

    #[test]
    fn default_form_parses_to_screen_defaults() {
        let input = SolverInput::from_fields(&FormFields::default()).expect("defaults parse");
        assert_eq!(input, SolverInput::new("y' = x + y", 0.0, 0.0, 0.1, 1.0, 1));
        assert_eq!(input.step_count(), 10);
    }

    #[test]
    fn numeric_fields_tolerate_surrounding_whitespace() {
        let input = SolverInput::from_fields(&fields(" 0.25 ", "1e0", " 3")).expect("parse");
        assert_eq!(input.step_size, 0.25);
        assert_eq!(input.x_final, 1.0);
        assert_eq!(input.correction_count, 3);
    }

    #[test]
    fn non_numeric_fields_are_invalid_input() {
        assert_eq!(
            SolverInput::from_fields(&fields("abc", "1", "1")),
            Err(InvalidInput::NotANumber {
                field: "stepSize",
                text: "abc".to_string()
            })
        );
        assert!(matches!(
            SolverInput::from_fields(&fields("0.1", "", "1")),
            Err(InvalidInput::NotANumber { field: "finalX", .. })
        ));
    }

    #[test]
    fn correction_count_must_be_a_non_negative_integer() {
        for text in ["-1", "1.5", "two", ""] {
            assert_eq!(
                SolverInput::from_fields(&fields("0.1", "1", text)),
                Err(InvalidInput::InvalidCorrectionCount(text.to_string())),
                "corrections = {text:?}"
            );
        }
    }

    #[test]
    fn zero_step_size_is_rejected() {
        assert_eq!(
            SolverInput::from_fields(&fields("0", "1", "1")),
            Err(InvalidInput::ZeroStepSize)
        );
        assert_eq!(
            SolverInput::new("y' = x", 0.0, 0.0, -0.0, 1.0, 0).validate(),
            Err(InvalidInput::ZeroStepSize)
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            SolverInput::from_fields(&fields("inf", "1", "1")),
            Err(InvalidInput::NonFinite { field: "h", .. })
        ));
        assert!(matches!(
            SolverInput::new("y' = x", f64::NAN, 0.0, 0.1, 1.0, 0).validate(),
            Err(InvalidInput::NonFinite { field: "x0", .. })
        ));
    }

    #[test]
    fn fine_step_sizes_are_valid() {
        let input = SolverInput::new("y' = x", 0.0, 0.0, 1e-5, 2.0, 0);
        assert_eq!(input.validate(), Ok(()));
        assert_eq!(input.step_count(), 200_000);
    }

    #[test]
    fn step_count_uses_ceiling_and_clamps_at_zero() {
        assert_eq!(SolverInput::new("", 0.0, 0.0, 0.3, 1.0, 0).step_count(), 4);
        assert_eq!(SolverInput::new("", 1.0, 0.0, 0.1, 1.0, 0).step_count(), 0);
        assert_eq!(SolverInput::new("", 2.0, 0.0, 0.1, 1.0, 0).step_count(), 0);
        assert_eq!(SolverInput::new("", 1.0, 0.0, -0.5, 0.0, 0).step_count(), 2);
        assert_eq!(SolverInput::new("", 0.0, 0.0, -0.5, 1.0, 0).step_count(), 0);
    }
}
