//! Calculator-screen bindings: settings plus the solve button.

use anyhow::{anyhow, Context};
use heun_core::equation_engine::EngineEvaluator;
use heun_core::{solve_form, FormFields, Settings, SolveOutcome};
use js_sys::Array;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmCalculator {
    settings: Settings,
    evaluator: EngineEvaluator,
}

impl Default for WasmCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmCalculator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmCalculator {
        console_error_panic_hook::set_once();

        WasmCalculator {
            settings: Settings::default(),
            evaluator: EngineEvaluator::new(),
        }
    }

    pub fn precision(&self) -> u8 {
        self.settings.precision()
    }

    pub fn set_precision(&mut self, precision: u8) {
        self.settings.set_precision(precision);
    }

    pub fn increment_precision(&mut self) -> u8 {
        self.settings.increment_precision();
        self.settings.precision()
    }

    pub fn decrement_precision(&mut self) -> u8 {
        self.settings.decrement_precision();
        self.settings.precision()
    }

    /// Replaces the settings from a JS object such as `{ precision: 6 }`.
    pub fn load_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.settings = decode_settings(settings).map_err(to_js_error)?;
        Ok(())
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.settings)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize settings: {err}")))
    }

    /// Solves from a `{ equation, initialX, initialY, stepSize, finalX, corrections }`
    /// object and returns the tagged outcome with its full trace.
    pub fn solve(&self, fields: JsValue) -> Result<JsValue, JsValue> {
        let fields = decode_fields(fields).map_err(to_js_error)?;
        let outcome = self.run(&fields);
        serde_wasm_bindgen::to_value(&outcome)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize outcome: {err}")))
    }

    /// Solves from the six raw text fields and returns the lines to display.
    pub fn solve_lines(
        &self,
        equation: String,
        initial_x: String,
        initial_y: String,
        step_size: String,
        final_x: String,
        corrections: String,
    ) -> Array {
        let fields = FormFields {
            equation,
            initial_x,
            initial_y,
            step_size,
            final_x,
            corrections,
        };
        self.run(&fields)
            .lines()
            .into_iter()
            .map(|line| JsValue::from_str(&line))
            .collect()
    }
}

impl WasmCalculator {
    /// Runs one solve with the precision in effect right now.
    pub(crate) fn run(&self, fields: &FormFields) -> SolveOutcome {
        solve_form(fields, self.settings, &self.evaluator)
    }
}

fn decode_fields(value: JsValue) -> anyhow::Result<FormFields> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| anyhow!("{err}"))
        .context("Failed to decode calculator fields")
}

fn decode_settings(value: JsValue) -> anyhow::Result<Settings> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| anyhow!("{err}"))
        .context("Failed to decode settings")
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    log::error!("{err:#}");
    JsValue::from_str(&format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heun_core::FAILURE_MESSAGE;

    #[test]
    fn calculator_starts_with_default_precision() {
        let calculator = WasmCalculator::new();
        assert_eq!(calculator.precision(), 4);
    }

    #[test]
    fn precision_buttons_saturate_at_bounds() {
        let mut calculator = WasmCalculator::new();
        calculator.set_precision(7);
        assert_eq!(calculator.increment_precision(), 8);
        assert_eq!(calculator.increment_precision(), 8);

        calculator.set_precision(1);
        assert_eq!(calculator.decrement_precision(), 0);
        assert_eq!(calculator.decrement_precision(), 0);
    }

    #[test]
    fn run_uses_precision_in_effect_at_call_time() {
        let mut calculator = WasmCalculator::new();
        let fields = FormFields::default();

        calculator.set_precision(2);
        let coarse = calculator.run(&fields).lines();
        calculator.set_precision(6);
        let fine = calculator.run(&fields).lines();

        assert_eq!(coarse[1], "Target x value: 1.00");
        assert_eq!(fine[1], "Target x value: 1.000000");
    }

    #[test]
    fn run_reports_bad_input_as_single_line() {
        let calculator = WasmCalculator::new();
        let fields = FormFields {
            step_size: "0".to_string(),
            ..FormFields::default()
        };
        assert_eq!(calculator.run(&fields).lines(), vec![FAILURE_MESSAGE.to_string()]);
    }

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn solve_lines_returns_trace_array() {
        let calculator = WasmCalculator::new();
        let lines = calculator.solve_lines(
            "y' = x + y".to_string(),
            "0".to_string(),
            "0".to_string(),
            "0.5".to_string(),
            "1".to_string(),
            "1".to_string(),
        );
        // 4 header lines, 2 steps of 7 lines, 1 final line.
        assert_eq!(lines.length(), 4 + 2 * 7 + 1);
    }

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn solve_rejects_non_object_payload() {
        let calculator = WasmCalculator::new();
        let result = calculator.solve(JsValue::from_f64(1.0));
        assert!(result.is_err(), "expected decode error");
    }
}
