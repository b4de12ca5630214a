//! Itemized record of a solve, one entry per displayed line.

use crate::settings::Settings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TraceLineKind {
    Header,
    StepDivider,
    PredictorLabel,
    PredictorEval,
    PredictorValue,
    CorrectionLabel,
    CorrectionEval,
    CorrectionValue,
    FinalResult,
}

/// Numeric values a line was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    pub x: f64,
    pub y: f64,
    /// `f(x, y)` for evaluation lines, `None` otherwise.
    pub slope: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceLine {
    pub kind: TraceLineKind,
    pub text: String,
    pub point: Option<TracePoint>,
}

/// The completed trace of a successful solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTrace {
    pub lines: Vec<TraceLine>,
    pub final_x: f64,
    pub final_y: f64,
    pub steps: usize,
    pub precision: u8,
}

impl StepTrace {
    /// Rendered text of every line, in order.
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    pub fn lines_of_kind(&self, kind: TraceLineKind) -> impl Iterator<Item = &TraceLine> {
        self.lines.iter().filter(move |line| line.kind == kind)
    }
}

/// Accumulates trace lines, formatting numbers with the captured settings.
pub(crate) struct TraceBuilder {
    settings: Settings,
    lines: Vec<TraceLine>,
}

impl TraceBuilder {
    pub(crate) fn new(settings: Settings) -> Self {
        Self {
            settings,
            lines: Vec::new(),
        }
    }

    fn fmt(&self, value: f64) -> String {
        self.settings.format(value)
    }

    fn push(&mut self, kind: TraceLineKind, text: String, point: Option<TracePoint>) {
        self.lines.push(TraceLine { kind, text, point });
    }

    pub(crate) fn header(
        &mut self,
        x0: f64,
        y0: f64,
        x_final: f64,
        h: f64,
        steps: usize,
        corrections: u32,
    ) {
        let text = format!(
            "Starting with initial values: x₀ = {}, y₀ = {}",
            self.fmt(x0),
            self.fmt(y0)
        );
        let start = TracePoint {
            x: x0,
            y: y0,
            slope: None,
        };
        self.push(TraceLineKind::Header, text, Some(start));

        let text = format!("Target x value: {}", self.fmt(x_final));
        self.push(TraceLineKind::Header, text, None);

        let text = format!("Using step size h = {} ({} steps)", self.fmt(h), steps);
        self.push(TraceLineKind::Header, text, None);

        let text = format!("Number of corrections per step: {corrections}");
        self.push(TraceLineKind::Header, text, None);
    }

    pub(crate) fn step_divider(&mut self, step_index: usize) {
        self.push(
            TraceLineKind::StepDivider,
            format!("\nStep {}:", step_index + 1),
            None,
        );
    }

    pub(crate) fn predictor(&mut self, x: f64, y: f64, slope: f64, predicted: f64) {
        self.push(TraceLineKind::PredictorLabel, "  Predictor:".to_string(), None);

        let text = format!(
            "    f({}, {}) = {}",
            self.fmt(x),
            self.fmt(y),
            self.fmt(slope)
        );
        let point = TracePoint {
            x,
            y,
            slope: Some(slope),
        };
        self.push(TraceLineKind::PredictorEval, text, Some(point));

        let text = format!("    Predicted y = {}", self.fmt(predicted));
        self.push(TraceLineKind::PredictorValue, text, None);
    }

    /// `eval_y` is the ordinate `f` was evaluated at, `corrected` the result.
    /// The eval line prints `corrected`; its payload keeps the evaluated point.
    pub(crate) fn correction(
        &mut self,
        correction_index: u32,
        x: f64,
        eval_y: f64,
        slope: f64,
        corrected: f64,
    ) {
        self.push(
            TraceLineKind::CorrectionLabel,
            format!("  Correction {}:", correction_index + 1),
            None,
        );

        let text = format!(
            "    f({}, {}) = {}",
            self.fmt(x),
            self.fmt(corrected),
            self.fmt(slope)
        );
        let point = TracePoint {
            x,
            y: eval_y,
            slope: Some(slope),
        };
        self.push(TraceLineKind::CorrectionEval, text, Some(point));

        let text = format!("    Corrected y = {}", self.fmt(corrected));
        let point = TracePoint {
            x,
            y: corrected,
            slope: None,
        };
        self.push(TraceLineKind::CorrectionValue, text, Some(point));
    }

    pub(crate) fn finish(mut self, x: f64, y: f64, steps: usize) -> StepTrace {
        let text = format!("\nFinal value: y({}) = {}", self.fmt(x), self.fmt(y));
        let point = TracePoint { x, y, slope: None };
        self.push(TraceLineKind::FinalResult, text, Some(point));
        StepTrace {
            lines: self.lines,
            final_x: x,
            final_y: y,
            steps,
            precision: self.settings.precision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_reports_inputs_with_configured_precision() {
        let mut builder = TraceBuilder::new(Settings::with_precision(2));
        builder.header(0.0, 1.0, 1.0, 0.1, 10, 2);
        let trace = builder.finish(0.0, 1.0, 0);

        assert_eq!(
            trace.texts(),
            vec![
                "Starting with initial values: x₀ = 0.00, y₀ = 1.00",
                "Target x value: 1.00",
                "Using step size h = 0.10 (10 steps)",
                "Number of corrections per step: 2",
                "\nFinal value: y(0.00) = 1.00",
            ]
        );
        assert_eq!(trace.lines_of_kind(TraceLineKind::Header).count(), 4);
        assert_eq!(trace.precision, 2);
    }

    #[test]
    fn step_lines_follow_display_layout() {
        let mut builder = TraceBuilder::new(Settings::with_precision(3));
        builder.step_divider(0);
        builder.predictor(0.0, 1.0, 2.0, 1.2);
        builder.correction(0, 0.1, 1.2, 2.5, 1.225);
        let trace = builder.finish(0.1, 1.225, 1);

        let kinds: Vec<TraceLineKind> = trace.lines.iter().map(|line| line.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TraceLineKind::StepDivider,
                TraceLineKind::PredictorLabel,
                TraceLineKind::PredictorEval,
                TraceLineKind::PredictorValue,
                TraceLineKind::CorrectionLabel,
                TraceLineKind::CorrectionEval,
                TraceLineKind::CorrectionValue,
                TraceLineKind::FinalResult,
            ]
        );
        assert_eq!(trace.lines[0].text, "\nStep 1:");
        assert_eq!(trace.lines[2].text, "    f(0.000, 1.000) = 2.000");
        assert_eq!(trace.lines[4].text, "  Correction 1:");
        assert_eq!(trace.lines[5].text, "    f(0.100, 1.225) = 2.500");
        assert_eq!(trace.lines[6].text, "    Corrected y = 1.225");
        assert_eq!(
            trace.lines[5].point,
            Some(TracePoint {
                x: 0.1,
                y: 1.2,
                slope: Some(2.5)
            })
        );
        assert_eq!(trace.final_y, 1.225);
    }
}
