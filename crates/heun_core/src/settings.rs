//! Display settings captured by each solve call.

use serde::{Deserialize, Deserializer, Serialize};

/// Digits after the decimal point used when none is configured.
pub const DEFAULT_PRECISION: u8 = 4;
/// Largest supported number of decimal digits.
pub const MAX_PRECISION: u8 = 8;

/// User-facing configuration for rendering a trace.
///
/// Precision always lies in `[0, MAX_PRECISION]`; out-of-range values are
/// clamped on construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_precision", deserialize_with = "deserialize_precision")]
    precision: u8,
}

fn default_precision() -> u8 {
    DEFAULT_PRECISION
}

fn deserialize_precision<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, MAX_PRECISION as i64) as u8)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Settings {
    pub fn with_precision(precision: u8) -> Self {
        Self {
            precision: precision.min(MAX_PRECISION),
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: u8) {
        self.precision = precision.min(MAX_PRECISION);
    }

    /// One more digit, saturating at [`MAX_PRECISION`].
    pub fn increment_precision(&mut self) {
        self.set_precision(self.precision.saturating_add(1));
    }

    /// One fewer digit, saturating at zero.
    pub fn decrement_precision(&mut self) {
        self.precision = self.precision.saturating_sub(1);
    }

    /// Fixed-point rendering with exactly `precision` decimals.
    pub fn format(&self, value: f64) -> String {
        if value.is_infinite() {
            return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        // Exact negative zero renders unsigned.
        let value = if value == 0.0 { 0.0 } else { value };
        format!("{:.*}", self.precision as usize, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_precision_is_four_digits() {
        let settings = Settings::default();
        assert_eq!(settings.precision(), 4);
        assert_eq!(settings.format(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn precision_is_clamped_to_supported_range() {
        assert_eq!(Settings::with_precision(12).precision(), MAX_PRECISION);

        let mut settings = Settings::with_precision(MAX_PRECISION);
        settings.increment_precision();
        assert_eq!(settings.precision(), MAX_PRECISION);

        let mut settings = Settings::with_precision(0);
        settings.decrement_precision();
        assert_eq!(settings.precision(), 0);
        settings.increment_precision();
        assert_eq!(settings.precision(), 1);
    }

    #[test]
    fn format_uses_fixed_decimals() {
        assert_eq!(Settings::with_precision(0).format(2.5001), "3");
        assert_eq!(Settings::with_precision(2).format(1.005_1), "1.01");
        assert_eq!(Settings::with_precision(6).format(-0.25), "-0.250000");
        assert_eq!(Settings::with_precision(3).format(-0.0), "0.000");
    }

    #[test]
    fn infinities_render_by_name() {
        let settings = Settings::default();
        assert_eq!(settings.format(f64::INFINITY), "Infinity");
        assert_eq!(settings.format(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn precision_changes_only_the_rendering() {
        let value = 1.234_567_891;
        let coarse = Settings::with_precision(2);
        let fine = Settings::with_precision(6);
        assert_eq!(coarse.format(value), "1.23");
        assert_eq!(fine.format(value), "1.234568");
    }
}
