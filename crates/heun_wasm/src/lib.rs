//! WASM bindings for the modified Euler calculator.
//!
//! The UI owns layout and state; these bindings only parse what it passes in,
//! call into `heun_core`, and hand back serializable results.

use heun_core::FormFields;
use wasm_bindgen::prelude::*;

mod calculator;

pub use calculator::WasmCalculator;

/// Initial contents of the calculator form.
#[wasm_bindgen]
pub fn default_fields() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&FormFields::default())
        .map_err(|err| JsValue::from_str(&format!("Failed to serialize fields: {err}")))
}

#[cfg(test)]
mod tests {
    use super::WasmCalculator;

    #[test]
    fn calculator_reexport_is_wired() {
        assert!(std::any::type_name::<WasmCalculator>().ends_with("WasmCalculator"));
    }

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn default_fields_serialize_to_object() {
        let value = super::default_fields().expect("fields should serialize");
        assert!(value.is_object());
    }
}
