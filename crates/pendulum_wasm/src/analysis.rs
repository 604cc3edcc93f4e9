//! Jacobian and Lyapunov spectrum of the current state.

use crate::system::WasmPendulum;
use js_sys::Float64Array;
use pendulum_core::analysis::{jacobian, kaplan_yorke, lyapunov_exponents};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
pub(crate) struct LyapunovPayload {
    exponents: Vec<f64>,
    kaplan_yorke: f64,
}

#[wasm_bindgen]
impl WasmPendulum {
    /// Row-major 4x4 Jacobian of the vector field at the current state.
    pub fn compute_jacobian(&self) -> Vec<f64> {
        let jac = jacobian(&self.sim.state(), self.sim.params());
        let mut out = Vec::with_capacity(16);
        for i in 0..4 {
            for j in 0..4 {
                out.push(jac[(i, j)]);
            }
        }
        out
    }

    /// Lyapunov spectrum starting from the current state. `dt` defaults to the
    /// physics step when zero; `qr_stride` of zero means every step.
    pub fn compute_lyapunov_exponents(
        &self,
        steps: u32,
        dt: f64,
        qr_stride: u32,
    ) -> Result<Float64Array, JsValue> {
        let exponents = self.lyapunov(steps, dt, qr_stride)?;
        Ok(Float64Array::from(exponents.as_slice()))
    }

    /// Same as `compute_lyapunov_exponents`, plus the Kaplan-Yorke dimension.
    pub fn compute_lyapunov_summary(
        &self,
        steps: u32,
        dt: f64,
        qr_stride: u32,
    ) -> Result<JsValue, JsValue> {
        let exponents = self.lyapunov(steps, dt, qr_stride)?;
        let payload = LyapunovPayload {
            kaplan_yorke: kaplan_yorke(&exponents),
            exponents,
        };
        to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl WasmPendulum {
    fn lyapunov(&self, steps: u32, dt: f64, qr_stride: u32) -> Result<Vec<f64>, JsValue> {
        let dt = if dt == 0.0 {
            self.sim.config().physics_step
        } else {
            dt
        };
        let stride = if qr_stride == 0 {
            1
        } else {
            qr_stride as usize
        };
        lyapunov_exponents(
            self.sim.params(),
            self.sim.state(),
            steps as usize,
            dt,
            stride,
        )
        .map_err(|e| JsValue::from_str(&format!("Lyapunov computation failed: {}", e)))
    }
}
