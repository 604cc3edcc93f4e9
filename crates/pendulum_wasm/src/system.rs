//! Stateful simulation handle exposed to JS.

use js_sys::Float64Array;
use nalgebra::Point2;
use pendulum_core::kinematics::from_screen;
use pendulum_core::simulation::{Simulation, SimulationConfig};
use pendulum_core::{PendulumParams, PendulumState};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPendulum {
    pub(crate) sim: Simulation,
}

impl WasmPendulum {
    fn build(config: SimulationConfig) -> Result<WasmPendulum, JsValue> {
        let sim = Simulation::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmPendulum { sim })
    }
}

#[wasm_bindgen]
impl WasmPendulum {
    #[wasm_bindgen(constructor)]
    pub fn new(
        m1: f64,
        m2: f64,
        l1: f64,
        l2: f64,
        g: f64,
        theta1: f64,
        theta2: f64,
    ) -> Result<WasmPendulum, JsValue> {
        let config = SimulationConfig {
            params: PendulumParams::new(m1, m2, l1, l2, g),
            initial_theta1: theta1,
            initial_theta2: theta2,
            ..SimulationConfig::default()
        };
        Self::build(config)
    }

    /// Builds from a JS object shaped like `SimulationConfig`; missing fields take defaults.
    pub fn from_config(config: JsValue) -> Result<WasmPendulum, JsValue> {
        console_error_panic_hook::set_once();
        let config: SimulationConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?;
        Self::build(config)
    }

    /// Feeds one frame time (s); returns the number of physics steps run.
    pub fn advance(&mut self, frame_time: f64) -> u32 {
        self.sim.advance(frame_time) as u32
    }

    pub fn step(&mut self) {
        self.sim.step_once();
    }

    pub fn reset(&mut self) {
        self.sim.reset();
    }

    /// `[theta1, theta2, omega1, omega2]`
    pub fn get_state(&self) -> Vec<f64> {
        self.sim.state().to_array().to_vec()
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        let values: [f64; 4] = state
            .try_into()
            .map_err(|_| JsValue::from_str("State must have exactly 4 components."))?;
        self.sim.set_state(PendulumState::from_array(values));
        Ok(())
    }

    /// Display angles wrapped into (-pi, pi].
    pub fn wrapped_angles(&self) -> Vec<f64> {
        let (theta1, theta2) = self.sim.state().wrapped_angles();
        vec![theta1, theta2]
    }

    pub fn nudge(&mut self, d_omega1: f64, d_omega2: f64) {
        self.sim.nudge(d_omega1, d_omega2);
    }

    /// Drags bob 2 to a pivot-relative point in meters (y down).
    pub fn place_bob(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.sim
            .place_bob(Point2::new(x, y))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drags bob 2 to a screen point, using the same pivot and scale as `bob_positions`.
    pub fn place_bob_on_screen(
        &mut self,
        x: f64,
        y: f64,
        pivot_x: f64,
        pivot_y: f64,
        scale: f64,
    ) -> Result<(), JsValue> {
        let target = from_screen(Point2::new(x, y), Point2::new(pivot_x, pivot_y), scale);
        self.place_bob(target.x, target.y)
    }

    /// Screen coordinates `[x1, y1, x2, y2]` for a pivot at `(pivot_x, pivot_y)`.
    pub fn bob_positions(&self, pivot_x: f64, pivot_y: f64, scale: f64) -> Float64Array {
        let screen = self
            .sim
            .bob_positions()
            .to_screen(Point2::new(pivot_x, pivot_y), scale);
        Float64Array::from(
            [screen.bob1.x, screen.bob1.y, screen.bob2.x, screen.bob2.y].as_slice(),
        )
    }

    pub fn energy(&self) -> f64 {
        self.sim.energy()
    }

    pub fn get_t(&self) -> f64 {
        self.sim.time()
    }

    pub fn get_steps(&self) -> f64 {
        self.sim.steps() as f64
    }

    pub fn get_resets(&self) -> f64 {
        self.sim.resets() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn pendulum() -> WasmPendulum {
        WasmPendulum::new(1.0, 1.0, 1.0, 1.0, 9.81, FRAC_PI_2, FRAC_PI_2)
            .unwrap_or_else(|_| panic!("valid parameters"))
    }

    #[test]
    fn advance_steps_state_and_time() {
        let mut pendulum = pendulum();
        let before = pendulum.get_state();
        assert_eq!(pendulum.advance(0.035), 3);
        let after = pendulum.get_state();
        assert_eq!(after.len(), 4);
        assert_ne!(before, after);
        assert!((pendulum.get_t() - 0.03).abs() < 1e-12);
        assert_eq!(pendulum.get_steps(), 3.0);
    }

    #[test]
    fn reset_and_nudge_update_velocities() {
        let mut pendulum = pendulum();
        pendulum.nudge(0.5, -0.25);
        assert_eq!(&pendulum.get_state()[2..], &[0.5, -0.25]);
        pendulum.step();
        pendulum.reset();
        assert_eq!(pendulum.get_state(), vec![FRAC_PI_2, FRAC_PI_2, 0.0, 0.0]);
    }

    #[test]
    fn set_state_accepts_four_components() {
        let mut pendulum = pendulum();
        assert!(pendulum.set_state(&[0.1, 0.2, 0.3, 0.4]).is_ok());
        assert_eq!(pendulum.get_state(), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(pendulum.wrapped_angles(), vec![0.1, 0.2]);
    }

    #[test]
    fn place_bob_reaches_target() {
        let mut pendulum = pendulum();
        assert!(pendulum.place_bob(0.0, 2.0).is_ok());
        let state = pendulum.get_state();
        for value in state {
            assert!(value.abs() < 1e-9);
        }
        assert!((pendulum.energy() + 3.0 * 9.81).abs() < 1e-9);
    }

    #[test]
    fn place_bob_on_screen_converts_pixels_to_meters() {
        let mut pendulum = pendulum();
        assert!(pendulum
            .place_bob_on_screen(400.0, 500.0, 400.0, 200.0, 150.0)
            .is_ok());
        for value in pendulum.get_state() {
            assert!(value.abs() < 1e-9);
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn from_config_fills_defaults_and_validates() {
        let config = SimulationConfig {
            initial_theta1: 0.2,
            ..SimulationConfig::default()
        };
        let value = serde_wasm_bindgen::to_value(&config).expect("serializable config");
        let pendulum = WasmPendulum::from_config(value).expect("valid config");
        assert_eq!(pendulum.get_state()[0], 0.2);

        let bad = SimulationConfig {
            physics_step: 0.0,
            ..SimulationConfig::default()
        };
        let value = serde_wasm_bindgen::to_value(&bad).expect("serializable config");
        assert!(WasmPendulum::from_config(value).is_err());
    }

    #[wasm_bindgen_test]
    fn place_bob_reports_unreachable_targets() {
        let mut pendulum = WasmPendulum::new(1.0, 1.0, 1.0, 1.0, 9.81, 0.0, 0.0).expect("valid");
        assert!(pendulum.place_bob(5.0, 0.0).is_err());
        assert_eq!(pendulum.bob_positions(0.0, 0.0, 100.0).length(), 4);
    }
}
