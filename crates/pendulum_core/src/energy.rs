//! Mechanical energy of the double pendulum, with the pivot at zero height.

use crate::pendulum::{PendulumParams, PendulumState};
use serde::{Deserialize, Serialize};

pub fn kinetic_energy(state: &PendulumState, params: &PendulumParams) -> f64 {
    let PendulumParams { m1, m2, l1, l2, .. } = *params;
    let (w1, w2) = (state.omega1, state.omega2);
    0.5 * m1 * l1 * l1 * w1 * w1
        + 0.5
            * m2
            * (l1 * l1 * w1 * w1
                + l2 * l2 * w2 * w2
                + 2.0 * l1 * l2 * w1 * w2 * (state.theta1 - state.theta2).cos())
}

pub fn potential_energy(state: &PendulumState, params: &PendulumParams) -> f64 {
    let PendulumParams { m1, m2, l1, l2, g } = *params;
    -(m1 + m2) * g * l1 * state.theta1.cos() - m2 * g * l2 * state.theta2.cos()
}

pub fn total_energy(state: &PendulumState, params: &PendulumParams) -> f64 {
    kinetic_energy(state, params) + potential_energy(state, params)
}

/// Energy bookkeeping over a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyDrift {
    pub initial: f64,
    pub current: f64,
    pub max_abs_drift: f64,
}

impl EnergyDrift {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            current: initial,
            max_abs_drift: 0.0,
        }
    }

    pub fn record(&mut self, energy: f64) {
        self.current = energy;
        let drift = (energy - self.initial).abs();
        if drift > self.max_abs_drift || drift.is_nan() {
            self.max_abs_drift = drift;
        }
    }

    /// Worst drift relative to the initial magnitude; absolute when the initial energy is zero.
    pub fn relative(&self) -> f64 {
        if self.initial == 0.0 {
            self.max_abs_drift
        } else {
            self.max_abs_drift / self.initial.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn resting_at_bottom_has_minimum_potential() {
        let params = PendulumParams::default();
        let bottom = PendulumState::default();
        assert_eq!(kinetic_energy(&bottom, &params), 0.0);
        assert!((potential_energy(&bottom, &params) + 3.0 * 9.81).abs() < 1e-12);

        let inverted = PendulumState::at_rest(PI, PI);
        assert!((potential_energy(&inverted, &params) - 3.0 * 9.81).abs() < 1e-12);
    }

    #[test]
    fn kinetic_energy_of_rigid_rotation() {
        // Aligned rods spinning together: bob 1 at radius l1, bob 2 at radius l1 + l2.
        let params = PendulumParams::new(2.0, 3.0, 1.0, 0.5, 9.81);
        let state = PendulumState::new(0.4, 0.4, 1.5, 1.5);
        let expected = 0.5 * 2.0 * 1.5_f64.powi(2) + 0.5 * 3.0 * (1.5_f64 * 1.5).powi(2);
        assert!((kinetic_energy(&state, &params) - expected).abs() < 1e-12);
    }

    #[test]
    fn total_energy_matches_closed_form() {
        let params = PendulumParams::default();
        let state = PendulumState::at_rest(PI / 4.0, PI / 4.0);
        let expected = -3.0 * 9.81 * (PI / 4.0).cos();
        assert!((total_energy(&state, &params) - expected).abs() < 1e-12);
    }

    #[test]
    fn drift_tracks_worst_deviation() {
        let mut drift = EnergyDrift::new(-10.0);
        drift.record(-10.5);
        drift.record(-9.9);
        assert_eq!(drift.current, -9.9);
        assert!((drift.max_abs_drift - 0.5).abs() < 1e-12);
        assert!((drift.relative() - 0.05).abs() < 1e-12);

        drift.record(f64::NAN);
        assert!(drift.relative().is_nan());
    }
}
