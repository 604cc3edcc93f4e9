use crate::error::PendulumError;
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Physical constants of a run. Never mutated by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    /// Mass of bob 1 (kg).
    pub m1: f64,
    /// Mass of bob 2 (kg).
    pub m2: f64,
    /// Length of rod 1 (m).
    pub l1: f64,
    /// Length of rod 2 (m).
    pub l2: f64,
    /// Gravitational acceleration (m/s^2). Zero or negative is allowed.
    pub g: f64,
}

impl PendulumParams {
    pub fn new(m1: f64, m2: f64, l1: f64, l2: f64, g: f64) -> Self {
        Self { m1, m2, l1, l2, g }
    }

    /// Checks the preconditions of the equations of motion: masses and lengths
    /// strictly positive, everything finite.
    pub fn validate(&self) -> Result<(), PendulumError> {
        for (name, value) in [
            ("m1", self.m1),
            ("m2", self.m2),
            ("l1", self.l1),
            ("l2", self.l2),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PendulumError::InvalidParams { name, value });
            }
        }
        if !self.g.is_finite() {
            return Err(PendulumError::InvalidParams {
                name: "g",
                value: self.g,
            });
        }
        Ok(())
    }
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            m1: 1.0,
            m2: 1.0,
            l1: 1.0,
            l2: 1.0,
            g: 9.81,
        }
    }
}

/// Angular state. Angles are measured from the downward vertical and are not wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PendulumState {
    pub theta1: f64,
    pub theta2: f64,
    pub omega1: f64,
    pub omega2: f64,
}

impl PendulumState {
    pub fn new(theta1: f64, theta2: f64, omega1: f64, omega2: f64) -> Self {
        Self {
            theta1,
            theta2,
            omega1,
            omega2,
        }
    }

    /// Both rods released from rest at the given angles.
    pub fn at_rest(theta1: f64, theta2: f64) -> Self {
        Self::new(theta1, theta2, 0.0, 0.0)
    }

    /// Layout: `[theta1, theta2, omega1, omega2]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.theta1, self.theta2, self.omega1, self.omega2]
    }

    pub fn from_array(x: [f64; 4]) -> Self {
        Self::new(x[0], x[1], x[2], x[3])
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Angles wrapped into (-pi, pi] for display. The simulation keeps the raw angles.
    pub fn wrapped_angles(&self) -> (f64, f64) {
        (wrap_angle(self.theta1), wrap_angle(self.theta2))
    }
}

fn wrap_angle(theta: f64) -> f64 {
    if theta > -PI && theta <= PI {
        return theta;
    }
    let wrapped = (theta + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Angular accelerations `(theta1_ddot, theta2_ddot)` of a point-mass double pendulum.
///
/// The shared denominator `2*m1 + m2 - m2*cos(2*delta)` is not guarded: a
/// degenerate configuration yields large or non-finite values, never a panic.
#[allow(clippy::too_many_arguments)]
pub fn accelerations<T: Scalar>(
    theta1: T,
    theta2: T,
    omega1: T,
    omega2: T,
    m1: T,
    m2: T,
    l1: T,
    l2: T,
    g: T,
) -> (T, T) {
    let two = T::from_f64(2.0).unwrap();
    let delta = theta1 - theta2;
    let (sin_delta, cos_delta) = delta.sin_cos();
    let den = two * m1 + m2 - m2 * (two * delta).cos();

    let w1_sq = omega1 * omega1;
    let w2_sq = omega2 * omega2;

    let theta1_ddot = (-g * (two * m1 + m2) * theta1.sin()
        - m2 * g * (theta1 - two * theta2).sin()
        - two * sin_delta * m2 * (w2_sq * l2 + w1_sq * l1 * cos_delta))
        / (l1 * den);

    let theta2_ddot = (two
        * sin_delta
        * (w1_sq * l1 * (m1 + m2) + g * (m1 + m2) * theta1.cos() + w2_sq * l2 * m2 * cos_delta))
        / (l2 * den);

    (theta1_ddot, theta2_ddot)
}

/// Time derivative of `[theta1, theta2, omega1, omega2]`.
pub fn derivative(state: &PendulumState, params: &PendulumParams) -> [f64; 4] {
    let (a1, a2) = accelerations(
        state.theta1,
        state.theta2,
        state.omega1,
        state.omega2,
        params.m1,
        params.m2,
        params.l1,
        params.l2,
        params.g,
    );
    [state.omega1, state.omega2, a1, a2]
}

/// The pendulum as a generic first-order system, for use with `solvers` and `analysis`.
#[derive(Debug, Clone, Copy)]
pub struct DoublePendulum {
    pub params: PendulumParams,
}

impl DoublePendulum {
    pub fn new(params: PendulumParams) -> Self {
        Self { params }
    }
}

impl<T: Scalar> DynamicalSystem<T> for DoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let p = &self.params;
        let c = |v: f64| T::from_f64(v).unwrap();
        let (a1, a2) = accelerations(
            x[0],
            x[1],
            x[2],
            x[3],
            c(p.m1),
            c(p.m2),
            c(p.l1),
            c(p.l2),
            c(p.g),
        );
        out[0] = x[2];
        out[1] = x[3];
        out[2] = a1;
        out[3] = a2;
    }
}
