use crate::pendulum::{derivative, PendulumParams, PendulumState};

/// Advances the pendulum by one classical Runge-Kutta 4th order step.
///
/// Pure: takes the state by value and returns its successor. `dt` is not
/// validated and non-finite results are returned as-is.
pub fn step(state: PendulumState, params: &PendulumParams, dt: f64) -> PendulumState {
    let y = state.to_array();
    let half = 0.5 * dt;

    // k1 = f(y)
    let k1 = derivative(&state, params);

    // k2 = f(y + dt*k1/2)
    let k2 = derivative(&offset(&y, &k1, half), params);

    // k3 = f(y + dt*k2/2)
    let k3 = derivative(&offset(&y, &k2, half), params);

    // k4 = f(y + dt*k3)
    let k4 = derivative(&offset(&y, &k3, dt), params);

    // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
    let sixth = dt / 6.0;
    let mut next = [0.0; 4];
    for i in 0..4 {
        next[i] = y[i] + sixth * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    PendulumState::from_array(next)
}

/// Applies `step` `steps` times at a fixed `dt`.
pub fn integrate(
    state: PendulumState,
    params: &PendulumParams,
    dt: f64,
    steps: usize,
) -> PendulumState {
    (0..steps).fold(state, |s, _| step(s, params, dt))
}

fn offset(y: &[f64; 4], k: &[f64; 4], h: f64) -> PendulumState {
    PendulumState::new(
        y[0] + h * k[0],
        y[1] + h * k[1],
        y[2] + h * k[2],
        y[3] + h * k[3],
    )
}
