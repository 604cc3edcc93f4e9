use crate::pendulum::{derivative, PendulumParams, PendulumState};
use crate::solvers::RK4;
use crate::traits::{DynamicalSystem, Steppable};
use anyhow::{bail, Result};
use nalgebra::Matrix4;
use tracing::debug;

const DIM: usize = 4;
const AUG_DIM: usize = DIM + DIM * DIM;

/// Jacobian of `[theta1, theta2, omega1, omega2] -> derivative` by central differences.
pub fn jacobian(state: &PendulumState, params: &PendulumParams) -> Matrix4<f64> {
    let x = state.to_array();
    let mut jac = Matrix4::zeros();
    for j in 0..DIM {
        let h = 1e-6 * x[j].abs().max(1.0);
        let mut plus = x;
        let mut minus = x;
        plus[j] += h;
        minus[j] -= h;
        let f_plus = derivative(&PendulumState::from_array(plus), params);
        let f_minus = derivative(&PendulumState::from_array(minus), params);
        for i in 0..DIM {
            jac[(i, j)] = (f_plus[i] - f_minus[i]) / (2.0 * h);
        }
    }
    jac
}

/// State plus a row-major 4x4 tangent matrix `Phi`, evolving as `Phi' = J(x) Phi`.
struct TangentPendulum {
    params: PendulumParams,
}

impl DynamicalSystem<f64> for TangentPendulum {
    fn dimension(&self) -> usize {
        AUG_DIM
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let state = PendulumState::new(x[0], x[1], x[2], x[3]);
        out[..DIM].copy_from_slice(&derivative(&state, &self.params));

        let phi = Matrix4::from_row_slice(&x[DIM..]);
        let phi_dot = jacobian(&state, &self.params) * phi;
        for i in 0..DIM {
            for j in 0..DIM {
                out[DIM + i * DIM + j] = phi_dot[(i, j)];
            }
        }
    }
}

/// Lyapunov spectrum of the trajectory starting at `initial`, sorted descending (1/s).
pub fn lyapunov_exponents(
    params: &PendulumParams,
    initial: PendulumState,
    steps: usize,
    dt: f64,
    qr_stride: usize,
) -> Result<Vec<f64>> {
    params.validate()?;
    if !initial.is_finite() {
        bail!("Initial state must be finite.");
    }
    if steps == 0 {
        bail!("Lyapunov computation requires at least one integration step.");
    }
    if !(dt > 0.0 && dt.is_finite()) {
        bail!("Step size dt must be positive.");
    }
    if qr_stride == 0 {
        bail!("qr_stride must be at least 1.");
    }

    let mut augmented = [0.0; AUG_DIM];
    augmented[..DIM].copy_from_slice(&initial.to_array());
    for i in 0..DIM {
        augmented[DIM + i * DIM + i] = 1.0;
    }

    let system = TangentPendulum { params: *params };
    let mut solver = RK4::new(AUG_DIM);
    let mut accum = [0.0; DIM];
    let mut t = 0.0;
    let mut since_last_qr = 0usize;

    for step in 1..=steps {
        solver.step(&system, &mut t, &mut augmented, dt);
        if augmented.iter().any(|v| !v.is_finite()) {
            bail!("Trajectory diverged at step {step}.");
        }
        since_last_qr += 1;
        if since_last_qr == qr_stride || step == steps {
            orthonormalize(&mut augmented[DIM..], &mut accum)?;
            since_last_qr = 0;
        }
    }

    let total_time = steps as f64 * dt;
    let mut exponents: Vec<f64> = accum.iter().map(|v| v / total_time).collect();
    exponents.sort_by(|a, b| b.total_cmp(a));
    debug!(?exponents, steps, dt, "lyapunov spectrum");
    Ok(exponents)
}

/// QR-factorizes the tangent matrix in place, keeping Q and accumulating `ln |R_ii|`.
fn orthonormalize(phi_slice: &mut [f64], accum: &mut [f64; DIM]) -> Result<()> {
    let (q, r) = Matrix4::from_row_slice(phi_slice).qr().unpack();
    for (i, total) in accum.iter_mut().enumerate() {
        let diag = r[(i, i)].abs();
        if diag <= f64::EPSILON {
            bail!("Encountered near-singular R matrix during orthonormalization.");
        }
        *total += diag.ln();
    }
    for i in 0..DIM {
        for j in 0..DIM {
            phi_slice[i * DIM + j] = q[(i, j)];
        }
    }
    Ok(())
}

/// Kaplan-Yorke (Lyapunov) dimension of a spectrum.
pub fn kaplan_yorke(exponents: &[f64]) -> f64 {
    let mut sorted = exponents.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut partial = 0.0;
    for (k, &lambda) in sorted.iter().enumerate() {
        if partial + lambda < 0.0 {
            if lambda.abs() <= f64::EPSILON {
                return k as f64;
            }
            return k as f64 + partial / lambda.abs();
        }
        partial += lambda;
    }
    sorted.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn jacobian_at_equilibrium_matches_linearization() {
        let g = 9.81;
        let params = PendulumParams::default();
        let jac = jacobian(&PendulumState::default(), &params);
        #[rustfmt::skip]
        let expected = Matrix4::new(
            0.0,      0.0,      1.0, 0.0,
            0.0,      0.0,      0.0, 1.0,
            -2.0 * g, g,        0.0, 0.0,
            2.0 * g,  -2.0 * g, 0.0, 0.0,
        );
        assert!((jac - expected).abs().max() < 1e-6, "{jac}");
    }

    #[test]
    fn lyapunov_exponents_rejects_invalid_inputs() {
        let params = PendulumParams::default();
        let start = PendulumState::at_rest(0.1, 0.1);
        assert_err_contains(
            lyapunov_exponents(&params, start, 0, 0.01, 1),
            "at least one integration step",
        );
        assert_err_contains(
            lyapunov_exponents(&params, start, 10, 0.0, 1),
            "dt must be positive",
        );
        assert_err_contains(lyapunov_exponents(&params, start, 10, 0.01, 0), "qr_stride");
        assert_err_contains(
            lyapunov_exponents(&params, PendulumState::at_rest(f64::NAN, 0.0), 10, 0.01, 1),
            "finite",
        );
        assert_err_contains(
            lyapunov_exponents(
                &PendulumParams::new(-1.0, 1.0, 1.0, 1.0, 9.81),
                start,
                10,
                0.01,
                1,
            ),
            "m1",
        );
    }

    #[test]
    fn spectrum_sums_to_zero_for_conservative_flow() {
        let params = PendulumParams::default();
        let start = PendulumState::at_rest(FRAC_PI_2, FRAC_PI_2);
        let exponents =
            lyapunov_exponents(&params, start, 2000, 0.01, 5).expect("spectrum should compute");
        assert_eq!(exponents.len(), 4);
        assert!(exponents.windows(2).all(|w| w[0] >= w[1]));
        let sum: f64 = exponents.iter().sum();
        assert!(sum.abs() < 0.1, "sum {sum} from {exponents:?}");
    }

    #[test]
    fn chaotic_release_outgrows_small_oscillation() {
        let params = PendulumParams::default();
        let regular =
            lyapunov_exponents(&params, PendulumState::at_rest(0.05, 0.05), 4000, 0.01, 10)
                .expect("regular spectrum");
        let release = PendulumState::at_rest(FRAC_PI_2, FRAC_PI_2);
        let chaotic =
            lyapunov_exponents(&params, release, 4000, 0.01, 10).expect("chaotic spectrum");
        assert!(regular[0].abs() < 0.2, "regular {regular:?}");
        assert!(chaotic[0] > 0.3, "chaotic {chaotic:?}");
        assert!(chaotic[0] > regular[0]);
    }

    #[test]
    fn orthonormalize_keeps_q_and_accumulates_logs() {
        #[rustfmt::skip]
        let mut phi = [
            2.0, 0.0, 0.0, 0.0,
            0.0, 3.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let mut accum = [0.0; DIM];
        orthonormalize(&mut phi, &mut accum).expect("QR should succeed");

        let expected = [2.0_f64.ln(), 3.0_f64.ln(), 0.5_f64.ln(), 0.0];
        for (a, e) in accum.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-12);
        }
        let q = Matrix4::from_row_slice(&phi);
        assert!((q.transpose() * q - Matrix4::identity()).abs().max() < 1e-12);

        let mut singular = [0.0; DIM * DIM];
        assert_err_contains(
            orthonormalize(&mut singular, &mut accum),
            "near-singular R matrix",
        );
    }

    #[test]
    fn kaplan_yorke_handles_empty_and_partial_sum() {
        assert_eq!(kaplan_yorke(&[]), 0.0);
        let result = kaplan_yorke(&[0.1, 0.0, -1.0]);
        assert!((result - 2.1).abs() < 1e-12);
        assert_eq!(kaplan_yorke(&[0.5, 0.2]), 2.0);
        assert_eq!(kaplan_yorke(&[-1.0, -2.0]), 0.0);
    }
}
