use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Number type the equations of motion are written over. `f64` everywhere in
/// the simulation; `f32` works too for the generic solver.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Autonomous or not, a vector field `dx/dt = f(t, x)` on a flat state slice.
///
/// The pendulum is 4-dimensional (`[theta1, theta2, omega1, omega2]`); the
/// tangent system used for Lyapunov exponents carries the 4x4 variational
/// matrix on top of it.
pub trait DynamicalSystem<T: Scalar> {
    fn dimension(&self) -> usize;

    /// Writes `f(t, x)` into `out`. Both slices have length `dimension()`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Fixed-step integrator advancing `state` and `t` in place by `dt`.
pub trait Steppable<T: Scalar> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
