pub mod analysis;
pub mod energy;
pub mod error;
pub mod integrator;
pub mod kinematics;
pub mod pendulum;
pub mod simulation;
pub mod solvers;
/// The `pendulum_core` crate provides the numerical engine for the double pendulum.
/// The stepper is a pure function over plain value types: no hidden state, no I/O,
/// and no validation inside the hot path.
///
/// Key components:
/// - **Pendulum**: `PendulumState`, `PendulumParams` and the closed-form angular accelerations.
/// - **Integrator**: the classical RK4 `step` over `(theta1, theta2, omega1, omega2)`.
/// - **Traits / Solvers**: `DynamicalSystem` and a generic, buffer-reusing `RK4`.
/// - **Simulation**: fixed-timestep accumulator loop, reset, IK placement and divergence policy.
/// - **Analysis**: Jacobian, Lyapunov spectrum and Kaplan-Yorke dimension.
pub mod traits;

pub use error::PendulumError;
pub use integrator::step;
pub use pendulum::{PendulumParams, PendulumState};
