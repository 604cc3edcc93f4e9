use thiserror::Error;

/// Caller-facing validation failures. The stepper itself never produces these;
/// numerical degeneracy shows up as non-finite values in the returned state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PendulumError {
    #[error("parameter {name} must be positive and finite, got {value}")]
    InvalidParams { name: &'static str, value: f64 },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("target unreachable (distance {distance:.3} m, reach {max_reach:.3} m)")]
    Unreachable { distance: f64, max_reach: f64 },
}
