//! Forward and inverse kinematics of the two bobs.
//!
//! Positions are in meters relative to the pivot, with `y` growing downward so
//! that `theta = 0` hangs straight down: `x = l sin(theta)`, `y = l cos(theta)`.

use crate::error::PendulumError;
use crate::pendulum::{PendulumParams, PendulumState};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BobPositions {
    pub bob1: Point2<f64>,
    pub bob2: Point2<f64>,
}

impl BobPositions {
    /// Maps pivot-relative meters onto a screen whose pivot sits at `pivot`,
    /// `scale` pixels per meter.
    pub fn to_screen(&self, pivot: Point2<f64>, scale: f64) -> BobPositions {
        BobPositions {
            bob1: pivot + self.bob1.coords * scale,
            bob2: pivot + self.bob2.coords * scale,
        }
    }
}

/// Inverse of [`BobPositions::to_screen`] for a single point: screen pixels back
/// to pivot-relative meters.
pub fn from_screen(point: Point2<f64>, pivot: Point2<f64>, scale: f64) -> Point2<f64> {
    Point2::from((point - pivot) / scale)
}

fn rod(length: f64, theta: f64) -> Vector2<f64> {
    let (s, c) = theta.sin_cos();
    Vector2::new(length * s, length * c)
}

pub fn forward_kinematics(state: &PendulumState, params: &PendulumParams) -> BobPositions {
    let bob1 = Point2::origin() + rod(params.l1, state.theta1);
    let bob2 = bob1 + rod(params.l2, state.theta2);
    BobPositions { bob1, bob2 }
}

/// Rod angles `(theta1, theta2)` that put bob 2 at `target`, elbow-down branch.
pub fn inverse_kinematics(
    target: Point2<f64>,
    params: &PendulumParams,
) -> Result<(f64, f64), PendulumError> {
    let (l1, l2) = (params.l1, params.l2);
    let d_sq = target.coords.norm_squared();
    let d = d_sq.sqrt();
    let max_reach = l1 + l2;

    if d > max_reach || d < (l1 - l2).abs() || d == 0.0 {
        debug!(distance = d, max_reach, "IK target out of reach");
        return Err(PendulumError::Unreachable {
            distance: d,
            max_reach,
        });
    }

    // Law of cosines at the pivot: l2^2 = l1^2 + d^2 - 2*l1*d*cos(alpha).
    let cos_alpha = ((l1 * l1 + d_sq - l2 * l2) / (2.0 * l1 * d)).clamp(-1.0, 1.0);
    let alpha = cos_alpha.acos();
    let beta = target.x.atan2(target.y);
    let theta1 = beta - alpha;

    let elbow = rod(l1, theta1);
    let theta2 = (target.x - elbow.x).atan2(target.y - elbow.y);
    Ok((theta1, theta2))
}
