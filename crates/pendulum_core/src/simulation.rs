//! Fixed-timestep driver around the pure stepper.
//!
//! Frame time from the caller is accumulated and consumed in whole physics
//! steps, so the integration step stays constant regardless of frame rate.

use crate::energy::total_energy;
use crate::error::PendulumError;
use crate::integrator::step;
use crate::kinematics::{forward_kinematics, inverse_kinematics, BobPositions};
use crate::pendulum::{PendulumParams, PendulumState};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, trace, warn};

/// What to do when a step produces NaN or infinite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Keep the non-finite state.
    Ignore,
    /// Restore the initial pose at rest.
    #[default]
    ResetToInitial,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub params: PendulumParams,
    pub initial_theta1: f64,
    pub initial_theta2: f64,
    /// Fixed physics step (s).
    pub physics_step: f64,
    /// Frame times above this are clamped before accumulation (s).
    pub max_frame_time: f64,
    pub divergence: DivergencePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: PendulumParams::default(),
            initial_theta1: FRAC_PI_2,
            initial_theta2: FRAC_PI_2,
            physics_step: 0.01,
            max_frame_time: 0.25,
            divergence: DivergencePolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), PendulumError> {
        self.params.validate()?;
        if !(self.physics_step.is_finite() && self.physics_step > 0.0) {
            return Err(PendulumError::InvalidConfig(format!(
                "physics_step must be positive, got {}",
                self.physics_step
            )));
        }
        if !(self.max_frame_time.is_finite() && self.max_frame_time > 0.0) {
            return Err(PendulumError::InvalidConfig(format!(
                "max_frame_time must be positive, got {}",
                self.max_frame_time
            )));
        }
        if !(self.initial_theta1.is_finite() && self.initial_theta2.is_finite()) {
            return Err(PendulumError::InvalidConfig(
                "initial angles must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn initial_state(&self) -> PendulumState {
        PendulumState::at_rest(self.initial_theta1, self.initial_theta2)
    }
}

/// One pendulum instance. Owns its state exclusively; share it across threads
/// only behind external synchronization.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    state: PendulumState,
    accumulator: f64,
    time: f64,
    steps: u64,
    resets: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, PendulumError> {
        config.validate()?;
        Ok(Self {
            state: config.initial_state(),
            config,
            accumulator: 0.0,
            time: 0.0,
            steps: 0,
            resets: 0,
        })
    }

    /// Feeds one frame's worth of wall time and runs every whole physics step
    /// it covers. Returns the number of steps taken.
    pub fn advance(&mut self, frame_time: f64) -> usize {
        let frame_time = if frame_time.is_nan() {
            0.0
        } else {
            frame_time.clamp(0.0, self.config.max_frame_time)
        };
        self.accumulator += frame_time;

        let mut taken = 0;
        while self.accumulator >= self.config.physics_step {
            self.step_once();
            self.accumulator -= self.config.physics_step;
            taken += 1;
        }
        trace!(frame_time, taken, leftover = self.accumulator, "advance");
        taken
    }

    /// Runs exactly one physics step, bypassing the accumulator.
    pub fn step_once(&mut self) {
        self.state = step(self.state, &self.config.params, self.config.physics_step);
        self.time += self.config.physics_step;
        self.steps += 1;

        if !self.state.is_finite() {
            match self.config.divergence {
                DivergencePolicy::Ignore => {
                    warn!(step = self.steps, state = ?self.state, "state diverged");
                }
                DivergencePolicy::ResetToInitial => {
                    warn!(step = self.steps, state = ?self.state, "state diverged, resetting");
                    self.state = self.config.initial_state();
                    self.resets += 1;
                }
            }
        }
    }

    /// Back to the configured initial pose at rest. Time and counters keep running.
    pub fn reset(&mut self) {
        debug!(
            theta1 = self.config.initial_theta1,
            theta2 = self.config.initial_theta2,
            "reset"
        );
        self.state = self.config.initial_state();
        self.accumulator = 0.0;
    }

    /// Drags bob 2 to `target` (meters from the pivot) and releases it from rest.
    /// Unreachable targets leave the state untouched.
    pub fn place_bob(&mut self, target: Point2<f64>) -> Result<(), PendulumError> {
        let (theta1, theta2) = inverse_kinematics(target, &self.config.params)?;
        self.state = PendulumState::at_rest(theta1, theta2);
        Ok(())
    }

    /// Adds to both angular velocities.
    pub fn nudge(&mut self, d_omega1: f64, d_omega2: f64) {
        self.state.omega1 += d_omega1;
        self.state.omega2 += d_omega2;
    }

    pub fn set_state(&mut self, state: PendulumState) {
        self.state = state;
    }

    pub fn state(&self) -> PendulumState {
        self.state
    }

    pub fn params(&self) -> &PendulumParams {
        &self.config.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulated time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of divergence resets so far.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn energy(&self) -> f64 {
        total_energy(&self.state, &self.config.params)
    }

    pub fn bob_positions(&self) -> BobPositions {
        forward_kinematics(&self.state, &self.config.params)
    }
}
