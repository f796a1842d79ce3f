//! Strapdown integrator: double-integrates world-frame linear acceleration
//! into velocity and displacement since the last reference reset.
//!
//! Deliberately not physically exact: velocity is exponentially damped toward
//! zero every tick so accelerometer bias cannot grow displacement without
//! bound during a long GPS outage. That trades accuracy for availability.

use nalgebra::Vector3;

use crate::config::TrackerConfig;
use crate::diagnostics::Diagnostics;

/// Running velocity and accumulated displacement since the active reference.
/// Mutated only by [`Integrator::step`], reset only through
/// [`Integrator::reset`] when the reconciler accepts a fix.
#[derive(Clone, Debug, Default)]
pub struct IntegratorState {
    /// World-frame velocity, m/s (x east, y north, z up).
    pub velocity: Vector3<f64>,
    /// World-frame displacement since the reference origin, meters.
    pub displacement: Vector3<f64>,
}

pub struct Integrator {
    state: IntegratorState,
}

impl Integrator {
    pub fn new() -> Self {
        Self {
            state: IntegratorState::default(),
        }
    }

    pub fn state(&self) -> &IntegratorState {
        &self.state
    }

    /// Zeroes accumulated displacement and replaces velocity with the
    /// fix-derived vector. Called by the reconciler on every accepted fix.
    pub fn reset(&mut self, velocity: Vector3<f64>) {
        self.state.velocity = velocity;
        self.state.displacement = Vector3::zeros();
    }

    /// Advances the state by one tick of world-frame acceleration.
    ///
    /// Displacement is updated before velocity so that a constant
    /// acceleration from rest accumulates exactly 0.5·a·t².
    pub fn step(
        &mut self,
        accel: &Vector3<f64>,
        dt: f64,
        cfg: &TrackerConfig,
        diag: &mut Diagnostics,
    ) {
        let dt = if dt > cfg.max_timestep {
            diag.note_clamped_timestep(dt, cfg.max_timestep);
            cfg.max_timestep
        } else {
            dt
        };

        self.state.displacement += self.state.velocity * dt + accel * (0.5 * dt * dt);
        self.state.velocity += accel * dt;

        // ZUPT: a still device should not keep a phantom velocity alive.
        if accel.norm() < cfg.zupt_accel_threshold {
            self.state.velocity *= cfg.zupt_velocity_damping;
        }

        if cfg.velocity_decay_rate > 0.0 {
            self.state.velocity *= (-cfg.velocity_decay_rate * dt).exp();
        }

        let speed = self.state.velocity.norm();
        if speed > cfg.max_speed {
            diag.note_speed_clamp(speed, cfg.max_speed);
            self.state.velocity *= cfg.max_speed / speed;
        }
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new()
    }
}
