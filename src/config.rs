use serde::{Deserialize, Serialize};

/// Tunable parameters for one tracking session.
///
/// Defaults reproduce the behaviour of the phone logger this crate replays:
/// 10 Hz sampling, ~0.995 velocity decay per 100 ms tick, 30 m accuracy gate,
/// 10 m/s dead-reckoned speed ceiling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Fixes with horizontal accuracy at or above this many meters are
    /// rejected and treated the same as an absent fix.
    pub accuracy_threshold: f64,

    /// Maximum trusted dead-reckoning duration in seconds. Confidence decays
    /// linearly from 1.0 to 0.0 over this horizon.
    pub confidence_horizon: f64,

    /// Exponential velocity decay rate (1/s), applied as
    /// `v *= exp(-rate * dt)` each tick to bound accelerometer-bias drift
    /// during long outages. 0.05/s matches the original 0.995-per-tick decay.
    pub velocity_decay_rate: f64,

    /// Ticks with dt above this many seconds are clamped before integration.
    /// Guards against a suspended sampling loop blowing up the integrator.
    pub max_timestep: f64,

    /// Dead-reckoned speed ceiling in m/s. The velocity vector is rescaled,
    /// never zeroed, when it exceeds this.
    pub max_speed: f64,

    /// World-frame acceleration magnitude (m/s²) below which the device is
    /// considered stationary for the ZUPT damping below.
    pub zupt_accel_threshold: f64,

    /// Velocity damping factor applied once per stationary tick.
    pub zupt_velocity_damping: f64,

    /// Confidence multiplier for a dead-reckoned tick that had to reuse a
    /// stale attitude because the reported one was degenerate.
    pub degenerate_attitude_penalty: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: 30.0,
            confidence_horizon: 180.0,
            velocity_decay_rate: 0.05,
            max_timestep: 1.0,
            max_speed: 10.0,
            zupt_accel_threshold: 0.05,
            zupt_velocity_damping: 0.8,
            degenerate_attitude_penalty: 0.9,
        }
    }
}
