use log::{debug, warn};
use serde::Serialize;

/// Counters for every anomaly the core tolerates.
///
/// Nothing in here is fatal. A recording session has to survive transient
/// sensor glitches, so anomalies are counted and logged as warnings instead
/// of being raised as errors.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    /// Samples dropped for non-finite fields.
    pub invalid_samples: u64,
    /// Samples dropped for a non-increasing timestamp.
    pub out_of_order_samples: u64,
    /// Ticks that reused the last valid attitude.
    pub degenerate_attitude_ticks: u64,
    /// Ticks whose dt exceeded the configured ceiling.
    pub clamped_timesteps: u64,
    /// Ticks whose dead-reckoned speed was rescaled to the ceiling.
    pub speed_clamps: u64,
    /// Fixes rejected for accuracy or out-of-range coordinates.
    pub rejected_fixes: u64,
    /// Fixes accepted as a new reference.
    pub accepted_fixes: u64,
    /// Samples that passed validation.
    pub samples_processed: u64,
}

impl Diagnostics {
    pub(crate) fn note_invalid_sample(&mut self, timestamp: f64, reason: &str) {
        self.invalid_samples += 1;
        warn!("dropping sample at t={timestamp:.3}: {reason}");
    }

    pub(crate) fn note_out_of_order(&mut self, timestamp: f64, last: f64) {
        self.out_of_order_samples += 1;
        warn!("dropping out-of-order sample: t={timestamp:.3} after t={last:.3}");
    }

    pub(crate) fn note_degenerate_attitude(&mut self, timestamp: f64, pitch: f64) {
        self.degenerate_attitude_ticks += 1;
        debug!("degenerate attitude at t={timestamp:.3} (pitch={pitch:.4} rad), reusing last rotation");
    }

    pub(crate) fn note_clamped_timestep(&mut self, dt: f64, ceiling: f64) {
        self.clamped_timesteps += 1;
        warn!("clamping dt {dt:.3}s to {ceiling:.3}s");
    }

    pub(crate) fn note_speed_clamp(&mut self, speed: f64, ceiling: f64) {
        self.speed_clamps += 1;
        debug!("rescaling dead-reckoned speed {speed:.2} m/s to ceiling {ceiling:.2} m/s");
    }

    pub(crate) fn note_rejected_fix(&mut self, timestamp: f64, reason: &str) {
        self.rejected_fixes += 1;
        debug!("ignoring fix at t={timestamp:.3}: {reason}");
    }

    pub(crate) fn note_accepted_fix(&mut self) {
        self.accepted_fixes += 1;
    }
}
