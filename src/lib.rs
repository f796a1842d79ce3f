//! Dead-reckoning navigation core for handheld motion/location telemetry.
//!
//! Turns a stream of inertial samples (acceleration, gravity, angular rate,
//! attitude, magnetic field) plus intermittent satellite fixes into a
//! continuous, confidence-scored position trajectory. While fixes are valid
//! the trajectory follows them; across outages the strapdown integrator
//! propagates the last reference forward and confidence decays toward zero.
//!
//! The pipeline runs once per sample tick:
//! ingest → project → integrate → reconcile → score → emit,
//! all synchronous and single-threaded. Time only ever comes from input
//! timestamps, so replaying a stored log is bit-identical to live operation.
//!
//! ```no_run
//! use dead_reckoning_rs::{Tracker, TrackerConfig};
//! use dead_reckoning_rs::log_file::load_log;
//!
//! let log = load_log("sensor_log.json".as_ref()).unwrap();
//! let mut tracker = Tracker::new(TrackerConfig::default());
//! for record in &log.records {
//!     let output = tracker.process(record.motion_sample(), record.location_fix());
//!     if let Some(est) = output.estimate() {
//!         println!("{:.6},{:.6} conf={:.2}", est.latitude, est.longitude, est.confidence);
//!     }
//! }
//! ```

pub mod confidence;
pub mod config;
pub mod diagnostics;
pub mod ingest;
pub mod integrator;
pub mod log_file;
pub mod projector;
pub mod reconciler;
pub mod tracker;
pub mod types;

pub use config::TrackerConfig;
pub use diagnostics::Diagnostics;
pub use reconciler::TrackingState;
pub use tracker::Tracker;
pub use types::{
    DeadReckonedEstimate, FixQuality, LocationFix, MotionSample, Provenance, TrackOutput,
};
