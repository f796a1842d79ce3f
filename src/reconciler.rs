//! Fix reconciliation: merges satellite fixes with the strapdown integrator.
//!
//! A valid fresh fix hard-resets the reference; there is no blending across
//! the transition, which keeps the error bounded and the model simple.
//! Between fixes the estimate is the reference position plus the integrated
//! displacement, converted through a local-tangent-plane approximation.

use log::debug;
use nalgebra::Vector3;

use crate::config::TrackerConfig;
use crate::diagnostics::Diagnostics;
use crate::integrator::Integrator;
use crate::types::{LocationFix, Provenance};

/// WGS84 equatorial radius, meters. Same constant the phone logger uses for
/// its flat-earth conversion.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// The last trusted absolute position/velocity/time, used as the integration
/// origin. Replaced atomically whenever a valid fix arrives.
#[derive(Clone, Debug)]
pub struct ReferenceState {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// World-frame velocity derived from GPS course and speed (x east,
    /// y north, z up). Zero when the receiver reported neither.
    pub velocity: Vector3<f64>,
    pub timestamp: f64,
}

impl ReferenceState {
    fn from_fix(fix: &LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            velocity: velocity_from_fix(fix),
            timestamp: fix.timestamp,
        }
    }
}

/// Reconciler state machine. The enum carries the data each state needs so
/// the compiler checks every transition exhaustively.
#[derive(Clone, Debug)]
pub enum TrackingState {
    /// No valid fix yet; no estimate can be produced.
    Uninitialized,
    /// Following valid fixes directly.
    GpsLocked { reference: ReferenceState },
    /// Propagating from the last reference via the integrator.
    DeadReckoning { reference: ReferenceState, since: f64 },
}

/// Position resolved for one tick.
pub struct ResolvedPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub provenance: Provenance,
    /// Seconds since the reference fix. 0.0 on a fix tick.
    pub elapsed_since_fix: f64,
}

pub struct Reconciler {
    state: TrackingState,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            state: TrackingState::Uninitialized,
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Merges this tick's (possibly absent) fix with the integrator output.
    /// Returns `None` only while no valid fix has ever been seen.
    pub fn reconcile(
        &mut self,
        timestamp: f64,
        fix: Option<&LocationFix>,
        integrator: &mut Integrator,
        cfg: &TrackerConfig,
        diag: &mut Diagnostics,
    ) -> Option<ResolvedPosition> {
        let valid_fix = fix.filter(|f| {
            if f.horizontal_accuracy < cfg.accuracy_threshold {
                true
            } else {
                diag.note_rejected_fix(f.timestamp, "horizontal accuracy above threshold");
                false
            }
        });

        if let Some(fix) = valid_fix {
            let reference = ReferenceState::from_fix(fix);
            integrator.reset(reference.velocity);
            diag.note_accepted_fix();
            if let TrackingState::DeadReckoning { since, .. } = self.state {
                debug!(
                    "fix reacquired at t={timestamp:.3} after {:.1}s of dead reckoning",
                    timestamp - since
                );
            }
            self.state = TrackingState::GpsLocked { reference };
            return Some(ResolvedPosition {
                latitude: fix.latitude,
                longitude: fix.longitude,
                provenance: Provenance::Gps,
                elapsed_since_fix: 0.0,
            });
        }

        match &self.state {
            TrackingState::Uninitialized => None,
            TrackingState::GpsLocked { reference } => {
                debug!("fix lost at t={timestamp:.3}, entering dead reckoning");
                let reference = reference.clone();
                let resolved = dead_reckoned_position(&reference, integrator, timestamp);
                self.state = TrackingState::DeadReckoning {
                    reference,
                    since: timestamp,
                };
                Some(resolved)
            }
            TrackingState::DeadReckoning { reference, .. } => {
                Some(dead_reckoned_position(reference, integrator, timestamp))
            }
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

fn dead_reckoned_position(
    reference: &ReferenceState,
    integrator: &Integrator,
    timestamp: f64,
) -> ResolvedPosition {
    let disp = integrator.state().displacement;
    let (latitude, longitude) = offset_latlon(reference.latitude, reference.longitude, disp.y, disp.x);
    ResolvedPosition {
        latitude,
        longitude,
        provenance: Provenance::DeadReckoning,
        elapsed_since_fix: (timestamp - reference.timestamp).max(0.0),
    }
}

/// Flat-earth conversion of a local east/north displacement (meters) to a
/// lat/lon offset. Valid for the short ranges dead reckoning covers.
pub fn offset_latlon(latitude: f64, longitude: f64, north_m: f64, east_m: f64) -> (f64, f64) {
    let d_lat = north_m / EARTH_RADIUS;
    // cos(lat) hits 0 at the poles; floor it so an eastward displacement
    // stays finite over the whole valid fix range.
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    let d_lon = east_m / (EARTH_RADIUS * cos_lat);
    (latitude + d_lat.to_degrees(), longitude + d_lon.to_degrees())
}

/// North/east velocity from GPS course (degrees clockwise from north) and
/// speed. Missing course or speed means no usable velocity.
fn velocity_from_fix(fix: &LocationFix) -> Vector3<f64> {
    match (fix.speed, fix.course) {
        (Some(speed), Some(course)) => {
            let course_rad = course.to_radians();
            Vector3::new(speed * course_rad.sin(), speed * course_rad.cos(), 0.0)
        }
        _ => Vector3::zeros(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fix(timestamp: f64, accuracy: f64) -> LocationFix {
        LocationFix {
            timestamp,
            latitude: 35.0,
            longitude: 139.0,
            altitude: 20.0,
            speed: None,
            course: None,
            horizontal_accuracy: accuracy,
        }
    }

    #[test]
    fn uninitialized_until_first_valid_fix() {
        let mut rec = Reconciler::new();
        let mut integ = Integrator::new();
        let mut diag = Diagnostics::default();
        let cfg = TrackerConfig::default();

        assert!(rec
            .reconcile(0.0, None, &mut integ, &cfg, &mut diag)
            .is_none());
        // An inaccurate fix does not initialize either.
        assert!(rec
            .reconcile(0.1, Some(&fix(0.1, 80.0)), &mut integ, &cfg, &mut diag)
            .is_none());
        assert!(matches!(rec.state(), TrackingState::Uninitialized));
        assert_eq!(diag.rejected_fixes, 1);

        let out = rec
            .reconcile(0.2, Some(&fix(0.2, 5.0)), &mut integ, &cfg, &mut diag)
            .unwrap();
        assert_eq!(out.provenance, Provenance::Gps);
        assert!(matches!(rec.state(), TrackingState::GpsLocked { .. }));
    }

    #[test]
    fn lost_fix_switches_to_dead_reckoning() {
        let mut rec = Reconciler::new();
        let mut integ = Integrator::new();
        let mut diag = Diagnostics::default();
        let cfg = TrackerConfig::default();

        rec.reconcile(0.0, Some(&fix(0.0, 5.0)), &mut integ, &cfg, &mut diag);
        let out = rec
            .reconcile(0.1, None, &mut integ, &cfg, &mut diag)
            .unwrap();
        assert_eq!(out.provenance, Provenance::DeadReckoning);
        assert!(matches!(rec.state(), TrackingState::DeadReckoning { .. }));
        // Still device: the dead-reckoned position is the reference itself.
        assert_relative_eq!(out.latitude, 35.0, epsilon = 1e-12);
        assert_relative_eq!(out.longitude, 139.0, epsilon = 1e-12);
        assert_relative_eq!(out.elapsed_since_fix, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn reacquired_fix_hard_resets() {
        let mut rec = Reconciler::new();
        let mut integ = Integrator::new();
        let mut diag = Diagnostics::default();
        let cfg = TrackerConfig {
            velocity_decay_rate: 0.0,
            zupt_accel_threshold: 0.0,
            ..TrackerConfig::default()
        };

        rec.reconcile(0.0, Some(&fix(0.0, 5.0)), &mut integ, &cfg, &mut diag);
        for i in 1..=10 {
            integ.step(&Vector3::new(2.0, 0.0, 0.0), 0.1, &cfg, &mut diag);
            rec.reconcile(i as f64 * 0.1, None, &mut integ, &cfg, &mut diag);
        }
        assert!(integ.state().displacement.norm() > 0.0);

        let mut back = fix(1.1, 5.0);
        back.latitude = 35.0005;
        let out = rec
            .reconcile(1.1, Some(&back), &mut integ, &cfg, &mut diag)
            .unwrap();
        assert_eq!(out.provenance, Provenance::Gps);
        assert_relative_eq!(out.latitude, 35.0005, epsilon = 1e-12);
        assert_eq!(integ.state().displacement.norm(), 0.0);
    }

    #[test]
    fn fix_velocity_comes_from_course_and_speed() {
        let mut rec = Reconciler::new();
        let mut integ = Integrator::new();
        let mut diag = Diagnostics::default();
        let cfg = TrackerConfig::default();

        let mut f = fix(0.0, 5.0);
        f.speed = Some(2.0);
        f.course = Some(90.0); // due east
        rec.reconcile(0.0, Some(&f), &mut integ, &cfg, &mut diag);

        let v = integ.state().velocity;
        assert_relative_eq!(v.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn polar_reference_keeps_longitude_finite() {
        let (lat, lon) = offset_latlon(90.0, 0.0, 0.0, 5.0);
        assert!(lat.is_finite());
        assert!(lon.is_finite());

        let (_, lon) = offset_latlon(-90.0, 10.0, 1.0, -3.0);
        assert!(lon.is_finite());
    }

    #[test]
    fn northward_displacement_raises_latitude_only() {
        let (lat, lon) = offset_latlon(35.0, 139.0, 111.0, 0.0);
        assert!(lat > 35.0);
        assert_relative_eq!(lon, 139.0, epsilon = 1e-12);
        // ~1e-3 degrees per 111m of northing.
        assert_relative_eq!(lat - 35.0, 111.0 / EARTH_RADIUS * 180.0 / std::f64::consts::PI, epsilon = 1e-12);
    }
}
