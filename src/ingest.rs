//! Sample ingestion: validates one raw motion + location reading and turns it
//! into the normalized record shape the rest of the pipeline consumes.
//!
//! Validation never fails the stream. A bad sample is dropped and counted; a
//! bad fix is discarded while the motion sample is kept.

use crate::diagnostics::Diagnostics;
use crate::types::{LocationFix, MotionSample};

/// A validated sample paired with the time elapsed since the previous
/// accepted one. `dt` is `None` for the first sample of a session.
pub struct IngestedSample {
    pub sample: MotionSample,
    pub fix: Option<LocationFix>,
    pub dt: Option<f64>,
}

/// Stateful ingestor: remembers the last accepted timestamp so it can enforce
/// strict ordering and derive per-tick dt from the input clock alone.
pub struct Ingestor {
    last_accepted: Option<f64>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self { last_accepted: None }
    }

    /// Validates one reading. Returns `None` when the motion sample has to be
    /// dropped; an invalid fix alone only discards the fix.
    pub fn ingest(
        &mut self,
        sample: MotionSample,
        fix: Option<LocationFix>,
        diag: &mut Diagnostics,
    ) -> Option<IngestedSample> {
        if let Some(reason) = motion_sample_problem(&sample) {
            diag.note_invalid_sample(sample.timestamp, reason);
            return None;
        }

        if let Some(last) = self.last_accepted {
            if sample.timestamp <= last {
                diag.note_out_of_order(sample.timestamp, last);
                return None;
            }
        }

        let fix = match fix {
            Some(f) => match location_fix_problem(&f) {
                Some(reason) => {
                    diag.note_rejected_fix(f.timestamp, reason);
                    None
                }
                None => Some(normalize_fix(f)),
            },
            None => None,
        };

        let dt = self.last_accepted.map(|last| sample.timestamp - last);
        self.last_accepted = Some(sample.timestamp);
        diag.samples_processed += 1;

        Some(IngestedSample { sample, fix, dt })
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new()
    }
}

fn motion_sample_problem(sample: &MotionSample) -> Option<&'static str> {
    if !sample.timestamp.is_finite() {
        return Some("non-finite timestamp");
    }
    if !finite3(&sample.acceleration) {
        return Some("non-finite acceleration");
    }
    if !finite3(&sample.gravity) {
        return Some("non-finite gravity");
    }
    if !finite3(&sample.angular_rate) {
        return Some("non-finite angular rate");
    }
    let att = &sample.attitude;
    if !(att.roll.is_finite() && att.pitch.is_finite() && att.yaw.is_finite()) {
        return Some("non-finite attitude");
    }
    if !finite3(&sample.magnetic_field) {
        return Some("non-finite magnetic field");
    }
    None
}

fn location_fix_problem(fix: &LocationFix) -> Option<&'static str> {
    if !(fix.timestamp.is_finite()
        && fix.latitude.is_finite()
        && fix.longitude.is_finite()
        && fix.altitude.is_finite()
        && fix.horizontal_accuracy.is_finite())
    {
        return Some("non-finite location field");
    }
    if !(-90.0..=90.0).contains(&fix.latitude) {
        return Some("latitude out of range");
    }
    if !(-180.0..=180.0).contains(&fix.longitude) {
        return Some("longitude out of range");
    }
    if fix.horizontal_accuracy <= 0.0 {
        return Some("non-positive horizontal accuracy");
    }
    None
}

/// The phone reports unknown speed/course as negative values; map those to
/// absent so downstream code never branches on sentinels.
fn normalize_fix(mut fix: LocationFix) -> LocationFix {
    fix.speed = fix.speed.filter(|s| s.is_finite() && *s >= 0.0);
    fix.course = fix
        .course
        .filter(|c| c.is_finite() && (0.0..360.0).contains(c));
    fix
}

fn finite3(v: &nalgebra::Vector3<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
