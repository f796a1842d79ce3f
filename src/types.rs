use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Device attitude as Euler angles in radians, the way the phone reports it.
/// Converted to a rotation matrix at the input boundary (see `projector`);
/// nothing downstream touches the raw angles.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// One motion reading in the device frame, SI units.
///
/// `acceleration` excludes gravity per the logger contract; the gravity
/// vector is reported separately.
#[derive(Clone, Debug)]
pub struct MotionSample {
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Linear acceleration, device frame, m/s², gravity removed.
    pub acceleration: Vector3<f64>,
    /// Gravity vector, device frame, m/s².
    pub gravity: Vector3<f64>,
    /// Angular rate, rad/s.
    pub angular_rate: Vector3<f64>,
    pub attitude: Attitude,
    /// Magnetic field, µT.
    pub magnetic_field: Vector3<f64>,
}

/// One satellite fix (WGS84).
#[derive(Clone, Debug)]
pub struct LocationFix {
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Ground speed in m/s; `None` when the receiver reports it as unknown.
    pub speed: Option<f64>,
    /// Course over ground in degrees [0, 360); `None` when unknown.
    pub course: Option<f64>,
    /// Horizontal accuracy in meters, > 0.
    pub horizontal_accuracy: f64,
}

impl LocationFix {
    pub fn quality(&self) -> FixQuality {
        FixQuality::classify(self.horizontal_accuracy)
    }
}

/// Horizontal-accuracy tiers, matching the status bands the phone UI shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl FixQuality {
    pub fn classify(horizontal_accuracy: f64) -> Self {
        if horizontal_accuracy < 5.0 {
            FixQuality::Excellent
        } else if horizontal_accuracy < 15.0 {
            FixQuality::Good
        } else if horizontal_accuracy < 30.0 {
            FixQuality::Fair
        } else if horizontal_accuracy < 100.0 {
            FixQuality::Poor
        } else {
            FixQuality::VeryPoor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FixQuality::Excellent => "excellent",
            FixQuality::Good => "good",
            FixQuality::Fair => "fair",
            FixQuality::Poor => "poor",
            FixQuality::VeryPoor => "very_poor",
        }
    }
}

/// Where a position estimate came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Gps,
    DeadReckoning,
}

/// Per-tick position estimate. Immutable once emitted; one per input sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeadReckonedEstimate {
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// 1.0 on a fix, decaying toward 0.0 while dead reckoning.
    pub confidence: f64,
    pub provenance: Provenance,
}

/// Result of one tick of the pipeline.
#[derive(Clone, Debug)]
pub enum TrackOutput {
    Estimate(DeadReckonedEstimate),
    /// No valid fix has ever been seen, so there is nothing to estimate yet.
    /// This is a documented startup state, not an error.
    NoFix { timestamp: f64 },
    /// The sample failed validation and was discarded. The anomaly is counted
    /// in `Diagnostics`; reference and integrator state are untouched.
    Dropped { timestamp: f64 },
}

impl TrackOutput {
    pub fn estimate(&self) -> Option<&DeadReckonedEstimate> {
        match self {
            TrackOutput::Estimate(est) => Some(est),
            _ => None,
        }
    }
}
