//! Rotates device-frame linear acceleration into the world frame.
//!
//! World frame is local ENU: x east, y north, z up. Gravity is already
//! excluded from the input per the logger contract, so the only job here is
//! the attitude rotation. Euler angles are converted to a rotation matrix at
//! this boundary; nothing downstream handles raw roll/pitch/yaw.

use nalgebra::{Rotation3, Vector3};

use crate::diagnostics::Diagnostics;
use crate::types::Attitude;

/// Below this |cos(pitch)| the reported roll/yaw are unreliable (gimbal
/// lock); the projector falls back to the last valid rotation.
const COS_PITCH_MIN: f64 = 1e-3;

/// World-frame acceleration for one tick plus whether the attitude that
/// produced it was trustworthy.
pub struct WorldAccel {
    pub accel: Vector3<f64>,
    pub attitude_valid: bool,
}

pub struct Projector {
    last_rotation: Option<Rotation3<f64>>,
}

impl Projector {
    pub fn new() -> Self {
        Self { last_rotation: None }
    }

    pub fn project(
        &mut self,
        timestamp: f64,
        acceleration: &Vector3<f64>,
        attitude: &Attitude,
        diag: &mut Diagnostics,
    ) -> WorldAccel {
        let valid = attitude.pitch.cos().abs() > COS_PITCH_MIN;

        let rotation = if valid {
            let r = Rotation3::from_euler_angles(attitude.roll, attitude.pitch, attitude.yaw);
            self.last_rotation = Some(r);
            r
        } else {
            diag.note_degenerate_attitude(timestamp, attitude.pitch);
            // Until a valid attitude has been seen, identity is the only
            // frame available.
            self.last_rotation.unwrap_or_else(Rotation3::identity)
        };

        WorldAccel {
            accel: rotation * acceleration,
            attitude_valid: valid,
        }
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}
