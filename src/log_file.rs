//! Serde model of the JSON sensor-log format produced by the phone logger,
//! plus load/save helpers with transparent `.json.gz` support.
//!
//! The core only produces the `dead_reckoning` object per record; everything
//! else is carried through untouched so an annotated log stays a valid input
//! for the viewer.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Attitude, DeadReckonedEstimate, LocationFix, MotionSample};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vec3Record> for Vector3<f64> {
    fn from(v: Vec3Record) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AttitudeRecord {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionRecord {
    pub acceleration: Vec3Record,
    pub gravity: Vec3Record,
    pub gyroscope: Vec3Record,
    pub attitude: AttitudeRecord,
    pub magnetic_field: Vec3Record,
}

/// Raw location as logged. Unknown speed/course come through as negative
/// sentinels, the way the phone location API reports them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub course: f64,
    pub horizontal_accuracy: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeadReckoningRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: f64,
}

impl From<&DeadReckonedEstimate> for DeadReckoningRecord {
    fn from(est: &DeadReckonedEstimate) -> Self {
        Self {
            latitude: est.latitude,
            longitude: est.longitude,
            confidence: est.confidence,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: f64,
    pub motion: MotionRecord,
    #[serde(default)]
    pub location: Option<LocationRecord>,
    #[serde(default)]
    pub dead_reckoning: Option<DeadReckoningRecord>,
}

impl LogRecord {
    /// Field mapping only; validation is the ingestor's job.
    pub fn motion_sample(&self) -> MotionSample {
        MotionSample {
            timestamp: self.timestamp,
            acceleration: self.motion.acceleration.into(),
            gravity: self.motion.gravity.into(),
            angular_rate: self.motion.gyroscope.into(),
            attitude: Attitude {
                roll: self.motion.attitude.roll,
                pitch: self.motion.attitude.pitch,
                yaw: self.motion.attitude.yaw,
            },
            magnetic_field: self.motion.magnetic_field.into(),
        }
    }

    pub fn location_fix(&self) -> Option<LocationFix> {
        self.location.as_ref().map(|loc| LocationFix {
            timestamp: self.timestamp,
            latitude: loc.latitude,
            longitude: loc.longitude,
            altitude: loc.altitude,
            speed: (loc.speed >= 0.0).then_some(loc.speed),
            course: (loc.course >= 0.0).then_some(loc.course),
            horizontal_accuracy: loc.horizontal_accuracy,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogFile {
    #[serde(default)]
    pub device_info: Value,
    pub records: Vec<LogRecord>,
}

pub fn load_log(path: &Path) -> Result<LogFile> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

pub fn save_log(path: &Path, log: &LogFile) -> Result<()> {
    let file = File::create(path)?;
    if is_gzipped(path) {
        // Finish explicitly so a failed gzip trailer surfaces as an error
        // instead of being swallowed on drop.
        let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
        serde_json::to_writer(&mut writer, log)?;
        writer.into_inner().map_err(|e| e.into_error())?.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, log)?;
        writer.flush()?;
    }
    Ok(())
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record_json() -> &'static str {
        r#"{
            "timestamp": 1700000000.5,
            "motion": {
                "acceleration": {"x": 0.1, "y": 0.2, "z": -0.05},
                "gravity": {"x": 0.0, "y": 0.0, "z": -9.81},
                "gyroscope": {"x": 0.01, "y": 0.0, "z": -0.02},
                "attitude": {"roll": 0.05, "pitch": -0.1, "yaw": 1.57},
                "magnetic_field": {"x": 24.0, "y": -3.5, "z": -40.2}
            },
            "location": {
                "latitude": 35.6812,
                "longitude": 139.7671,
                "altitude": 12.0,
                "speed": -1.0,
                "course": 271.5,
                "horizontal_accuracy": 8.0
            },
            "dead_reckoning": null
        }"#
    }

    #[test]
    fn parses_a_record_and_maps_sentinels() {
        let record: LogRecord = serde_json::from_str(record_json()).unwrap();
        let sample = record.motion_sample();
        assert_relative_eq!(sample.acceleration.x, 0.1);
        assert_relative_eq!(sample.attitude.yaw, 1.57);

        let fix = record.location_fix().unwrap();
        assert!(fix.speed.is_none(), "negative speed means unknown");
        assert_relative_eq!(fix.course.unwrap(), 271.5);
        assert_relative_eq!(fix.horizontal_accuracy, 8.0);
    }

    #[test]
    fn missing_location_and_dead_reckoning_default_to_none() {
        let json = r#"{
            "timestamp": 1.0,
            "motion": {
                "acceleration": {"x": 0, "y": 0, "z": 0},
                "gravity": {"x": 0, "y": 0, "z": -9.81},
                "gyroscope": {"x": 0, "y": 0, "z": 0},
                "attitude": {"roll": 0, "pitch": 0, "yaw": 0},
                "magnetic_field": {"x": 0, "y": 0, "z": 0}
            }
        }"#;
        let record: LogRecord = serde_json::from_str(json).unwrap();
        assert!(record.location.is_none());
        assert!(record.dead_reckoning.is_none());
        assert!(record.location_fix().is_none());
    }

    #[test]
    fn annotated_log_round_trips_with_dead_reckoning_populated() {
        use crate::tracker::Tracker;
        use crate::types::TrackOutput;

        // First record has no fix; the second carries one; the rest dead
        // reckon from it.
        let mut records: Vec<LogRecord> = (0..6)
            .map(|i| {
                let mut r: LogRecord = serde_json::from_str(record_json()).unwrap();
                r.timestamp = 100.0 + i as f64 * 0.1;
                if i != 1 {
                    r.location = None;
                }
                r
            })
            .collect();

        let mut tracker = Tracker::with_defaults();
        for record in &mut records {
            record.dead_reckoning =
                match tracker.process(record.motion_sample(), record.location_fix()) {
                    TrackOutput::Estimate(est) => Some(DeadReckoningRecord::from(&est)),
                    _ => None,
                };
        }

        let log = LogFile {
            device_info: Value::Null,
            records,
        };
        let path = std::env::temp_dir().join("dr_log_annotated.json.gz");
        save_log(&path, &log).unwrap();
        let loaded = load_log(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(loaded.records[0].dead_reckoning.is_none());
        for record in &loaded.records[1..] {
            let dr = record
                .dead_reckoning
                .as_ref()
                .expect("every record after the first valid fix is annotated");
            assert!(dr.confidence > 0.0 && dr.confidence <= 1.0);
            assert!(dr.latitude.is_finite() && dr.longitude.is_finite());
        }
    }

    #[test]
    fn save_log_propagates_write_errors() {
        let log = LogFile {
            device_info: Value::Null,
            records: Vec::new(),
        };
        let missing_dir = std::env::temp_dir().join("dr_no_such_dir").join("out.json");
        assert!(save_log(&missing_dir, &log).is_err());
    }

    #[test]
    fn log_file_round_trips_through_disk() {
        let record: LogRecord = serde_json::from_str(record_json()).unwrap();
        let log = LogFile {
            device_info: serde_json::json!({"model": "iPhone"}),
            records: vec![record],
        };

        let dir = std::env::temp_dir();
        for name in ["dr_log_roundtrip.json", "dr_log_roundtrip.json.gz"] {
            let path = dir.join(name);
            save_log(&path, &log).unwrap();
            let loaded = load_log(&path).unwrap();
            assert_eq!(loaded.records.len(), 1);
            assert_relative_eq!(loaded.records[0].timestamp, 1700000000.5);
            let _ = std::fs::remove_file(&path);
        }
    }
}
