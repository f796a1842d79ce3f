//! The per-session pipeline: one tick in, one output record out.
//!
//! `Tracker` owns every piece of mutable state (ingestor clock, last valid
//! attitude, integrator, reference) so independent sessions are just
//! independent `Tracker` values and replaying a stored log is bit-identical
//! to live operation for the same input sequence. Single-threaded by design;
//! the host serializes ticks.

use crate::confidence::{apply_attitude_penalty, dead_reckoning_confidence};
use crate::config::TrackerConfig;
use crate::diagnostics::Diagnostics;
use crate::ingest::Ingestor;
use crate::integrator::Integrator;
use crate::projector::Projector;
use crate::reconciler::{Reconciler, TrackingState};
use crate::types::{DeadReckonedEstimate, LocationFix, MotionSample, Provenance, TrackOutput};

pub struct Tracker {
    config: TrackerConfig,
    ingestor: Ingestor,
    projector: Projector,
    integrator: Integrator,
    reconciler: Reconciler,
    diagnostics: Diagnostics,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            ingestor: Ingestor::new(),
            projector: Projector::new(),
            integrator: Integrator::new(),
            reconciler: Reconciler::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default())
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn state(&self) -> &TrackingState {
        self.reconciler.state()
    }

    /// Processes one tick: ingest, project, integrate, reconcile, score,
    /// emit. Never panics on malformed input; the worst outcome is a
    /// `Dropped` marker and a diagnostics counter.
    pub fn process(&mut self, sample: MotionSample, fix: Option<LocationFix>) -> TrackOutput {
        let timestamp = sample.timestamp;

        let Some(ingested) = self.ingestor.ingest(sample, fix, &mut self.diagnostics) else {
            return TrackOutput::Dropped { timestamp };
        };

        let world = self.projector.project(
            ingested.sample.timestamp,
            &ingested.sample.acceleration,
            &ingested.sample.attitude,
            &mut self.diagnostics,
        );

        // First sample of a session has no dt to integrate over.
        if let Some(dt) = ingested.dt {
            self.integrator
                .step(&world.accel, dt, &self.config, &mut self.diagnostics);
        }

        let resolved = self.reconciler.reconcile(
            ingested.sample.timestamp,
            ingested.fix.as_ref(),
            &mut self.integrator,
            &self.config,
            &mut self.diagnostics,
        );

        let Some(resolved) = resolved else {
            return TrackOutput::NoFix {
                timestamp: ingested.sample.timestamp,
            };
        };

        let confidence = match resolved.provenance {
            Provenance::Gps => 1.0,
            Provenance::DeadReckoning => {
                let base = dead_reckoning_confidence(
                    resolved.elapsed_since_fix,
                    self.config.confidence_horizon,
                );
                if world.attitude_valid {
                    base
                } else {
                    apply_attitude_penalty(base, self.config.degenerate_attitude_penalty)
                }
            }
        };

        TrackOutput::Estimate(DeadReckonedEstimate {
            timestamp: ingested.sample.timestamp,
            latitude: resolved.latitude,
            longitude: resolved.longitude,
            confidence,
            provenance: resolved.provenance,
        })
    }
}
