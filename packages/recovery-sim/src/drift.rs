//! drift.rs — Surface drift & bearing estimator
//!
//! Not a navigation model. Two behaviours:
//! 1. Mission phase: distance to buoy mirrors the device distance and the
//!    bearing jitters ±1° around a nominal heading every tick
//! 2. Recapture phase (after surfacing): every `interval_s` simulated seconds
//!    each telemetry field takes one bounded uniform random-walk step
//!
//! The random source is passed in on every call so callers decide between a
//! seeded `StdRng` and anything else implementing `RngCore`.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use recovery_types::DriftTelemetry;

use crate::config::DriftConfig;

/// Upper bound on random-walk steps applied by a single `advance` call.
pub const MAX_STEPS_PER_ADVANCE: u32 = 1000;

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if w >= 360.0 { 0.0 } else { w }
}

/// Uniform sample in `(-half_width, half_width)`; zero width yields 0.
fn perturb<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return 0.0;
    }
    Uniform::new(-half_width, half_width).sample(rng)
}

#[derive(Debug, Clone)]
pub struct DriftEstimator {
    cfg: DriftConfig,
    telemetry: DriftTelemetry,
    recapture: bool,
    /// Simulated seconds accumulated toward the next random-walk step
    pending_s: f64,
}

impl DriftEstimator {
    pub fn new(cfg: DriftConfig) -> Self {
        let telemetry = Self::initial_telemetry(&cfg);
        Self { cfg, telemetry, recapture: false, pending_s: 0.0 }
    }

    fn initial_telemetry(cfg: &DriftConfig) -> DriftTelemetry {
        DriftTelemetry {
            distance_to_buoy_m: 0.0,
            bearing_to_buoy_deg: wrap_degrees(cfg.nominal_bearing_deg),
            drift_speed_mps: cfg.initial_speed_mps.clamp(0.0, cfg.max_speed_mps),
            drift_direction_deg: wrap_degrees(cfg.initial_direction_deg),
        }
    }

    pub fn telemetry(&self) -> DriftTelemetry {
        self.telemetry
    }

    pub fn in_recapture(&self) -> bool {
        self.recapture
    }

    /// Mission-phase update: follow the device distance, jitter the bearing.
    pub fn track_mission<R: Rng + ?Sized>(&mut self, current_distance_m: f64, rng: &mut R) {
        self.telemetry.distance_to_buoy_m = current_distance_m.max(0.0);
        self.telemetry.bearing_to_buoy_deg =
            wrap_degrees(self.cfg.nominal_bearing_deg + perturb(rng, self.cfg.bearing_step_deg));
    }

    /// Switch to the recapture random walk, seeded at the surfacing distance.
    pub fn begin_recapture(&mut self, current_distance_m: f64) {
        self.recapture = true;
        self.pending_s = 0.0;
        self.telemetry.distance_to_buoy_m = current_distance_m.max(0.0);
    }

    /// Accumulate `dt` simulated seconds; one walk step per full interval elapsed,
    /// at most `MAX_STEPS_PER_ADVANCE`. Returns the number of steps applied.
    /// No-op outside the recapture phase.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> u32 {
        if !self.recapture || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.pending_s += dt;
        let due = (self.pending_s / self.cfg.interval_s).floor();
        self.pending_s = (self.pending_s - due * self.cfg.interval_s).max(0.0);
        // Backlog beyond the cap is dropped, not carried
        let steps = due.min(MAX_STEPS_PER_ADVANCE as f64) as u32;
        for _ in 0..steps {
            self.step(rng);
        }
        steps
    }

    /// One random-walk step of all four fields.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let c = &self.cfg;
        let t = &mut self.telemetry;

        t.distance_to_buoy_m = (t.distance_to_buoy_m + perturb(rng, c.distance_step_m)).max(0.0);
        t.bearing_to_buoy_deg = wrap_degrees(t.bearing_to_buoy_deg + perturb(rng, c.bearing_step_deg));
        t.drift_speed_mps =
            (t.drift_speed_mps + perturb(rng, c.speed_step_mps)).clamp(0.0, c.max_speed_mps);
        t.drift_direction_deg =
            wrap_degrees(t.drift_direction_deg + perturb(rng, c.direction_step_deg));
    }

    pub fn reset(&mut self) {
        self.telemetry = Self::initial_telemetry(&self.cfg);
        self.recapture = false;
        self.pending_s = 0.0;
    }
}
