//! resurfacing.rs — Ascent stopwatch
//!
//! NOT_STARTED → RUNNING on acoustic trigger, RUNNING → STOPPED on surface
//! arrival. Only a whole-mission reset goes back to NOT_STARTED.

use chrono::{DateTime, Utc};

use crate::clock::whole_secs_between;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResurfacingPhase {
    NotStarted,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResurfacingTimer {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    total_secs: u64,
}

impl ResurfacingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ResurfacingPhase {
        match (self.start, self.end) {
            (None, _) => ResurfacingPhase::NotStarted,
            (Some(_), None) => ResurfacingPhase::Running,
            (Some(_), Some(_)) => ResurfacingPhase::Stopped,
        }
    }

    /// Returns false (and changes nothing) unless the timer has never started.
    pub fn start(&mut self, at: DateTime<Utc>) -> bool {
        if self.phase() != ResurfacingPhase::NotStarted {
            return false;
        }
        self.start = Some(at);
        true
    }

    /// Freeze the timer. Returns the total only on the RUNNING → STOPPED edge.
    pub fn stop(&mut self, at: DateTime<Utc>) -> Option<u64> {
        let start = match (self.start, self.end) {
            (Some(start), None) => start,
            _ => return None,
        };
        let end = at.max(start);
        self.end = Some(end);
        self.total_secs = whole_secs_between(start, end);
        Some(self.total_secs)
    }

    /// 0 before ascent, live floor seconds while rising, frozen total once surfaced.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match (self.start, self.end) {
            (None, _) => 0,
            (Some(start), None) => whole_secs_between(start, now),
            (Some(_), Some(_)) => self.total_secs,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
