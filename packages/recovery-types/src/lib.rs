//! # recovery-types
//!
//! Shared mission vocabulary for the deep-sea device recovery simulator.
//!
//! These types are used by:
//! - `recovery-sim`: the mission state store and its tick loop
//! - operator consoles: every event on the control socket is one of these,
//!   serialized as JSON
//!
//! ## Units
//!
//! - Depth and distance in meters, depth positive downward from the surface
//! - Bearings and drift directions in degrees, always wrapped into `[0, 360)`
//! - Durations reported to operators in whole seconds (floor)

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Device & Buoy Status ──────────────────────────────────────────────────────

/// Motion phase of the submerged device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// No mission running; the device is not being tracked
    #[default]
    Offline,
    /// Holding position, either at max depth or at the surface
    Idle,
    Descending,
    /// Acoustic trigger received, rising toward the surface
    Ascending,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Idle => "idle",
            Self::Descending => "descending",
            Self::Ascending => "ascending",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface relay state. Independent of the device's own motion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuoyStatus {
    #[default]
    Off,
    On,
    Error,
    /// Acoustic signal currently being emitted (frequency test or trigger)
    Transmitting,
}

impl BuoyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Error => "error",
            Self::Transmitting => "transmitting",
        }
    }
}

impl fmt::Display for BuoyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Trigger Codes ─────────────────────────────────────────────────────────────

/// Acoustic release code sent to the device. Each code is a fixed Morse pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCode {
    A,
    B,
    C,
}

impl TriggerCode {
    /// Morse pattern keyed onto the carrier for this code
    pub fn morse(&self) -> &'static str {
        match self {
            Self::A => "-.-.",
            Self::B => "-...-",
            Self::C => "----.",
        }
    }
}

impl fmt::Display for TriggerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        write!(f, "{letter} ({})", self.morse())
    }
}

// ── Mission Outcome ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    Recovered,
    Lost,
}

// ── Drift Telemetry ───────────────────────────────────────────────────────────

/// Recapture-phase position estimate relative to the buoy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftTelemetry {
    pub distance_to_buoy_m: f64,
    /// Bearing from the boat to the buoy, `[0, 360)`
    pub bearing_to_buoy_deg: f64,
    /// Surface drift speed, `[0, max]` m/s
    pub drift_speed_mps: f64,
    /// Direction the device is drifting toward, `[0, 360)`
    pub drift_direction_deg: f64,
}

// ── Mission Snapshot ──────────────────────────────────────────────────────────

/// Read-only view of the whole mission, broadcast on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    pub active: bool,
    pub device_status: DeviceStatus,
    pub buoy_status: BuoyStatus,
    pub current_depth_m: f64,
    pub current_distance_m: f64,
    pub max_depth_m: f64,
    pub acoustic_trigger_activated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acoustic_trigger_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resurface_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resurface_end_time: Option<DateTime<Utc>>,
    pub total_resurfacing_secs: u64,
    pub elapsed_mission_secs: u64,
    pub time_since_resurfacing_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_trigger_code: Option<TriggerCode>,
    pub frequency_khz: u32,
    /// Last frequency test passed and the carrier has not been retuned since
    pub frequency_tested: bool,
    /// Last code test passed and the selection has not changed since
    pub code_tested: bool,
    pub device_recovered: bool,
    pub device_lost: bool,
    pub drift: DriftTelemetry,
}

// ── Notifications ─────────────────────────────────────────────────────────────

/// Change notification published by the mission store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MissionEvent {
    MissionStarted { at: DateTime<Utc> },
    AcousticTriggerActivated {
        at: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<TriggerCode>,
    },
    /// Fired at the end of every tick while a mission is active
    StateUpdated { snapshot: Box<MissionSnapshot> },
    /// Fired exactly once per mission, at the tick the device crosses the ascent threshold
    DeviceResurfaced {
        at: DateTime<Utc>,
        total_resurfacing_secs: u64,
        depth_m: f64,
    },
    MissionEnded { outcome: MissionOutcome },
    MissionReset,
}

impl MissionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissionStarted { .. } => "mission_started",
            Self::AcousticTriggerActivated { .. } => "acoustic_trigger_activated",
            Self::StateUpdated { .. } => "state_updated",
            Self::DeviceResurfaced { .. } => "device_resurfaced",
            Self::MissionEnded { .. } => "mission_ended",
            Self::MissionReset => "mission_reset",
        }
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Format whole seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}
