//! config.rs — Simulator configuration (config.toml)
//!
//! Every section and field has a default, so an empty file is a valid config.
//! Rates and depths are immutable for the lifetime of a mission store;
//! `validate()` runs when the store is constructed.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Bundled defaults, used when no config file is found on disk
pub const BUNDLED_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub mission: MissionConfig,
    pub simulation: SimulationConfig,
    pub drift: DriftConfig,
    pub acoustic: AcousticConfig,
    pub console: ConsoleConfig,
}

/// Device motion constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub max_depth_m: f64,
    pub descent_rate_mps: f64,
    pub ascent_rate_mps: f64,
    /// Device is considered surfaced once shallower than this while ascending
    pub ascent_threshold_m: f64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            max_depth_m: 245.0,
            descent_rate_mps: 1.0,
            ascent_rate_mps: 0.8,
            ascent_threshold_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock period between ticks
    pub tick_period_ms: u64,
    /// Simulated seconds advanced per tick
    pub seconds_per_tick: f64,
    /// Fixed seed for the drift random walk; entropy when absent
    pub seed: Option<u64>,
    /// Notification buffer per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            seconds_per_tick: 1.0,
            seed: None,
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Simulated seconds between random-walk steps in the recapture phase
    pub interval_s: f64,
    pub nominal_bearing_deg: f64,
    pub initial_speed_mps: f64,
    pub initial_direction_deg: f64,
    pub distance_step_m: f64,
    pub bearing_step_deg: f64,
    pub speed_step_mps: f64,
    pub max_speed_mps: f64,
    pub direction_step_deg: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            interval_s: 5.0,
            nominal_bearing_deg: 72.0,
            initial_speed_mps: 0.6,
            initial_direction_deg: 105.0,
            distance_step_m: 2.5,
            bearing_step_deg: 1.0,
            speed_step_mps: 0.05,
            max_speed_mps: 2.0,
            direction_step_deg: 2.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AcousticConfig {
    pub default_frequency_khz: u32,
    pub min_frequency_khz: u32,
    pub max_frequency_khz: u32,
    /// How long the buoy stays `transmitting` before the trigger lands
    pub transmission_delay_ms: u64,
}

impl Default for AcousticConfig {
    fn default() -> Self {
        Self {
            default_frequency_khz: 57,
            min_frequency_khz: 25,
            max_frequency_khz: 75,
            transmission_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub ctrl_port: u16,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { ctrl_port: 9191 }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SimulatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: SimulatorConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path`, falling back to the bundled config when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, using bundled config", path.display());
                Self::from_toml_str(BUNDLED_CONFIG)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mission.validate()?;
        self.simulation.validate()?;
        self.drift.validate()?;
        self.acoustic.validate()
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, requirement: "finite and > 0", value })
    }
}

impl MissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("mission.max_depth_m", self.max_depth_m)?;
        require_positive("mission.descent_rate_mps", self.descent_rate_mps)?;
        require_positive("mission.ascent_rate_mps", self.ascent_rate_mps)?;
        let t = self.ascent_threshold_m;
        if !(t.is_finite() && t >= 0.0 && t < self.max_depth_m) {
            return Err(ConfigError::OutOfRange {
                field: "mission.ascent_threshold_m",
                requirement: "within [0, max_depth_m)",
                value: t,
            });
        }
        Ok(())
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("simulation.tick_period_ms", self.tick_period_ms as f64)?;
        require_positive("simulation.seconds_per_tick", self.seconds_per_tick)?;
        require_positive("simulation.event_capacity", self.event_capacity as f64)
    }

    /// Simulated seconds per wall-clock second at real-time speed. A clock
    /// running at this rate advances `seconds_per_tick` between two ticks.
    pub fn clock_rate(&self) -> f64 {
        self.seconds_per_tick * 1000.0 / self.tick_period_ms.max(1) as f64
    }
}

impl DriftConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("drift.interval_s", self.interval_s)?;
        require_positive("drift.max_speed_mps", self.max_speed_mps)?;
        for (field, value) in [
            ("drift.distance_step_m", self.distance_step_m),
            ("drift.bearing_step_deg", self.bearing_step_deg),
            ("drift.speed_step_mps", self.speed_step_mps),
            ("drift.direction_step_deg", self.direction_step_deg),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange { field, requirement: "finite and >= 0", value });
            }
        }
        Ok(())
    }
}

impl AcousticConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frequency_khz > self.max_frequency_khz {
            return Err(ConfigError::OutOfRange {
                field: "acoustic.min_frequency_khz",
                requirement: "<= acoustic.max_frequency_khz",
                value: self.min_frequency_khz as f64,
            });
        }
        if !(self.min_frequency_khz..=self.max_frequency_khz).contains(&self.default_frequency_khz) {
            return Err(ConfigError::OutOfRange {
                field: "acoustic.default_frequency_khz",
                requirement: "inside the acoustic band",
                value: self.default_frequency_khz as f64,
            });
        }
        Ok(())
    }
}
