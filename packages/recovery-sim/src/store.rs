//! store.rs — Mission state store
//!
//! Single owner of all mission state. Screens (or the control socket) call
//! commands and queries on one injected instance; changes are published on a
//! tokio broadcast channel. Not internally synchronized: share it behind a lock
//! and let exactly one task deliver ticks.
//!
//! Tick order:
//!   1. depth model advances depth, distance and status by `seconds_per_tick`
//!   2. drift estimator updates bearing / random walk
//!   3. surface-arrival edge (was ascending, now at/above threshold) freezes the
//!      resurfacing timer, switches drift to recapture and publishes
//!      `DeviceResurfaced` once
//!   4. `StateUpdated` is published with a full snapshot

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use recovery_types::{
    format_hms, BuoyStatus, DeviceStatus, DriftTelemetry, MissionEvent, MissionOutcome,
    MissionSnapshot, TriggerCode,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::acoustic::{AcousticError, AcousticLink};
use crate::clock::{whole_secs_between, Clock};
use crate::config::{ConfigError, SimulatorConfig};
use crate::depth_model::{self, DEPTH_EPSILON_M};
use crate::drift::DriftEstimator;
use crate::resurfacing::{ResurfacingPhase, ResurfacingTimer};
use crate::ticker::Ticker;

pub type SimRng = Box<dyn RngCore + Send + Sync>;

/// `StdRng` from a fixed seed, or from OS entropy when `seed` is `None`.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    #[error("a mission is already active")]
    AlreadyActive,
}

/// Why an acoustic trigger request was refused. State is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerRejected {
    #[error("no active mission")]
    MissionInactive,
    #[error("acoustic trigger already activated")]
    AlreadyActivated,
    #[error("device is {0}; trigger needs descending or idle")]
    InvalidStatus(DeviceStatus),
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
struct MissionState {
    active: bool,
    device_status: DeviceStatus,
    buoy_status: BuoyStatus,
    current_depth_m: f64,
    current_distance_m: f64,
    acoustic_trigger_activated: bool,
    acoustic_trigger_time: Option<DateTime<Utc>>,
    mission_start_time: Option<DateTime<Utc>>,
    /// Set by `end_mission`; freezes the elapsed mission time
    mission_end_time: Option<DateTime<Utc>>,
    device_recovered: bool,
    device_lost: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickResult {
    /// No active mission; nothing changed and nothing was published
    Idle,
    Updated,
    /// This tick crossed the ascent threshold
    Resurfaced { total_secs: u64 },
}

pub struct MissionStore {
    config: SimulatorConfig,
    clock: Box<dyn Clock>,
    ticker: Box<dyn Ticker>,
    rng: SimRng,
    state: MissionState,
    resurfacing: ResurfacingTimer,
    drift: DriftEstimator,
    acoustic: AcousticLink,
    events: broadcast::Sender<MissionEvent>,
    ticks: u64,
}

impl MissionStore {
    /// Validates `config`; an invalid config never produces a store.
    pub fn new(
        config: SimulatorConfig,
        clock: Box<dyn Clock>,
        ticker: Box<dyn Ticker>,
        rng: SimRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.simulation.event_capacity);
        Ok(Self {
            drift: DriftEstimator::new(config.drift.clone()),
            acoustic: AcousticLink::new(&config.acoustic),
            config,
            clock,
            ticker,
            rng,
            state: MissionState::default(),
            resurfacing: ResurfacingTimer::new(),
            events,
            ticks: 0,
        })
    }

    /// Register for change notifications. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<MissionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: MissionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    fn tick_period(&self) -> Duration {
        Duration::from_millis(self.config.simulation.tick_period_ms)
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Begin a new mission: device descending from the surface, ticker running.
    pub fn start_mission(&mut self) -> Result<(), MissionError> {
        if self.state.active {
            warn!("Mission: start ignored, a mission is already active");
            return Err(MissionError::AlreadyActive);
        }
        let now = self.clock.now();
        self.state = MissionState {
            active: true,
            device_status: DeviceStatus::Descending,
            buoy_status: self.state.buoy_status,
            mission_start_time: Some(now),
            ..MissionState::default()
        };
        self.resurfacing.reset();
        self.drift.reset();
        self.ticks = 0;
        self.ticker.start(self.tick_period());

        info!("Mission: started, device descending");
        self.emit(MissionEvent::MissionStarted { at: now });
        Ok(())
    }

    /// Send the release code: device begins ascending and the resurfacing timer starts.
    pub fn activate_acoustic_trigger(&mut self) -> Result<(), TriggerRejected> {
        if let Err(e) = self.check_trigger() {
            warn!("Mission: acoustic trigger rejected: {e}");
            return Err(e);
        }

        let now = self.clock.now();
        self.state.acoustic_trigger_activated = true;
        self.state.acoustic_trigger_time = Some(now);
        self.resurfacing.start(now);
        self.state.device_status = DeviceStatus::Ascending;

        let code = self.acoustic.selected_code();
        match code {
            Some(code) => info!(
                "Mission: acoustic trigger {code} sent at {:.1}m, resurfacing timer started",
                self.state.current_depth_m
            ),
            None => info!(
                "Mission: acoustic trigger sent at {:.1}m with no code selected, resurfacing timer started",
                self.state.current_depth_m
            ),
        }
        self.emit(MissionEvent::AcousticTriggerActivated { at: now, code });
        Ok(())
    }

    /// Close the mission with exactly one outcome flag set.
    pub fn end_mission(&mut self, outcome: MissionOutcome) {
        if !self.state.active {
            debug!("Mission: end requested with no active mission");
        }
        self.ticker.stop();
        self.state.active = false;
        if self.state.mission_start_time.is_some() && self.state.mission_end_time.is_none() {
            self.state.mission_end_time = Some(self.clock.now());
        }
        self.state.device_recovered = outcome == MissionOutcome::Recovered;
        self.state.device_lost = outcome == MissionOutcome::Lost;

        info!(
            "Mission: ended ({outcome:?}) after {}",
            format_hms(self.elapsed_mission_time())
        );
        self.emit(MissionEvent::MissionEnded { outcome });
    }

    /// Stop the ticker and return every mission field to its offline default.
    /// The buoy status and acoustic settings are left alone.
    pub fn reset_mission_state(&mut self) {
        self.ticker.stop();
        self.state = MissionState {
            buoy_status: self.state.buoy_status,
            ..MissionState::default()
        };
        self.resurfacing.reset();
        self.drift.reset();
        self.ticks = 0;

        info!("Mission: state reset");
        self.emit(MissionEvent::MissionReset);
    }

    /// Emergency abort: immediate reset of all mission state.
    pub fn abort(&mut self) {
        warn!("Mission: emergency abort");
        self.reset_mission_state();
    }

    /// Power the buoy on and start the mission.
    pub fn activate_buoy(&mut self) -> Result<(), MissionError> {
        self.state.buoy_status = BuoyStatus::On;
        info!("Mission: buoy activated");
        self.start_mission()
    }

    /// Power the buoy off; the device goes offline and the mission resets.
    pub fn deactivate_buoy(&mut self) {
        self.state.buoy_status = BuoyStatus::Off;
        info!("Mission: buoy deactivated");
        self.reset_mission_state();
    }

    /// Set the buoy relay state. `Off` has the same effect as `deactivate_buoy`.
    pub fn set_buoy_status(&mut self, status: BuoyStatus) {
        if status == BuoyStatus::Off {
            self.deactivate_buoy();
            return;
        }
        if self.state.buoy_status != status {
            debug!("Mission: buoy {} -> {status}", self.state.buoy_status);
        }
        self.state.buoy_status = status;
    }

    pub fn set_selected_trigger_code(&mut self, code: TriggerCode) {
        self.acoustic.select_code(code);
        info!("Mission: trigger code {code} selected");
    }

    pub fn set_frequency_khz(&mut self, khz: u32) -> Result<(), AcousticError> {
        self.acoustic.set_frequency_khz(khz)?;
        info!("Mission: carrier frequency {khz} kHz");
        Ok(())
    }

    pub fn test_frequency(&mut self) -> Result<(), AcousticError> {
        self.acoustic.record_frequency_test(self.state.buoy_status)?;
        info!("Mission: frequency {} kHz test passed", self.acoustic.frequency_khz());
        Ok(())
    }

    pub fn test_trigger_code(&mut self) -> Result<TriggerCode, AcousticError> {
        let code = self.acoustic.record_code_test(self.state.buoy_status)?;
        info!("Mission: trigger code {code} test passed");
        Ok(code)
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    /// Advance the simulation by one tick. No-op without an active mission.
    pub fn tick(&mut self) -> TickResult {
        if !self.state.active {
            return TickResult::Idle;
        }
        self.ticks += 1;
        let dt = self.config.simulation.seconds_per_tick;
        let before = self.state.device_status;

        let step = depth_model::advance(
            before,
            self.state.current_depth_m,
            self.state.current_distance_m,
            dt,
            &self.config.mission,
        );
        self.state.device_status = step.status;
        self.state.current_depth_m = step.depth_m;
        self.state.current_distance_m = step.distance_m;

        if step.transitioned && before == DeviceStatus::Descending {
            info!("Mission: device reached maximum depth {:.1}m", step.depth_m);
        }

        if self.drift.in_recapture() {
            self.drift.advance(dt, &mut *self.rng);
        } else {
            self.drift.track_mission(self.state.current_distance_m, &mut *self.rng);
        }

        let surfaced = before == DeviceStatus::Ascending
            && self.state.current_depth_m <= self.config.mission.ascent_threshold_m + DEPTH_EPSILON_M
            && self.resurfacing.phase() == ResurfacingPhase::Running;

        let mut resurfaced = None;
        if surfaced {
            let now = self.clock.now();
            if let Some(total_secs) = self.resurfacing.stop(now) {
                info!(
                    "Mission: device reached surface at {:.1}m, resurfacing took {}",
                    self.state.current_depth_m,
                    format_hms(total_secs)
                );
                self.drift.begin_recapture(self.state.current_distance_m);
                self.emit(MissionEvent::DeviceResurfaced {
                    at: now,
                    total_resurfacing_secs: total_secs,
                    depth_m: self.state.current_depth_m,
                });
                resurfaced = Some(total_secs);
            }
        }

        debug!(
            "Mission: tick {} {} depth={:.2}m dist={:.2}m",
            self.ticks, self.state.device_status, self.state.current_depth_m, self.state.current_distance_m
        );
        self.emit(MissionEvent::StateUpdated { snapshot: Box::new(self.snapshot()) });

        match resurfaced {
            Some(total_secs) => TickResult::Resurfaced { total_secs },
            None => TickResult::Updated,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Whether `activate_acoustic_trigger` would succeed right now.
    pub fn check_trigger(&self) -> Result<(), TriggerRejected> {
        if !self.state.active {
            return Err(TriggerRejected::MissionInactive);
        }
        if self.state.acoustic_trigger_activated {
            return Err(TriggerRejected::AlreadyActivated);
        }
        match self.state.device_status {
            DeviceStatus::Descending | DeviceStatus::Idle => Ok(()),
            status => Err(TriggerRejected::InvalidStatus(status)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn device_status(&self) -> DeviceStatus {
        self.state.device_status
    }

    pub fn buoy_status(&self) -> BuoyStatus {
        self.state.buoy_status
    }

    pub fn current_depth(&self) -> f64 {
        self.state.current_depth_m
    }

    pub fn current_distance(&self) -> f64 {
        self.state.current_distance_m
    }

    pub fn selected_trigger_code(&self) -> Option<TriggerCode> {
        self.acoustic.selected_code()
    }

    pub fn acoustic(&self) -> &AcousticLink {
        &self.acoustic
    }

    pub fn resurfacing(&self) -> &ResurfacingTimer {
        &self.resurfacing
    }

    pub fn outcome(&self) -> Option<MissionOutcome> {
        match (self.state.device_recovered, self.state.device_lost) {
            (true, _) => Some(MissionOutcome::Recovered),
            (_, true) => Some(MissionOutcome::Lost),
            _ => None,
        }
    }

    /// Whole seconds since mission start; frozen once the mission ends, 0 before any start.
    pub fn elapsed_mission_time(&self) -> u64 {
        match self.state.mission_start_time {
            Some(start) => {
                let until = self.state.mission_end_time.unwrap_or_else(|| self.clock.now());
                whole_secs_between(start, until)
            }
            None => 0,
        }
    }

    /// 0 before ascent, live while ascending, the frozen total once surfaced.
    pub fn time_since_resurfacing(&self) -> u64 {
        self.resurfacing.elapsed_secs(self.clock.now())
    }

    pub fn drift_telemetry(&self) -> DriftTelemetry {
        self.drift.telemetry()
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            active: self.state.active,
            device_status: self.state.device_status,
            buoy_status: self.state.buoy_status,
            current_depth_m: self.state.current_depth_m,
            current_distance_m: self.state.current_distance_m,
            max_depth_m: self.config.mission.max_depth_m,
            acoustic_trigger_activated: self.state.acoustic_trigger_activated,
            acoustic_trigger_time: self.state.acoustic_trigger_time,
            mission_start_time: self.state.mission_start_time,
            resurface_start_time: self.resurfacing.start_time(),
            resurface_end_time: self.resurfacing.end_time(),
            total_resurfacing_secs: self.resurfacing.total_secs(),
            elapsed_mission_secs: self.elapsed_mission_time(),
            time_since_resurfacing_secs: self.time_since_resurfacing(),
            selected_trigger_code: self.acoustic.selected_code(),
            frequency_khz: self.acoustic.frequency_khz(),
            frequency_tested: self.acoustic.frequency_tested(),
            code_tested: self.acoustic.code_tested(),
            device_recovered: self.state.device_recovered,
            device_lost: self.state.device_lost,
            drift: self.drift.telemetry(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MissionConfig;
    use crate::ticker::ManualTicker;

    fn store_with(mission: MissionConfig) -> (MissionStore, ManualClock, ManualTicker) {
        let clock = ManualClock::default();
        let ticker = ManualTicker::new();
        let config = SimulatorConfig { mission, ..Default::default() };
        let store = MissionStore::new(
            config,
            Box::new(clock.clone()),
            Box::new(ticker.clone()),
            Box::new(seeded_rng(Some(11))),
        )
        .unwrap();
        (store, clock, ticker)
    }

    fn store() -> (MissionStore, ManualClock, ManualTicker) {
        store_with(MissionConfig::default())
    }

    fn tick_n(store: &mut MissionStore, clock: &ManualClock, n: usize) {
        for _ in 0..n {
            clock.advance_secs_f64(1.0);
            store.tick();
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = SimulatorConfig {
            mission: MissionConfig { descent_rate_mps: -1.0, ..Default::default() },
            ..Default::default()
        };
        let result = MissionStore::new(
            config,
            Box::new(ManualClock::default()),
            Box::new(ManualTicker::new()),
            Box::new(seeded_rng(Some(1))),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_initial_state_is_offline() {
        let (store, _, _) = store();
        assert!(!store.is_active());
        assert_eq!(store.device_status(), DeviceStatus::Offline);
        assert_eq!(store.buoy_status(), BuoyStatus::Off);
        assert_eq!(store.elapsed_mission_time(), 0);
        assert_eq!(store.time_since_resurfacing(), 0);
    }

    #[test]
    fn test_start_mission_sets_descending_and_starts_ticker() {
        let (mut store, _, ticker) = store();
        store.start_mission().unwrap();
        assert!(store.is_active());
        assert_eq!(store.device_status(), DeviceStatus::Descending);
        assert_eq!(store.current_depth(), 0.0);
        assert!(ticker.is_running());
        assert_eq!(ticker.log().period, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_start_while_active_rejected() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 3);
        assert_eq!(store.start_mission(), Err(MissionError::AlreadyActive));
        assert_eq!(store.current_depth(), 3.0, "existing mission untouched");
    }

    #[test]
    fn test_tick_without_mission_is_noop() {
        let (mut store, _, _) = store();
        let mut rx = store.subscribe();
        assert_eq!(store.tick(), TickResult::Idle);
        assert!(rx.try_recv().is_err());
        assert_eq!(store.current_depth(), 0.0);
    }

    #[test]
    fn test_trigger_rejected_when_inactive() {
        let (mut store, _, _) = store();
        let before = store.snapshot();
        assert_eq!(store.activate_acoustic_trigger(), Err(TriggerRejected::MissionInactive));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_trigger_twice_keeps_first_start_time() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 5);
        store.activate_acoustic_trigger().unwrap();
        let first = store.resurfacing().start_time();

        clock.advance_secs_f64(2.0);
        assert_eq!(store.activate_acoustic_trigger(), Err(TriggerRejected::AlreadyActivated));
        assert_eq!(store.resurfacing().start_time(), first);
        assert_eq!(store.device_status(), DeviceStatus::Ascending);
    }

    #[test]
    fn test_trigger_after_surfacing_rejected() {
        let (mut store, clock, _) = store_with(MissionConfig { max_depth_m: 20.0, ..Default::default() });
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 20);
        store.activate_acoustic_trigger().unwrap();
        tick_n(&mut store, &clock, 20);
        assert_eq!(store.device_status(), DeviceStatus::Idle);
        assert_eq!(store.activate_acoustic_trigger(), Err(TriggerRejected::AlreadyActivated));
    }

    #[test]
    fn test_trigger_rejected_while_offline_after_reset() {
        let (mut store, _, _) = store();
        store.start_mission().unwrap();
        store.reset_mission_state();
        assert_eq!(store.activate_acoustic_trigger(), Err(TriggerRejected::MissionInactive));
    }

    #[test]
    fn test_resurfaced_fires_once() {
        let (mut store, clock, _) = store_with(MissionConfig { max_depth_m: 30.0, ..Default::default() });
        let mut rx = store.subscribe();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 30);
        store.activate_acoustic_trigger().unwrap();

        let mut resurfaced = 0;
        let mut updates = 0;
        for _ in 0..60 {
            clock.advance_secs_f64(1.0);
            store.tick();
            while let Ok(ev) = rx.try_recv() {
                match ev {
                    MissionEvent::DeviceResurfaced { .. } => resurfaced += 1,
                    MissionEvent::StateUpdated { .. } => updates += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(resurfaced, 1);
        assert_eq!(updates, 60);
    }

    #[test]
    fn test_bearing_updates_on_surfacing_tick() {
        let (mut store, clock, _) = store_with(MissionConfig { max_depth_m: 20.0, ..Default::default() });
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 20);
        store.activate_acoustic_trigger().unwrap();

        let mut surfaced = false;
        for _ in 0..20 {
            let before = store.drift_telemetry().bearing_to_buoy_deg;
            clock.advance_secs_f64(1.0);
            if let TickResult::Resurfaced { .. } = store.tick() {
                assert_ne!(store.drift_telemetry().bearing_to_buoy_deg, before);
                assert_eq!(store.drift_telemetry().distance_to_buoy_m, store.current_distance());
                surfaced = true;
                break;
            }
        }
        assert!(surfaced);
    }

    #[test]
    fn test_acoustic_test_results_in_snapshot() {
        let (mut store, _, _) = store();
        store.set_buoy_status(BuoyStatus::On);
        store.set_selected_trigger_code(TriggerCode::B);
        store.test_frequency().unwrap();
        store.test_trigger_code().unwrap();
        let snap = store.snapshot();
        assert!(snap.frequency_tested && snap.code_tested);

        store.set_frequency_khz(40).unwrap();
        assert!(!store.snapshot().frequency_tested);
    }

    #[test]
    fn test_total_resurfacing_time_frozen() {
        let (mut store, clock, _) = store_with(MissionConfig { max_depth_m: 18.0, ..Default::default() });
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 18);
        store.activate_acoustic_trigger().unwrap();
        tick_n(&mut store, &clock, 10);
        assert_eq!(store.resurfacing().phase(), ResurfacingPhase::Stopped);

        let start = store.resurfacing().start_time().unwrap();
        let end = store.resurfacing().end_time().unwrap();
        let total = store.resurfacing().total_secs();
        assert_eq!(total, whole_secs_between(start, end));
        assert_eq!(total, 10);

        tick_n(&mut store, &clock, 25);
        assert_eq!(store.time_since_resurfacing(), total);
        assert_eq!(store.resurfacing().end_time(), Some(end));
    }

    #[test]
    fn test_time_since_resurfacing_live_while_ascending() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 100);
        store.activate_acoustic_trigger().unwrap();
        clock.advance_secs_f64(7.4);
        assert_eq!(store.time_since_resurfacing(), 7);
    }

    #[test]
    fn test_end_mission_sets_single_outcome() {
        let (mut store, clock, ticker) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 4);
        store.end_mission(MissionOutcome::Lost);
        assert!(!store.is_active());
        assert!(!ticker.is_running());
        assert_eq!(store.outcome(), Some(MissionOutcome::Lost));

        store.end_mission(MissionOutcome::Recovered);
        let snap = store.snapshot();
        assert!(snap.device_recovered && !snap.device_lost);
        assert_eq!(ticker.log().stops, 1, "second stop was a no-op");
    }

    #[test]
    fn test_elapsed_frozen_after_end() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 12);
        store.end_mission(MissionOutcome::Recovered);
        clock.advance_secs_f64(100.0);
        assert_eq!(store.elapsed_mission_time(), 12);
        assert_eq!(store.tick(), TickResult::Idle);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut store, clock, ticker) = store();
        store.activate_buoy().unwrap();
        store.set_selected_trigger_code(TriggerCode::A);
        tick_n(&mut store, &clock, 40);
        store.activate_acoustic_trigger().unwrap();
        tick_n(&mut store, &clock, 5);

        store.reset_mission_state();
        let snap = store.snapshot();
        assert!(!snap.active);
        assert_eq!(snap.device_status, DeviceStatus::Offline);
        assert_eq!(snap.current_depth_m, 0.0);
        assert!(!snap.acoustic_trigger_activated);
        assert!(snap.resurface_start_time.is_none());
        assert_eq!(snap.buoy_status, BuoyStatus::On);
        assert_eq!(snap.selected_trigger_code, Some(TriggerCode::A));
        assert_eq!(store.elapsed_mission_time(), 0);
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_deactivate_buoy_goes_offline() {
        let (mut store, clock, _) = store();
        store.activate_buoy().unwrap();
        tick_n(&mut store, &clock, 3);
        store.set_buoy_status(BuoyStatus::Off);
        assert_eq!(store.buoy_status(), BuoyStatus::Off);
        assert_eq!(store.device_status(), DeviceStatus::Offline);
        assert!(!store.is_active());
    }

    #[test]
    fn test_buoy_axis_independent_of_device() {
        let (mut store, clock, _) = store();
        store.activate_buoy().unwrap();
        store.set_buoy_status(BuoyStatus::Transmitting);
        tick_n(&mut store, &clock, 2);
        assert_eq!(store.device_status(), DeviceStatus::Descending);
        store.set_buoy_status(BuoyStatus::Error);
        assert!(store.is_active());
    }

    #[test]
    fn test_acoustic_tests_follow_buoy() {
        let (mut store, _, _) = store();
        assert_eq!(store.test_frequency(), Err(AcousticError::BuoyOff));
        store.set_buoy_status(BuoyStatus::On);
        store.test_frequency().unwrap();
        assert!(store.acoustic().frequency_tested());
        assert_eq!(store.test_trigger_code(), Err(AcousticError::NoCodeSelected));
        store.set_selected_trigger_code(TriggerCode::C);
        assert_eq!(store.test_trigger_code(), Ok(TriggerCode::C));
    }

    #[test]
    fn test_drift_mirrors_distance_before_surfacing() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 10);
        let drift = store.drift_telemetry();
        assert_eq!(drift.distance_to_buoy_m, store.current_distance());
        assert!((drift.bearing_to_buoy_deg - 72.0).abs() <= 1.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let (mut store, clock, _) = store();
        store.start_mission().unwrap();
        tick_n(&mut store, &clock, 2);
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["device_status"], "descending");
        assert_eq!(json["current_depth_m"], 2.0);
        assert!(json.get("resurface_start_time").is_none());
    }
}
