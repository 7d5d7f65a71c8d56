//! control.rs — Operator command boundary
//!
//! Commands arrive as JSON: { "cmd": "...", "args": {...} }
//! `apply` runs one command against the store and always answers with a reply;
//! rejected commands are reported, never panicked on.

use recovery_types::{BuoyStatus, MissionOutcome, MissionSnapshot, TriggerCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::MissionStore;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum ControlCommand {
    ActivateBuoy,
    DeactivateBuoy,
    SetBuoyStatus { status: BuoyStatus },
    StartMission,
    Trigger,
    EndMission { outcome: MissionOutcome },
    Reset,
    Abort,
    SelectCode { code: TriggerCode },
    SetFrequency { khz: u32 },
    TestFrequency,
    TestCode,
    Snapshot,
}

impl ControlCommand {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Box<MissionSnapshot>>,
}

impl CommandReply {
    fn done(store: &MissionStore, message: impl Into<String>) -> Self {
        Self {
            kind: "reply",
            ok: true,
            message: message.into(),
            snapshot: Some(Box::new(store.snapshot())),
        }
    }

    fn rejected(store: &MissionStore, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        warn!("Control: rejected: {message}");
        Self {
            kind: "reply",
            ok: false,
            message,
            snapshot: Some(Box::new(store.snapshot())),
        }
    }

    /// Reply for input that never reached the store.
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        let message = format!("bad command: {err}");
        warn!("Control: {message}");
        Self { kind: "reply", ok: false, message, snapshot: None }
    }
}

pub fn apply(store: &mut MissionStore, cmd: ControlCommand) -> CommandReply {
    match cmd {
        ControlCommand::ActivateBuoy => match store.activate_buoy() {
            Ok(()) => CommandReply::done(store, "buoy on, mission started"),
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::DeactivateBuoy => {
            store.deactivate_buoy();
            CommandReply::done(store, "buoy off, mission reset")
        }
        ControlCommand::SetBuoyStatus { status } => {
            store.set_buoy_status(status);
            CommandReply::done(store, format!("buoy {status}"))
        }
        ControlCommand::StartMission => match store.start_mission() {
            Ok(()) => CommandReply::done(store, "mission started"),
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::Trigger => match store.activate_acoustic_trigger() {
            Ok(()) => CommandReply::done(store, "acoustic trigger activated"),
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::EndMission { outcome } => {
            store.end_mission(outcome);
            let message = match outcome {
                MissionOutcome::Recovered => "mission ended: device recovered",
                MissionOutcome::Lost => "mission ended: device lost",
            };
            CommandReply::done(store, message)
        }
        ControlCommand::Reset => {
            store.reset_mission_state();
            CommandReply::done(store, "mission reset")
        }
        ControlCommand::Abort => {
            store.abort();
            CommandReply::done(store, "mission aborted")
        }
        ControlCommand::SelectCode { code } => {
            store.set_selected_trigger_code(code);
            CommandReply::done(store, format!("code {code} selected"))
        }
        ControlCommand::SetFrequency { khz } => match store.set_frequency_khz(khz) {
            Ok(()) => CommandReply::done(store, format!("frequency {khz} kHz")),
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::TestFrequency => match store.test_frequency() {
            Ok(()) => {
                let khz = store.acoustic().frequency_khz();
                CommandReply::done(store, format!("frequency {khz} kHz test passed"))
            }
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::TestCode => match store.test_trigger_code() {
            Ok(code) => CommandReply::done(store, format!("code {code} test passed")),
            Err(e) => CommandReply::rejected(store, e),
        },
        ControlCommand::Snapshot => CommandReply::done(store, "snapshot"),
    }
}

// ── Trigger transmission ─────────────────────────────────────────────────────
//
// An operator trigger keys the code onto the buoy before the device is released:
// `begin_trigger_transmission`, wait `transmission_delay_ms`, then
// `finish_trigger_transmission`. The caller must not hold the store across the wait.

/// Put the buoy into `transmitting`. Fails with the rejection reply, buoy
/// untouched, when the trigger could not succeed anyway.
pub fn begin_trigger_transmission(store: &mut MissionStore) -> Result<(), CommandReply> {
    if let Err(e) = store.check_trigger() {
        return Err(CommandReply::rejected(store, e));
    }
    store.set_buoy_status(BuoyStatus::Transmitting);
    info!("Control: transmitting trigger code");
    Ok(())
}

/// Return the buoy to `on` and release the device. A buoy switched off during
/// the transmission has already reset the mission, so the trigger is rejected.
pub fn finish_trigger_transmission(store: &mut MissionStore) -> CommandReply {
    if store.buoy_status() == BuoyStatus::Transmitting {
        store.set_buoy_status(BuoyStatus::On);
    }
    apply(store, ControlCommand::Trigger)
}
