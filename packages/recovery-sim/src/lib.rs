//! recovery-sim — Deep-sea device recovery mission simulator
//!
//! The mission core is a single `MissionStore` fed by an injectable clock,
//! ticker and random source. The `recovery-sim` binary wraps it in a tokio
//! tick pump and an operator control WebSocket.

pub mod acoustic;
pub mod clock;
pub mod config;
pub mod control;
pub mod depth_model;
pub mod drift;
pub mod resurfacing;
pub mod store;
pub mod ticker;

pub use acoustic::{AcousticError, AcousticLink};
pub use clock::{Clock, ManualClock, ScaledClock};
pub use config::{ConfigError, SimulatorConfig};
pub use control::{apply, CommandReply, ControlCommand};
pub use store::{seeded_rng, MissionError, MissionStore, TickResult, TriggerRejected};
pub use ticker::{IntervalTicker, ManualTicker, Ticker};
