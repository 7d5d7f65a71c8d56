//! main.rs — Recovery mission simulator entry point
//!
//! Runs three concurrent tasks:
//!   1. Tick pump: receives ticks from the store's interval ticker and advances
//!      the mission under the shared lock
//!   2. Event relay: store notifications → JSON → every connected control client
//!   3. WebSocket server: operator control panel (buoy, frequency, trigger code,
//!      trigger, end/abort) plus live mission state

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use clap::Parser;
use recovery_sim::control::{begin_trigger_transmission, finish_trigger_transmission};
use recovery_sim::{
    apply, seeded_rng, CommandReply, ControlCommand, IntervalTicker, MissionStore, ScaledClock,
    SimulatorConfig, TickResult,
};
use recovery_types::{format_hms, MissionEvent, MissionSnapshot};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "recovery-sim", about = "Deep-sea device recovery mission simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Seed for the drift random walk (overrides config)
    #[arg(long)]
    seed: Option<u64>,
    /// Control panel WebSocket port (overrides config)
    #[arg(long)]
    ctrl_port: Option<u16>,
    /// Power the buoy and start a mission on startup
    #[arg(long)]
    autostart: bool,
}

// ── Shared state ──────────────────────────────────────────────────────────────

type SharedStore = Arc<RwLock<MissionStore>>;

#[derive(Clone)]
struct AppState {
    store: SharedStore,
    telem: broadcast::Sender<String>,
    /// Real-time wait while the buoy transmits the trigger code
    transmission_delay: Duration,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recovery_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = SimulatorConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;

    let speed = if args.speed.is_finite() && args.speed > 0.0 {
        args.speed
    } else {
        warn!("Ignoring invalid speed {}, running real-time", args.speed);
        1.0
    };
    if args.seed.is_some() {
        cfg.simulation.seed = args.seed;
    }
    // One tick must span seconds_per_tick of clock time at any speed
    let clock_speed = speed * cfg.simulation.clock_rate();
    cfg.simulation.tick_period_ms =
        ((cfg.simulation.tick_period_ms as f64 / speed).round() as u64).max(1);
    let transmission_delay =
        Duration::from_secs_f64(cfg.acoustic.transmission_delay_ms as f64 / 1000.0 / speed);
    let ctrl_port = args.ctrl_port.unwrap_or(cfg.console.ctrl_port);

    info!(
        "🌊 Recovery simulator starting: max depth {}m, {}×, tick {}ms, clock {:.2}×, seed {:?}",
        cfg.mission.max_depth_m,
        speed,
        cfg.simulation.tick_period_ms,
        clock_speed,
        cfg.simulation.seed
    );

    let (ticker, tick_rx) = IntervalTicker::new(Handle::current());
    let rng = seeded_rng(cfg.simulation.seed);
    let store = MissionStore::new(
        cfg,
        Box::new(ScaledClock::new(clock_speed)),
        Box::new(ticker),
        Box::new(rng),
    )
    .context("building mission store")?;
    let events = store.subscribe();
    let shared: SharedStore = Arc::new(RwLock::new(store));

    // Broadcast channel for control clients (already serialized)
    let (telem_tx, _) = broadcast::channel::<String>(64);

    tokio::spawn(tick_pump(shared.clone(), tick_rx));
    tokio::spawn(event_relay(events, telem_tx.clone()));

    if args.autostart {
        shared.write().await.activate_buoy()?;
    }

    let app_state = AppState { store: shared, telem: telem_tx, transmission_delay };

    let ctrl_addr = format!("0.0.0.0:{ctrl_port}");
    info!("🖥  Control panel WebSocket at ws://{ctrl_addr}/ws");

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "recovery-sim ok" }))
        .route("/state", get(state_handler))
        .with_state(app_state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener = tokio::net::TcpListener::bind(&ctrl_addr)
        .await
        .with_context(|| format!("binding {ctrl_addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Tick pump ─────────────────────────────────────────────────────────────────

async fn tick_pump(store: SharedStore, mut ticks: mpsc::Receiver<()>) {
    info!("⚓ Tick pump running");
    while ticks.recv().await.is_some() {
        let mut s = store.write().await;
        match s.tick() {
            TickResult::Resurfaced { total_secs } => {
                info!("🛟 Device at the surface, resurfacing time {}", format_hms(total_secs));
            }
            TickResult::Updated if s.ticks() % 10 == 0 => {
                let drift = s.drift_telemetry();
                info!(
                    "⏱ {} | {} | depth={:.1}m | dist={:.1}m | bearing={:.0}°",
                    format_hms(s.elapsed_mission_time()),
                    s.device_status(),
                    s.current_depth(),
                    s.current_distance(),
                    drift.bearing_to_buoy_deg,
                );
            }
            _ => {}
        }
    }
}

// ── Event relay ───────────────────────────────────────────────────────────────

async fn event_relay(mut events: broadcast::Receiver<MissionEvent>, out: broadcast::Sender<String>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    let _ = out.send(json);
                }
                Err(e) => warn!("Failed to serialize {} event: {e}", event.kind()),
            },
            Err(RecvError::Lagged(n)) => warn!("Event relay lagged, {n} events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

// ── HTTP / WebSocket ──────────────────────────────────────────────────────────

async fn state_handler(State(app): State<AppState>) -> Json<MissionSnapshot> {
    Json(app.store.read().await.snapshot())
}

async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, app))
}

async fn handle_ws(mut socket: WebSocket, app: AppState) {
    let mut telem_rx = app.telem.subscribe();

    // Send current state immediately on connect
    let hello = {
        let snapshot = app.store.read().await.snapshot();
        serde_json::json!({ "type": "snapshot", "snapshot": snapshot }).to_string()
    };
    if socket.send(Message::Text(hello)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            // Relay mission events to client
            msg = telem_rx.recv() => match msg {
                Ok(msg) => {
                    if socket.send(Message::Text(msg)).await.is_err() { break; }
                }
                Err(RecvError::Lagged(n)) => warn!("Control client lagged, {n} messages dropped"),
                Err(RecvError::Closed) => break,
            },
            // Operator commands
            Some(Ok(Message::Text(raw))) = socket.recv() => {
                let reply = handle_command(&app, &raw).await;
                let json = serde_json::to_string(&reply).unwrap_or_default();
                if socket.send(Message::Text(json)).await.is_err() { break; }
            }
            else => break,
        }
    }
}

/// Handle one operator command.
/// Commands are JSON: { "cmd": "...", "args": {...} }
async fn handle_command(app: &AppState, raw: &str) -> CommandReply {
    let cmd = match ControlCommand::parse(raw) {
        Ok(cmd) => cmd,
        Err(e) => return CommandReply::malformed(e),
    };
    if cmd == ControlCommand::Trigger {
        return transmit_trigger(app).await;
    }
    let mut s = app.store.write().await;
    apply(&mut s, cmd)
}

/// Buoy transmits the selected code, then the device is released.
async fn transmit_trigger(app: &AppState) -> CommandReply {
    if let Err(reply) = begin_trigger_transmission(&mut *app.store.write().await) {
        return reply;
    }
    tokio::time::sleep(app.transmission_delay).await;
    finish_trigger_transmission(&mut *app.store.write().await)
}
