//! Async driver for [`FeedEngine`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::engine::{FeedEngine, FeedSnapshot};
use super::{FeedConfig, FeedMode, LocationListener};
use crate::geo::Coordinate;
use crate::timer::sleep_until_opt;

/// Control messages accepted by the feed task.
#[derive(Debug, Clone, PartialEq)]
enum FeedCommand {
    Start,
    Stop,
    SetMode(FeedMode),
    SetStreamHz(u32),
    SetJitterRadius(f64),
    SetBaseCoordinate(Coordinate),
}

/// Handle to a running location feed.
///
/// Spawns one task that owns the [`FeedEngine`] and serializes every tick,
/// broadcast and control call. Control methods never block; they queue a
/// command for the task. Must be created inside a tokio runtime.
pub struct LocationFeed {
    commands: mpsc::UnboundedSender<FeedCommand>,
    snapshot: watch::Receiver<FeedSnapshot>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LocationFeed {
    /// Spawn the feed task. The feed starts stopped.
    pub fn spawn(config: FeedConfig, listener: Arc<dyn LocationListener>) -> Self {
        let engine = FeedEngine::new(config);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(engine.snapshot());
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run(
            engine,
            command_rx,
            listener,
            snapshot_tx,
            shutdown.clone(),
        ));

        Self {
            commands,
            snapshot,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Start broadcasting. No effect if already streaming.
    pub fn start(&self) {
        self.send(FeedCommand::Start);
    }

    /// Stop broadcasting and moving.
    pub fn stop(&self) {
        self.send(FeedCommand::Stop);
    }

    pub fn set_mode(&self, mode: FeedMode) {
        self.send(FeedCommand::SetMode(mode));
    }

    /// Change the broadcast rate (clamped to 1..=10 Hz).
    pub fn set_stream_hz(&self, hz: u32) {
        self.send(FeedCommand::SetStreamHz(hz));
    }

    pub fn set_jitter_radius(&self, radius_m: f64) {
        self.send(FeedCommand::SetJitterRadius(radius_m));
    }

    pub fn set_base_coordinate(&self, base: Coordinate) {
        self.send(FeedCommand::SetBaseCoordinate(base));
    }

    /// Latest published state.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Current speed in m/s.
    pub fn velocity_mps(&self) -> f64 {
        self.snapshot.borrow().velocity_mps
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot.clone()
    }

    /// Cancel all schedules and wait for the feed task to exit.
    pub async fn dispose(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    fn send(&self, command: FeedCommand) {
        if self.commands.send(command).is_err() {
            debug!("Location feed task has exited, command dropped");
        }
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run(
    mut engine: FeedEngine,
    mut commands: mpsc::UnboundedReceiver<FeedCommand>,
    listener: Arc<dyn LocationListener>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
    shutdown: CancellationToken,
) {
    debug!(mode = %engine.mode(), "Location feed task started");

    loop {
        let deadline = engine.next_deadline();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                break;
            }

            command = commands.recv() => {
                match command {
                    Some(command) => apply(&mut engine, command, Instant::now()),
                    None => break,
                }
            }

            _ = sleep_until_opt(deadline) => {
                if let Some(coordinate) = engine.on_timer(Instant::now()) {
                    listener.on_location_update(coordinate.latitude, coordinate.longitude);
                }
            }
        }

        snapshot_tx.send_replace(engine.snapshot());
    }

    engine.stop();
    snapshot_tx.send_replace(engine.snapshot());
    info!("Location feed disposed");
}

fn apply(engine: &mut FeedEngine, command: FeedCommand, now: Instant) {
    match command {
        FeedCommand::Start => {
            engine.start(now);
        }
        FeedCommand::Stop => engine.stop(),
        FeedCommand::SetMode(mode) => engine.set_mode(mode, now),
        FeedCommand::SetStreamHz(hz) => engine.set_stream_hz(hz),
        FeedCommand::SetJitterRadius(radius) => engine.set_jitter_radius(radius),
        FeedCommand::SetBaseCoordinate(base) => engine.set_base_coordinate(base),
    }
}
