//! Cooperative wall-clock runtime.
//!
//! The core components are clock-agnostic (every tick takes `now_ms`);
//! this module is the only place real time exists. One current-thread task
//! drives both cadences from a single `select!`. The `biased` arm order is
//! the contract: when the driver and player deadlines coincide, the driver
//! tick is dispatched first. Relative ordering does not affect correctness
//! (both ticks recompute from current state), only which sub-tick an
//! observer sees; making the order explicit keeps it from being an accident
//! of registration.

use std::time::{Duration, Instant};

use tokio::time;
use tracing::info;

use crate::bus::BusFrame;
use crate::sim::Simulator;

/// Driver cadence, roughly a display refresh (~60 Hz).
pub const DRIVER_TICK_MS: u64 = 16;
/// Scenario player cadence; deliberately not a multiple of the driver tick.
pub const PLAYER_TICK_MS: u64 = 40;

/// Drive a started simulator against the wall clock until the deadline
/// passes or the simulator stops. Emitted frame pairs are handed to
/// `on_frame_pair` as they appear.
///
/// The caller starts the simulator (and any scenario) with epoch-relative
/// time 0; this loop supplies milliseconds since entry.
pub async fn run<F>(sim: &mut Simulator, deadline: Option<Duration>, mut on_frame_pair: F)
where
    F: FnMut(&BusFrame, &BusFrame),
{
    let epoch = Instant::now();
    let mut driver = time::interval(Duration::from_millis(DRIVER_TICK_MS));
    let mut player = time::interval(Duration::from_millis(PLAYER_TICK_MS));
    info!(
        driver_ms = DRIVER_TICK_MS,
        player_ms = PLAYER_TICK_MS,
        "cooperative runtime started"
    );

    loop {
        if !sim.stats().running {
            break;
        }
        if let Some(limit) = deadline {
            if epoch.elapsed() >= limit {
                break;
            }
        }
        tokio::select! {
            biased;
            _ = driver.tick() => {
                let now_ms = epoch.elapsed().as_millis() as u64;
                if let Some((tx, rx)) = sim.tick(now_ms) {
                    on_frame_pair(&tx, &rx);
                }
            }
            _ = player.tick() => {
                let now_ms = epoch.elapsed().as_millis() as u64;
                sim.player_tick(now_ms);
            }
        }
    }

    sim.stop();
    info!("cooperative runtime stopped");
}
