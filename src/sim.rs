//! Top-level simulation driver.
//!
//! Ties the sensor model, mode machine, scenario player and bus reporting
//! together on a rate-agnostic tick: the caller supplies `now_ms`, and
//! nothing here assumes a particular refresh rate. Control cadence and bus
//! cadence are deliberately decoupled: frames are emitted only when the
//! fixed bus interval has elapsed, however often `tick` runs.

use serde::Serialize;
use tracing::{debug, info};

use crate::bus::{BusFrame, FrameGenerator, FrameLog};
use crate::commands::{Command, CommandError, CommandQueue};
use crate::controller::{CommandEffect, ControllerState, FanController};
use crate::scenario::{PlayerStats, ScenarioError, ScenarioPlayer};
use crate::sensors;
use crate::state::{SimSnapshot, StateStore};

/// Milliseconds between bus frame emissions, independent of the tick rate.
pub const DEFAULT_BUS_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub bus_interval_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bus_interval_ms: DEFAULT_BUS_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SimStats {
    pub running: bool,
    pub uptime_ms: u64,
    pub ticks: u64,
    pub commands_accepted: u32,
    pub commands_rejected: u32,
    pub frame_pairs_emitted: u32,
}

pub struct Simulator {
    config: SimConfig,
    store: StateStore,
    controller: FanController,
    frame_gen: FrameGenerator,
    frame_log: FrameLog,
    player: ScenarioPlayer,
    commands: CommandQueue,
    stats: SimStats,
    started_at_ms: u64,
    last_emit_ms: u64,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            store: StateStore::new(),
            controller: FanController::new(),
            frame_gen: FrameGenerator::new(0),
            frame_log: FrameLog::new(),
            player: ScenarioPlayer::new(),
            commands: CommandQueue::new(),
            stats: SimStats::default(),
            started_at_ms: 0,
            last_emit_ms: 0,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.stats.running {
            return;
        }
        self.stats.running = true;
        self.started_at_ms = now_ms;
        self.last_emit_ms = now_ms;
        self.frame_gen.reset(now_ms);
        info!(now_ms, "simulation started");
    }

    pub fn stop(&mut self) {
        if !self.stats.running {
            return;
        }
        self.stats.running = false;
        info!(uptime_ms = self.stats.uptime_ms, "simulation stopped");
    }

    /// Inject a discrete command. Human-originated input uses the same
    /// queue the scenario player writes into; the mode machine consumes
    /// commands without knowing their origin.
    pub fn emit_command(&mut self, command: Command) -> Result<(), CommandError> {
        self.commands.emit(command)
    }

    pub fn start_scenario(&mut self, name: &str, now_ms: u64) -> Result<(), ScenarioError> {
        self.player.start(name, now_ms, &mut self.store)
    }

    pub fn stop_scenario(&mut self) {
        self.player.stop(&mut self.store);
    }

    /// Scenario cadence entry point, scheduled independently of [`tick`].
    ///
    /// [`tick`]: Simulator::tick
    pub fn player_tick(&mut self, now_ms: u64) {
        if !self.stats.running {
            return;
        }
        self.player.tick(now_ms, &mut self.store, &mut self.commands);
    }

    /// One driver tick. Returns the TX/RX pair when the bus interval
    /// elapsed this tick, `None` otherwise.
    pub fn tick(&mut self, now_ms: u64) -> Option<(BusFrame, BusFrame)> {
        if !self.stats.running {
            return None;
        }
        self.stats.ticks += 1;
        self.stats.uptime_ms = now_ms.saturating_sub(self.started_at_ms);

        self.process_commands(now_ms);
        self.derive_temperatures();

        let engine_temp_c = self.store.engine_temp_c.get();
        self.controller.evaluate(engine_temp_c);
        self.publish_control_state();

        self.emit_frames_due(now_ms)
    }

    fn process_commands(&mut self, now_ms: u64) {
        while let Some(command) = self.commands.pop() {
            match self.controller.handle_command(command) {
                Ok(CommandEffect::ResetAll) => {
                    self.apply_full_reset(now_ms);
                    self.stats.commands_accepted += 1;
                }
                Ok(CommandEffect::None) => {
                    self.stats.commands_accepted += 1;
                }
                Err(err) => {
                    self.stats.commands_rejected += 1;
                    debug!(%err, ?command, "command rejected");
                }
            }
        }
    }

    /// Raw samples are the single source of truth: derived temperatures are
    /// recomputed from them every tick, never carried forward.
    fn derive_temperatures(&mut self) {
        let engine_raw = self.store.engine_raw.get();
        let ambient_raw = self.store.ambient_raw.get();
        self.store
            .engine_temp_c
            .set(sensors::sample_to_engine_temp(engine_raw));
        self.store
            .ambient_temp_c
            .set(sensors::sample_to_ambient_temp(ambient_raw));
    }

    fn publish_control_state(&mut self) {
        let state = *self.controller.state();
        self.store.mode.set(state.mode);
        self.store.fan_duty_pct.set(state.fan_duty_pct);
        self.store.manual_duty_pct.set(state.manual_duty_pct);
        self.store.safety_active.set(state.safety_active);
    }

    fn emit_frames_due(&mut self, now_ms: u64) -> Option<(BusFrame, BusFrame)> {
        if now_ms.saturating_sub(self.last_emit_ms) < self.config.bus_interval_ms {
            return None;
        }
        self.last_emit_ms = now_ms;
        let (tx, rx) = self.frame_gen.generate(
            now_ms,
            self.store.engine_raw.get(),
            self.store.ambient_raw.get(),
            self.store.fan_duty_pct.get(),
            self.store.mode.get(),
        );
        self.frame_log.push(tx.clone());
        self.frame_log.push(rx.clone());
        self.stats.frame_pairs_emitted += 1;
        Some((tx, rx))
    }

    fn apply_full_reset(&mut self, now_ms: u64) {
        // The controller already restored its own defaults before returning
        // the ResetAll effect.
        self.store.reset();
        self.frame_log.clear();
        self.frame_gen.reset(now_ms);
        self.last_emit_ms = now_ms;
        info!("system state reset to defaults");
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Mutable access for direct input (slider drags, test setup). Raw
    /// sample writes land on the same observable cells the scenario player
    /// uses.
    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn controller_state(&self) -> &ControllerState {
        self.controller.state()
    }

    pub fn frame_log(&self) -> &FrameLog {
        &self.frame_log
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn player_stats(&self) -> &PlayerStats {
        self.player.stats()
    }

    pub fn scenario_running(&self) -> bool {
        self.player.is_running()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        self.store.snapshot()
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
