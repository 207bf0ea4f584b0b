//! Scripted scenario playback: continuous eased sensor ramps and one-shot
//! command injection on a shared timeline.
//!
//! Scenarios exist to walk the mode machine through realistic temperature
//! trajectories for demonstration. Ramps are authored in degrees Celsius
//! and converted to raw-sample endpoints through the sensor model when the
//! catalog is built. At most one scenario plays at a time.

use heapless::Vec;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandQueue};
use crate::sensors;
use crate::state::StateStore;

pub const MAX_SCENARIO_STEPS: usize = 16;

/// Shared-state property a ramp drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampTarget {
    EngineRaw,
    AmbientRaw,
}

#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    pub start_ms: u64,
    pub duration_ms: u64,
    pub target: RampTarget,
    pub from: u16,
    pub to: u16,
}

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Ramp(Ramp),
    Inject { at_ms: u64, command: Command },
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    steps: Vec<Step, MAX_SCENARIO_STEPS>,
}

impl Scenario {
    pub fn new(name: &'static str, summary: &'static str, steps: &[Step]) -> Self {
        debug_assert!(
            steps.len() <= MAX_SCENARIO_STEPS,
            "scenario `{}` has {} steps, capacity {}",
            name,
            steps.len(),
            MAX_SCENARIO_STEPS
        );
        let mut list = Vec::new();
        for step in steps.iter().take(MAX_SCENARIO_STEPS) {
            let _ = list.push(*step);
        }
        Self {
            name,
            summary,
            steps: list,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn by_name(name: &str) -> Option<Scenario> {
        Self::catalog().into_iter().find(|s| s.name == name)
    }

    /// The built-in demonstration scenarios.
    pub fn catalog() -> std::vec::Vec<Scenario> {
        vec![
            Scenario::new(
                "warmup",
                "cold start: both channels climb until the first duty step engages",
                &[
                    engine_ramp(0, 10_000, 15.0, 68.0),
                    ambient_ramp(0, 10_000, 10.0, 22.0),
                ],
            ),
            Scenario::new(
                "overheat-recovery",
                "trip the safety override, show the command lockout, cool back out",
                &[
                    engine_ramp(0, 6_000, 70.0, 95.0),
                    // Lands while SAFETY is latched and must be rejected.
                    inject(7_000, Command::SwitchToManual),
                    engine_ramp(8_000, 6_000, 95.0, 80.0),
                ],
            ),
            Scenario::new(
                "manual-sweep",
                "switch to manual and step the duty through every supported value",
                &[
                    engine_ramp(0, 8_000, 40.0, 55.0),
                    inject(500, Command::SwitchToManual),
                    inject(1_000, Command::SetManualDuty(25)),
                    inject(2_500, Command::SetManualDuty(50)),
                    inject(4_000, Command::SetManualDuty(75)),
                    inject(5_500, Command::SetManualDuty(100)),
                    inject(7_000, Command::SetManualDuty(0)),
                    inject(7_500, Command::SwitchToAuto),
                ],
            ),
            Scenario::new(
                "ambient-drift",
                "hot day: ambient climbs while the engine stays below the first band",
                &[
                    ambient_ramp(0, 8_000, 22.0, 45.0),
                    engine_ramp(0, 8_000, 30.0, 50.0),
                ],
            ),
        ]
    }
}

fn engine_ramp(start_ms: u64, duration_ms: u64, from_c: f32, to_c: f32) -> Step {
    Step::Ramp(Ramp {
        start_ms,
        duration_ms,
        target: RampTarget::EngineRaw,
        from: sensors::engine_temp_to_sample(from_c),
        to: sensors::engine_temp_to_sample(to_c),
    })
}

fn ambient_ramp(start_ms: u64, duration_ms: u64, from_c: f32, to_c: f32) -> Step {
    Step::Ramp(Ramp {
        start_ms,
        duration_ms,
        target: RampTarget::AmbientRaw,
        from: sensors::ambient_temp_to_sample(from_c),
        to: sensors::ambient_temp_to_sample(to_c),
    })
}

fn inject(at_ms: u64, command: Command) -> Step {
    Step::Inject { at_ms, command }
}

/// Cubic ease-in-out: slow start, fast middle, slow settle.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PlayerStats {
    pub scenarios_started: u32,
    pub scenarios_completed: u32,
    pub ramp_writes: u32,
    pub commands_injected: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("unknown scenario `{0}`")]
    Unknown(String),
}

#[derive(Debug)]
struct ActiveScenario {
    scenario: Scenario,
    started_at_ms: u64,
    /// Per-step settled (ramps) / fired (injections) flag.
    done: Vec<bool, MAX_SCENARIO_STEPS>,
}

/// Plays at most one scenario at a time against the shared state and the
/// command queue. Clock-agnostic: the caller supplies `now_ms` each tick.
#[derive(Debug)]
pub struct ScenarioPlayer {
    active: Option<ActiveScenario>,
    stats: PlayerStats,
}

impl ScenarioPlayer {
    pub fn new() -> Self {
        Self {
            active: None,
            stats: PlayerStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.scenario.name)
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Start a named catalog scenario. Any running scenario is stopped
    /// first, so at most one is ever active. Unknown names change nothing.
    pub fn start(
        &mut self,
        name: &str,
        now_ms: u64,
        store: &mut StateStore,
    ) -> Result<(), ScenarioError> {
        let scenario =
            Scenario::by_name(name).ok_or_else(|| ScenarioError::Unknown(name.to_string()))?;
        self.start_custom(scenario, now_ms, store);
        Ok(())
    }

    /// Start an ad-hoc scenario built by the caller.
    pub fn start_custom(&mut self, scenario: Scenario, now_ms: u64, store: &mut StateStore) {
        self.stop(store);

        info!(scenario = scenario.name, "scenario started");
        store.scenario_name.set(Some(scenario.name));
        let mut done = Vec::new();
        for _ in scenario.steps() {
            let _ = done.push(false);
        }
        self.active = Some(ActiveScenario {
            scenario,
            started_at_ms: now_ms,
            done,
        });
        self.stats.scenarios_started += 1;
    }

    /// Stop playback. Safe to call when nothing is running.
    pub fn stop(&mut self, store: &mut StateStore) {
        if let Some(active) = self.active.take() {
            info!(scenario = active.scenario.name, "scenario stopped");
            store.scenario_name.set(None);
        }
    }

    /// Advance playback to `now_ms`.
    ///
    /// Ramps interpolate with cubic easing and snap exactly to their target
    /// sample once elapsed, so floating-point error never accumulates into
    /// the endpoint. Injections fire exactly once. When every step has
    /// settled or fired the player stops itself.
    pub fn tick(&mut self, now_ms: u64, store: &mut StateStore, commands: &mut CommandQueue) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let elapsed = now_ms.saturating_sub(active.started_at_ms);
        let mut all_done = true;

        for (index, step) in active.scenario.steps.iter().enumerate() {
            if active.done[index] {
                continue;
            }
            match *step {
                Step::Ramp(ramp) => {
                    if elapsed < ramp.start_ms {
                        all_done = false;
                        continue;
                    }
                    let local = elapsed - ramp.start_ms;
                    if local >= ramp.duration_ms {
                        write_target(store, ramp.target, ramp.to);
                        active.done[index] = true;
                    } else {
                        let progress = (local as f32 / ramp.duration_ms as f32).clamp(0.0, 1.0);
                        let eased = ease_in_out_cubic(progress);
                        let span = f32::from(ramp.to) - f32::from(ramp.from);
                        let value = f32::from(ramp.from) + span * eased;
                        write_target(store, ramp.target, sensors::clamp_sample(value.round() as i32));
                        all_done = false;
                    }
                    self.stats.ramp_writes += 1;
                }
                Step::Inject { at_ms, command } => {
                    if elapsed >= at_ms {
                        if let Err(err) = commands.emit(command) {
                            warn!(%err, ?command, "scenario command dropped");
                        }
                        active.done[index] = true;
                        self.stats.commands_injected += 1;
                        debug!(?command, at_ms, "scenario command injected");
                    } else {
                        all_done = false;
                    }
                }
            }
        }

        if all_done {
            if let Some(finished) = self.active.take() {
                info!(scenario = finished.scenario.name, "scenario complete");
            }
            store.scenario_name.set(None);
            self.stats.scenarios_completed += 1;
        }
    }
}

impl Default for ScenarioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_target(store: &mut StateStore, target: RampTarget, value: u16) {
    match target {
        RampTarget::EngineRaw => {
            store.engine_raw.set(value);
        }
        RampTarget::AmbientRaw => {
            store.ambient_raw.set(value);
        }
    }
}
