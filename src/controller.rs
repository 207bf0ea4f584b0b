//! Control mode state machine: AUTO / MANUAL / SAFETY with an overheat
//! hysteresis band.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandError};
use crate::sensors;

/// Overheat trip point. At or above this the controller latches SAFETY.
pub const SAFETY_ENGAGE_C: f32 = 90.0;
/// Release point. SAFETY holds until the engine cools below this, leaving a
/// 5 degree band so the mode cannot chatter around the trip point.
pub const SAFETY_RELEASE_C: f32 = 85.0;
/// Duty pinned while the safety override is latched.
pub const SAFETY_DUTY_PCT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    Auto,
    Manual,
    Safety,
}

impl ControlMode {
    /// Numeric code reported in RX bus frames.
    pub fn code(self) -> u8 {
        match self {
            ControlMode::Auto => 0,
            ControlMode::Manual => 1,
            ControlMode::Safety => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlMode::Auto => "AUTO",
            ControlMode::Manual => "MANUAL",
            ControlMode::Safety => "SAFETY",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControllerState {
    pub mode: ControlMode,
    pub previous_mode: ControlMode,
    pub fan_duty_pct: u8,
    pub manual_duty_pct: u8,
    pub safety_active: bool,
    pub safety_entry_count: u32,
}

impl ControllerState {
    fn power_on() -> Self {
        Self {
            mode: ControlMode::Auto,
            previous_mode: ControlMode::Auto,
            fan_duty_pct: 0,
            manual_duty_pct: 0,
            safety_active: false,
            safety_entry_count: 0,
        }
    }
}

/// What the orchestrator must do after an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    None,
    /// Restore shared state, bus sequence and frame log to defaults.
    ResetAll,
}

#[derive(Debug)]
pub struct FanController {
    state: ControllerState,
}

impl FanController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::power_on(),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Re-evaluate mode and duty against the current engine temperature.
    ///
    /// Called once per driver tick. The computation is idempotent: duty is
    /// always derived from the current mode and temperature, never carried
    /// forward incrementally.
    pub fn evaluate(&mut self, engine_temp_c: f32) {
        if self.state.mode != ControlMode::Safety && engine_temp_c >= SAFETY_ENGAGE_C {
            self.enter_safety(engine_temp_c);
        } else if self.state.mode == ControlMode::Safety && engine_temp_c < SAFETY_RELEASE_C {
            self.exit_safety(engine_temp_c);
        }
        self.state.fan_duty_pct = self.duty_for_mode(engine_temp_c);
    }

    fn duty_for_mode(&self, engine_temp_c: f32) -> u8 {
        match self.state.mode {
            ControlMode::Safety => SAFETY_DUTY_PCT,
            ControlMode::Auto => sensors::duty_for_temperature(engine_temp_c),
            ControlMode::Manual => self.state.manual_duty_pct,
        }
    }

    fn enter_safety(&mut self, engine_temp_c: f32) {
        self.state.previous_mode = self.state.mode;
        self.state.mode = ControlMode::Safety;
        self.state.safety_active = true;
        self.state.safety_entry_count = self.state.safety_entry_count.saturating_add(1);
        warn!(
            temp_c = engine_temp_c,
            from = self.state.previous_mode.label(),
            "overheat: safety override engaged"
        );
    }

    fn exit_safety(&mut self, engine_temp_c: f32) {
        self.state.mode = self.state.previous_mode;
        self.state.safety_active = false;
        info!(
            temp_c = engine_temp_c,
            restored = self.state.mode.label(),
            "safety override released"
        );
    }

    /// Apply one discrete command.
    ///
    /// While SAFETY is latched every command is rejected, including `Reset`;
    /// the override only releases when the temperature falls below
    /// [`SAFETY_RELEASE_C`]. Kept from the source system's observed behavior
    /// (see DESIGN.md). The guard runs before any dispatch, so a rejected
    /// command is never partially applied.
    pub fn handle_command(&mut self, command: Command) -> Result<CommandEffect, CommandError> {
        if self.state.mode == ControlMode::Safety {
            debug!(?command, "command rejected while safety override active");
            return Err(CommandError::SafetyLockout);
        }
        match command {
            Command::SwitchToAuto => {
                self.state.mode = ControlMode::Auto;
                Ok(CommandEffect::None)
            }
            Command::SwitchToManual => {
                self.state.mode = ControlMode::Manual;
                self.state.fan_duty_pct = self.state.manual_duty_pct;
                Ok(CommandEffect::None)
            }
            Command::SetManualDuty(duty) => {
                if self.state.mode != ControlMode::Manual {
                    return Err(CommandError::NotInManualMode);
                }
                if !sensors::DUTY_STEPS.contains(&duty) {
                    return Err(CommandError::InvalidDutyStep(duty));
                }
                self.state.manual_duty_pct = duty;
                self.state.fan_duty_pct = duty;
                Ok(CommandEffect::None)
            }
            Command::Reset => {
                self.reset();
                Ok(CommandEffect::ResetAll)
            }
        }
    }

    /// Restore power-on defaults.
    pub fn reset(&mut self) {
        self.state = ControllerState::power_on();
        debug!("controller reset to power-on state");
    }
}

impl Default for FanController {
    fn default() -> Self {
        Self::new()
    }
}
