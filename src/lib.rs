//! # Cooling-Fan Controller Simulator
//!
//! A deterministic, single-threaded simulation of an embedded automotive
//! cooling-fan controller: two 10-bit analog temperature channels, a
//! three-state control mode machine with an overheat hysteresis band,
//! synthetic CAN frame reporting on a fixed cadence decoupled from the
//! control cadence, and scripted scenarios mixing eased sensor ramps with
//! discrete command injection.
//!
//! ## Features
//!
//! - **Sensor model**: pure ADC-to-voltage/temperature conversions with
//!   input clamping, plus the stepped duty curve
//! - **Mode machine**: AUTO / MANUAL / SAFETY with a 5 degree hysteresis
//!   band and a strict command lockout while the override is latched
//! - **Bus reporting**: TX/RX frame pairs with a wrapping sequence number
//!   and a bounded, oldest-evicted frame log
//! - **Scenario playback**: named timelines of cubic-eased ramps and
//!   one-shot commands, at most one active at a time
//! - **Deterministic core**: every tick takes `now_ms`; wall-clock time
//!   exists only in the [`runtime`] module
//!
//! ## Quick Start
//!
//! ```rust
//! use fansim::{SimConfig, Simulator};
//!
//! let mut sim = Simulator::new(SimConfig::default());
//! sim.start(0);
//! sim.start_scenario("warmup", 0).expect("built-in scenario");
//!
//! for now_ms in (0..1_000u64).step_by(16) {
//!     sim.player_tick(now_ms);
//!     let _ = sim.tick(now_ms);
//! }
//! assert!(sim.stats().ticks > 0);
//! ```
//!
//! ## Architecture
//!
//! - [`sensors`] - raw sample conversions and the duty curve
//! - [`state`] - shared observable state container
//! - [`commands`] - command codes and the single injection queue
//! - [`controller`] - mode state machine and safety override
//! - [`bus`] - frame pair generation and the bounded log
//! - [`scenario`] - scripted timelines and the playback engine
//! - [`sim`] - the orchestrating driver
//! - [`runtime`] - cooperative wall-clock scheduler

#![deny(warnings)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod commands;
pub mod controller;
pub mod runtime;
pub mod scenario;
pub mod sensors;
pub mod sim;
pub mod state;

// Re-export the main public types for convenience.
pub use commands::{Command, CommandError};
pub use controller::{ControlMode, FanController};
pub use scenario::{Scenario, ScenarioPlayer};
pub use sim::{SimConfig, Simulator};
pub use state::StateStore;
