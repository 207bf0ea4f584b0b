//! Shared simulation state: typed observable cells with change notification.
//!
//! The container is constructed by the caller and passed into each component
//! explicitly, so several simulator instances can coexist and tests run
//! against isolated state. Rendering layers are plain subscribers; the core
//! never calls back into them by name.

use core::fmt;

use serde::Serialize;

use crate::controller::ControlMode;
use crate::sensors;

/// Power-on engine coolant temperature (a warm parked car, not 0 degC).
pub const DEFAULT_ENGINE_TEMP_C: f32 = 25.0;
/// Power-on ambient temperature.
pub const DEFAULT_AMBIENT_TEMP_C: f32 = 22.0;

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// A single observable value.
///
/// `set` short-circuits on equality: writing the current value again is a
/// no-op and notifies nobody. `subscribe` invokes the callback once
/// immediately with the current value, then on every subsequent change.
pub struct Observable<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
}

impl<T: Copy + PartialEq> Observable<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value
    }

    /// Write a new value. Returns whether a change actually occurred.
    pub fn set(&mut self, value: T) -> bool {
        if value == self.value {
            return false;
        }
        self.value = value;
        for notify in &mut self.subscribers {
            notify(&self.value);
        }
        true
    }

    pub fn subscribe(&mut self, mut callback: impl FnMut(&T) + 'static) {
        callback(&self.value);
        self.subscribers.push(Box::new(callback));
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// All state shared between the driver, the scenario player and outside
/// observers. Each field has exactly one writer role: raw samples belong to
/// the scenario player or direct input, everything else to the driver.
#[derive(Debug)]
pub struct StateStore {
    pub engine_raw: Observable<u16>,
    pub ambient_raw: Observable<u16>,
    pub engine_temp_c: Observable<f32>,
    pub ambient_temp_c: Observable<f32>,
    pub mode: Observable<ControlMode>,
    pub fan_duty_pct: Observable<u8>,
    pub manual_duty_pct: Observable<u8>,
    pub safety_active: Observable<bool>,
    pub scenario_name: Observable<Option<&'static str>>,
}

impl StateStore {
    pub fn new() -> Self {
        let engine_raw = sensors::engine_temp_to_sample(DEFAULT_ENGINE_TEMP_C);
        let ambient_raw = sensors::ambient_temp_to_sample(DEFAULT_AMBIENT_TEMP_C);
        Self {
            engine_raw: Observable::new(engine_raw),
            ambient_raw: Observable::new(ambient_raw),
            engine_temp_c: Observable::new(sensors::sample_to_engine_temp(engine_raw)),
            ambient_temp_c: Observable::new(sensors::sample_to_ambient_temp(ambient_raw)),
            mode: Observable::new(ControlMode::Auto),
            fan_duty_pct: Observable::new(0),
            manual_duty_pct: Observable::new(0),
            safety_active: Observable::new(false),
            scenario_name: Observable::new(None),
        }
    }

    /// Restore every documented default. Subscribers stay registered and are
    /// notified only for fields whose value actually changes.
    pub fn reset(&mut self) {
        let engine_raw = sensors::engine_temp_to_sample(DEFAULT_ENGINE_TEMP_C);
        let ambient_raw = sensors::ambient_temp_to_sample(DEFAULT_AMBIENT_TEMP_C);
        self.engine_raw.set(engine_raw);
        self.ambient_raw.set(ambient_raw);
        self.engine_temp_c.set(sensors::sample_to_engine_temp(engine_raw));
        self.ambient_temp_c.set(sensors::sample_to_ambient_temp(ambient_raw));
        self.mode.set(ControlMode::Auto);
        self.fan_duty_pct.set(0);
        self.manual_duty_pct.set(0);
        self.safety_active.set(false);
        self.scenario_name.set(None);
    }

    /// Point-in-time copy of everything an outside consumer can observe.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            engine_raw: self.engine_raw.get(),
            ambient_raw: self.ambient_raw.get(),
            engine_voltage: sensors::sample_to_voltage(self.engine_raw.get()),
            ambient_voltage: sensors::sample_to_voltage(self.ambient_raw.get()),
            engine_temp_c: self.engine_temp_c.get(),
            ambient_temp_c: self.ambient_temp_c.get(),
            mode: self.mode.get(),
            fan_duty_pct: self.fan_duty_pct.get(),
            manual_duty_pct: self.manual_duty_pct.get(),
            safety_active: self.safety_active.get(),
            scenario: self.scenario_name.get(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimSnapshot {
    pub engine_raw: u16,
    pub ambient_raw: u16,
    pub engine_voltage: f32,
    pub ambient_voltage: f32,
    pub engine_temp_c: f32,
    pub ambient_temp_c: f32,
    pub mode: ControlMode,
    pub fan_duty_pct: u8,
    pub manual_duty_pct: u8,
    pub safety_active: bool,
    pub scenario: Option<&'static str>,
}
