use fansim::commands::Command;
use fansim::controller::ControlMode;
use fansim::sensors;
use fansim::sim::{SimConfig, Simulator};

/// Step both cadences the way the cooperative runtime would: driver every
/// 16 ms, player every 40 ms, driver first on coincident deadlines.
fn run_until(sim: &mut Simulator, from_ms: u64, to_ms: u64) {
    for now_ms in from_ms..=to_ms {
        if now_ms % 16 == 0 {
            let _ = sim.tick(now_ms);
        }
        if now_ms % 40 == 0 {
            sim.player_tick(now_ms);
        }
    }
}

fn hot_sim(temp_c: f32) -> Simulator {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);
    let raw = sensors::engine_temp_to_sample(temp_c);
    sim.store_mut().engine_raw.set(raw);
    let _ = sim.tick(0);
    sim
}

#[test]
fn ticks_are_no_ops_until_started() {
    let mut sim = Simulator::new(SimConfig::default());
    assert!(sim.tick(0).is_none());
    assert_eq!(sim.stats().ticks, 0);

    sim.start(0);
    let _ = sim.tick(16);
    assert_eq!(sim.stats().ticks, 1);
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);
    sim.start(500);
    let _ = sim.tick(16);
    assert_eq!(sim.stats().uptime_ms, 16, "second start did not rebase");

    sim.stop();
    sim.stop();
    assert!(!sim.stats().running);
}

#[test]
fn derived_temperatures_are_recomputed_from_raw_every_tick() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);

    let raw = sensors::engine_temp_to_sample(75.0);
    sim.store_mut().engine_raw.set(raw);
    let _ = sim.tick(16);

    let temp = sim.store().engine_temp_c.get();
    assert!((temp - 75.0).abs() < 0.1);
    assert_eq!(sim.store().fan_duty_pct.get(), 50);
    assert_eq!(sim.store().mode.get(), ControlMode::Auto);
}

#[test]
fn bus_cadence_is_decoupled_from_tick_rate() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);

    let mut emitted = 0;
    for now_ms in (0..=1_100u64).step_by(16) {
        if sim.tick(now_ms).is_some() {
            emitted += 1;
        }
    }

    // Ticks at 0, 16, ..., 1096: pairs land at 512 and 1024 only.
    assert_eq!(emitted, 2);
    assert_eq!(sim.stats().frame_pairs_emitted, 2);
    assert_eq!(sim.frame_log().len(), 4);
}

#[test]
fn shorter_bus_interval_emits_more_often() {
    let mut sim = Simulator::new(SimConfig {
        bus_interval_ms: 100,
    });
    sim.start(0);

    let mut emitted = 0;
    for now_ms in (0..=1_000u64).step_by(16) {
        if sim.tick(now_ms).is_some() {
            emitted += 1;
        }
    }
    assert!(emitted >= 9);
}

#[test]
fn frame_log_stays_bounded_over_long_runs() {
    let mut sim = Simulator::new(SimConfig { bus_interval_ms: 1 });
    sim.start(0);
    for now_ms in 0..200u64 {
        let _ = sim.tick(now_ms);
    }
    assert_eq!(sim.frame_log().len(), 100);
}

#[test]
fn safety_pins_duty_and_rejects_commands_through_the_driver() {
    let mut sim = hot_sim(95.0);

    assert_eq!(sim.store().mode.get(), ControlMode::Safety);
    assert_eq!(sim.store().fan_duty_pct.get(), 100);
    assert!(sim.store().safety_active.get());

    // Reset arrives through the queue and is refused by the lockout.
    sim.emit_command(Command::Reset).unwrap();
    let _ = sim.tick(16);
    assert_eq!(sim.stats().commands_rejected, 1);
    assert_eq!(sim.store().mode.get(), ControlMode::Safety);
    assert_eq!(sim.store().fan_duty_pct.get(), 100);
}

#[test]
fn cooling_out_of_the_band_releases_safety() {
    let mut sim = hot_sim(95.0);

    sim.store_mut()
        .engine_raw
        .set(sensors::engine_temp_to_sample(86.0));
    let _ = sim.tick(16);
    assert_eq!(sim.store().mode.get(), ControlMode::Safety, "inside the band");

    sim.store_mut()
        .engine_raw
        .set(sensors::engine_temp_to_sample(84.0));
    let _ = sim.tick(32);
    assert_eq!(sim.store().mode.get(), ControlMode::Auto);
    assert_eq!(sim.store().fan_duty_pct.get(), 75);
    assert!(!sim.store().safety_active.get());
}

#[test]
fn reset_restores_defaults_and_clears_the_bus() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);

    sim.store_mut()
        .engine_raw
        .set(sensors::engine_temp_to_sample(75.0));
    run_until(&mut sim, 0, 1_100);
    assert!(sim.frame_log().len() >= 2);

    sim.emit_command(Command::Reset).unwrap();
    let _ = sim.tick(1_104);

    assert_eq!(sim.stats().commands_accepted, 1);
    assert!(sim.frame_log().is_empty());
    let snapshot = sim.snapshot();
    assert!((snapshot.engine_temp_c - 25.0).abs() < 0.1);
    assert!((snapshot.ambient_temp_c - 22.0).abs() < 0.1);
    assert_eq!(snapshot.mode, ControlMode::Auto);
    assert_eq!(snapshot.fan_duty_pct, 0);
}

#[test]
fn equal_value_writes_reach_no_subscribers() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);

    let calls: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    sim.store_mut()
        .fan_duty_pct
        .subscribe(move |duty| sink.borrow_mut().push(*duty));

    // Constant temperature: the driver republishes the same duty each tick
    // and the equality short-circuit keeps subscribers quiet.
    for now_ms in (0..500u64).step_by(16) {
        let _ = sim.tick(now_ms);
    }
    assert_eq!(*calls.borrow(), vec![0], "only the subscription-time call");
}

#[test]
fn overheat_recovery_scenario_end_to_end() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);
    sim.start_scenario("overheat-recovery", 0).unwrap();
    assert_eq!(sim.store().scenario_name.get(), Some("overheat-recovery"));

    run_until(&mut sim, 0, 15_000);

    // Played all the way out: the player stopped itself.
    assert!(!sim.scenario_running());
    assert_eq!(sim.store().scenario_name.get(), None);
    assert_eq!(sim.player_stats().scenarios_completed, 1);

    // Safety engaged once on the way up and released on the way down.
    assert_eq!(sim.controller_state().safety_entry_count, 1);
    assert_eq!(sim.store().mode.get(), ControlMode::Auto);
    assert!(!sim.store().safety_active.get());

    // The scripted SwitchToManual landed inside the lockout window.
    assert_eq!(sim.stats().commands_rejected, 1);
    assert_eq!(sim.stats().commands_accepted, 0);

    // Final plateau: 80 degC puts AUTO in the 75 % band.
    let temp = sim.store().engine_temp_c.get();
    assert!((temp - 80.0).abs() < 0.5, "final temp {temp}");
    assert_eq!(sim.store().fan_duty_pct.get(), 75);
}

#[test]
fn manual_sweep_scenario_steps_the_duty() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);
    sim.start_scenario("manual-sweep", 0).unwrap();

    run_until(&mut sim, 0, 4_500);
    assert_eq!(sim.store().mode.get(), ControlMode::Manual);
    assert_eq!(sim.store().fan_duty_pct.get(), 75);

    run_until(&mut sim, 4_501, 9_000);
    assert!(!sim.scenario_running());
    assert_eq!(sim.store().mode.get(), ControlMode::Auto);
    assert_eq!(sim.stats().commands_rejected, 0);
    assert_eq!(sim.stats().commands_accepted, 7);
}

#[test]
fn starting_a_second_scenario_replaces_the_first() {
    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);

    sim.start_scenario("warmup", 0).unwrap();
    run_until(&mut sim, 0, 500);
    sim.start_scenario("ambient-drift", 500).unwrap();

    assert_eq!(sim.store().scenario_name.get(), Some("ambient-drift"));
    assert_eq!(sim.player_stats().scenarios_started, 2);

    // The replacement plays to completion on its own clock.
    run_until(&mut sim, 501, 9_500);
    assert!(!sim.scenario_running());
}
