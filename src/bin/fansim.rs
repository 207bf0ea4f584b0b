use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use std::time::Duration;

use fansim::bus::{BusFrame, FrameDirection};
use fansim::runtime;
use fansim::scenario::Scenario;
use fansim::sensors;
use fansim::sim::{SimConfig, Simulator};
use fansim::state::SimSnapshot;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("fansim")
        .version("0.1.0")
        .about("Closed-loop cooling-fan controller simulator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["table", "json", "compact"])
                .default_value("table")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Run the simulation and stream bus frames")
                .arg(
                    Arg::with_name("scenario")
                        .short("s")
                        .long("scenario")
                        .value_name("NAME")
                        .help("Scenario to play (see `fansim scenarios`)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("duration")
                        .short("d")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("How long to run")
                        .takes_value(true)
                        .default_value("15")
                        .validator(|v| {
                            v.parse::<u64>()
                                .map(|_| ())
                                .map_err(|_| "duration must be a whole number of seconds".into())
                        }),
                ),
        )
        .subcommand(SubCommand::with_name("scenarios").about("List the built-in scenarios"))
        .subcommand(
            SubCommand::with_name("convert")
                .about("Convert a raw ADC sample to voltage and temperatures")
                .arg(
                    Arg::with_name("raw")
                        .help("Raw sample (0-1023; out-of-range input is clamped)")
                        .required(true)
                        .validator(|v| {
                            v.parse::<i32>()
                                .map(|_| ())
                                .map_err(|_| "raw sample must be an integer".into())
                        }),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("run", Some(sub)) => run_simulation(sub).await,
        ("scenarios", Some(sub)) => {
            list_scenarios(sub);
            Ok(())
        }
        ("convert", Some(sub)) => {
            convert_sample(sub);
            Ok(())
        }
        _ => unreachable!("SubcommandRequiredElseHelp"),
    }
}

async fn run_simulation(sub: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let duration_s: u64 = sub.value_of("duration").unwrap_or("15").parse()?;
    let format = sub.value_of("format").unwrap_or("table").to_string();

    let mut sim = Simulator::new(SimConfig::default());
    sim.start(0);
    if let Some(name) = sub.value_of("scenario") {
        sim.start_scenario(name, 0)?;
        println!("{} {}", "scenario:".bold(), name.cyan());
    }

    runtime::run(&mut sim, Some(Duration::from_secs(duration_s)), |tx, rx| {
        print_frame(tx, &format);
        print_frame(rx, &format);
    })
    .await;

    print_snapshot(&sim.snapshot(), &format)?;
    Ok(())
}

fn print_frame(frame: &BusFrame, format: &str) {
    match format {
        "json" => {
            if let Ok(line) = serde_json::to_string(frame) {
                println!("{line}");
            }
        }
        "compact" => {
            println!(
                "{} {} {} seq={}",
                frame.stamp, frame.direction.label(), frame.id, frame.sequence()
            );
        }
        _ => {
            let direction = match frame.direction {
                FrameDirection::Tx => frame.direction.label().blue().bold(),
                FrameDirection::Rx => frame.direction.label().green().bold(),
            };
            let payload = frame
                .payload
                .iter()
                .map(|byte| format!("{byte:02X}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!(
                "{}  {}  {}  dlc={}  [{}]  {}",
                frame.stamp.as_str().dimmed(),
                direction,
                frame.id.yellow(),
                frame.dlc,
                payload,
                frame.description
            );
        }
    }
}

fn print_snapshot(snapshot: &SimSnapshot, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    let mode = if snapshot.safety_active {
        snapshot.mode.label().red().bold()
    } else {
        snapshot.mode.label().green().bold()
    };
    println!();
    println!("{}", "final state".bold().underline());
    println!("  mode          : {mode}");
    println!(
        "  engine        : {:.1} degC (raw {}, {:.3} V)",
        snapshot.engine_temp_c, snapshot.engine_raw, snapshot.engine_voltage
    );
    println!(
        "  ambient       : {:.1} degC (raw {}, {:.3} V)",
        snapshot.ambient_temp_c, snapshot.ambient_raw, snapshot.ambient_voltage
    );
    println!("  fan duty      : {}%", snapshot.fan_duty_pct);
    println!("  manual duty   : {}%", snapshot.manual_duty_pct);
    if let Some(name) = snapshot.scenario {
        println!("  scenario      : {} (still running)", name.cyan());
    }
    Ok(())
}

fn list_scenarios(sub: &ArgMatches<'_>) {
    let catalog = Scenario::catalog();
    if sub.value_of("format") == Some("json") {
        let names: Vec<_> = catalog
            .iter()
            .map(|s| serde_json::json!({ "name": s.name, "summary": s.summary }))
            .collect();
        if let Ok(out) = serde_json::to_string_pretty(&names) {
            println!("{out}");
        }
        return;
    }
    for scenario in &catalog {
        println!("{:<20} {}", scenario.name.cyan().bold(), scenario.summary);
    }
}

fn convert_sample(sub: &ArgMatches<'_>) {
    let raw_arg: i32 = sub
        .value_of("raw")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let raw = sensors::clamp_sample(raw_arg);
    let engine_temp = sensors::sample_to_engine_temp(raw);
    println!("raw sample : {raw}");
    println!("voltage    : {:.3} V", sensors::sample_to_voltage(raw));
    println!(
        "engine     : {engine_temp:.1} degC (auto duty {}%)",
        sensors::duty_for_temperature(engine_temp)
    );
    println!("ambient    : {:.1} degC", sensors::sample_to_ambient_temp(raw));
}
