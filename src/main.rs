use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use missile_guidance::dynamics::SimConfig;
use missile_guidance::error::{GuidanceError, Result};
use missile_guidance::io::{self, EngagementSummary};
use missile_guidance::scenario::{presets, Scenario};
use missile_guidance::sim::event::EventKind;
use missile_guidance::{simulate, Command};

const USAGE: &str = "usage: missile-guidance [preset|scenario.json] [--csv path] [--summary path]";

struct Args {
    scenario: String,
    csv: Option<String>,
    summary: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { scenario: "crossing".into(), csv: None, summary: None };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .ok_or_else(|| GuidanceError::InvalidScenario(format!("{flag} needs a path\n{USAGE}")))
        };
        match arg.as_str() {
            "--csv" => args.csv = Some(value("--csv")?),
            "--summary" => args.summary = Some(value("--summary")?),
            "-h" | "--help" => {
                println!("{USAGE}\npresets: {}", presets::NAMES.join(", "));
                std::process::exit(0);
            }
            _ => args.scenario = arg,
        }
    }
    Ok(args)
}

fn load_scenario(name: &str) -> Result<Scenario> {
    match presets::by_name(name) {
        Some(s) => Ok(s),
        None if name.ends_with(".json") => Scenario::load(name),
        None => Err(GuidanceError::InvalidScenario(format!(
            "unknown preset '{name}' (try {})",
            presets::NAMES.join(", ")
        ))),
    }
}

fn order_label(order: &Command) -> String {
    match order {
        Command::Idle => "IDLE".into(),
        Command::TurnTowards { target } => format!("TURN towards ({:.0}, {:.0})", target.x, target.y),
        Command::Seek { target } => format!("SEEK ({:.0}, {:.0})", target.x, target.y),
        Command::FollowPath { waypoints } => format!("PATH through {} waypoints", waypoints.len()),
        Command::SetTarget { target } => format!("RETARGET ({:.0}, {:.0})", target.x, target.y),
    }
}

fn event_label(kind: &EventKind) -> String {
    match kind {
        EventKind::StateChanged { from, to } => format!("STATE     {from} -> {to}"),
        EventKind::WaypointReached { waypoint, remaining } => {
            format!("WAYPOINT  ({:.0}, {:.0}), {remaining} left", waypoint.x, waypoint.y)
        }
        EventKind::Arrived => "ARRIVED".into(),
        EventKind::PathCompleted => "PATH DONE".into(),
        EventKind::Intercept { miss_distance } => format!("INTERCEPT miss={miss_distance:.2}m"),
        EventKind::Custom(label) => format!("ALERT     {label}"),
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let scenario = load_scenario(&args.scenario)?;
    let config = SimConfig::default();

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let record = simulate(&scenario, &config)?;
    let summary = EngagementSummary::from_record(&scenario.name, &record);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    let g = &scenario.guidance;
    println!();
    println!("====================================================================");
    println!("  MISSILE GUIDANCE — {}", scenario.name);
    println!("====================================================================");
    println!();
    println!("  Airframe & Guidance");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.1} kg    Inertia:      {:>8.2} kg·m^2",
        scenario.missile.mass(),
        scenario.missile.inertia()
    );
    println!(
        "  Max speed:     {:>8.1} m/s   Max lin acc:  {:>8.1} m/s^2",
        g.limits.max_speed, g.limits.max_linear_acceleration
    );
    println!(
        "  Max ang acc:   {:>8.2} r/s^2 Arrival r:    {:>8.1} m",
        g.limits.max_angular_acceleration, g.limits.min_arrival_distance
    );
    println!(
        "  Turn PID:      kp={:.2} ki={:.2} kd={:.2}   Thrust PID: kp={:.2} ki={:.2} kd={:.2}",
        g.turn_gains.kp, g.turn_gains.ki, g.turn_gains.kd,
        g.thrust_gains.kp, g.thrust_gains.ki, g.thrust_gains.kd,
    );
    println!("  Order:         {}", order_label(&scenario.order));
    println!();

    println!("  Engagement Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for e in &record.events {
        println!(
            "  t={:>6.2}s   pos=({:>7.1},{:>7.1})   {}",
            e.time,
            e.state.pos.x,
            e.state.pos.y,
            event_label(&e.kind)
        );
    }
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    if let (Some(d), Some(t)) = (summary.closest_approach_m, summary.closest_approach_time) {
        println!("  Closest approach: {:>8.2} m  at t={:.2} s", d, t);
    }
    match summary.intercept_time {
        Some(t) => println!("  Intercept:        {:>8.2} s", t),
        None => println!("  Intercept:             none"),
    }
    println!("  Max speed:        {:>8.1} m/s", summary.max_speed);
    println!("  Max turn rate:    {:>8.2} rad/s", summary.max_turn_rate);
    println!("  Flight time:      {:>8.1} s", summary.flight_time);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>8}  {:>8}  {:>9}  {:>8}",
        "t (s)", "x (m)", "y (m)", "v (m/s)", "hdg(deg)", "range (m)", "torque"
    );
    println!("  {}", "─".repeat(66));

    let n = record.trajectory.len();
    let sample_interval = (n / 30).max(1);
    let rows = record.trajectory.iter().zip(&record.targets).zip(&record.actuations);
    for (i, ((s, target), act)) in rows.enumerate() {
        if i % sample_interval != 0 && i != n - 1 {
            continue;
        }
        let range = target.map_or(String::from("-"), |t| format!("{:.1}", s.distance_to(&t)));
        println!(
            "  {:>7.2}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>9}  {:>8.2}",
            s.time,
            s.pos.x,
            s.pos.y,
            s.speed(),
            s.heading().to_degrees(),
            range,
            act.torque
        );
    }

    println!();
    println!("  Simulation: {} steps, dt={:.4} s", n - 1, config.dt);
    println!("====================================================================");
    println!();

    if let Some(path) = &args.csv {
        io::write_trajectory_file(path, &record)?;
        println!("  Trajectory written to {path}");
    }
    if let Some(path) = &args.summary {
        io::write_summary_file(path, &summary)?;
        println!("  Summary written to {path}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "missile_guidance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
