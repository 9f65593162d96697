use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use missile_guidance::dynamics::state::{Actuation, BodyState, SimConfig};
use missile_guidance::io::EngagementSummary;
use missile_guidance::math::{adjust_angle, bearing};
use missile_guidance::scenario::{presets, Scenario};
use missile_guidance::sim::{self, SimRecord};

fn main() -> eframe::Result {
    let name = std::env::args().nth(1).unwrap_or_else(|| "crossing".into());
    let scenario = match presets::by_name(&name) {
        Some(s) => s,
        None => match Scenario::load(&name) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot load '{name}': {e}; showing the crossing preset");
                presets::crossing_target()
            }
        },
    };
    let config = SimConfig::default();
    let record = match sim::simulate(&scenario, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            SimRecord::default()
        }
    };
    let summary = EngagementSummary::from_record(&scenario.name, &record);

    let app = GuidanceViz { record, summary };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Missile Guidance", options, Box::new(|_| Ok(Box::new(app))))
}

struct GuidanceViz {
    record: SimRecord,
    summary: EngagementSummary,
}

type Sample<'a> = (&'a BodyState, &'a Option<nalgebra::Vector2<f64>>, &'a Actuation);

impl eframe::App for GuidanceViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let r = &self.record;
        let step = (r.trajectory.len() / 2000).max(1);
        let sampled: Vec<Sample> = r
            .trajectory
            .iter()
            .zip(&r.targets)
            .zip(&r.actuations)
            .map(|((s, t), a)| (s, t, a))
            .step_by(step)
            .collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Scenario: {}", self.summary.scenario));
            let fmt = |v: Option<f64>, unit: &str| v.map_or("-".into(), |v| format!("{v:.2} {unit}"));
            ui.label(format!(
                "Closest approach: {}  |  Intercept: {}  |  Max speed: {:.1} m/s  |  Flight: {:.1} s",
                fmt(self.summary.closest_approach_m, "m"),
                fmt(self.summary.intercept_time, "s"),
                self.summary.max_speed,
                self.summary.flight_time,
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                // Ground track: missile and target
                ui.vertical(|ui| {
                    ui.label("Path (m)");
                    let missile: PlotPoints = sampled.iter().map(|(s, _, _)| [s.pos.x, s.pos.y]).collect();
                    let target: PlotPoints = sampled
                        .iter()
                        .filter_map(|(_, t, _)| t.map(|t| [t.x, t.y]))
                        .collect();
                    Plot::new("path")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("x (m)")
                        .data_aspect(1.0)
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Missile", missile));
                            plot_ui.line(Line::new("Target", target));
                        });
                });

                // Heading error vs Time
                ui.vertical(|ui| {
                    ui.label("Heading Error (deg)");
                    let points: PlotPoints = sampled
                        .iter()
                        .filter_map(|(s, t, _)| {
                            let t = (**t)?;
                            let b = bearing(&s.pos, &t)?;
                            Some([s.time, adjust_angle(s.angle - b).to_degrees()])
                        })
                        .collect();
                    Plot::new("heading_error")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Heading error", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                // Speed vs Time
                ui.vertical(|ui| {
                    ui.label("Speed (m/s)");
                    let points: PlotPoints = sampled.iter().map(|(s, _, _)| [s.time, s.speed()]).collect();
                    Plot::new("speed")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Speed", points));
                        });
                });

                // Steering torque vs Time
                ui.vertical(|ui| {
                    ui.label("Torque (N·m)");
                    let points: PlotPoints = sampled.iter().map(|(s, _, a)| [s.time, a.torque]).collect();
                    Plot::new("torque")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Torque", points));
                        });
                });
            });
        });
    }
}
