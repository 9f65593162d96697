use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sim::SimRecord;

/// Summary statistics computed from a recorded engagement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub scenario: String,
    /// Smallest distance to the chased point seen in any sample.
    pub closest_approach_m: Option<f64>,
    pub closest_approach_time: Option<f64>,
    pub intercept_time: Option<f64>,
    pub max_speed: f64,
    pub max_turn_rate: f64,
    pub flight_time: f64,
    pub final_distance_m: Option<f64>,
    pub events: usize,
}

impl EngagementSummary {
    /// Compute summary from a recorded run.
    pub fn from_record(scenario: &str, record: &SimRecord) -> Self {
        let closest = record
            .trajectory
            .iter()
            .zip(&record.targets)
            .filter_map(|(s, t)| t.map(|t| (s.distance_to(&t), s.time)))
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let max_speed = record
            .trajectory
            .iter()
            .map(|s| s.speed())
            .fold(0.0_f64, f64::max);

        let max_turn_rate = record
            .trajectory
            .iter()
            .map(|s| s.omega.abs())
            .fold(0.0_f64, f64::max);

        let final_distance_m = record
            .trajectory
            .last()
            .zip(record.targets.last().copied().flatten())
            .map(|(s, t)| s.distance_to(&t));

        EngagementSummary {
            scenario: scenario.to_string(),
            closest_approach_m: closest.map(|c| c.0),
            closest_approach_time: closest.map(|c| c.1),
            intercept_time: record.intercept().map(|e| e.time),
            max_speed,
            max_turn_rate,
            flight_time: record.final_state().map_or(0.0, |s| s.time),
            final_distance_m,
            events: record.events.len(),
        }
    }
}

/// Write engagement summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &EngagementSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Write engagement summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &EngagementSummary) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_summary(&mut file, summary)?;
    file.flush()?;
    Ok(())
}
