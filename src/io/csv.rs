use std::io::{self, Write};
use std::path::Path;

use crate::sim::SimRecord;

/// Write a recorded engagement to CSV format.
///
/// Columns: time, pos_x, pos_y, vel_x, vel_y, heading_deg, omega,
///          target_x, target_y, force_x, force_y, torque
///
/// Target columns are left empty while nothing is being chased.
pub fn write_trajectory<W: Write>(writer: &mut W, record: &SimRecord) -> io::Result<()> {
    writeln!(
        writer,
        "time,pos_x,pos_y,vel_x,vel_y,heading_deg,omega,\
         target_x,target_y,force_x,force_y,torque"
    )?;

    let rows = record
        .trajectory
        .iter()
        .zip(&record.targets)
        .zip(&record.actuations);
    for ((s, target), act) in rows {
        let (tx, ty) = match target {
            Some(t) => (format!("{:.4}", t.x), format!("{:.4}", t.y)),
            None => (String::new(), String::new()),
        };
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4},{:.4},{:.2},{:.6},{},{},{:.4},{:.4},{:.4}",
            s.time,
            s.pos.x, s.pos.y,
            s.vel.x, s.vel.y,
            s.heading().to_degrees(),
            s.omega,
            tx, ty,
            act.force.x, act.force.y,
            act.torque,
        )?;
    }

    Ok(())
}

/// Write a recorded engagement to a CSV file at the given path.
pub fn write_trajectory_file(path: impl AsRef<Path>, record: &SimRecord) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, record)?;
    file.flush()
}
