// fusion_sim/src/output.rs

//! Tab-separated estimate files: one row per processed measurement.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use fusion_core::state::StateVariable;

use crate::error::SimError;
use crate::runner::Estimate;

pub const HEADER: &str = "time_us\tsensor\tpx_est\tpy_est\tv_est\tyaw_est\tyaw_rate_est\
\tpx_meas\tpy_meas\tpx_gt\tpy_gt\tvx_gt\tvy_gt\tnis";

fn optional(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

pub fn format_row(estimate: &Estimate) -> String {
    let x = &estimate.state.vector;
    // Radar readings are reported in Cartesian form so both sensors share columns.
    let (meas_px, meas_py) = estimate.measurement.data.position();
    let gt = estimate.ground_truth;

    let mut fields = vec![
        estimate.measurement.timestamp.to_string(),
        estimate.measurement.kind().to_string(),
    ];
    fields.extend(StateVariable::LAYOUT.iter().map(|v| x[v.index()].to_string()));
    fields.push(meas_px.to_string());
    fields.push(meas_py.to_string());
    fields.push(optional(gt.map(|g| g.px)));
    fields.push(optional(gt.map(|g| g.py)));
    fields.push(optional(gt.map(|g| g.vx)));
    fields.push(optional(gt.map(|g| g.vy)));
    fields.push(optional(estimate.nis()));
    fields.join("\t")
}

pub fn write_estimates<W: Write>(mut writer: W, estimates: &[Estimate]) -> std::io::Result<()> {
    writeln!(writer, "{}", HEADER)?;
    for estimate in estimates {
        writeln!(writer, "{}", format_row(estimate))?;
    }
    writer.flush()
}

pub fn write_estimates_file(path: &Path, estimates: &[Estimate]) -> Result<(), SimError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SimError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    write_estimates(BufWriter::new(file), estimates).map_err(|e| SimError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_reader::GroundTruth;
    use fusion_core::estimation::ProcessOutcome;
    use fusion_core::messages::{MeasurementMessage, SensorKind};
    use fusion_core::state::FilterState;
    use fusion_core::types::StateVector;

    #[test]
    fn test_rows_match_header_width() {
        let estimates = [
            Estimate {
                measurement: MeasurementMessage::lidar(0, 1.0, 2.0),
                outcome: ProcessOutcome::Initialized,
                state: FilterState {
                    vector: StateVector::new(1.0, 2.0, 0.0, 0.0, 0.0),
                    ..FilterState::default()
                },
                ground_truth: None,
            },
            Estimate {
                measurement: MeasurementMessage::radar(50_000, 2.0, 0.0, 1.0),
                outcome: ProcessOutcome::Updated {
                    sensor: SensorKind::Radar,
                    nis: 1.25,
                    prediction_steps: 1,
                },
                state: FilterState::default(),
                ground_truth: Some(GroundTruth {
                    px: 2.0,
                    py: 0.0,
                    vx: 1.0,
                    vy: 0.0,
                    yaw: None,
                    yaw_rate: None,
                }),
            },
        ];

        let mut buffer = Vec::new();
        write_estimates(&mut buffer, &estimates).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        let width = HEADER.split('\t').count();
        assert_eq!(width, 14);
        for line in &lines {
            assert_eq!(line.split('\t').count(), width);
        }

        let first: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(first[1], "lidar");
        assert_eq!(first[2], "1");
        assert_eq!(first[13], "");

        let second: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(second[0], "50000");
        assert_eq!(second[1], "radar");
        assert_eq!(second[7], "2");
        assert_eq!(second[9], "2");
        assert_eq!(second[13], "1.25");
    }
}
