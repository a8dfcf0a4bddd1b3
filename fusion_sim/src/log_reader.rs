// fusion_sim/src/log_reader.rs

//! Reader for whitespace-separated sensor logs, one measurement per line:
//!
//! ```text
//! L  px   py           timestamp_us  [gt_px gt_py gt_vx gt_vy [gt_yaw gt_yaw_rate]]
//! R  rho  phi  rho_dot timestamp_us  [gt_px gt_py gt_vx gt_vy [gt_yaw gt_yaw_rate]]
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use fusion_core::messages::{MeasurementData, MeasurementMessage};
use fusion_core::types::TimestampUs;
use log::{debug, warn};
use nalgebra::Vector4;
use thiserror::Error;
use walkdir::WalkDir;

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct LogParseError {
    pub line: usize,
    pub reason: String,
}

impl LogParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Ground truth recorded alongside a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruth {
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
    pub yaw: Option<f64>,
    pub yaw_rate: Option<f64>,
}

impl GroundTruth {
    /// `[px, py, vx, vy]`, comparable with `FilterState::cartesian`.
    pub fn cartesian(&self) -> Vector4<f64> {
        Vector4::new(self.px, self.py, self.vx, self.vy)
    }
}

/// One line of a sensor log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord {
    pub measurement: MeasurementMessage,
    pub ground_truth: Option<GroundTruth>,
}

fn parse_f64(token: &str, what: &str, line: usize) -> Result<f64, LogParseError> {
    token
        .parse::<f64>()
        .map_err(|e| LogParseError::new(line, format!("invalid {} '{}': {}", what, token, e)))
}

fn parse_timestamp(token: &str, line: usize) -> Result<TimestampUs, LogParseError> {
    token
        .parse::<TimestampUs>()
        .map_err(|e| LogParseError::new(line, format!("invalid timestamp '{}': {}", token, e)))
}

/// Parses a single log line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(text: &str, line: usize) -> Result<Option<SensorRecord>, LogParseError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let arity = match tokens[0] {
        "L" => 2,
        "R" => 3,
        other => {
            return Err(LogParseError::new(
                line,
                format!("unknown sensor type '{}'", other),
            ))
        }
    };
    if tokens.len() < arity + 2 {
        return Err(LogParseError::new(
            line,
            format!("expected at least {} fields, found {}", arity + 2, tokens.len()),
        ));
    }

    let values = tokens[1..=arity]
        .iter()
        .map(|t| parse_f64(t, "reading", line))
        .collect::<Result<Vec<_>, _>>()?;
    let data = match tokens[0] {
        "L" => MeasurementData::Lidar {
            px: values[0],
            py: values[1],
        },
        _ => MeasurementData::Radar {
            rho: values[0],
            phi: values[1],
            rho_dot: values[2],
        },
    };
    let timestamp = parse_timestamp(tokens[arity + 1], line)?;

    let truth = tokens[arity + 2..]
        .iter()
        .map(|t| parse_f64(t, "ground truth", line))
        .collect::<Result<Vec<_>, _>>()?;
    let ground_truth = match truth.len() {
        0 => None,
        4 | 6 => Some(GroundTruth {
            px: truth[0],
            py: truth[1],
            vx: truth[2],
            vy: truth[3],
            yaw: truth.get(4).copied(),
            yaw_rate: truth.get(5).copied(),
        }),
        n => {
            return Err(LogParseError::new(
                line,
                format!("expected 0, 4 or 6 ground truth fields, found {}", n),
            ))
        }
    };

    Ok(Some(SensorRecord {
        measurement: MeasurementMessage { timestamp, data },
        ground_truth,
    }))
}

/// Parses every line of a reader. Line numbers in errors are 1-based.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<SensorRecord>, LogParseError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let text = line.map_err(|e| LogParseError::new(line_no, e.to_string()))?;
        if let Some(record) = parse_line(&text, line_no)? {
            records.push(record);
        }
    }
    Ok(records)
}

pub fn read_log_file(path: &Path) -> Result<Vec<SensorRecord>, SimError> {
    let file = File::open(path).map_err(|e| SimError::io(path, e))?;
    let records = parse_log(BufReader::new(file)).map_err(|source| SimError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Resolves the input of a run: a single file, or every `.txt` file below a
/// directory in sorted order.
pub fn collect_logs(input: &Path) -> Result<Vec<PathBuf>, SimError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(SimError::NoInput(input.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", input, e);
                None
            }
        })
        .filter(|e| {
            !e.file_type().is_dir() && e.path().extension().map_or(false, |ext| ext == "txt")
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(SimError::NoInput(input.to_path_buf()));
    }
    Ok(files)
}

/// Formats a record back into a log line.
pub fn format_record(record: &SensorRecord) -> String {
    let mut line = match record.measurement.data {
        MeasurementData::Lidar { px, py } => {
            format!("L\t{}\t{}\t{}", px, py, record.measurement.timestamp)
        }
        MeasurementData::Radar { rho, phi, rho_dot } => format!(
            "R\t{}\t{}\t{}\t{}",
            rho, phi, rho_dot, record.measurement.timestamp
        ),
    };
    if let Some(gt) = &record.ground_truth {
        line.push_str(&format!("\t{}\t{}\t{}\t{}", gt.px, gt.py, gt.vx, gt.vy));
        if let (Some(yaw), Some(yaw_rate)) = (gt.yaw, gt.yaw_rate) {
            line.push_str(&format!("\t{}\t{}", yaw, yaw_rate));
        }
    }
    line
}
