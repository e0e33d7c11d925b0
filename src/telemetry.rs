//! Telemetry log to time-series transform
//!
//! The station appends one record per line:
//!
//! ```text
//! <timestamp>,<record type>,<sensor key>,<value>
//! ```
//!
//! `BIRD` and `PERIODIC` records are event markers and carry no reading.
//! Every other record with a sensor key becomes one [`SeriesPoint`] under that
//! key. A `nan` value is kept as a gap (`v: null`) so charts can show it.

use crate::types::{SeriesIndex, SeriesPoint};

/// Record types that mark events rather than sensor readings
pub const MARKER_RECORD_TYPES: [&str; 2] = ["BIRD", "PERIODIC"];

/// Why a line did not contribute a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    /// Not exactly four comma-separated fields
    Shape,
    /// `BIRD` / `PERIODIC` or empty sensor key
    NoReading,
    /// Value is neither a finite number nor `nan`
    BadValue,
}

/// Parse one non-blank line into `(sensor key, point)`
fn parse_line(line: &str) -> Result<(&str, SeriesPoint), Skip> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [timestamp, record_type, sensor_key, value] = fields.as_slice() else {
        return Err(Skip::Shape);
    };

    if MARKER_RECORD_TYPES.contains(record_type) || sensor_key.is_empty() {
        return Err(Skip::NoReading);
    }

    let v = parse_value(value)?;
    Ok((*sensor_key, SeriesPoint::new(*timestamp, v)))
}

fn parse_value(token: &str) -> Result<Option<f64>, Skip> {
    if token == "nan" {
        return Ok(None);
    }
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(Skip::BadValue),
    }
}

/// Convert raw log text into a per-sensor series index.
///
/// Never fails: malformed lines are skipped. Within each sensor, points keep
/// the order in which their lines appear in `raw`.
pub fn transform(raw: &str) -> SeriesIndex {
    let mut index = SeriesIndex::new();
    let mut malformed = 0usize;
    let mut markers = 0usize;

    for line in raw.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((sensor, point)) => index.push(sensor, point),
            Err(Skip::NoReading) => markers += 1,
            Err(Skip::Shape) | Err(Skip::BadValue) => malformed += 1,
        }
    }

    if malformed > 0 {
        tracing::debug!(malformed, markers, "skipped malformed telemetry lines");
    }
    tracing::debug!(
        sensors = index.len(),
        points = index.point_count(),
        "transformed telemetry log"
    );
    index
}
