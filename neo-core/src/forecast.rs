//! Linear miss-distance trend over time

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{NeoError, Result};
use crate::types::{ApproachRecord, TrendForecast};

/// 7 days
pub const DEFAULT_HORIZON_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Parse an approach date into unix seconds.
///
/// Accepts `2015-09-08`, the feed's full form `2015-Sep-08 09:45`, and RFC 3339.
pub fn parse_approach_time(date: &str) -> Option<i64> {
    let date = date.trim();

    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%b-%d %H:%M") {
        return Some(dt.and_utc().timestamp());
    }
    DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.timestamp())
}

/// Fit miss distance against time and project `horizon_seconds` past the
/// latest observation.
///
/// The projection is the raw value of the fitted line and may be negative.
/// A horizon whose target time cannot be represented as a UTC date is
/// rejected with `InvalidHorizon`.
pub fn forecast(records: &[ApproachRecord], horizon_seconds: i64) -> Result<TrendForecast> {
    let samples: Vec<(i64, f64)> = records
        .iter()
        .filter_map(|r| {
            let distance = r.miss_distance_km?;
            let time = parse_approach_time(&r.close_approach_date)?;
            Some((time, distance))
        })
        .collect();

    if samples.len() < 2 {
        return Err(NeoError::InsufficientData {
            needed: 2,
            available: samples.len(),
        });
    }

    let (slope, intercept) = least_squares(&samples);

    let latest = samples.iter().map(|(t, _)| *t).max().unwrap_or_default();
    let (future_timestamp, future_date) = latest
        .checked_add(horizon_seconds)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| (ts, dt.to_rfc3339())))
        .ok_or(NeoError::InvalidHorizon { horizon_seconds })?;
    let predicted_distance_km = slope * future_timestamp as f64 + intercept;

    debug!(
        "Trend over {} samples: slope={} km/s, projected {} km at {}",
        samples.len(),
        slope,
        predicted_distance_km,
        future_date
    );

    Ok(TrendForecast {
        slope,
        intercept,
        samples: samples.len(),
        future_timestamp,
        future_date,
        predicted_distance_km,
    })
}

/// Ordinary least squares on mean-centered data.
///
/// When every sample shares one timestamp the minimum-norm solution is a flat
/// line through the mean distance.
fn least_squares(samples: &[(i64, f64)]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|(t, _)| *t as f64).sum::<f64>() / n;
    let mean_y = samples.iter().map(|(_, d)| *d).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (t, d) in samples {
        let dx = *t as f64 - mean_x;
        sxy += dx * (d - mean_y);
        sxx += dx * dx;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, mean_y - slope * mean_x)
}
