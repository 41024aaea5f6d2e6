//! Closest / fastest approach search

use crate::error::{NeoError, Result};
use crate::types::{ApproachRecord, Extremes};

/// Record with the smallest miss distance. Null distances are ignored.
pub fn closest(records: &[ApproachRecord]) -> Result<&ApproachRecord> {
    first_extreme(records, |r| r.miss_distance_km, |candidate, best| candidate < best)
        .ok_or(NeoError::EmptyResult { field: "miss_distance_km" })
}

/// Record with the highest relative velocity. Null velocities are ignored.
pub fn fastest(records: &[ApproachRecord]) -> Result<&ApproachRecord> {
    first_extreme(records, |r| r.velocity_kph, |candidate, best| candidate > best)
        .ok_or(NeoError::EmptyResult { field: "velocity_kph" })
}

pub fn extremes(records: &[ApproachRecord]) -> Result<Extremes> {
    Ok(Extremes {
        closest: closest(records)?.clone(),
        fastest: fastest(records)?.clone(),
    })
}

/// Strict comparison keeps the first record on ties.
fn first_extreme<'a>(
    records: &'a [ApproachRecord],
    field: impl Fn(&ApproachRecord) -> Option<f64>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&'a ApproachRecord> {
    let mut best: Option<(&ApproachRecord, f64)> = None;

    for record in records {
        let Some(value) = field(record) else { continue };
        match best {
            Some((_, best_value)) if !better(value, best_value) => {}
            _ => best = Some((record, value)),
        }
    }

    best.map(|(record, _)| record)
}
