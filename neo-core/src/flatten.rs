//! Flattening of NeoWs feed payloads
//!
//! A feed payload groups asteroids by calendar date:
//!
//! ```text
//! { "near_earth_objects": { "<date>": [ { id, name, close_approach_data: [ ... ] } ] } }
//! ```
//!
//! Every (date, asteroid) pair becomes one [`ApproachRecord`]. Only the first
//! close-approach entry of an asteroid is read.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::NeoError;
use crate::types::{ApproachRecord, RawPayload, UNKNOWN};

/// Shape of a stored payload as seen by the flattener
#[derive(Debug)]
pub enum PayloadShape<'a> {
    /// Date key -> asteroid list mapping
    Groups(&'a Map<String, Value>),
    /// Payload that cannot contribute records
    Skip(NeoError),
}

impl<'a> PayloadShape<'a> {
    pub fn classify(payload: &'a RawPayload) -> Self {
        match payload.as_value().get("near_earth_objects") {
            Some(Value::Object(groups)) => PayloadShape::Groups(groups),
            Some(other) => PayloadShape::Skip(NeoError::MalformedPayload(format!(
                "'near_earth_objects' is {}, expected an object",
                json_type(other)
            ))),
            None => PayloadShape::Skip(NeoError::MalformedPayload(
                "missing 'near_earth_objects'".to_string(),
            )),
        }
    }
}

/// Flatten payloads into approach records.
///
/// Output order follows payload order, then date-group order, then asteroid
/// order. Malformed payloads are skipped with a warning.
pub fn flatten(payloads: &[RawPayload]) -> Vec<ApproachRecord> {
    let mut records = Vec::new();

    for (index, payload) in payloads.iter().enumerate() {
        let groups = match PayloadShape::classify(payload) {
            PayloadShape::Groups(groups) => groups,
            PayloadShape::Skip(reason) => {
                warn!("Skipping payload #{}: {}", index, reason);
                continue;
            }
        };

        for (date, asteroids) in groups {
            let Some(asteroids) = asteroids.as_array() else {
                warn!(
                    "Skipping date group '{}' in payload #{}: {} is not a list",
                    date,
                    index,
                    json_type(asteroids)
                );
                continue;
            };

            records.extend(asteroids.iter().map(|asteroid| approach_record(date, asteroid)));
        }
    }

    debug!("Flattened {} payloads into {} records", payloads.len(), records.len());
    records
}

fn approach_record(date: &str, asteroid: &Value) -> ApproachRecord {
    let first_approach = asteroid
        .get("close_approach_data")
        .and_then(|approaches| approaches.get(0));

    ApproachRecord {
        id: identity_field(asteroid.get("id")),
        name: identity_field(asteroid.get("name")),
        close_approach_date: date.to_string(),
        miss_distance_km: first_approach
            .and_then(|a| a.pointer("/miss_distance/kilometers"))
            .and_then(coerce_number),
        velocity_kph: first_approach
            .and_then(|a| a.pointer("/relative_velocity/kilometers_per_hour"))
            .and_then(coerce_number),
    }
}

fn identity_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// The feed encodes numbers as strings; plain JSON numbers are accepted too.
fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
