use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder used for identity fields missing from the source
pub const UNKNOWN: &str = "unknown";

/// One stored ingestion response, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(pub serde_json::Value);

impl RawPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for RawPayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// One asteroid approach, flattened out of a feed payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachRecord {
    pub id: String,
    pub name: String,
    /// Date key of the group the asteroid was listed under
    pub close_approach_date: String,
    pub miss_distance_km: Option<f64>,
    pub velocity_kph: Option<f64>,
}

/// Closest and fastest approach of a record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    #[serde(rename = "closest_neo")]
    pub closest: ApproachRecord,
    #[serde(rename = "fastest_neo")]
    pub fastest: ApproachRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub name: String,
    pub velocity_kph: f64,
    pub cluster: usize,
}

/// Velocity clustering result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Center velocity per cluster id, in algorithm order
    pub centers: Vec<f64>,
    /// Member count per cluster id
    pub counts: BTreeMap<usize, usize>,
    pub assignments: Vec<ClusterMember>,
    pub iterations: usize,
}

/// Linear miss-distance trend and its projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    /// km per second
    pub slope: f64,
    pub intercept: f64,
    pub samples: usize,
    pub future_timestamp: i64,
    pub future_date: String,
    pub predicted_distance_km: f64,
}

impl TrendForecast {
    /// Evaluate the fitted line at a unix timestamp
    pub fn predict(&self, timestamp: i64) -> f64 {
        self.slope * timestamp as f64 + self.intercept
    }
}
