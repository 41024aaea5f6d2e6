//! Near-Earth-object pipeline core: flattening of raw NeoWs feed payloads
//! and the analytics built on the flat record set.

pub mod cluster;
pub mod error;
pub mod extremes;
pub mod flatten;
pub mod forecast;
pub mod types;

pub use cluster::{cluster, cluster_with_seed, DEFAULT_CLUSTER_COUNT, DEFAULT_SEED};
pub use error::{NeoError, Result};
pub use extremes::{closest, extremes, fastest};
pub use flatten::{flatten, PayloadShape};
pub use forecast::{forecast, parse_approach_time, DEFAULT_HORIZON_SECONDS};
pub use types::{
    ApproachRecord, ClusterMember, ClusterReport, Extremes, RawPayload, TrendForecast,
    UNKNOWN,
};
