//! Error taxonomy shared by the pipeline and the service boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NeoError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NeoError {
    /// Network or status failure while calling the upstream feed
    #[error("failed to fetch upstream feed: {message}")]
    UpstreamFetch {
        message: String,
        status_code: Option<u16>,
    },

    /// A stored payload does not have the expected shape
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// No eligible rows for an analytic query
    #[error("no records with a value for '{field}'")]
    EmptyResult { field: &'static str },

    /// Not enough rows to run the requested computation
    #[error("insufficient data: need at least {needed}, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Forecast horizon that lands outside the representable time range
    #[error("horizon of {horizon_seconds} seconds is out of range")]
    InvalidHorizon { horizon_seconds: i64 },

    #[error("raw store error: {0}")]
    Store(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl NeoError {
    /// Stable machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            NeoError::UpstreamFetch { .. } => "upstream_fetch",
            NeoError::MalformedPayload(_) => "malformed_payload",
            NeoError::EmptyResult { .. } => "empty_result",
            NeoError::InsufficientData { .. } => "insufficient_data",
            NeoError::InvalidHorizon { .. } => "invalid_horizon",
            NeoError::Store(_) => "store",
            NeoError::Export(_) => "export",
            NeoError::Render(_) => "render",
        }
    }

    /// Upstream HTTP status, when the failure carried one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NeoError::UpstreamFetch { status_code, .. } => *status_code,
            _ => None,
        }
    }
}
