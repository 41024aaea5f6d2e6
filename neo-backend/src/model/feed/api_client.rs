//! NeoWs feed client

use chrono::NaiveDate;
use neo_core::{NeoError, RawPayload};
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;

use crate::config::NasaConfig;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date window requested from the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FeedWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, String> {
        if end_date < start_date {
            return Err(format!(
                "end_date {} is before start_date {}",
                end_date, start_date
            ));
        }
        Ok(Self { start_date, end_date })
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, String> {
        let parse = |label: &str, value: &str| {
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
                .map_err(|e| format!("invalid {} '{}': {}", label, value, e))
        };
        Self::new(parse("start_date", start_date)?, parse("end_date", end_date)?)
    }
}

/// HTTP client for the feed endpoint. One attempt per fetch, no retries.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FeedClient {
    pub fn new(config: &NasaConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("neo-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn feed_url(&self, window: &FeedWindow) -> Result<Url, NeoError> {
        let start = window.start_date.format(DATE_FORMAT).to_string();
        let end = window.end_date.format(DATE_FORMAT).to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| NeoError::UpstreamFetch {
            message: format!("invalid feed URL '{}': {}", self.base_url, e),
            status_code: None,
        })
    }

    /// Fetch one window and return the body verbatim.
    pub async fn fetch_feed(&self, window: &FeedWindow) -> Result<RawPayload, NeoError> {
        let url = self.feed_url(window)?;
        tracing::info!(
            "Fetching NEO feed {} .. {} from {}",
            window.start_date,
            window.end_date,
            self.base_url
        );

        let response = self.client.get(url).send().await.map_err(|e| NeoError::UpstreamFetch {
            message: format!("request failed: {}", e),
            status_code: e.status().map(|s| s.as_u16()),
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("NEO feed answered with HTTP {}", status);
            return Err(NeoError::UpstreamFetch {
                message: format!("HTTP error {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| NeoError::UpstreamFetch {
            message: format!("failed to parse JSON response: {}", e),
            status_code: Some(status.as_u16()),
        })?;

        Ok(RawPayload::new(body))
    }
}
