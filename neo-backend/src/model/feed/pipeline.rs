//! Fetch → store, and store → flat records

use neo_core::{flatten, ApproachRecord, NeoError};
use serde::Serialize;

use super::api_client::{FeedClient, FeedWindow};
use super::store::RawStore;

#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    pub window: FeedWindow,
    /// Records the new payload flattens to
    pub records: usize,
    pub cleared: bool,
}

/// Fetch one window and append it to the store.
///
/// With `clear_before` the store is emptied only after a successful fetch, so
/// an upstream failure leaves the previous data in place.
pub async fn fetch_and_store(
    feed: &FeedClient,
    store: &dyn RawStore,
    window: FeedWindow,
    clear_before: bool,
) -> Result<FetchSummary, NeoError> {
    let payload = feed.fetch_feed(&window).await?;
    let records = flatten(std::slice::from_ref(&payload)).len();

    if clear_before {
        store.clear().await?;
    }
    store.append(&payload).await?;

    tracing::info!(
        "Stored NEO feed {} .. {} ({} records, cleared: {})",
        window.start_date,
        window.end_date,
        records,
        clear_before
    );

    Ok(FetchSummary {
        window,
        records,
        cleared: clear_before,
    })
}

/// Flatten everything in the store. Recomputed on every call.
pub async fn load_records(store: &dyn RawStore) -> Result<Vec<ApproachRecord>, NeoError> {
    let payloads = store.read_all().await?;
    Ok(flatten(&payloads))
}
