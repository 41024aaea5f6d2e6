//! NeoWs feed ingestion and raw payload storage
//!
//! ## Main Components
//! - `FeedClient`: fetches one date window from the NeoWs `feed` endpoint
//! - `RawStore`: append/read log of raw payloads (`FileRawStore`, `MemoryRawStore`)
//! - `pipeline`: fetch-and-store plus the record loading every analytic route starts from

mod api_client;
pub use api_client::{FeedClient, FeedWindow};

mod store;
pub use store::{FileRawStore, MemoryRawStore, RawStore};

pub mod pipeline;
pub use pipeline::{fetch_and_store, load_records, FetchSummary};
