//! Page storage: the per-message [`PageSet`], its persisted shape, and the
//! [`FeedService`] through which every mutation goes.

pub mod message_store;
pub mod normalize;
pub mod page_set;
pub mod service;

pub use message_store::{JsonFileStore, MemoryStore, MessageStore};
pub use normalize::{normalize, normalize_with_raw_texts};
pub use page_set::{GenerationMode, PageSet, RawText};
pub use service::{FeedService, GenerationGuard};

use crate::parsing::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Page {index} out of range ({len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("A generation is already running for message {0}")]
    GenerationInFlight(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data error: {0}")]
    Json(#[from] serde_json::Error),
}
