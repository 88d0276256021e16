pub mod models;
pub mod parsing;
pub mod serializing;
pub mod store;

// Re-export key types for easier usage
pub use models::*;
pub use parsing::{ParseError, extract_sns_content, parse, parse_edit};
pub use serializing::serialize;
pub use store::{
    FeedService, GenerationGuard, GenerationMode, JsonFileStore, MemoryStore, MessageStore,
    PageSet, RawText, StoreError,
};
