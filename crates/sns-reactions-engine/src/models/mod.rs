pub mod platform;
pub mod post;

pub use platform::{Platform, PlatformPost, PostBase, UnknownPlatform};
pub use post::{
    ConversationContext, ConversationKind, MediaItem, MediaKind, Page, Post, PostId, QuoteItem,
    QuotedPost, ReplyDepth, ReplyItem, Stats, VideoContext,
};
