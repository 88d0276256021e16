use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

/// One complete set of posts produced by a single generation pass.
pub type Page = Vec<Post>;

/// Opaque post identifier, assigned at parse time.
///
/// Freshly parsed posts get a v4 UUID; stored ids from older data are kept
/// verbatim whatever their format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One social-media item as parsed from a `[POST]` block.
///
/// This is the flat record the parser produces. Use [`Post::dialect`] to get a
/// view holding only the fields a given platform uses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: PostId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub replies: Vec<ReplyItem>,
    #[serde(default)]
    pub quotes: Vec<QuoteItem>,
    #[serde(default, alias = "quoteRt", skip_serializing_if = "Option::is_none")]
    pub quoted_post: Option<QuotedPost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_context: Option<ConversationContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_context: Option<VideoContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Post {
    /// Tag the post with the platform it was generated under and when.
    pub fn tag(&mut self, platform: Platform, timestamp: DateTime<Utc>) {
        self.platform = Some(platform);
        self.timestamp = Some(timestamp);
    }

    /// Reply count shown next to the post; derived from the parsed replies.
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}

/// Media type tag, written `[Image]` / `[Video]` in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaKind {
    #[default]
    #[serde(alias = "image", alias = "IMAGE", alias = "Photo", alias = "photo")]
    Image,
    #[serde(alias = "video", alias = "VIDEO")]
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
        }
    }
}

/// A media descriptor: type tag plus free-text description.
///
/// Deserializes from `{type, description}` objects as well as from the bare
/// strings older stored data used (`"[Video] a clip"`, `"a sunset"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredMedia")]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub description: String,
}

impl MediaItem {
    pub fn new(kind: MediaKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn image(description: impl Into<String>) -> Self {
        Self::new(MediaKind::Image, description)
    }

    pub fn video(description: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, description)
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "[{}]", self.kind.as_str())
        } else {
            write!(f, "[{}] {}", self.kind.as_str(), self.description)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMedia {
    Tagged {
        #[serde(rename = "type", default)]
        kind: MediaKind,
        #[serde(default)]
        description: String,
    },
    Legacy(String),
}

impl From<StoredMedia> for MediaItem {
    fn from(stored: StoredMedia) -> Self {
        match stored {
            StoredMedia::Tagged { kind, description } => MediaItem { kind, description },
            StoredMedia::Legacy(line) => crate::parsing::post::parse_media_item(&line),
        }
    }
}

fn zero() -> String {
    "0".to_string()
}

/// Engagement counters as written by the generator.
///
/// Each counter is kept as its textual token, possibly carrying a `K`/`M`
/// magnitude suffix (`"15.5K"`). Share tokens keep their unit letter
/// (`"300R"`); use [`Stats::bare_count`] for the number alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default = "zero")]
    pub likes: String,
    #[serde(default = "zero", alias = "retweets")]
    pub shares: String,
    #[serde(default = "zero", alias = "quotes")]
    pub secondary_shares: String,
    #[serde(default, alias = "replies")]
    pub reply_count_hint: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            likes: zero(),
            shares: zero(),
            secondary_shares: zero(),
            reply_count_hint: 0,
        }
    }
}

impl Stats {
    /// Strip a trailing unit letter (`R`, `Q`, `S`, `C`, `L`) from a counter token.
    pub fn bare_count(token: &str) -> &str {
        token.trim_end_matches(|c: char| {
            matches!(c.to_ascii_uppercase(), 'R' | 'Q' | 'S' | 'C' | 'L')
        })
    }

    pub fn is_zero(token: &str) -> bool {
        let bare = Self::bare_count(token);
        bare.is_empty() || bare.chars().all(|c| matches!(c, '0' | '.' | ','))
    }
}

/// Nesting level of a reply. Only one level of sub-replies exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ReplyDepth {
    #[default]
    Top,
    /// Reply to a reply, marked with a leading `└` in markup.
    Sub,
}

impl From<bool> for ReplyDepth {
    fn from(is_sub: bool) -> Self {
        if is_sub { ReplyDepth::Sub } else { ReplyDepth::Top }
    }
}

impl From<ReplyDepth> for bool {
    fn from(depth: ReplyDepth) -> Self {
        depth == ReplyDepth::Sub
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyItem {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "isSub", default)]
    pub depth: ReplyDepth,
    #[serde(default)]
    pub time: Option<String>,
}

impl ReplyItem {
    pub fn is_sub(&self) -> bool {
        self.depth == ReplyDepth::Sub
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub content: String,
}

impl From<ReplyItem> for QuoteItem {
    fn from(item: ReplyItem) -> Self {
        Self {
            username: item.username,
            display_name: item.display_name,
            content: item.content,
        }
    }
}

/// An original post embedded in another post (`[Quote RT of ...]`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedPost {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    #[serde(alias = "1on1")]
    Direct,
    Group,
}

/// Participants of a message thread. The first participant is the post's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub participants: Vec<String>,
}

impl ConversationContext {
    /// Build the roster from the author and the other listed participants.
    ///
    /// Returns `None` when nobody else is listed.
    pub fn from_roster(author: &str, others: Vec<String>) -> Option<Self> {
        if others.is_empty() {
            return None;
        }
        let kind = if others.len() == 1 {
            ConversationKind::Direct
        } else {
            ConversationKind::Group
        };
        let mut participants = Vec::with_capacity(others.len() + 1);
        participants.push(author.to_string());
        participants.extend(others);
        Some(Self { kind, participants })
    }

    /// Everyone except the author.
    pub fn others(&self) -> &[String] {
        self.participants.get(1..).unwrap_or_default()
    }
}

/// Context of the video a comment page belongs to (`[VIDEO]` block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoContext {
    pub channel_name: String,
    pub video_title: String,
    pub subscribers: String,
    pub duration: String,
    pub most_viewed_time: String,
    pub most_viewed_text: String,
    pub description: String,
}

impl VideoContext {
    pub const DEFAULT_CHANNEL: &'static str = "Channel";
    pub const DEFAULT_TITLE: &'static str = "Video Title";
    pub const DEFAULT_SUBSCRIBERS: &'static str = "1.2M subscribers";
    pub const DEFAULT_DURATION: &'static str = "10:00";
    pub const DEFAULT_MOST_VIEWED_TIME: &'static str = "0:00";
}

impl Default for VideoContext {
    fn default() -> Self {
        Self {
            channel_name: Self::DEFAULT_CHANNEL.to_string(),
            video_title: Self::DEFAULT_TITLE.to_string(),
            subscribers: Self::DEFAULT_SUBSCRIBERS.to_string(),
            duration: Self::DEFAULT_DURATION.to_string(),
            most_viewed_time: Self::DEFAULT_MOST_VIEWED_TIME.to_string(),
            most_viewed_text: String::new(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_media_display_keeps_tag() {
        assert_eq!(MediaItem::image("first").to_string(), "[Image] first");
        assert_eq!(MediaItem::video("").to_string(), "[Video]");
    }

    #[test]
    fn test_media_deserializes_from_legacy_string() {
        let media: Vec<MediaItem> =
            serde_json::from_value(json!(["[Video] a clip", "a sunset"])).unwrap();
        assert_eq!(
            media,
            vec![MediaItem::video("a clip"), MediaItem::image("a sunset")]
        );
    }

    #[test]
    fn test_media_deserializes_from_object() {
        let media: MediaItem =
            serde_json::from_value(json!({"type": "video", "description": "x"})).unwrap();
        assert_eq!(media, MediaItem::video("x"));
    }

    #[test]
    fn test_stats_accepts_legacy_keys() {
        let stats: Stats =
            serde_json::from_value(json!({"likes": "10K", "retweets": "5", "quotes": "2", "replies": 0}))
                .unwrap();
        assert_eq!(stats.shares, "5");
        assert_eq!(stats.secondary_shares, "2");
    }

    #[test]
    fn test_stats_bare_count() {
        assert_eq!(Stats::bare_count("300R"), "300");
        assert_eq!(Stats::bare_count("1.5KQ"), "1.5K");
        assert_eq!(Stats::bare_count("10K"), "10K");
        assert!(Stats::is_zero("0"));
        assert!(!Stats::is_zero("5R"));
    }

    #[test]
    fn test_reply_depth_serializes_as_is_sub_flag() {
        let reply = ReplyItem {
            username: "@bob".into(),
            display_name: "Bob".into(),
            content: "hi".into(),
            depth: ReplyDepth::Sub,
            time: None,
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["isSub"], json!(true));

        let back: ReplyItem = serde_json::from_value(value).unwrap();
        assert!(back.is_sub());
    }

    #[test]
    fn test_conversation_roster() {
        let ctx = ConversationContext::from_roster("me", vec!["mom".into()]).unwrap();
        assert_eq!(ctx.kind, ConversationKind::Direct);
        assert_eq!(ctx.participants, vec!["me", "mom"]);
        assert_eq!(ctx.others(), ["mom".to_string()]);

        let group =
            ConversationContext::from_roster("me", vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(group.kind, ConversationKind::Group);

        assert!(ConversationContext::from_roster("me", vec![]).is_none());
    }

    #[test]
    fn test_legacy_conversation_kind() {
        let ctx: ConversationContext =
            serde_json::from_value(json!({"type": "1on1", "participants": ["a", "b"]})).unwrap();
        assert_eq!(ctx.kind, ConversationKind::Direct);
    }

    #[test]
    fn test_post_accepts_legacy_quote_rt_key() {
        let post: Post = serde_json::from_value(json!({
            "id": "lx3k9abc",
            "username": "@a",
            "content": "hi",
            "quoteRt": {"displayName": "B", "username": "b", "content": "orig", "media": []}
        }))
        .unwrap();
        assert_eq!(post.id.as_str(), "lx3k9abc");
        assert_eq!(post.quoted_post.unwrap().content, "orig");
        assert_eq!(post.stats, Stats::default());
    }
}
