use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::post::{
    ConversationContext, MediaItem, Post, PostId, QuoteItem, QuotedPost, ReplyItem, Stats,
    VideoContext,
};

/// The simulated social platforms a page can be generated for.
///
/// Each platform has its own markup dialect: which identity fields it uses and
/// which unit letters its stats carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    Twitter,
    Instagram,
    /// Video comment section.
    Youtube,
    /// Anonymous campus forum.
    Everytime,
    /// Message threads.
    Messenger,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Twitter,
        Platform::Instagram,
        Platform::Youtube,
        Platform::Everytime,
        Platform::Messenger,
    ];

    /// Wire name used in stored data and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Everytime => "everytime",
            Platform::Messenger => "messenger",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter",
            Platform::Instagram => "Instagram",
            Platform::Youtube => "YouTube",
            Platform::Everytime => "Everytime",
            Platform::Messenger => "Messenger",
        }
    }

    /// Whether the dialect writes a `Name:` line next to `User:`.
    pub fn uses_display_name(self) -> bool {
        matches!(
            self,
            Platform::Twitter | Platform::Instagram | Platform::Messenger
        )
    }

    /// Unit letters appended to the share and secondary-share counters.
    pub fn stat_units(self) -> (char, char) {
        match self {
            Platform::Everytime => ('S', 'C'),
            _ => ('R', 'Q'),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unknown platform names fall back to the default platform.
impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(name.parse().unwrap_or_else(|_| {
            log::warn!("Unknown stored platform '{name}', using default");
            Platform::default()
        }))
    }
}

/// Fields every dialect shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostBase<'a> {
    pub id: &'a PostId,
    pub username: &'a str,
    pub date: Option<&'a str>,
    pub content: &'a str,
    pub media: &'a [MediaItem],
    pub stats: &'a Stats,
    pub replies: &'a [ReplyItem],
    pub quotes: &'a [QuoteItem],
    pub quoted_post: Option<&'a QuotedPost>,
}

/// A post seen through one platform's dialect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformPost<'a> {
    Twitter {
        base: PostBase<'a>,
        display_name: &'a str,
    },
    Instagram {
        base: PostBase<'a>,
        display_name: &'a str,
    },
    Forum {
        base: PostBase<'a>,
        title: Option<&'a str>,
    },
    VideoComment {
        base: PostBase<'a>,
        video_context: Option<&'a VideoContext>,
    },
    MessageThread {
        base: PostBase<'a>,
        display_name: &'a str,
        conversation_context: Option<&'a ConversationContext>,
    },
}

impl<'a> PlatformPost<'a> {
    pub fn base(&self) -> &PostBase<'a> {
        match self {
            PlatformPost::Twitter { base, .. }
            | PlatformPost::Instagram { base, .. }
            | PlatformPost::Forum { base, .. }
            | PlatformPost::VideoComment { base, .. }
            | PlatformPost::MessageThread { base, .. } => base,
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformPost::Twitter { .. } => Platform::Twitter,
            PlatformPost::Instagram { .. } => Platform::Instagram,
            PlatformPost::Forum { .. } => Platform::Everytime,
            PlatformPost::VideoComment { .. } => Platform::Youtube,
            PlatformPost::MessageThread { .. } => Platform::Messenger,
        }
    }

    /// Display name, for dialects that have one.
    pub fn display_name(&self) -> Option<&'a str> {
        match *self {
            PlatformPost::Twitter { display_name, .. }
            | PlatformPost::Instagram { display_name, .. }
            | PlatformPost::MessageThread { display_name, .. } => Some(display_name),
            _ => None,
        }
    }
}

impl Post {
    /// View this post through the dialect of `platform`.
    pub fn dialect(&self, platform: Platform) -> PlatformPost<'_> {
        let base = PostBase {
            id: &self.id,
            username: &self.username,
            date: self.date.as_deref(),
            content: &self.content,
            media: &self.media,
            stats: &self.stats,
            replies: &self.replies,
            quotes: &self.quotes,
            quoted_post: self.quoted_post.as_ref(),
        };
        match platform {
            Platform::Twitter => PlatformPost::Twitter {
                base,
                display_name: &self.display_name,
            },
            Platform::Instagram => PlatformPost::Instagram {
                base,
                display_name: &self.display_name,
            },
            Platform::Everytime => PlatformPost::Forum {
                base,
                title: self.title.as_deref(),
            },
            Platform::Youtube => PlatformPost::VideoComment {
                base,
                video_context: self.video_context.as_ref(),
            },
            Platform::Messenger => PlatformPost::MessageThread {
                base,
                display_name: &self.display_name,
                conversation_context: self.conversation_context.as_ref(),
            },
        }
    }
}
