//! Parsing of `[REPLIES]` and `[QUOTES]` sub-sections.
//!
//! A post may contain several blocks with the same tag; their items are
//! concatenated in document order. Two strategies run in order:
//!
//! 1. [`parse_inline_items`]: one item per line, `Name @handle: content [time]`,
//!    with an optional leading `└` marking a sub-reply.
//! 2. [`parse_verbose_items`]: only when the inline pass found nothing, items
//!    written as `User:` / `Name:` / `Content:` lines, with optional `Time:`
//!    and a `└` before `User:` for sub-replies. Older output uses this format,
//!    and the serializer falls back to it for identities a single line cannot
//!    hold.

use std::sync::LazyLock;

use regex::Regex;

use super::fields::{is_placeholder_name, normalize_username};
use crate::models::{ReplyDepth, ReplyItem};

/// Leading glyph of a reply-to-a-reply.
pub const SUB_REPLY_MARKER: char = '└';

static REPLIES_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[REPLIES\](.*?)\[/REPLIES\]").expect("valid regex"));

static QUOTES_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[QUOTES\](.*?)\[/QUOTES\]").expect("valid regex"));

static TRAILING_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\[([^\]]*)\]$").expect("valid regex"));

static TRAILING_HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(@+[\w.]+)$").expect("valid regex"));

static VERBOSE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:└[ \t]*)?(?:User|Name|Content|Time)[ \t]*:").expect("valid regex")
});

static VERBOSE_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*(└[ \t]*)?(User|Name|Content|Time)[ \t]*:[ \t]*(.*?)[ \t\r]*$")
        .expect("valid regex")
});

/// Which sub-section tag to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Replies,
    Quotes,
}

impl Section {
    pub fn tag(self) -> &'static str {
        match self {
            Section::Replies => "REPLIES",
            Section::Quotes => "QUOTES",
        }
    }

    pub(crate) fn block_regex(self) -> &'static Regex {
        match self {
            Section::Replies => &REPLIES_BLOCK_RE,
            Section::Quotes => &QUOTES_BLOCK_RE,
        }
    }
}

/// Inner texts of every `section` block in `post_body`, in document order.
pub fn section_bodies(post_body: &str, section: Section) -> Vec<&str> {
    section
        .block_regex()
        .captures_iter(post_body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Parse all items of `section` in a post body, falling back to the verbose
/// format when no inline item is found.
pub fn parse_section(post_body: &str, section: Section) -> Vec<ReplyItem> {
    let bodies = section_bodies(post_body, section);

    let inline: Vec<ReplyItem> = bodies.iter().flat_map(|b| parse_inline_items(b)).collect();
    if !inline.is_empty() {
        return inline;
    }

    let verbose: Vec<ReplyItem> = bodies.iter().flat_map(|b| parse_verbose_items(b)).collect();
    if !verbose.is_empty() {
        log::debug!(
            "[{}] parsed {} item(s) in verbose format",
            section.tag(),
            verbose.len()
        );
    }
    verbose
}

/// Inline strategy: one item per non-blank line.
pub fn parse_inline_items(body: &str) -> Vec<ReplyItem> {
    body.lines().filter_map(parse_inline_line).collect()
}

/// Parse one `meta: content` line. Returns `None` for blank lines, lines
/// without a `:`, and lines that start a verbose item.
pub fn parse_inline_line(line: &str) -> Option<ReplyItem> {
    let line = line.trim();
    if line.is_empty() || VERBOSE_START_RE.is_match(line) {
        return None;
    }

    let Some((meta, content)) = line.split_once(':') else {
        log::debug!("Dropping sub-section line without ':': {line}");
        return None;
    };
    let mut meta = meta.trim();
    let mut content = content.trim();

    let mut time = None;
    if let Some(caps) = TRAILING_TIME_RE.captures(content)
        && let (Some(whole), Some(value)) = (caps.get(0), caps.get(1))
    {
        time = Some(value.as_str().trim().to_string());
        content = content[..whole.start()].trim();
    }

    let mut depth = ReplyDepth::Top;
    if let Some(rest) = meta.strip_prefix(SUB_REPLY_MARKER) {
        depth = ReplyDepth::Sub;
        meta = rest.trim_start();
    } else if let Some(rest) = content.strip_prefix(SUB_REPLY_MARKER) {
        depth = ReplyDepth::Sub;
        content = rest.trim_start();
    }

    let (username, display_name) = split_identity(meta);
    Some(ReplyItem {
        username,
        display_name,
        content: content.to_string(),
        depth,
        time,
    })
}

/// Split the identity part of an inline item into `(username, display_name)`.
///
/// - `Display Name @handle` → handle and the text before it
/// - `@handle` → the handle for both
/// - `nickname` → the nickname for both
pub fn split_identity(meta: &str) -> (String, String) {
    let meta = meta.trim();

    if let Some(handle) = TRAILING_HANDLE_RE.captures(meta).and_then(|caps| caps.get(1)) {
        let username = normalize_username(handle.as_str());
        let display = meta[..handle.start()].trim();
        let display_name = if display.is_empty() {
            username.clone()
        } else {
            display.to_string()
        };
        return (username, display_name);
    }

    if meta.starts_with('@') {
        let username = normalize_username(meta);
        return (username.clone(), username);
    }

    (meta.to_string(), meta.to_string())
}

#[derive(Debug, Default)]
struct VerboseItem {
    user: Option<String>,
    name: Option<String>,
    content: Option<String>,
    time: Option<String>,
    depth: ReplyDepth,
}

impl VerboseItem {
    fn is_started(&self) -> bool {
        self.user.is_some() || self.name.is_some() || self.content.is_some()
    }

    fn finish(self) -> Option<ReplyItem> {
        let content = self.content?;
        let username = normalize_username(self.user.as_deref().unwrap_or_default());
        let display_name = match self.name {
            Some(name) if !name.is_empty() && !is_placeholder_name(&name) => name,
            _ => username.clone(),
        };
        Some(ReplyItem {
            username,
            display_name,
            content,
            depth: self.depth,
            time: self.time.filter(|time| !time.is_empty()),
        })
    }
}

/// Verbose strategy: items written as `User:` / `Name:` / `Content:` lines.
///
/// A `User:` line, or a repeated field, starts a new item. Items without
/// content are dropped. `Time:` belongs to the item before it.
pub fn parse_verbose_items(body: &str) -> Vec<ReplyItem> {
    let mut items = Vec::new();
    let mut current = VerboseItem::default();

    for line in body.lines() {
        let Some(caps) = VERBOSE_FIELD_RE.captures(line) else {
            continue;
        };
        let is_sub = caps.get(1).is_some();
        let label = caps[2].to_ascii_lowercase();
        let value = caps[3].to_string();

        let slot_taken = match label.as_str() {
            "user" => current.is_started(),
            "name" => current.name.is_some(),
            "time" => current.time.is_some(),
            _ => current.content.is_some(),
        };
        if slot_taken {
            items.extend(std::mem::take(&mut current).finish());
        }

        match label.as_str() {
            "user" => {
                current.user = Some(value);
                if is_sub {
                    current.depth = ReplyDepth::Sub;
                }
            }
            "name" => current.name = Some(value),
            "time" => current.time = Some(value),
            _ => current.content = Some(value),
        }
    }
    items.extend(current.finish());
    items
}
