//! Markup serialization: the inverse of [`crate::parsing::parse`].
//!
//! Output is written in the dialect of the requested platform, so fields the
//! dialect has no use for are left out. Re-parsing the output gives back the
//! same posts, though not necessarily byte-identical text.

use crate::models::{
    MediaItem, Platform, PlatformPost, Post, QuotedPost, ReplyDepth, ReplyItem, Stats,
    VideoContext,
};
use crate::parsing::subsection::{SUB_REPLY_MARKER, Section, parse_inline_line};

/// Prefix of forum replies written without an identity ("anonymous").
pub const ANONYMOUS_PREFIX: &str = "익명";

/// Write a page as block markup in the dialect of `platform`.
pub fn serialize(page: &[Post], platform: Platform) -> String {
    let mut blocks = Vec::with_capacity(page.len() + 1);
    if let Some(video) = page.first().and_then(|post| post.video_context.as_ref()) {
        blocks.push(serialize_video(video));
    }
    blocks.extend(page.iter().map(|post| serialize_post(post, platform)));
    blocks.join("\n\n")
}

pub fn serialize_video(video: &VideoContext) -> String {
    let mut w = MarkupWriter::default();
    w.raw("[VIDEO]");
    w.field("Channel", &video.channel_name);
    w.field("Subscribers", &video.subscribers);
    w.field("Title", &video.video_title);
    w.field("Duration", &video.duration);
    if !video.most_viewed_text.is_empty() {
        w.field(
            "MostViewed",
            &format!("{} - {}", video.most_viewed_time, video.most_viewed_text),
        );
    }
    if !video.description.is_empty() {
        w.field("Description", &video.description);
    }
    w.raw("[/VIDEO]");
    w.finish()
}

pub fn serialize_post(post: &Post, platform: Platform) -> String {
    let view = post.dialect(platform);
    let base = view.base();
    let mut w = MarkupWriter::default();

    w.raw("[POST]");
    w.field("User", base.username);
    if let Some(name) = view.display_name().filter(|name| !name.is_empty()) {
        w.field("Name", name);
    }
    if let PlatformPost::Forum {
        title: Some(title), ..
    } = view
    {
        w.field("Title", title);
    }
    if let Some(date) = base.date {
        w.field("Date", date);
    }
    if let PlatformPost::MessageThread {
        conversation_context: Some(ctx),
        ..
    } = view
    {
        w.field("Participants", &ctx.others().join(", "));
    }
    w.field("Content", base.content);
    w.media(base.media);
    if let Some(quoted) = base.quoted_post {
        w.quoted_post(quoted);
    }
    w.field("Stats", &stats_line(base.stats, platform));

    let mut anonymous = AnonymousNames::default();
    let replies: Vec<ReplyItem> = base
        .replies
        .iter()
        .map(|reply| anonymous.resolve(platform, reply.clone()))
        .collect();
    w.section(Section::Replies, &replies);
    let quotes: Vec<ReplyItem> = base
        .quotes
        .iter()
        .map(|quote| {
            let item = ReplyItem {
                username: quote.username.clone(),
                display_name: quote.display_name.clone(),
                content: quote.content.clone(),
                ..Default::default()
            };
            anonymous.resolve(platform, item)
        })
        .collect();
    w.section(Section::Quotes, &quotes);
    w.raw("[/POST]");
    w.finish()
}

/// Rebuild a `Stats:` value.
///
/// Likes are written bare. Share tokens keep their stored unit, bare counts get
/// the dialect's unit, and counters still at their `"0"` default are left out.
pub fn stats_line(stats: &Stats, platform: Platform) -> String {
    let (share_unit, secondary_unit) = platform.stat_units();
    let mut tokens = vec![Stats::bare_count(&stats.likes).to_string()];
    for (token, unit) in [
        (&stats.shares, share_unit),
        (&stats.secondary_shares, secondary_unit),
    ] {
        if token == "0" {
            continue;
        }
        if token.ends_with(|c: char| c.is_ascii_alphabetic() && !is_magnitude(c)) {
            tokens.push(token.clone());
        } else {
            tokens.push(format!("{token}{unit}"));
        }
    }
    tokens.join(" ")
}

fn is_magnitude(c: char) -> bool {
    matches!(c, 'K' | 'k' | 'M' | 'm')
}

/// Identity part of an inline reply or quote line.
///
/// `Display @handle` when both are known and differ, otherwise whichever one
/// there is.
pub fn identity(username: &str, display_name: &str) -> String {
    let display_name = display_name.trim();
    if username.starts_with('@') && !display_name.is_empty() && display_name != username {
        format!("{display_name} {username}")
    } else if username.is_empty() {
        display_name.to_string()
    } else {
        username.to_string()
    }
}

/// One-line form of a reply or quote: `Display @handle: content [time]`.
fn inline_line(item: &ReplyItem) -> String {
    let mut line = String::new();
    if item.is_sub() {
        line.push(SUB_REPLY_MARKER);
        line.push(' ');
    }
    line.push_str(&identity(&item.username, &item.display_name));
    line.push_str(": ");
    line.push_str(&item.content);
    if let Some(time) = &item.time {
        line.push_str(&format!(" [{time}]"));
    }
    line
}

/// Whether re-parsing the one-line form gives the item back.
///
/// Nicknames with a separate display name, and names holding `:` or a
/// trailing handle, do not survive a single line.
fn fits_inline(item: &ReplyItem) -> bool {
    let display_name = match item.display_name.trim() {
        "" => item.username.clone(),
        name => name.to_string(),
    };
    let expected = ReplyItem {
        display_name,
        ..item.clone()
    };
    parse_inline_line(&inline_line(item)).as_ref() == Some(&expected)
}

/// Numbers identity-less forum items in order of appearance within one post.
#[derive(Default)]
struct AnonymousNames {
    next: usize,
}

impl AnonymousNames {
    fn resolve(&mut self, platform: Platform, mut item: ReplyItem) -> ReplyItem {
        let anonymous = item.username.is_empty() && item.display_name.trim().is_empty();
        if anonymous && platform == Platform::Everytime {
            self.next += 1;
            item.username = format!("{ANONYMOUS_PREFIX}{}", self.next);
            item.display_name = item.username.clone();
        }
        item
    }
}

#[derive(Default)]
struct MarkupWriter {
    lines: Vec<String>,
}

impl MarkupWriter {
    fn raw(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn field(&mut self, label: &str, value: &str) {
        self.lines.push(format!("{label}: {value}"));
    }

    /// One `Media:` line per item, never merged.
    fn media(&mut self, media: &[MediaItem]) {
        for item in media {
            self.field("Media", &item.to_string());
        }
    }

    /// A `[REPLIES]`/`[QUOTES]` block, one line per item when every item
    /// fits on one line, otherwise as `User:`/`Name:`/`Content:` items.
    fn section(&mut self, section: Section, items: &[ReplyItem]) {
        if items.is_empty() {
            return;
        }
        self.raw(&format!("[{}]", section.tag()));
        if items.iter().all(fits_inline) {
            for item in items {
                self.raw(&inline_line(item));
            }
        } else {
            for item in items {
                self.verbose_item(item);
            }
        }
        self.raw(&format!("[/{}]", section.tag()));
    }

    fn verbose_item(&mut self, item: &ReplyItem) {
        match item.depth {
            ReplyDepth::Sub => self.field(&format!("{SUB_REPLY_MARKER} User"), &item.username),
            ReplyDepth::Top => self.field("User", &item.username),
        }
        if !item.display_name.is_empty() && item.display_name != item.username {
            self.field("Name", &item.display_name);
        }
        self.field("Content", &item.content);
        if let Some(time) = &item.time {
            self.field("Time", time);
        }
    }

    fn quoted_post(&mut self, quoted: &QuotedPost) {
        let header = [quoted.display_name.as_str(), quoted.username.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.raw(&format!("[Quote RT of {header}]"));
        if !quoted.content.is_empty() {
            self.raw(&quoted.content);
        }
        self.media(&quoted.media);
        self.raw("[/Quote RT]");
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}
