//! Markup parsing: generator text in, structured posts out.
//!
//! Parsing is best-effort. Absent fields take defaults and malformed blocks are
//! skipped; [`parse`] never fails. Only [`parse_edit`] reports a condition, so
//! the edit flow can warn when non-empty text produced nothing.

pub mod blocks;
pub mod fields;
pub mod post;
pub mod stats;
pub mod subsection;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Page, VideoContext};
use fields::{field_regex, first_field};

pub use blocks::extract_sns_content;
pub use post::parse_post;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("No posts could be parsed from the given text")]
    NothingParsed,
}

static CHANNEL_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Channel"));
static SUBSCRIBERS_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Subscribers"));
static VIDEO_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Title"));
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Duration"));
static MOST_VIEWED_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("MostViewed"));

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*Description[ \t]*:[ \t]*((?s:.*))$").expect("valid regex")
});

/// `<time> - <text>` or `<time> – <text>`.
static MOST_VIEWED_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?::\d+)+)\s*[-–]\s*(.+)$").expect("valid regex"));

/// Parse generator output into a page of posts, in document order.
///
/// The video context, when present, is attached to every post.
pub fn parse(text: &str) -> Page {
    let extracted = blocks::extract(text);
    let video_context = extracted.video.and_then(parse_video_context);

    let page: Page = extracted
        .posts
        .into_iter()
        .map(|body| {
            let mut post = parse_post(body);
            post.video_context = video_context.clone();
            post
        })
        .collect();

    log::debug!(
        "Parsed {} post(s){}",
        page.len(),
        if video_context.is_some() {
            " with video context"
        } else {
            ""
        }
    );
    page
}

/// Parse user-edited markup.
///
/// Non-blank text that yields no post is [`ParseError::NothingParsed`];
/// blank text is an empty page.
pub fn parse_edit(text: &str) -> Result<Page, ParseError> {
    let page = parse(text);
    if page.is_empty() && !text.trim().is_empty() {
        return Err(ParseError::NothingParsed);
    }
    Ok(page)
}

/// Parse the body of a `[VIDEO]` block.
///
/// Returns `None` unless a `Channel:` or `Title:` field is present.
pub fn parse_video_context(body: &str) -> Option<VideoContext> {
    let (fields, description) = match DESCRIPTION_RE.captures(body) {
        Some(caps) => {
            let start = caps.get(0).map_or(body.len(), |m| m.start());
            let description = caps.get(1).map_or("", |m| m.as_str()).trim();
            (&body[..start], description)
        }
        None => (body, ""),
    };

    let channel = first_field(fields, &CHANNEL_RE);
    let title = first_field(fields, &VIDEO_TITLE_RE);
    if channel.is_none() && title.is_none() {
        log::debug!("Ignoring [VIDEO] block without Channel or Title");
        return None;
    }

    let defaults = VideoContext::default();
    let (most_viewed_time, most_viewed_text) = first_field(fields, &MOST_VIEWED_RE)
        .map(|value| split_most_viewed(&value))
        .unwrap_or((defaults.most_viewed_time, defaults.most_viewed_text));

    Some(VideoContext {
        channel_name: channel.unwrap_or(defaults.channel_name),
        video_title: title.unwrap_or(defaults.video_title),
        subscribers: first_field(fields, &SUBSCRIBERS_RE).unwrap_or(defaults.subscribers),
        duration: first_field(fields, &DURATION_RE).unwrap_or(defaults.duration),
        most_viewed_time,
        most_viewed_text,
        description: description.to_string(),
    })
}

fn split_most_viewed(value: &str) -> (String, String) {
    match MOST_VIEWED_VALUE_RE.captures(value) {
        Some(caps) => (caps[1].to_string(), caps[2].trim().to_string()),
        None => (
            VideoContext::DEFAULT_MOST_VIEWED_TIME.to_string(),
            value.to_string(),
        ),
    }
}
