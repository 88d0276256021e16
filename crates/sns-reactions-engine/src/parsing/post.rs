//! Parsing of one `[POST]` block body into a [`Post`].

use std::sync::LazyLock;

use regex::Regex;

use super::fields::{
    field_line_regex, field_regex, first_field, normalize_username, sanitize_display_name,
    tidy_body,
};
use super::stats::parse_stats;
use super::subsection::{Section, parse_section};
use crate::models::{ConversationContext, MediaItem, MediaKind, Post, QuoteItem, QuotedPost};

static USER_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("User"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Name"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex(TITLE_LABELS));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Date"));
static PARTICIPANTS_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Participants"));
static STATS_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Stats"));
static MEDIA_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("Photo|Media"));

const TITLE_LABELS: &str = "Title|제목|Subject|Header";

/// Every labeled line that is not part of the post body.
static NON_CONTENT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    field_line_regex(&format!(
        "User|Name|{TITLE_LABELS}|Date|Stats|Participants|Photo|Media"
    ))
});

static CONTENT_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*Content[ \t]*:[ \t]*").expect("valid regex"));

/// `[Quote RT of Display Name @handle]body[/Quote RT]`, tolerating spaces
/// before the closing bracket and a missing handle.
static QUOTE_RT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[Quote RT of[ \t]+([^\]\n]+?)(?:[ \t]+(@+[\w.]+))?\s*\]((?s:.*?))\[/Quote RT\]",
    )
    .expect("valid regex")
});

static HANDLE_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@+[\w.]+$").expect("valid regex"));

static QUOTE_RT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[Quote RT of.*?\[/Quote RT\]").expect("valid regex"));

/// Media lines inside a quoted post: `Media:`/`Photo:` fields or bare tags.
static QUOTE_MEDIA_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:(?:Media|Photo)[ \t]*:[ \t]*(.+?)|(\[(?:Image|Video|Photo|미디어)\].*?))[ \t\r]*(?:\n|\z)",
    )
    .expect("valid regex")
});

static MEDIA_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[(Image|Video)\]").expect("valid regex"));

static LEADING_MEDIA_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\[(Image|Video|Photo|미디어)\][ \t]*(.*)$").expect("valid regex")
});

/// Parse the inner text of one `[POST]` block.
///
/// Never fails: absent fields get their defaults.
pub fn parse_post(block: &str) -> Post {
    let quoted_post = parse_quoted_post(block);
    let replies = parse_section(block, Section::Replies);
    let quotes: Vec<QuoteItem> = parse_section(block, Section::Quotes)
        .into_iter()
        .map(QuoteItem::from)
        .collect();

    // Post-level fields must not pick up lines from inside sub-blocks.
    let head = strip_sub_blocks(block);

    let username = first_field(&head, &USER_RE)
        .map(|raw| normalize_username(&raw))
        .unwrap_or_default();
    let display_name = first_field(&head, &NAME_RE)
        .map(|raw| sanitize_display_name(&raw))
        .unwrap_or_default();

    let conversation_context = first_field(&head, &PARTICIPANTS_RE).and_then(|raw| {
        let others = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        ConversationContext::from_roster(&username, others)
    });

    let media = MEDIA_RE
        .captures_iter(&head)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|line| !line.is_empty())
        .flat_map(split_media_line)
        .collect();

    let stats = parse_stats(&first_field(&head, &STATS_RE).unwrap_or_default());

    Post {
        username,
        display_name,
        title: first_field(&head, &TITLE_RE),
        date: first_field(&head, &DATE_RE),
        content: clean_body(&head),
        media,
        stats,
        replies,
        quotes,
        quoted_post,
        conversation_context,
        ..Default::default()
    }
}

fn strip_sub_blocks(block: &str) -> String {
    let text = Section::Replies.block_regex().replace_all(block, "");
    let text = Section::Quotes.block_regex().replace_all(&text, "");
    QUOTE_RT_BLOCK_RE.replace_all(&text, "").into_owned()
}

/// The post body: everything that is not a recognized field, with a leading
/// `Content:` label removed.
fn clean_body(head: &str) -> String {
    let body = NON_CONTENT_LINE_RE.replace_all(head, "");
    let body = CONTENT_LABEL_RE.replace_all(&body, "");
    tidy_body(&body)
}

pub fn parse_quoted_post(block: &str) -> Option<QuotedPost> {
    let caps = QUOTE_RT_RE.captures(block)?;
    let name = caps.get(1).map_or("", |m| m.as_str()).trim();
    let (display_name, username) = match caps.get(2) {
        Some(handle) => (name.to_string(), normalize_username(handle.as_str())),
        // `[Quote RT of @handle]`: the only word is the handle
        None if HANDLE_ONLY_RE.is_match(name) => (String::new(), normalize_username(name)),
        None => (name.to_string(), String::new()),
    };
    let body = caps.get(3).map_or("", |m| m.as_str()).trim();

    let media = QUOTE_MEDIA_LINE_RE
        .captures_iter(body)
        .filter_map(|line| line.get(1).or_else(|| line.get(2)))
        .map(|m| parse_media_item(m.as_str()))
        .collect();
    let content = tidy_body(&QUOTE_MEDIA_LINE_RE.replace_all(body, ""));

    Some(QuotedPost {
        display_name,
        username,
        content,
        media,
    })
}

/// Split one `Media:` value into entries.
///
/// When the line carries more than one `[Image]`/`[Video]` tag, each tag and
/// the text up to the next tag becomes its own entry. Otherwise the whole line
/// is one entry.
pub fn split_media_line(line: &str) -> Vec<MediaItem> {
    let tags: Vec<_> = MEDIA_TAG_RE.captures_iter(line).collect();
    if tags.len() <= 1 {
        return vec![parse_media_item(line)];
    }

    tags.iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let (tag, kind) = (caps.get(0)?, caps.get(1)?);
            let end = tags
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(line.len(), |next| next.start());
            Some(MediaItem::new(
                media_kind(kind.as_str()),
                line[tag.end()..end].trim(),
            ))
        })
        .collect()
}

/// Parse a single media descriptor. Untagged text is an image description.
pub fn parse_media_item(line: &str) -> MediaItem {
    let line = line.trim();
    match LEADING_MEDIA_TAG_RE.captures(line) {
        Some(caps) => MediaItem::new(media_kind(&caps[1]), caps[2].trim()),
        None => MediaItem::image(line),
    }
}

fn media_kind(tag: &str) -> MediaKind {
    if tag.eq_ignore_ascii_case("video") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationKind, ReplyDepth, Stats};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_basic_fields() {
        let post = parse_post(
            "\nUser: @news\nName: Reporter\nDate: 2h ago\nContent: Breaking!\nStats: 10K 5R 2Q\n",
        );
        assert_eq!(post.username, "@news");
        assert_eq!(post.display_name, "Reporter");
        assert_eq!(post.date.as_deref(), Some("2h ago"));
        assert_eq!(post.title, None);
        assert_eq!(post.content, "Breaking!");
        assert_eq!(post.stats.likes, "10K");
        assert_eq!(post.stats.shares, "5R");
        assert_eq!(post.stats.secondary_shares, "2Q");
    }

    #[test]
    fn test_absent_fields_default() {
        let post = parse_post("just some words");
        assert_eq!(post.username, "");
        assert_eq!(post.display_name, "");
        assert_eq!(post.content, "just some words");
        assert_eq!(post.stats, Stats::default());
        assert!(post.media.is_empty());
        assert!(post.quoted_post.is_none());
        assert!(post.conversation_context.is_none());
    }

    #[rstest]
    #[case("Title: Exam tips")]
    #[case("Subject: Exam tips")]
    #[case("Header: Exam tips")]
    #[case("제목: Exam tips")]
    fn test_title_aliases(#[case] line: &str) {
        let post = parse_post(&format!("{line}\nContent: body"));
        assert_eq!(post.title.as_deref(), Some("Exam tips"));
        assert_eq!(post.content, "body");
    }

    #[test]
    fn test_placeholder_display_name_is_dropped() {
        let post = parse_post("User: someone\nName: Name\nContent: x");
        assert_eq!(post.display_name, "");
        assert_eq!(post.username, "someone");
    }

    #[test]
    fn test_media_line_with_several_tags_is_split() {
        let post = parse_post("Content: x\nMedia: [Image] first [Image] second");
        let media: Vec<String> = post.media.iter().map(ToString::to_string).collect();
        assert_eq!(media, vec!["[Image] first", "[Image] second"]);
    }

    #[test]
    fn test_media_lines_are_collected_in_order() {
        let post = parse_post("Photo: sunset\nContent: x\nMedia: [Video] clip [Image]");
        assert_eq!(
            post.media,
            vec![
                MediaItem::image("sunset"),
                MediaItem::video("clip"),
                MediaItem::image(""),
            ]
        );
    }

    #[test]
    fn test_single_tag_line_keeps_whole_description() {
        assert_eq!(
            split_media_line("[Video] dog [jumping] over fence"),
            vec![MediaItem::video("dog [jumping] over fence")]
        );
    }

    #[test]
    fn test_quoted_post() {
        let block = "User: @me\nContent: so true\n[Quote RT of Old News @@oldnews ]\nYesterday's story\nMedia: [Image] archive shot\n[Video] b-roll\n[/Quote RT]\nStats: 1";
        let post = parse_post(block);
        let quoted = post.quoted_post.unwrap();
        assert_eq!(quoted.display_name, "Old News");
        assert_eq!(quoted.username, "@oldnews");
        assert_eq!(quoted.content, "Yesterday's story");
        assert_eq!(
            quoted.media,
            vec![MediaItem::image("archive shot"), MediaItem::video("b-roll")]
        );
        assert_eq!(post.content, "so true");
        assert!(post.media.is_empty(), "quoted media must stay in the quote");
    }

    #[test]
    fn test_quoted_post_without_handle() {
        let quoted = parse_quoted_post("[Quote RT of Somebody]\nhello\n[/Quote RT]").unwrap();
        assert_eq!(quoted.display_name, "Somebody");
        assert_eq!(quoted.username, "");
        assert_eq!(quoted.content, "hello");
    }

    #[rstest]
    #[case("[Quote RT of @oldnews]", "", "@oldnews")]
    #[case("[Quote RT of @@oldnews ]", "", "@oldnews")]
    #[case("[Quote RT of Old News @oldnews]", "Old News", "@oldnews")]
    fn test_quoted_post_header(
        #[case] header: &str,
        #[case] display_name: &str,
        #[case] username: &str,
    ) {
        let quoted = parse_quoted_post(&format!("{header}\nhello\n[/Quote RT]")).unwrap();
        assert_eq!(quoted.display_name, display_name);
        assert_eq!(quoted.username, username);
        assert_eq!(quoted.content, "hello");
    }

    #[test]
    fn test_participants_build_conversation_context() {
        let post = parse_post("User: me\nParticipants: Mom\nContent: dinner?");
        let ctx = post.conversation_context.unwrap();
        assert_eq!(ctx.kind, ConversationKind::Direct);
        assert_eq!(ctx.participants, vec!["me", "Mom"]);

        let post = parse_post("User: me\nParticipants: Mom, Dad , Sis\nContent: dinner?");
        let ctx = post.conversation_context.unwrap();
        assert_eq!(ctx.kind, ConversationKind::Group);
        assert_eq!(ctx.participants, vec!["me", "Mom", "Dad", "Sis"]);
    }

    #[test]
    fn test_sub_block_fields_do_not_leak_into_post() {
        let block = "Content: top\n[REPLIES]\nUser: @fan\nName: Fan\nContent: reply body\n[/REPLIES]\nUser: @author";
        let post = parse_post(block);
        assert_eq!(post.username, "@author");
        assert_eq!(post.display_name, "");
        assert_eq!(post.content, "top");
        assert_eq!(post.replies.len(), 1);
        assert_eq!(post.replies[0].content, "reply body");
    }

    #[test]
    fn test_replies_and_quotes() {
        let block = "User: @a\nContent: hi\n[REPLIES]\nB @b: one [1m]\n└ C @c: two\n[/REPLIES]\n[QUOTES]\nD @d: quoted\n[/QUOTES]";
        let post = parse_post(block);
        assert_eq!(post.replies.len(), 2);
        assert_eq!(post.replies[1].depth, ReplyDepth::Sub);
        assert_eq!(post.reply_count(), 2);
        assert_eq!(
            post.quotes,
            vec![QuoteItem {
                username: "@d".into(),
                display_name: "D".into(),
                content: "quoted".into(),
            }]
        );
    }

    #[test]
    fn test_multiline_content_is_kept() {
        let post = parse_post("User: @a\nContent: line one\nline two\n\nline four\nStats: 3");
        assert_eq!(post.content, "line one\nline two\n\nline four");
    }

    #[test]
    fn test_each_post_gets_a_fresh_id() {
        assert_ne!(parse_post("Content: a").id, parse_post("Content: a").id);
    }
}
