//! Plain-text rendering of a page for the terminal viewer.

use sns_reactions_engine::{MediaItem, Page, PageSet, Platform, PlatformPost, Post, Stats};

/// Media entries shown per post before the rest are summarized.
const MAX_MEDIA_SHOWN: usize = 4;

pub fn render_page_set(pages: &PageSet) -> Vec<String> {
    let Some(page) = pages.current_page() else {
        return vec!["No reactions yet. Use `append` to add a page.".to_string()];
    };
    let platform = pages.effective_platform();

    let mut lines = vec![format!(
        "{} · page {}/{}",
        platform.label(),
        pages.page_index() + 1,
        pages.len()
    )];
    if pages.is_collapsed() {
        lines.push(format!("({} posts hidden, press c to expand)", page.len()));
        return lines;
    }
    lines.push(String::new());
    lines.extend(render_page(page, platform));
    lines
}

pub fn render_page(page: &Page, platform: Platform) -> Vec<String> {
    let mut lines = Vec::new();
    for post in page {
        render_post(&mut lines, post, platform);
        lines.push(String::new());
    }
    lines
}

fn render_post(lines: &mut Vec<String>, post: &Post, platform: Platform) {
    let view = post.dialect(platform);
    let base = view.base();

    match view {
        PlatformPost::Twitter { display_name, .. }
        | PlatformPost::Instagram { display_name, .. } => {
            lines.push(author_line(display_name, base.username, base.date));
        }
        PlatformPost::Forum { title, .. } => {
            if let Some(title) = title {
                lines.push(format!("■ {title}"));
            }
            let author = if base.username.is_empty() {
                "익명"
            } else {
                base.username
            };
            lines.push(author_line("", author, base.date));
        }
        PlatformPost::VideoComment { video_context, .. } => {
            if let Some(video) = video_context {
                lines.push(format!(
                    "▶ {} · {} ({}) · {}",
                    video.video_title, video.channel_name, video.subscribers, video.duration
                ));
            }
            lines.push(author_line("", base.username, base.date));
        }
        PlatformPost::MessageThread {
            display_name,
            conversation_context,
            ..
        } => {
            if let Some(ctx) = conversation_context {
                lines.push(format!("to: {}", ctx.others().join(", ")));
            }
            lines.push(author_line(display_name, base.username, base.date));
        }
    }

    lines.extend(base.content.lines().map(|line| format!("  {line}")));
    lines.extend(media_lines(base.media, "  "));

    if let Some(quoted) = base.quoted_post {
        lines.push(format!(
            "  │ {}",
            [quoted.display_name.as_str(), quoted.username.as_str()]
                .join(" ")
                .trim()
        ));
        lines.extend(quoted.content.lines().map(|line| format!("  │ {line}")));
        lines.extend(media_lines(&quoted.media, "  │ "));
    }

    lines.push(format!("  {}", stats_summary(base.stats, post.reply_count(), platform)));

    for reply in base.replies {
        let indent = if reply.is_sub() { "      └ " } else { "    " };
        let time = reply
            .time
            .as_deref()
            .map(|t| format!(" · {t}"))
            .unwrap_or_default();
        lines.push(format!(
            "{indent}{}: {}{time}",
            reply_author(&reply.username, &reply.display_name),
            reply.content
        ));
    }
    for quote in base.quotes {
        lines.push(format!(
            "    ❝ {}: {}",
            reply_author(&quote.username, &quote.display_name),
            quote.content
        ));
    }
}

fn author_line(display_name: &str, username: &str, date: Option<&str>) -> String {
    let mut line = if display_name.is_empty() || display_name == username {
        username.to_string()
    } else {
        format!("{display_name} {username}")
    };
    if let Some(date) = date {
        line.push_str(&format!(" · {date}"));
    }
    line
}

fn reply_author<'a>(username: &'a str, display_name: &'a str) -> &'a str {
    if display_name.is_empty() {
        username
    } else {
        display_name
    }
}

fn media_lines(media: &[MediaItem], prefix: &str) -> Vec<String> {
    let mut lines: Vec<String> = media
        .iter()
        .take(MAX_MEDIA_SHOWN)
        .map(|item| format!("{prefix}{item}"))
        .collect();
    if media.len() > MAX_MEDIA_SHOWN {
        lines.push(format!("{prefix}+{} more", media.len() - MAX_MEDIA_SHOWN));
    }
    lines
}

/// One line of counters, hiding the ones at zero.
pub fn stats_summary(stats: &Stats, replies: usize, platform: Platform) -> String {
    let (share_label, secondary_label) = match platform {
        Platform::Everytime => ("scraps", "comments"),
        _ => ("reposts", "quotes"),
    };
    let mut parts = vec![format!("♥ {}", Stats::bare_count(&stats.likes))];
    for (token, label) in [
        (&stats.shares, share_label),
        (&stats.secondary_shares, secondary_label),
    ] {
        if !Stats::is_zero(token) {
            parts.push(format!("{} {label}", Stats::bare_count(token)));
        }
    }
    if replies > 0 {
        parts.push(format!("{replies} replies"));
    }
    parts.join(" · ")
}
