//! Top-level block extraction.
//!
//! Finds the optional `[VIDEO]...[/VIDEO]` block and every `[POST]...[/POST]`
//! block in generator output. Tags match case-insensitively and bodies are
//! non-greedy, so an unclosed tag simply yields no block.

use std::sync::LazyLock;

use regex::Regex;

static VIDEO_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[VIDEO\](.*?)\[/VIDEO\]").expect("valid regex"));

static POST_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\[POST\](.*?)\[/POST\]").expect("valid regex"));

/// Inner texts of the blocks found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedBlocks<'a> {
    /// Body of the first `[VIDEO]` block, if any.
    pub video: Option<&'a str>,
    /// Bodies of all `[POST]` blocks, in document order.
    pub posts: Vec<&'a str>,
}

pub fn extract(text: &str) -> ExtractedBlocks<'_> {
    ExtractedBlocks {
        video: video_block(text),
        posts: post_blocks(text),
    }
}

pub fn video_block(text: &str) -> Option<&str> {
    VIDEO_BLOCK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn post_blocks(text: &str) -> Vec<&str> {
    POST_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Keep only the markup portion of a generator response.
///
/// All `[VIDEO]` blocks come first, then all `[POST]` blocks, separated by blank
/// lines; surrounding prose is dropped. Text without any block is returned
/// unchanged.
pub fn extract_sns_content(text: &str) -> String {
    let blocks: Vec<&str> = VIDEO_BLOCK_RE
        .find_iter(text)
        .chain(POST_BLOCK_RE.find_iter(text))
        .map(|m| m.as_str())
        .collect();

    if blocks.is_empty() {
        return text.to_string();
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_all_post_blocks_in_order() {
        let text = "[POST]\na\n[/POST]\nnoise\n[post]\nb\n[/post]";
        assert_eq!(post_blocks(text), vec!["\na\n", "\nb\n"]);
    }

    #[test]
    fn test_only_first_video_block_is_used() {
        let text = "[VIDEO]one[/VIDEO][VIDEO]two[/VIDEO]";
        assert_eq!(video_block(text), Some("one"));
    }

    #[test]
    fn test_unclosed_tags_yield_nothing() {
        let blocks = extract("[POST]\nUser: @a\nContent: never closed");
        assert_eq!(blocks, ExtractedBlocks::default());
    }

    #[test]
    fn test_post_bodies_are_non_greedy() {
        let text = "[POST]a[/POST][POST]b[/POST]";
        assert_eq!(extract(text).posts.len(), 2);
    }

    #[test]
    fn test_extract_sns_content_drops_prose() {
        let text = "The crowd reacts.\n[POST]\nUser: @a\n[/POST]\nMeanwhile...\n[VIDEO]\nChannel: c\n[/VIDEO]";
        assert_eq!(
            extract_sns_content(text),
            "[VIDEO]\nChannel: c\n[/VIDEO]\n\n[POST]\nUser: @a\n[/POST]"
        );
    }

    #[test]
    fn test_extract_sns_content_falls_back_to_input() {
        assert_eq!(extract_sns_content("just prose"), "just prose");
    }
}
