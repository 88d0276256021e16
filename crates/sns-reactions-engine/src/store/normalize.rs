//! Normalization of stored page data.
//!
//! Stored data comes in two historical shapes: a list of pages (`[[post]]`)
//! and, from before pagination existed, a single flat page (`[post]`).

use serde_json::Value;

use crate::models::{Page, Post};

/// Turn stored page data into a list of non-empty pages.
///
/// - a list whose first element is a list is taken as a list of pages
/// - any other non-empty list is one page
/// - anything else is no pages
///
/// Pages that are not lists or that end up empty are dropped, as are entries
/// that are not valid posts.
pub fn normalize(raw: &Value) -> Vec<Page> {
    normalize_with_raw_texts(raw, &[])
        .into_iter()
        .map(|(page, _)| page)
        .collect()
}

/// [`normalize`], keeping each page next to its raw text.
///
/// `raw_texts` runs parallel to the stored pages, so a page and its text are
/// dropped together. Texts that match neither the stored nor the kept page
/// count are discarded.
pub fn normalize_with_raw_texts(
    raw: &Value,
    raw_texts: &[Option<String>],
) -> Vec<(Page, Option<String>)> {
    let stored = stored_pages(raw);
    let aligned = raw_texts.len() == stored.len();

    let mut pages: Vec<(Page, Option<String>)> = stored
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            let text = raw_texts.get(index).filter(|_| aligned).cloned().flatten();
            (page, text)
        })
        .filter(|(page, _)| !page.is_empty())
        .collect();

    if !aligned && !raw_texts.is_empty() {
        if raw_texts.len() == pages.len() {
            // Texts written against already-filtered pages
            for ((_, text), raw_text) in pages.iter_mut().zip(raw_texts) {
                *text = raw_text.clone();
            }
        } else {
            log::warn!(
                "Stored raw texts ({}) out of step with pages ({}), rebuilding from posts",
                raw_texts.len(),
                pages.len()
            );
        }
    }
    pages
}

/// Every stored page in order, unreadable ones as empty pages.
fn stored_pages(raw: &Value) -> Vec<Page> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };

    let pages: Vec<&Value> = match items.first() {
        None => return Vec::new(),
        Some(Value::Array(_)) => items.iter().collect(),
        Some(_) => vec![raw],
    };

    pages
        .into_iter()
        .map(|page| match page {
            Value::Array(posts) => read_page(posts),
            _ => {
                log::warn!("Dropping stored page that is not a list");
                Page::new()
            }
        })
        .collect()
}

fn read_page(posts: &[Value]) -> Page {
    posts
        .iter()
        .filter_map(|value| match serde_json::from_value::<Post>(value.clone()) {
            Ok(post) => Some(post),
            Err(e) => {
                log::warn!("Dropping unreadable stored post: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn usernames(pages: &[Page]) -> Vec<Vec<&str>> {
        pages
            .iter()
            .map(|page| page.iter().map(|p| p.username.as_str()).collect())
            .collect()
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!({}))]
    #[case(json!("text"))]
    #[case(json!([]))]
    #[case(json!([[]]))]
    fn test_no_pages(#[case] raw: Value) {
        assert!(normalize(&raw).is_empty());
    }

    #[test]
    fn test_flat_list_is_one_page() {
        let raw = json!([{"username": "@a"}, {"username": "@b"}]);
        assert_eq!(usernames(&normalize(&raw)), vec![vec!["@a", "@b"]]);
    }

    #[test]
    fn test_empty_pages_are_filtered() {
        let raw = json!([[], [{"username": "@a"}], "junk", []]);
        assert_eq!(usernames(&normalize(&raw)), vec![vec!["@a"]]);
    }

    #[test]
    fn test_legacy_post_fields_are_read() {
        let raw = json!([[{
            "id": "post-1",
            "username": "@a",
            "content": "hi",
            "media": ["[Video] clip"],
            "stats": {"likes": "3", "retweets": "1R", "quotes": "0", "replies": 2},
            "quoteRt": {"displayName": "Q", "username": "@q", "content": "orig"}
        }]]);
        let pages = normalize(&raw);
        let post = &pages[0][0];
        assert_eq!(post.id.as_str(), "post-1");
        assert_eq!(post.media[0].description, "clip");
        assert_eq!(post.stats.shares, "1R");
        assert_eq!(post.stats.reply_count_hint, 2);
        assert_eq!(post.quoted_post.as_ref().map(|q| q.content.as_str()), Some("orig"));
    }

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_raw_texts_are_dropped_with_their_pages() {
        let raw = json!([[], [{"username": "@a"}], "junk", [{"username": "@b"}]]);
        let texts = [text("ghost"), text("a text"), text("junk text"), text("b text")];
        let pages = normalize_with_raw_texts(&raw, &texts);
        let kept: Vec<(&str, Option<&str>)> = pages
            .iter()
            .map(|(page, text)| (page[0].username.as_str(), text.as_deref()))
            .collect();
        assert_eq!(kept, vec![("@a", Some("a text")), ("@b", Some("b text"))]);
    }

    #[test]
    fn test_raw_texts_matching_kept_pages() {
        let raw = json!([[], [{"username": "@a"}]]);
        let pages = normalize_with_raw_texts(&raw, &[text("a text")]);
        assert_eq!(pages[0].1.as_deref(), Some("a text"));
    }

    #[test]
    fn test_raw_texts_out_of_step_are_discarded() {
        let raw = json!([[{"username": "@a"}], [{"username": "@b"}]]);
        let pages = normalize_with_raw_texts(&raw, &[text("x"), text("y"), text("z")]);
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|(_, text)| text.is_none()));
    }

    #[test]
    fn test_unreadable_posts_are_dropped() {
        let raw = json!([[42, {"username": "@ok"}], [7]]);
        assert_eq!(usernames(&normalize(&raw)), vec![vec!["@ok"]]);
    }
}
