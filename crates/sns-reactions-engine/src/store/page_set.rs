use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::StoreError;
use super::normalize::normalize_with_raw_texts;
use crate::models::{Page, Platform};
use crate::parsing::{self, ParseError, extract_sns_content};
use crate::serializing::serialize;

/// How a generation result is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Add a new page after the last one and select it.
    #[default]
    Append,
    /// Overwrite the current page.
    Replace,
}

/// Text to show when editing a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawText<'a> {
    /// The generator's own markup, as stored.
    Stored(&'a str),
    /// No stored markup; rebuild it from the structured page.
    Reconstruct(&'a Page),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct PageEntry {
    posts: Page,
    raw_text: Option<String>,
}

impl PageEntry {
    fn new(posts: Page, raw_text: Option<String>) -> Self {
        Self {
            posts,
            raw_text: raw_text.filter(|text| !text.trim().is_empty()),
        }
    }
}

/// All pages generated for one message, plus view state.
///
/// Each page owns its raw text, so pages and raw texts cannot get out of step.
/// They are only written as two parallel arrays in the persisted shape:
/// `{pages, rawTexts, pageIndex, collapsed, platform}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "StoredPageSet")]
pub struct PageSet {
    entries: Vec<PageEntry>,
    page_index: usize,
    collapsed: bool,
    platform: Option<Platform>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.entries.iter().map(|entry| &entry.posts)
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.entries.get(index).map(|entry| &entry.posts)
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.page(self.page_index)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn toggle_collapsed(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.collapsed
    }

    /// Platform the pages were last generated for, if recorded.
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Platform used to write markup for this set.
    pub fn effective_platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }

    /// Add a page at the end and select it. Empty pages are not stored.
    pub fn append(&mut self, page: Page, raw_text: Option<String>) {
        if page.is_empty() {
            log::warn!("Ignoring append of an empty page");
            return;
        }
        self.entries.push(PageEntry::new(page, raw_text));
        self.page_index = self.entries.len() - 1;
    }

    /// Overwrite the page at `index`, clamped into range. With no pages yet
    /// this appends. Replacing with an empty page removes the page.
    pub fn replace(&mut self, index: usize, page: Page, raw_text: Option<String>) {
        if self.entries.is_empty() {
            self.append(page, raw_text);
            return;
        }
        let index = index.min(self.entries.len() - 1);
        if page.is_empty() {
            self.remove(index);
            return;
        }
        self.entries[index] = PageEntry::new(page, raw_text);
    }

    /// Remove the page at `index`, keeping the selection on a valid page.
    pub fn delete(&mut self, index: usize) -> Result<Page, StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::PageOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.remove(index))
    }

    fn remove(&mut self, index: usize) -> Page {
        let removed = self.entries.remove(index);
        if index < self.page_index {
            self.page_index -= 1;
        }
        self.page_index = self.page_index.min(self.entries.len().saturating_sub(1));
        removed.posts
    }

    pub fn select(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::PageOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.page_index = index;
        Ok(())
    }

    /// Move to the next page. Returns `false` when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.page_index + 1 < self.entries.len() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous page. Returns `false` when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page_index > 0 && !self.entries.is_empty() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn raw_text_for(&self, index: usize) -> Option<RawText<'_>> {
        let entry = self.entries.get(index)?;
        Some(match &entry.raw_text {
            Some(text) => RawText::Stored(text),
            None => RawText::Reconstruct(&entry.posts),
        })
    }

    /// Markup to put in front of the user when editing page `index`.
    pub fn editable_text(&self, index: usize) -> Option<String> {
        Some(match self.raw_text_for(index)? {
            RawText::Stored(text) => text.to_string(),
            RawText::Reconstruct(page) => serialize(page, self.effective_platform()),
        })
    }

    /// Replace the current page with the posts parsed from edited markup.
    ///
    /// Blank text removes the current page. Text that yields no post is
    /// rejected and leaves the set unchanged.
    pub fn save_edit(&mut self, text: &str) -> Result<(), StoreError> {
        let mut page = parsing::parse_edit(text)?;
        if let Some(platform) = self.platform {
            for post in &mut page {
                post.platform = Some(platform);
            }
        }
        self.replace(self.page_index, page, Some(text.to_string()));
        self.collapsed = false;
        Ok(())
    }

    /// Store the result of one generation run.
    ///
    /// Every post is tagged with `platform` and the current time, and only the
    /// markup part of `response` is kept as the page's raw text.
    pub fn apply_generation(
        &mut self,
        response: &str,
        platform: Platform,
        mode: GenerationMode,
    ) -> Result<usize, StoreError> {
        let mut page = parsing::parse(response);
        if page.is_empty() {
            return Err(ParseError::NothingParsed.into());
        }

        let now = Utc::now();
        for post in &mut page {
            post.tag(platform, now);
        }
        let count = page.len();
        let raw_text = Some(extract_sns_content(response));

        match mode {
            GenerationMode::Append => self.append(page, raw_text),
            GenerationMode::Replace => self.replace(self.page_index, page, raw_text),
        }
        self.platform = Some(platform);
        self.collapsed = false;
        Ok(count)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredPageSetRef<'a> {
    pages: Vec<&'a Page>,
    raw_texts: Vec<&'a str>,
    page_index: usize,
    collapsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<Platform>,
}

impl Serialize for PageSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StoredPageSetRef {
            pages: self.entries.iter().map(|entry| &entry.posts).collect(),
            raw_texts: self
                .entries
                .iter()
                .map(|entry| entry.raw_text.as_deref().unwrap_or_default())
                .collect(),
            page_index: self.page_index,
            collapsed: self.collapsed,
            platform: self.platform,
        }
        .serialize(serializer)
    }
}

/// Persisted shape as found in storage, read leniently.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredPageSet {
    pages: Value,
    raw_texts: Value,
    page_index: Value,
    collapsed: Value,
    platform: Option<Platform>,
}

impl From<StoredPageSet> for PageSet {
    fn from(stored: StoredPageSet) -> Self {
        let raw_texts: Vec<Option<String>> = match &stored.raw_texts {
            Value::Array(texts) => texts
                .iter()
                .map(|text| text.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let entries: Vec<PageEntry> = normalize_with_raw_texts(&stored.pages, &raw_texts)
            .into_iter()
            .map(|(posts, raw_text)| PageEntry::new(posts, raw_text))
            .collect();

        let requested = stored
            .page_index
            .as_i64()
            .or_else(|| stored.page_index.as_f64().map(|f| f as i64))
            .unwrap_or(0);
        let last = entries.len().saturating_sub(1) as i64;
        let page_index = requested.clamp(0, last) as usize;

        PageSet {
            entries,
            page_index,
            collapsed: stored.collapsed.as_bool().unwrap_or(false),
            platform: stored.platform,
        }
    }
}
