use anyhow::{Context, Result};
use sns_reactions_config::Config;
use sns_reactions_engine::{
    FeedService, GenerationMode, JsonFileStore, Platform, parse, serialize, store::normalize,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read a command input; `-` is standard input.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Platform from `--platform`, else the configured default.
pub fn resolve_platform(flag: Option<Platform>, config: &Config) -> Platform {
    flag.unwrap_or(config.default_platform)
}

pub fn open_service(store: Option<PathBuf>, config: &Config) -> FeedService<JsonFileStore> {
    let path = store.unwrap_or_else(|| config.store_path.clone());
    log::info!("Using store {}", path.display());
    FeedService::new(JsonFileStore::new(path))
}

pub fn parse_command(input: &Path, platform: Option<Platform>) -> Result<String> {
    let mut page = parse(&read_input(input)?);
    if let Some(platform) = platform {
        for post in &mut page {
            post.platform = Some(platform);
        }
    }
    log::info!("Parsed {} post(s) from {}", page.len(), input.display());
    Ok(serde_json::to_string_pretty(&page)?)
}

/// Accepts a page, a list of pages, or a stored page set.
pub fn serialize_command(input: &Path, platform: Platform) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;
    let pages = match value.get("pages") {
        Some(pages) => normalize(pages),
        None => normalize(&value),
    };
    Ok(pages
        .iter()
        .map(|page| serialize(page, platform))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

pub fn append_command(
    service: &FeedService<JsonFileStore>,
    message_id: &str,
    input: &Path,
    platform: Platform,
    mode: GenerationMode,
    max_posts: usize,
) -> Result<String> {
    let response = read_input(input)?;
    let guard = service.begin_generation(message_id)?;
    let count = service.apply_generation(&guard, &response, platform, mode)?;
    if count > max_posts {
        log::warn!("Response held {count} posts, more than the configured max_posts ({max_posts})");
    }
    let pages = service.load(message_id)?;
    Ok(format!(
        "Stored {count} {} post(s) for message {message_id} (page {}/{})",
        platform.label(),
        pages.page_index() + 1,
        pages.len()
    ))
}

pub fn edit_command(
    service: &FeedService<JsonFileStore>,
    message_id: &str,
    input: &Path,
) -> Result<String> {
    let text = read_input(input)?;
    service.save_edit(message_id, &text)?;
    let pages = service.load(message_id)?;
    Ok(match pages.current_page() {
        Some(page) => format!(
            "Saved {} post(s) to page {} of message {message_id}",
            page.len(),
            pages.page_index() + 1
        ),
        None => format!("Removed the page; message {message_id} has no pages left"),
    })
}
