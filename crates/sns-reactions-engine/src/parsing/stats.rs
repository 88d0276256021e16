//! Stats fragment parsing (`Stats: 15.5K 300R 5Q`).
//!
//! The order of extraction matters: share counters are found first, removed,
//! and the likes counter is the first number left in the residual text.
//! Counts may carry thousands separators (`1,247`), kept as written.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Stats;

/// A count followed by a share unit: `R` (reposts), or the forum's `S` (scraps).
static SHARES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d(?:[.,]?\d)*[KkMm]?)\s*([RrSs])").expect("valid regex"));

/// A count followed by a secondary-share unit: `Q` (quotes), or the forum's `C` (comments).
static SECONDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d(?:[.,]?\d)*[KkMm]?)\s*([QqCc])").expect("valid regex"));

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d(?:[.,]?\d)*[KkMm]?").expect("valid regex"));

/// Parse a stats fragment. Missing counters default to `"0"`.
///
/// `reply_count_hint` is always zero here; the reply count comes from the
/// parsed replies.
pub fn parse_stats(fragment: &str) -> Stats {
    let shares = unit_token(&SHARES_RE, fragment);
    let secondary_shares = unit_token(&SECONDARY_RE, fragment);

    let residual = SHARES_RE.replace_all(fragment, "");
    let residual = SECONDARY_RE.replace_all(&residual, "");
    let likes = COUNT_RE
        .find(&residual)
        .map(|m| m.as_str().to_string());

    Stats {
        likes: likes.unwrap_or_else(|| "0".to_string()),
        shares: shares.unwrap_or_else(|| "0".to_string()),
        secondary_shares: secondary_shares.unwrap_or_else(|| "0".to_string()),
        reply_count_hint: 0,
    }
}

/// First `count + unit` token matched by `re`, with the unit upper-cased.
fn unit_token(re: &Regex, fragment: &str) -> Option<String> {
    re.captures(fragment)
        .map(|caps| format!("{}{}", &caps[1], caps[2].to_ascii_uppercase()))
}
