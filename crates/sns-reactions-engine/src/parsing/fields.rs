//! Labeled-field helpers shared by the block parsers.
//!
//! A labeled field is a `Label: value` line. Labels match case-insensitively at
//! the start of a line (leading spaces allowed); the value is the rest of the
//! line, trimmed.

use regex::Regex;

/// Display names the generator emits when it has nothing better.
const PLACEHOLDER_NAMES: [&str; 3] = ["name", "user", "이름"];

/// Compile a regex matching a `Label: value` line for any of `labels`
/// (a regex alternation such as `"Title|Subject"`). Group 1 is the value.
pub(crate) fn field_regex(labels: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t]*(?:{labels})[ \t]*:[ \t]*(.*?)[ \t\r]*$"
    ))
    .expect("valid field regex")
}

/// Compile a regex matching whole `Label: ...` lines for any of `labels`,
/// including the line break, for stripping them from a body.
pub(crate) fn field_line_regex(labels: &str) -> Regex {
    Regex::new(&format!(r"(?im)^[ \t]*(?:{labels})[ \t]*:.*(?:\n|\z)"))
        .expect("valid field line regex")
}

/// First non-empty value of the field matched by `re`.
pub(crate) fn first_field(text: &str, re: &Regex) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Collapse any run of leading `@` to exactly one. Bare nicknames are kept.
pub fn normalize_username(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('@') {
        format!("@{}", raw.trim_start_matches('@'))
    } else {
        raw.to_string()
    }
}

/// Treat placeholder display names (`Name`, `User`, ...) as absent.
pub fn sanitize_display_name(raw: &str) -> String {
    let raw = raw.trim();
    if is_placeholder_name(raw) {
        String::new()
    } else {
        raw.to_string()
    }
}

pub fn is_placeholder_name(name: &str) -> bool {
    let name = name.trim();
    PLACEHOLDER_NAMES
        .iter()
        .any(|placeholder| placeholder.eq_ignore_ascii_case(name))
}

/// Trim a free-text body and collapse runs of blank lines left behind by
/// stripped fields into a single blank line.
pub(crate) fn tidy_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut blank_run = 0;
    for line in body.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("@@alice", "@alice")]
    #[case("@@@bob", "@bob")]
    #[case("@carol", "@carol")]
    #[case("dave", "dave")]
    #[case("  @@eve ", "@eve")]
    fn test_normalize_username(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_username(raw), expected);
    }

    #[rstest]
    #[case("Name", "")]
    #[case("NAME", "")]
    #[case("user", "")]
    #[case("이름", "")]
    #[case("Reporter", "Reporter")]
    fn test_sanitize_display_name(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_display_name(raw), expected);
    }

    #[test]
    fn test_field_regex_is_line_anchored() {
        let re = field_regex("User");
        assert_eq!(first_field("Username: x\nUser: @a", &re), Some("@a".into()));
        assert_eq!(first_field("  user :  @b  \r\n", &re), Some("@b".into()));
        assert_eq!(first_field("Content: User: x", &re), None);
    }

    #[test]
    fn test_first_field_skips_empty_values() {
        let re = field_regex("Date");
        assert_eq!(first_field("Date:\nDate: today", &re), Some("today".into()));
        assert_eq!(first_field("Date:   ", &re), None);
    }

    #[test]
    fn test_tidy_body_collapses_blank_runs() {
        assert_eq!(tidy_body("\n\na\n\n\n\nb\n\n"), "a\n\nb");
    }
}
