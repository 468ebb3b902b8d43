//! Canonical text cleaning applied to raw resume and job-posting text.
//!
//! The pass removes markup tags and URLs, strips every character outside
//! `[A-Za-z0-9@._-]` and whitespace, collapses whitespace runs and trims.
//! Two token classes survive verbatim even when they contain or touch
//! characters that would otherwise be stripped:
//!
//! - email-shaped substrings (`jane.doe@example.com`)
//! - experience-duration phrases (`2.5 years`, `2-5 yrs`, `10 Years`)
//!
//! Each occurrence is swapped for an indexed placeholder before stripping and
//! restored afterwards, so repeated identical tokens never collide. The
//! placeholders are delimited by a private-use character that is removed from
//! the input up front, so input text can never pose as a placeholder.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]*?>"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"https?://(?:[a-zA-Z0-9$-_@.&+!*\\(),]|%[0-9a-fA-F]{2})+"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"[\w.-]+@[\w.-]+"));

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b\d+(?:[.-]\d+)?(?:\s*-\s*\d+(?:\.\d+)?)?\s*(?:years?|yrs?)\b")
});

static STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[^a-zA-Z0-9@.\-_\s\x{E000}]"));

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s{2,}"));

/// Placeholder delimiter. Stripped from input like any other non-word symbol.
const MARK: char = '\u{E000}';

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\x{E000}([EN])(\d+)\x{E000}"));

fn compile(pattern: &str) -> Regex {
    // Patterns are literals covered by the tests below.
    Regex::new(pattern).expect("static normalizer pattern must compile")
}

/// Clean `raw` into canonical form. Pure and idempotent.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let text = raw.replace(MARK, " ");
    let text = TAG_RE.replace_all(&text, "");
    let text = URL_RE.replace_all(&text, "");

    let mut emails: Vec<String> = Vec::new();
    let text = EMAIL_RE.replace_all(&text, |caps: &Captures<'_>| {
        emails.push(caps[0].to_string());
        format!("{MARK}E{}{MARK}", emails.len() - 1)
    });

    let mut durations: Vec<String> = Vec::new();
    let text = DURATION_RE.replace_all(&text, |caps: &Captures<'_>| {
        durations.push(caps[0].to_string());
        format!("{MARK}N{}{MARK}", durations.len() - 1)
    });

    let text = STRIP_RE.replace_all(&text, " ");
    let text = SPACE_RUN_RE.replace_all(&text, " ");
    let text = text.trim();

    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let saved = if &caps[1] == "E" {
                &emails
            } else {
                &durations
            };
            caps[2]
                .parse::<usize>()
                .ok()
                .and_then(|idx| saved.get(idx))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Largest whole number of years named by a duration phrase in `text`.
///
/// For a range such as `2-5 yrs` the lower bound counts.
#[must_use]
pub fn years_mentioned(text: &str) -> Option<u32> {
    DURATION_RE
        .find_iter(text)
        .filter_map(|found| {
            let phrase = found.as_str();
            let end = phrase
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(phrase.len());
            phrase[..end].parse::<u32>().ok()
        })
        .max()
}
