//! Turns a completion candidate into an ordered list of college names.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Compiled-size budget per prompt byte; case-insensitive literals expand to classes.
const ECHO_SIZE_PER_BYTE: usize = 256;
const ECHO_BASE_SIZE_LIMIT: usize = 10 * (1 << 20);

fn separator_regex() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\n,-]+").expect("separator pattern is valid"))
}

/// Removes the first case-insensitive occurrence of `prompt` if the model echoed it.
pub fn strip_echoed_prompt<'a>(text: &'a str, prompt: &str) -> std::borrow::Cow<'a, str> {
    if prompt.is_empty() {
        return text.into();
    }
    let size_limit =
        ECHO_BASE_SIZE_LIMIT.saturating_add(prompt.len().saturating_mul(ECHO_SIZE_PER_BYTE));
    match RegexBuilder::new(&regex::escape(prompt))
        .case_insensitive(true)
        .size_limit(size_limit)
        .build()
    {
        Ok(echo) => echo.replace(text, ""),
        Err(e) => {
            warn!("Could not build echo pattern for a {}-byte prompt: {e}", prompt.len());
            text.into()
        }
    }
}

/// Splits on runs of newline, comma or hyphen, trims each piece, drops empties.
pub fn split_colleges(text: &str) -> Vec<String> {
    separator_regex()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Full parse of a candidate: trim, strip the echoed prompt, trim, split.
pub fn parse_recommendations(candidate: &str, prompt: &str) -> Vec<String> {
    let text = candidate.trim();
    let stripped = strip_echoed_prompt(text, prompt);
    split_colleges(stripped.trim())
}
