use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?,;:]+").expect("punctuation pattern compiles"));

/// Splits `text` into pieces of at most `max_chars` characters. Text that
/// already fits is returned untouched. Longer text is cut after punctuation
/// followed by whitespace, then at whitespace, and inside a word only when a
/// single word is longer than the limit. Chunks are slices of the input, so
/// decimals and abbreviations survive.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut rest = text.trim();
    let mut chunks = Vec::new();
    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = sentence_cut(rest, limit)
            .or_else(|| word_cut(rest, limit))
            .unwrap_or(limit);
        chunks.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    debug!("Split {} chars into {} chunks", text.chars().count(), chunks.len());
    chunks
}

/// Last punctuation run ending at or before `limit` that is followed by
/// whitespace or the end of the text.
fn sentence_cut(rest: &str, limit: usize) -> Option<usize> {
    PUNCTUATION
        .find_iter(rest)
        .map(|m| m.end())
        .take_while(|&end| end <= limit)
        .filter(|&end| rest[end..].chars().next().is_none_or(char::is_whitespace))
        .last()
}

fn word_cut(rest: &str, limit: usize) -> Option<usize> {
    if rest[limit..].starts_with(char::is_whitespace) {
        return Some(limit);
    }
    rest[..limit].rfind(char::is_whitespace).filter(|&i| i > 0)
}
