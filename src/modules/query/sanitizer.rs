//! Free-text query normalization.
//!
//! Over-length input is rejected rather than truncated, and no word cap is
//! applied: the query reaches the upstream as the user typed it, minus
//! characters the discovery API chokes on.

use crate::domain::SearchError;

pub const MAX_QUERY_LENGTH: usize = 500;

/// Accented Latin letters kept even where the alphanumeric test would not
/// already cover them.
const ACCENTED: &str = "äëïöüáéíóúàèìòùâêîôûãñõ";
const ALLOWED_PUNCTUATION: &str = "-'@./+";

#[derive(Debug, Clone)]
pub struct QuerySanitizer {
    max_length: usize,
}

impl Default for QuerySanitizer {
    fn default() -> Self {
        Self::new(MAX_QUERY_LENGTH)
    }
}

/// Piece of a query: free text to clean, or a quoted phrase kept verbatim.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Phrase(&'a str),
}

impl QuerySanitizer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn sanitize(&self, raw: &str) -> Result<String, SearchError> {
        if raw.chars().count() > self.max_length {
            return Err(SearchError::QueryTooLong {
                max: self.max_length,
            });
        }

        let decoded = decode_plus(raw);
        let decoded = decoded.trim().replace('+', " ");

        let cleaned: String = split_quoted(&decoded)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => clean_text(text),
                Segment::Phrase(phrase) => phrase.to_string(),
            })
            .collect();

        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() {
            tracing::debug!("Query '{}' is empty after sanitization", raw);
            return Err(SearchError::EmptyQuery);
        }

        Ok(collapsed)
    }
}

/// Form-style decoding: `+` is a space, `%XX` is a byte. Invalid UTF-8 is
/// replaced rather than rejected.
fn decode_plus(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || ALLOWED_PUNCTUATION.contains(c)
        || ACCENTED.contains(c)
}

fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect()
}

/// Split into text and `"..."` phrases, left to right. A phrase needs at
/// least one character between its quotes; unmatched quotes stay in the
/// text (and are later blanked as disallowed).
fn split_quoted(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(rel) = input[cursor..].find('"') {
        let open = cursor + rel;
        let Some(close_rel) = input[open + 1..].find('"') else {
            break;
        };
        let close = open + 1 + close_rel;

        if close == open + 1 {
            // `""` has nothing inside; the second quote may open a phrase.
            cursor = close;
            continue;
        }

        if open > text_start {
            segments.push(Segment::Text(&input[text_start..open]));
        }
        segments.push(Segment::Phrase(&input[open..=close]));
        text_start = close + 1;
        cursor = text_start;
    }

    if text_start < input.len() {
        segments.push(Segment::Text(&input[text_start..]));
    }
    segments
}
