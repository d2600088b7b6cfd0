//! Caption adjustment: hashtag capping and whole-word truncation

use super::PlatformAdjustment;
use crate::types::PlatformKind;

/// Produce the caption `platform` will accept.
///
/// Excess hashtags are dropped from the end first (the first N survive in
/// order), then the text is cut at the last whole word that fits the length
/// limit. No ellipsis is appended. Captions already within every limit are
/// returned unchanged, so the function is idempotent.
pub fn adjust_caption(caption: &str, platform: PlatformKind) -> String {
    let adjustment = PlatformAdjustment::for_platform(platform);

    let limited = match adjustment.max_hashtags {
        Some(max) => limit_hashtags(caption, max),
        None => caption.to_string(),
    };

    match adjustment.max_caption_length {
        Some(max_chars) => truncate_at_word(&limited, max_chars),
        None => limited,
    }
}

/// Hashtag tokens of `text`, in order of appearance
pub fn hashtags(text: &str) -> Vec<&str> {
    hashtag_spans(text)
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .collect()
}

/// Byte ranges of whitespace-delimited tokens that start with `#`
fn hashtag_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut token_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = token_start.take() {
                if is_hashtag(&text[start..idx]) {
                    spans.push((start, idx));
                }
            }
        } else if token_start.is_none() {
            token_start = Some(idx);
        }
    }

    if let Some(start) = token_start {
        if is_hashtag(&text[start..]) {
            spans.push((start, text.len()));
        }
    }

    spans
}

fn is_hashtag(token: &str) -> bool {
    token.starts_with('#') && token.len() > 1
}

/// Keep the first `max` hashtags, removing the rest together with the
/// whitespace that separated them from the preceding text.
fn limit_hashtags(text: &str, max: usize) -> String {
    let spans = hashtag_spans(text);
    if spans.len() <= max {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for &(start, end) in &spans[max..] {
        let opens_text = out.is_empty() && text[cursor..start].trim().is_empty();
        let (cut_start, cut_end) = if opens_text {
            // Nothing kept before it: eat the whitespace after it instead
            let rest = &text[end..];
            (cursor, end + (rest.len() - rest.trim_start().len()))
        } else {
            (text[..start].trim_end().len().max(cursor), end)
        };

        out.push_str(&text[cursor..cut_start]);
        cursor = cut_end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Cut `text` to at most `max_chars` characters at a word boundary.
///
/// A single word longer than the limit is hard-cut at the limit.
fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let head = &text[..cut];
    let kept = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) => &head[..idx],
            None => head,
        }
    };

    let trimmed = kept.trim_end();
    if trimmed.is_empty() {
        head.trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}
