use serde_json::Value;

use crate::error::{ParserError, Result};
use crate::text::truncate_chars;

/// Extract the JSON object from a model response.
///
/// Tried in order:
/// 1. the contents of a fenced code block, with or without a language tag
/// 2. the whole response
/// 3. the first balanced `{...}` substring
///
/// # Examples
/// ```
/// use ussg_parser::interpret::extract_json_from_response;
///
/// let value = extract_json_from_response("Here:\n```json\n{\"k\": 1}\n```").unwrap();
/// assert_eq!(value["k"], 1);
/// ```
pub fn extract_json_from_response(response: &str) -> Result<Value> {
    let trimmed = response.trim();

    for block in extract_fenced_blocks(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            if value.is_object() {
                return Ok(value);
            }
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(candidate) = first_balanced_object(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    Err(ParserError::InterpretationParse(format!(
        "no JSON object in response: {}",
        truncate_chars(trimmed, 500)
    )))
}

/// Contents of every fenced code block, in order.
fn extract_fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find("```") {
        let after_fence = &remaining[start + 3..];
        // Skip optional language identifier on the same line
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            blocks.push(&content[..end]);
            remaining = &content[end + 3..];
        } else {
            break;
        }
    }

    blocks
}

/// First `{...}` substring with balanced braces. Braces inside string
/// literals do not count.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}
