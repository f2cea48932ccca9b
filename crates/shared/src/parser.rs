//! Best-effort extraction of a story list from model output.
//!
//! The model is asked for a bare JSON array but regularly wraps it in code
//! fences, adds commentary before or after it, leaves trailing commas, or
//! gets cut off mid-array. [`extract_stories`] walks a chain of increasingly
//! forgiving strategies and returns whatever it can recover. It never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

pub type Record = Map<String, Value>;

/// Flat object (no nested braces) that mentions a headline key
static SALVAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{[^{}]*"headline"[^{}]*\}"#).expect("valid salvage pattern"));
static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma pattern"));

/// Extract story records from raw model text.
///
/// Strategies, each tried only when the previous one produced nothing:
/// 1. the whole text (code fences stripped) as a JSON array
/// 2. the first `[` through its matching `]`
/// 3. that same slice with trailing commas removed
/// 4. every flat `{...}` containing `"headline"`, parsed one by one
pub fn extract_stories(text: &str) -> Vec<Record> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    if let Some(records) = parse_array(&cleaned) {
        return records;
    }

    if let Some(slice) = find_balanced_array(&cleaned) {
        if let Some(records) = parse_array(slice) {
            debug!("Recovered array by bracket matching");
            return records;
        }

        if let Some(records) = parse_array(&remove_trailing_commas(slice)) {
            debug!("Recovered array after removing trailing commas");
            return records;
        }
    }

    let salvaged = salvage_objects(&cleaned);
    if !salvaged.is_empty() {
        debug!(count = salvaged.len(), "Salvaged individual story objects");
    }
    salvaged
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse `text` as a JSON array, keeping only the object elements.
/// Returns `None` when the text is not an array or holds no objects, so a
/// stray `[3]` in the prose does not end the search.
fn parse_array(text: &str) -> Option<Vec<Record>> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return None;
    };

    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}

/// Slice from the first `[` to its matching `]`, ignoring brackets inside
/// string literals. `None` if there is no `[` or it is never closed.
fn find_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

fn remove_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_RE.replace_all(text, "$1").into_owned()
}

fn salvage_objects(text: &str) -> Vec<Record> {
    SALVAGE_RE
        .find_iter(text)
        .filter_map(|m| match serde_json::from_str::<Value>(m.as_str()) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect()
}
