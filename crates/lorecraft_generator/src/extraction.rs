//! Utilities for extracting structured data from LLM responses.
//!
//! Model responses wrap JSON in markdown fences, prepend commentary, and
//! frequently emit raw newlines inside string values. This module locates
//! the JSON payload, heals the common newline defect, and parses it into
//! typed records.

use crate::sanitize::sanitize_entry;
use lorecraft_core::LoreEntry;
use lorecraft_error::{ExtractionError, ExtractionErrorKind, LorecraftResult};
use std::sync::OnceLock;

/// Extract JSON from a response that may contain markdown or extra text.
///
/// This function tries multiple extraction strategies:
/// 1. Markdown code blocks: ```json ... ```
/// 2. Balanced brackets: [ ... ]
/// 3. Balanced braces: { ... }
///
/// Arrays are preferred when both appear, since stage output is an entry
/// array and a stray object in the preamble should not win.
///
/// # Errors
///
/// Returns an error if no JSON region is found in the response.
///
/// # Examples
///
/// ```
/// use lorecraft_generator::extract_json;
///
/// let response = "Here's the data you requested:\n\
///     \n\
///     ```json\n\
///     [{\"keys\": [\"test\"]}]\n\
///     ```\n";
///
/// let json = extract_json(response).unwrap();
/// assert!(json.starts_with('['));
/// ```
pub fn extract_json(response: &str) -> LorecraftResult<String> {
    // Strategy 1: Extract from markdown code blocks
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    // Strategy 2: Balanced scan, preferring whichever delimiter appears first
    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => {
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
        }
        (Some(_), None) => {
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
        _ => {
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in LLM response"
    );

    Err(ExtractionError::new(ExtractionErrorKind::NoJsonFound).into())
}

/// Extract content from a labeled markdown code block (```language ... ```).
///
/// Only labeled fences are trusted: models also emit bare ``` fences around
/// commentary, and those must not preempt the balanced scan of the whole
/// response.
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    let start = response.find(&pattern)?;
    let content_start = start + pattern.len();
    if let Some(end) = response[content_start..].find("```") {
        let content = &response[content_start..content_start + end];
        return Some(content.trim().to_string());
    }
    // No closing fence, likely a truncated response
    Some(response[content_start..].trim().to_string())
}

/// Extract content between balanced delimiters.
///
/// Finds the first occurrence of `open` and extracts content up to the
/// matching `close`, handling nesting and skipping delimiters that appear
/// inside string literals.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

fn content_value_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r#""content"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap())
}

/// Escape raw newlines inside `content` string values.
///
/// Models frequently emit literal line breaks inside the long `content`
/// field, which makes the JSON unparseable. Only `content` values are
/// healed; other fields are short enough that the defect does not occur
/// there in practice.
///
/// # Examples
///
/// ```
/// use lorecraft_generator::heal_content_newlines;
///
/// let broken = "{\"content\": \"line one\nline two\"}";
/// let healed = heal_content_newlines(broken);
/// assert!(healed.contains("line one\\nline two"));
/// ```
pub fn heal_content_newlines(json: &str) -> String {
    content_value_regex()
        .replace_all(json, |caps: &regex::Captures| {
            let value = caps[1].replace('\n', "\\n").replace('\r', "\\r");
            format!("\"content\": \"{}\"", value)
        })
        .into_owned()
}

/// Parse a model response into sanitized lorebook entries.
///
/// Runs the full pipeline: extract the JSON region, heal `content`
/// newlines, parse, require an array, and sanitize every element into a
/// typed [`LoreEntry`].
///
/// # Errors
///
/// Returns an error if no JSON is found, the JSON fails to parse, or the
/// payload is not an array.
pub fn parse_entries(response: &str) -> LorecraftResult<Vec<LoreEntry>> {
    let extracted = extract_json(response)?;
    let healed = heal_content_newlines(&extracted);

    let value: serde_json::Value = serde_json::from_str(&healed)
        .map_err(|e| ExtractionError::new(ExtractionErrorKind::Parse(e.to_string())))?;

    let items = value.as_array().ok_or_else(|| {
        let got = match &value {
            serde_json::Value::Object(_) => "an object",
            serde_json::Value::String(_) => "a string",
            _ => "a non-array value",
        };
        ExtractionError::new(ExtractionErrorKind::NotAnArray(got.to_string()))
    })?;

    Ok(items.iter().map(sanitize_entry).collect())
}

/// Parse healed JSON into a specific type.
///
/// Used for decomposition plans and character cards, where the payload is
/// an object rather than an entry array.
///
/// # Errors
///
/// Returns an error if extraction fails or the JSON does not match `T`.
///
/// # Examples
///
/// ```
/// use lorecraft_generator::parse_json;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Plan {
///     steps: Vec<String>,
/// }
///
/// let response = r#"{"steps": ["one", "two"]}"#;
/// let plan: Plan = parse_json(response).unwrap();
/// assert_eq!(plan.steps.len(), 2);
/// ```
pub fn parse_json<T>(response: &str) -> LorecraftResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let extracted = extract_json(response)?;
    let healed = heal_content_newlines(&extracted);

    serde_json::from_str(&healed).map_err(|e| {
        let preview = healed.chars().take(100).collect::<String>();

        tracing::error!(
            error = %e,
            json_preview = %preview,
            "JSON parsing failed"
        );

        ExtractionError::new(ExtractionErrorKind::Parse(format!("{} (JSON: {}...)", e, preview)))
            .into()
    })
}
