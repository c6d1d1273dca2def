//! Entry sanitization.
//!
//! Model output is untrusted: entries arrive with invented fields, scalar
//! keys, or numeric values where strings belong. Sanitization projects each
//! raw JSON object onto the typed [`LoreEntry`] record, dropping everything
//! outside the allowlist instead of failing the task.

use lorecraft_core::LoreEntry;
use serde_json::Value;

fn string_or_render(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn keys_from(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(string_or_render).collect(),
        // A scalar key becomes a one-element list
        other => string_or_render(other).map(|s| vec![s]).unwrap_or_default(),
    }
}

/// Project a raw JSON value onto a typed lorebook entry.
///
/// Recognized fields: `keys` (or `key`), `comment`, `content`, `type`,
/// `position`, `depth`, `prevent_recursion`, `order`, `uid`. Anything else
/// is dropped. This never fails; a non-object value produces an empty
/// entry.
///
/// # Examples
///
/// ```
/// use lorecraft_generator::sanitize_entry;
/// use serde_json::json;
///
/// let raw = json!({
///     "key": "Ironhold",
///     "content": "A fortress city.",
///     "mood": "broody"
/// });
/// let entry = sanitize_entry(&raw);
/// assert_eq!(entry.keys, vec!["Ironhold".to_string()]);
/// assert!(entry.content.is_some());
/// ```
pub fn sanitize_entry(raw: &Value) -> LoreEntry {
    let Some(map) = raw.as_object() else {
        return LoreEntry::default();
    };

    let keys = map
        .get("keys")
        .or_else(|| map.get("key"))
        .map(keys_from)
        .unwrap_or_default();

    LoreEntry {
        keys,
        comment: map.get("comment").and_then(string_or_render),
        content: map.get("content").and_then(string_or_render),
        entry_type: map.get("type").and_then(string_or_render),
        position: map.get("position").and_then(string_or_render),
        depth: map.get("depth").and_then(Value::as_u64).map(|d| d as u32),
        prevent_recursion: map.get("prevent_recursion").and_then(Value::as_bool),
        order: map.get("order").and_then(Value::as_i64),
        uid: map.get("uid").and_then(Value::as_i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_unknown_fields() {
        let raw = json!({
            "keys": ["magic"],
            "content": "Magic is real.",
            "importance": "high",
            "notes": {"internal": true}
        });
        let entry = sanitize_entry(&raw);
        assert_eq!(entry.keys, vec!["magic".to_string()]);
        assert_eq!(entry.content.as_deref(), Some("Magic is real."));
        // Round-trip shows nothing extra survived
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("importance").is_none());
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn scalar_key_becomes_vec() {
        let raw = json!({"key": "dragon"});
        let entry = sanitize_entry(&raw);
        assert_eq!(entry.keys, vec!["dragon".to_string()]);
    }

    #[test]
    fn numeric_key_is_stringified() {
        let raw = json!({"keys": [7, "seven"]});
        let entry = sanitize_entry(&raw);
        assert_eq!(entry.keys, vec!["7".to_string(), "seven".to_string()]);
    }

    #[test]
    fn full_allowlist_survives() {
        let raw = json!({
            "keys": ["a"],
            "comment": "title",
            "content": "body",
            "type": "constant",
            "position": "before_char",
            "depth": 4,
            "prevent_recursion": true,
            "order": 100,
            "uid": 12
        });
        let entry = sanitize_entry(&raw);
        assert_eq!(entry.comment.as_deref(), Some("title"));
        assert_eq!(entry.entry_type.as_deref(), Some("constant"));
        assert_eq!(entry.position.as_deref(), Some("before_char"));
        assert_eq!(entry.depth, Some(4));
        assert_eq!(entry.prevent_recursion, Some(true));
        assert_eq!(entry.order, Some(100));
        assert_eq!(entry.uid, Some(12));
    }

    #[test]
    fn non_object_yields_empty_entry() {
        let entry = sanitize_entry(&json!("just a string"));
        assert!(entry.keys.is_empty());
        assert!(entry.content.is_none());
    }
}
