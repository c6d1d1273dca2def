//! Endpoint URL normalization for OpenAI-compatible APIs.
//!
//! Users paste base URLs in many shapes: with or without a trailing slash,
//! with or without the `/v1` segment, or a full completions URL. These
//! helpers normalize whatever was configured into concrete endpoint URLs.
//! Google's OpenAI-compatibility surface gets special treatment because its
//! paths do not follow the `/v1` convention.

/// Normalize a configured base URL into a chat completions endpoint.
///
/// # Examples
///
/// ```
/// use lorecraft_models::openai_compat::completions_url;
///
/// assert_eq!(
///     completions_url("https://api.example.com"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// assert_eq!(
///     completions_url("https://api.example.com/v1/"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// ```
pub fn completions_url(base: &str) -> String {
    let mut url = base.trim().to_string();
    if !url.ends_with('/') {
        url.push('/');
    }

    if url.contains("generativelanguage.googleapis.com") {
        if !url.ends_with("chat/completions/") && !url.ends_with("chat/completions") {
            url.push_str("chat/completions");
        } else if let Some(stripped) = url.strip_suffix('/') {
            url = stripped.to_string();
        }
    } else if url.ends_with("/v1/") {
        url.push_str("chat/completions");
    } else if !url.contains("/chat/completions") {
        url.push_str("v1/chat/completions");
    } else if let Some(stripped) = url.strip_suffix('/') {
        url = stripped.to_string();
    }

    url
}

/// Normalize a configured base URL into a model listing endpoint.
pub fn models_url(base: &str) -> String {
    let mut url = base.trim().to_string();
    if !url.ends_with('/') {
        url.push('/');
    }

    if url.contains("generativelanguage.googleapis.com") {
        if !url.ends_with("models/") && !url.ends_with("models") {
            url.push_str("models");
        } else if let Some(stripped) = url.strip_suffix('/') {
            url = stripped.to_string();
        }
    } else if url.ends_with("/v1/") {
        url.push_str("models");
    } else if !url.ends_with("models/") && !url.ends_with("models") {
        url.push_str("v1/models");
    } else if let Some(stripped) = url.strip_suffix('/') {
        url = stripped.to_string();
    }

    url
}
