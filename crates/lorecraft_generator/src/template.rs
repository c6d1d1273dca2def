//! Prompt template rendering.
//!
//! Stage prompts are static templates with `{{placeholder}}` markers. A
//! typed parameter record feeds substitution, so a renamed placeholder or a
//! forgotten value fails the render instead of silently shipping a prompt
//! with a literal `{{instruction}}` in it.

use lorecraft_core::LoreEntry;
use lorecraft_error::{GenerationError, GenerationErrorKind, LorecraftResult};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Built-in prompt template text.
pub mod templates {
    /// Shared preamble prepended to every stage prompt.
    pub const PREAMBLE: &str = include_str!("../templates/preamble.txt");
    /// Theme decomposition prompt.
    pub const DECOMPOSER: &str = include_str!("../templates/decomposer.txt");
    /// Stage one: world foundation entries.
    pub const FOUNDATION: &str = include_str!("../templates/foundation.txt");
    /// Stage two: plot outline entries.
    pub const PLOT_OUTLINE: &str = include_str!("../templates/plot_outline.txt");
    /// Stage three: detail entries.
    pub const DETAIL: &str = include_str!("../templates/detail.txt");
    /// Stage four: mechanics entries.
    pub const MECHANICS: &str = include_str!("../templates/mechanics.txt");
    /// Companion character card prompt.
    pub const CHARACTER: &str = include_str!("../templates/character.txt");
}

fn placeholder_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\{\{([a-z0-9_]+)\}\}").unwrap())
}

/// Typed parameters for template rendering.
///
/// # Examples
///
/// ```
/// use lorecraft_generator::{PromptTemplate, TemplateParams};
///
/// let template = PromptTemplate::new("Build {{book_name}} around: {{instruction}}");
/// let params = TemplateParams::new()
///     .book_name("Shattered Realms")
///     .instruction("floating islands");
/// let prompt = template.render(&params).unwrap();
/// assert!(prompt.contains("Shattered Realms"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    values: BTreeMap<&'static str, String>,
}

impl TemplateParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Set the `{{book_name}}` placeholder.
    pub fn book_name(self, value: impl Into<String>) -> Self {
        self.set("book_name", value)
    }

    /// Set the `{{core_theme}}` placeholder.
    pub fn core_theme(self, value: impl Into<String>) -> Self {
        self.set("core_theme", value)
    }

    /// Set the `{{instruction}}` placeholder.
    pub fn instruction(self, value: impl Into<String>) -> Self {
        self.set("instruction", value)
    }

    /// Set the `{{options}}` placeholder. Defaults to "none" when unset by
    /// [`TemplateParams::with_defaults`].
    pub fn options(self, value: impl Into<String>) -> Self {
        self.set("options", value)
    }

    /// Set the `{{user_prompt}}` placeholder.
    pub fn user_prompt(self, value: impl Into<String>) -> Self {
        self.set("user_prompt", value)
    }

    /// Set the `{{world_book_entries}}` placeholder from current entries,
    /// pretty-printed so the model sees the same shape it must produce.
    pub fn entries(self, entries: &[LoreEntry]) -> Self {
        let rendered = serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string());
        self.set("world_book_entries", rendered)
    }

    /// Set the per-stage count placeholders for the decomposer prompt.
    pub fn stage_counts(self, foundation: u32, plot_outline: u32, detail: u32, mechanics: u32) -> Self {
        self.set("foundation_count", foundation.to_string())
            .set("plot_outline_count", plot_outline.to_string())
            .set("detail_count", detail.to_string())
            .set("mechanics_count", mechanics.to_string())
    }

    /// Fill common placeholders that have sensible defaults.
    pub fn with_defaults(mut self) -> Self {
        self.values.entry("options").or_insert_with(|| "none".to_string());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}

/// A prompt template with `{{placeholder}}` markers.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Create a template from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Create a stage template with the shared preamble prepended.
    pub fn with_preamble(text: &str) -> Self {
        Self {
            text: format!("{}\n\n{}", templates::PREAMBLE, text),
        }
    }

    /// Render the template against the given parameters.
    ///
    /// # Errors
    ///
    /// Returns a `TemplateError` naming the first placeholder with no
    /// matching parameter.
    pub fn render(&self, params: &TemplateParams) -> LorecraftResult<String> {
        let mut missing: Option<String> = None;

        let rendered = placeholder_regex().replace_all(&self.text, |caps: &regex::Captures| {
            let name = &caps[1];
            match params.get(name) {
                Some(value) => value.to_string(),
                None => {
                    if missing.is_none() {
                        missing = Some(name.to_string());
                    }
                    String::new()
                }
            }
        });

        if let Some(name) = missing {
            return Err(GenerationError::new(GenerationErrorKind::TemplateError(format!(
                "No value for placeholder '{{{{{}}}}}'",
                name
            )))
            .into());
        }

        Ok(rendered.into_owned())
    }
}
