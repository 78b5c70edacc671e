//! Prompt templates for summarization
//!
//! Templates carry `{__name__}` placeholders that are filled by [`substitute`].

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Template for the stuff strategy, also used for map and reduce by default
pub const STUFF_PROMPT: &str = r#"Write a concise summary of the following:


"{__text__}"


CONCISE SUMMARY:"#;

/// Template for folding one more chunk into an existing summary
pub const REFINE_PROMPT: &str = r#"Your job is to produce a final summary
We have provided an existing summary up to a certain point: "{__existing_answer__}"
We have the opportunity to refine the existing summary
(only if needed) with some more context below.
------------
"{__text__}"
------------

Given the new context, refine the original summary
If the context isn't useful, return the original summary.

REFINED SUMMARY:"#;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{__(\w+)__\}").expect("placeholder regex is valid"))
}

/// Replace every `{__name__}` whose name is in `variables`; unknown
/// placeholders are left as they are
pub fn substitute(template: &str, variables: &HashMap<&str, &str>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Prompt templates used by the summarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub stuff: String,
    pub map: String,
    pub reduce: String,
    pub refine: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            stuff: STUFF_PROMPT.to_string(),
            map: STUFF_PROMPT.to_string(),
            reduce: STUFF_PROMPT.to_string(),
            refine: REFINE_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in templates with optional overrides
    pub fn with_overrides(
        stuff: Option<String>,
        map: Option<String>,
        reduce: Option<String>,
        refine: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            stuff: stuff.unwrap_or(defaults.stuff),
            map: map.unwrap_or(defaults.map),
            reduce: reduce.unwrap_or(defaults.reduce),
            refine: refine.unwrap_or(defaults.refine),
        }
    }

    /// Prompt for summarizing a whole text (or the first refine chunk)
    pub fn stuff_prompt(&self, text: &str) -> String {
        substitute(&self.stuff, &HashMap::from([("text", text)]))
    }

    /// Prompt for chunk summarization
    pub fn map_prompt(&self, chunk: &str) -> String {
        substitute(&self.map, &HashMap::from([("text", chunk)]))
    }

    /// Prompt for reduce phase (combining summaries)
    pub fn reduce_prompt(&self, summaries: &str) -> String {
        substitute(&self.reduce, &HashMap::from([("text", summaries)]))
    }

    /// Prompt for folding `chunk` into `existing_answer`
    pub fn refine_prompt(&self, chunk: &str, existing_answer: &str) -> String {
        substitute(
            &self.refine,
            &HashMap::from([("text", chunk), ("existing_answer", existing_answer)]),
        )
    }
}
