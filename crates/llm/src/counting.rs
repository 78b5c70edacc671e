//! Character, word and token counts for display

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Approximate: 1 token ≈ 4 characters
const CHARS_PER_TOKEN: usize = 4;

fn latin_word_regex() -> &'static Regex {
    static LATIN_WORD: OnceLock<Regex> = OnceLock::new();
    LATIN_WORD.get_or_init(|| Regex::new(r"[a-zA-Z]+").expect("word regex is valid"))
}

/// Input statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub tokens: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: count_characters(text),
            words: count_words(text),
            tokens: approximate_tokens(text),
        }
    }
}

pub fn count_characters(text: &str) -> usize {
    text.chars().count()
}

/// Count words: each CJK ideograph is a word, so is each run of Latin letters
pub fn count_words(text: &str) -> usize {
    let cjk = text
        .chars()
        .filter(|c| ('\u{4E00}'..='\u{9FFF}').contains(c))
        .count();
    cjk + latin_word_regex().find_iter(text).count()
}

pub fn approximate_tokens(text: &str) -> usize {
    count_characters(text).div_ceil(CHARS_PER_TOKEN)
}
