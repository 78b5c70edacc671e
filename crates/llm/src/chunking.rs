use std::collections::VecDeque;
use tracing::warn;

/// Separators tried from coarsest to finest. The empty string splits into characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character text splitter
///
/// Lengths are counted in `char`s, so chunk boundaries never fall inside a
/// multi-byte character.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    /// Maximum chunk length (best effort)
    pub chunk_size: usize,

    /// Maximum length carried over from one chunk into the next
    pub chunk_overlap: usize,

    /// Separator hierarchy
    pub separators: Vec<String>,

    /// Keep each separator as the prefix of the piece that follows it
    pub keep_separator: bool,
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            keep_separator: true,
        }
    }
}

impl RecursiveTextSplitter {
    /// Create splitter with default separators
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    /// Replace the separator hierarchy
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether separators are kept
    pub fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    /// Split text into ordered, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, finer) = choose_separator(text, separators);
        let join_separator = if self.keep_separator { "" } else { separator };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_on_separator(text, separator, self.keep_separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(merge_splits(
                    &pending,
                    join_separator,
                    self.chunk_size,
                    self.chunk_overlap,
                ));
                pending.clear();
            }

            match finer {
                Some(finer) => chunks.extend(self.split_recursive(piece, finer)),
                // Nothing finer to try: emit oversized piece as is
                None if !piece.trim().is_empty() => chunks.push(piece.to_string()),
                None => {}
            }
        }

        if !pending.is_empty() {
            chunks.extend(merge_splits(
                &pending,
                join_separator,
                self.chunk_size,
                self.chunk_overlap,
            ));
        }

        chunks
    }
}

/// Split text into chunks
pub fn split_text<S: AsRef<str>>(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[S],
    keep_separator: bool,
) -> Vec<String> {
    RecursiveTextSplitter::new(chunk_size, chunk_overlap)
        .with_separators(separators.iter().map(|s| s.as_ref().to_string()))
        .with_keep_separator(keep_separator)
        .split_text(text)
}

/// Pick the first separator present in `text` along with the finer ones left
/// for recursion. `None` means there is nothing finer to fall back to.
fn choose_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, Option<&'a [String]>) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", None);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), Some(&separators[i + 1..]));
        }
    }

    (separators.last().map(String::as_str).unwrap_or(""), None)
}

/// Split on a separator, discarding empty pieces
fn split_on_separator<'t>(text: &'t str, separator: &str, keep_separator: bool) -> Vec<&'t str> {
    let pieces: Vec<&str> = if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else if keep_separator {
        // Every position where the separator starts opens a new piece,
        // overlapping occurrences included
        let mut pieces = Vec::new();
        let mut start = 0;
        for (i, _) in text.char_indices() {
            if i > start && text[i..].starts_with(separator) {
                pieces.push(&text[start..i]);
                start = i;
            }
        }
        pieces.push(&text[start..]);
        pieces
    } else {
        text.split(separator).collect()
    };

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Greedily merge small pieces into chunks of at most `chunk_size`,
/// carrying up to `chunk_overlap` worth of trailing pieces into the next chunk
pub fn merge_splits(
    splits: &[&str],
    separator: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut docs = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for &piece in splits {
        let len = char_len(piece);
        let joined_separator_len = if current.is_empty() { 0 } else { separator_len };

        if total + len + joined_separator_len > chunk_size {
            if total > chunk_size {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total, chunk_size
                );
            }

            if !current.is_empty() {
                if let Some(doc) = join_docs(&current, separator) {
                    docs.push(doc);
                }

                // Evict from the front until only the overlap is left
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(first) => total -= char_len(first),
                        None => break,
                    }
                }
            }
        }

        current.push_back(piece);
        total += len;
    }

    if let Some(doc) = join_docs(&current, separator) {
        docs.push(doc);
    }

    docs
}

/// Join pieces and trim; all-whitespace results are dropped
fn join_docs(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let mut joined = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            joined.push_str(separator);
        }
        joined.push_str(piece);
    }

    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_text() {
        let chunks = split_text("", 10, 2, &DEFAULT_SEPARATORS, true);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_without_separator() {
        let chunks = split_text("abc", 10, 2, &DEFAULT_SEPARATORS, true);
        assert_eq!(chunks, vec!["abc"]);
    }

    #[test]
    fn test_regression_vector() {
        for keep_separator in [true, false] {
            let chunks = split_text("A. B. C.", 4, 1, &[" ", ""], keep_separator);
            assert_eq!(chunks, vec!["A.", "B.", "C."], "keep_separator={}", keep_separator);
        }
    }

    #[test]
    fn test_overlap_dropping_separator() {
        let chunks = split_text("a b c d e f", 5, 2, &[" ", ""], false);
        assert_eq!(chunks, vec!["a b c d", "c d e f"]);
    }

    #[test]
    fn test_overlap_keeping_separator() {
        let chunks = split_text("a b c d e f", 5, 2, &[" ", ""], true);
        assert_eq!(chunks, vec!["a b c", "c d", "d e", "e f"]);

        for pair in chunks.windows(2) {
            let shared = pair[0].split(' ').last().unwrap();
            assert!(pair[1].starts_with(shared));
            assert!(shared.chars().count() <= 2);
        }
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunks = split_text("para one\n\npara two", 12, 0, &DEFAULT_SEPARATORS, true);
        assert_eq!(chunks, vec!["para one", "para two"]);
    }

    #[test]
    fn test_oversized_piece_emitted_verbatim() {
        let chunks = split_text("abcdefghij", 5, 0, &["\n"], true);
        assert_eq!(chunks, vec!["abcdefghij"]);
    }

    #[test]
    fn test_empty_finer_list_falls_back_to_characters() {
        let chunks = split_text("abcdefghij xy", 5, 0, &[" "], false);
        assert_eq!(chunks, vec!["abcde", "fghij", "xy"]);
    }

    #[test]
    fn test_no_empty_chunks() {
        let text = "   \n\n   \n\n  x  \n\n \n\n y";
        let chunks = split_text(text, 3, 1, &DEFAULT_SEPARATORS, true);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn test_reconstructs_content_without_overlap() {
        let text = "The quick brown fox jumps over the lazy dog.\n\n\
                    Pack my box with five dozen liquor jugs.\nHow vexingly quick daft zebras jump!\n\n\
                    Sphinx of black quartz, judge my vow.";
        for keep_separator in [true, false] {
            let chunks = split_text(text, 20, 0, &DEFAULT_SEPARATORS, keep_separator);
            assert!(chunks.len() > 1);
            assert_eq!(strip_whitespace(&chunks.concat()), strip_whitespace(text));
            if keep_separator {
                assert!(chunks.iter().all(|c| c.chars().count() <= 20));
            }
        }
    }

    #[test]
    fn test_multibyte_lengths_in_chars() {
        let text = "长文本摘要需要分块处理才能放进上下文窗口里面";
        let chunks = split_text(text, 5, 1, &DEFAULT_SEPARATORS, true);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert!(chunks.first().unwrap().starts_with('长'));
        assert!(chunks.last().unwrap().ends_with('面'));
    }

    #[test]
    fn test_deterministic() {
        let text = "one two three four five six seven eight nine ten";
        let splitter = RecursiveTextSplitter::new(12, 4);
        assert_eq!(splitter.split_text(text), splitter.split_text(text));
    }

    #[test]
    fn test_overlap_not_smaller_than_size_terminates() {
        let chunks = split_text("a b c d e f g", 3, 5, &[" ", ""], false);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_merge_splits_warns_but_keeps_oversized() {
        let docs = merge_splits(&["abcdefgh", "ij"], "", 4, 0);
        assert_eq!(docs, vec!["abcdefgh", "ij"]);
    }
}
