//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator present (`"\n\n"`, `"\n"`, `". "`,
//! `" "`, then single characters). Pieces that still exceed the budget are
//! split again with the next separator; small neighbouring pieces are
//! merged greedily up to `chunk_size`, carrying up to `chunk_overlap`
//! characters of trailing pieces into the next chunk. Separators stay
//! attached to the start of the following piece, so merging is plain
//! concatenation. All lengths are in characters.

use tracing::trace;

use crate::{
    errors::RagError,
    record::{PageText, TextChunk},
};

pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Clone, Debug)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// # Errors
    /// [`RagError::Config`] if `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "invalid splitter budget: chunk_size={chunk_size} chunk_overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Splits one text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Splits every page and numbers the chunks across the whole document.
    pub fn split_pages(&self, pages: &[PageText]) -> Vec<TextChunk> {
        let mut out = Vec::new();
        for page in pages {
            for text in self.split_text(&page.text) {
                out.push(TextChunk {
                    page: page.page_number,
                    chunk_index: out.len(),
                    text,
                });
            }
        }
        trace!(pages = pages.len(), chunks = out.len(), "pages split");
        out
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = "";
        let mut rest: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                break;
            }
            if text.contains(s.as_str()) {
                separator = s;
                rest = &separators[i + 1..];
                break;
            }
        }

        let mut out = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge(&fitting));
                fitting.clear();
            }
            if rest.is_empty() {
                if let Some(t) = trimmed(piece) {
                    out.push(t);
                }
            } else {
                out.extend(self.split_recursive(piece, rest));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(&fitting));
        }
        out
    }

    /// Greedy merge of pieces that each fit the budget.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(doc) = trimmed(&window.iter().copied().collect::<String>()) {
                    docs.push(doc);
                }
                // Keep a tail of at most `chunk_overlap` chars that still
                // leaves room for the incoming piece.
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }

        if let Some(doc) = trimmed(&window.iter().copied().collect::<String>()) {
            docs.push(doc);
        }
        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn trimmed(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Splits before every occurrence of `sep` (the separator starts the next
/// piece). An empty separator yields single characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    if sep.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(sep) {
        if idx > start {
            out.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out.into_iter().filter(|p| !p.is_empty()).collect()
}
