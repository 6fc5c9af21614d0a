//! Recursive character splitter with overlap.
//!
//! Text is first cut into contiguous pieces, trying paragraph, line, sentence,
//! and word boundaries in that order and falling back to fixed character
//! windows. Pieces are then packed greedily into chunks, each chunk starting
//! with the tail of the previous one. A sentence that does not fit the space
//! left in a chunk is packed word by word. All lengths are measured in `char`s.
//!
//! Pieces cover the input without gaps, so stripping each chunk's carried
//! overlap and concatenating the rest yields the source text byte for byte.

use super::error::DocumentError;
use super::types::{Chunk, Document};

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns `DocumentError::Split` if the chunk size is zero or the overlap
    /// does not leave room for new content.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.chunk_size == 0 {
            return Err(DocumentError::Split("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocumentError::Split(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
}

const BOUNDARIES: [Boundary; 4] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Word,
];

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a document into overlapping chunks that inherit its metadata.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Split` if the configuration is invalid.
    pub fn split(&self, document: &Document) -> Result<Vec<Chunk>, DocumentError> {
        self.config.validate()?;

        Ok(self
            .split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(i, (content, overlap))| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
                overlap,
            })
            .collect())
    }

    /// Returns `(chunk text, overlap length in chars)` pairs.
    fn split_text(&self, text: &str) -> Vec<(String, usize)> {
        if text.is_empty() {
            return Vec::new();
        }

        let chunk_size = self.config.chunk_size;
        let max_piece = chunk_size - self.config.chunk_overlap;

        let mut pieces = Vec::new();
        split_recursive(text, &BOUNDARIES, max_piece, None, &mut pieces);

        let mut packer = Packer::new(chunk_size, self.config.chunk_overlap);
        for piece in pieces {
            // Sentences are refined to words rather than leaving the rest of
            // the chunk empty.
            if piece.cut == Some(Boundary::Sentence) && !packer.fits(piece.text) {
                for word in piece.text.split_inclusive(char::is_whitespace) {
                    packer.push(word);
                }
            } else {
                packer.push(piece.text);
            }
        }
        packer.finish()
    }
}

/// A contiguous slice of the input and the boundary it was cut at.
#[derive(Debug, Clone, Copy)]
struct Piece<'a> {
    text: &'a str,
    cut: Option<Boundary>,
}

/// Greedy chunk builder; each new chunk starts with the tail of the last one.
struct Packer {
    chunk_size: usize,
    overlap: usize,
    chunks: Vec<(String, usize)>,
    current: String,
    current_len: usize,
    carried: usize,
}

impl Packer {
    fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
            carried: 0,
        }
    }

    fn fits(&self, piece: &str) -> bool {
        self.current_len + char_len(piece) <= self.chunk_size
    }

    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);
        if self.current_len > self.carried && self.current_len + piece_len > self.chunk_size {
            let tail = overlap_tail(&self.current, self.overlap).to_owned();
            let tail_len = char_len(&tail);
            self.chunks
                .push((std::mem::replace(&mut self.current, tail), self.carried));
            self.carried = tail_len;
            self.current_len = tail_len;
        }
        self.current.push_str(piece);
        self.current_len += piece_len;
    }

    fn finish(mut self) -> Vec<(String, usize)> {
        if self.current_len > self.carried {
            self.chunks.push((self.current, self.carried));
        }
        self.chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `overlap` chars of `chunk`, moved forward to a word start when the
/// cut would otherwise land inside a word.
fn overlap_tail(chunk: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let total = char_len(chunk);
    if total <= overlap {
        return chunk;
    }
    let Some((start, _)) = chunk.char_indices().nth(total - overlap) else {
        return "";
    };

    let preceded_by_space = chunk[..start]
        .chars()
        .next_back()
        .is_some_and(char::is_whitespace);
    if preceded_by_space {
        return &chunk[start..];
    }

    let tail = &chunk[start..];
    match tail.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((ws, c)) if ws + c.len_utf8() < tail.len() => &tail[ws + c.len_utf8()..],
        _ => tail,
    }
}

/// Cut `text` into contiguous pieces of at most `max` chars.
fn split_recursive<'a>(
    text: &'a str,
    boundaries: &[Boundary],
    max: usize,
    cut: Option<Boundary>,
    out: &mut Vec<Piece<'a>>,
) {
    if char_len(text) <= max {
        if !text.is_empty() {
            out.push(Piece { text, cut });
        }
        return;
    }

    let Some((&boundary, rest)) = boundaries.split_first() else {
        split_chars(text, max, out);
        return;
    };

    let parts = split_at_boundary(text, boundary);
    if parts.len() <= 1 {
        split_recursive(text, rest, max, cut, out);
        return;
    }

    for part in parts {
        split_recursive(part, rest, max, Some(boundary), out);
    }
}

fn split_chars<'a>(text: &'a str, max: usize, out: &mut Vec<Piece<'a>>) {
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max {
            out.push(Piece {
                text: &text[start..idx],
                cut: None,
            });
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(Piece {
            text: &text[start..],
            cut: None,
        });
    }
}

/// Split keeping each separator attached to the piece before it.
fn split_at_boundary(text: &str, boundary: Boundary) -> Vec<&str> {
    match boundary {
        Boundary::Paragraph => text.split_inclusive("\n\n").collect(),
        Boundary::Line => text.split_inclusive('\n').collect(),
        Boundary::Word => text.split_inclusive(char::is_whitespace).collect(),
        Boundary::Sentence => split_sentences(text),
    }
}

/// Sentence ends are `.`, `!` or `?` followed by whitespace; the whitespace
/// stays with the sentence it ends.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, c)) = iter.next() {
        if prev_terminal && c.is_whitespace() {
            let end = idx + c.len_utf8();
            let next_is_space = iter.peek().is_some_and(|(_, n)| n.is_whitespace());
            if !next_is_space {
                parts.push(&text[start..end]);
                start = end;
                prev_terminal = false;
                continue;
            }
        }
        prev_terminal = matches!(c, '.' | '!' | '?') || (prev_terminal && c.is_whitespace());
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}
