//! Fixed-window text chunking for retrieval pipelines.
//!
//! [`Chunker`] slides a window of `chunk_size` characters across the content,
//! stepping back `overlap` characters between windows so that context
//! survives the cut. Non-final windows are pulled back to the last whitespace
//! when that whitespace sits in the final 20 % of the window, so words are
//! rarely split. Fragments of 50 characters or fewer are dropped at the end.
//!
//! All lengths are counted in `char`s, never bytes; window boundaries are
//! therefore always valid UTF-8 boundaries.
//!
//! ```rust
//! use edgequake_ingest::Chunker;
//!
//! let chunker = Chunker::new(200, 50).unwrap();
//! let text = "x".repeat(600);
//! let chunks = chunker.chunks(&text);
//! assert_eq!(chunks.len(), 4);
//! ```

use crate::error::IngestError;
use std::ops::Range;

/// Default window length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive windows in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Chunks whose trimmed length is at or below this are discarded.
pub const MIN_CHUNK_CHARS: usize = 50;

/// A validated `(chunk_size, overlap)` pair.
///
/// Construction fails when the pair could not make forward progress, so every
/// `Chunker` value terminates on every input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Create a chunker, rejecting `chunk_size == 0` and `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkParams {
                chunk_size,
                overlap,
                reason: "chunk_size must be greater than zero",
            });
        }
        if overlap >= chunk_size {
            return Err(IngestError::InvalidChunkParams {
                chunk_size,
                overlap,
                reason: "overlap must be smaller than chunk_size",
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Source windows as byte ranges into `content`, before trimming and
    /// before the minimum-length filter.
    ///
    /// Consecutive windows never leave a gap: each window starts at or before
    /// the end of the previous one, the first starts at 0 and the furthest
    /// reaches `content.len()`.
    pub fn windows(&self, content: &str) -> Vec<Range<usize>> {
        // offsets[i] is the byte position of char i; offsets[total] == len.
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let total = offsets.len() - 1;

        if total <= self.chunk_size {
            return vec![0..content.len()];
        }

        let chars: Vec<char> = content.chars().collect();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < total {
            // The cursor advances from the nominal end even when the slice
            // is clipped to the content length.
            let mut end = start + self.chunk_size;

            if end < total {
                if let Some(space) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                    // space > 0.8 * chunk_size, and the cursor must still move.
                    if space * 5 > self.chunk_size * 4 && space > self.overlap {
                        end = start + space;
                    }
                }
            }

            windows.push(offsets[start]..offsets[end.min(total)]);
            start = end - self.overlap;
        }

        windows
    }

    /// Split `content` into trimmed chunks borrowing from it.
    pub fn chunk_refs<'a>(&self, content: &'a str) -> Vec<&'a str> {
        if content.chars().count() <= self.chunk_size {
            return vec![content];
        }

        let candidates: Vec<&str> = self
            .windows(content)
            .into_iter()
            .map(|w| content[w].trim())
            .filter(|c| !c.is_empty())
            .collect();

        candidates
            .into_iter()
            .filter(|c| c.chars().count() > MIN_CHUNK_CHARS)
            .collect()
    }

    /// Split `content` into owned, trimmed chunks.
    ///
    /// Content no longer than `chunk_size` comes back as a single, untrimmed
    /// element.
    pub fn chunks(&self, content: &str) -> Vec<String> {
        self.chunk_refs(content)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

/// One-shot helper: validate the parameters and chunk `content`.
pub fn chunk_text(
    content: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, IngestError> {
    Ok(Chunker::new(chunk_size, overlap)?.chunks(content))
}
