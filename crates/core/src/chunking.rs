use crate::error::IngestError;
use crate::extractor::PageText;
use crate::models::Chunk;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than max chunk size {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// Char span a single page occupies in the concatenated document text.
struct PageSpan {
    number: u32,
    start: usize,
    end: usize,
}

/// Splits extracted pages into overlapping fixed-size chunks.
///
/// Pages are concatenated in order and a window of `max_chars` walks the
/// text, each window starting `overlap_chars` before the previous end so a
/// fact spanning a boundary survives intact in at least one chunk. Pure:
/// same pages and config always produce the same chunks.
pub fn split_pages(pages: &[PageText], config: ChunkingConfig) -> Result<Vec<Chunk>, IngestError> {
    config.validate()?;

    let mut text: Vec<char> = Vec::new();
    let mut spans: Vec<PageSpan> = Vec::new();

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        let start = text.len();
        text.extend(page.text.chars());
        spans.push(PageSpan {
            number: page.number,
            start,
            end: text.len(),
        });
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0u64;

    loop {
        let end = (start + config.max_chars).min(text.len());
        let piece: String = text[start..end].iter().collect();
        let (page_start, page_end) = page_range(&spans, start, end);

        chunks.push(Chunk {
            chunk_id: chunk_id(&piece, page_start, index),
            chunk_index: index,
            text: piece,
            page_start,
            page_end,
            char_start: start,
            char_end: end,
        });

        if end == text.len() {
            break;
        }
        start = end - config.overlap_chars;
        index += 1;
    }

    Ok(chunks)
}

fn page_range(spans: &[PageSpan], start: usize, end: usize) -> (u32, u32) {
    let mut first = None;
    let mut last = None;
    for span in spans {
        if span.start < end && span.end > start {
            if first.is_none() {
                first = Some(span.number);
            }
            last = Some(span.number);
        }
    }
    (first.unwrap_or(0), last.unwrap_or(0))
}

/// Content-and-position digest; the same text at the same place in the same
/// document always hashes to the same id.
pub fn chunk_id(text: &str, page_start: u32, index: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(page_start.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
