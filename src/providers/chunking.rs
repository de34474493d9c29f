/*!
 * Chunking policies for vendor calls.
 *
 * A chunk never splits a line, and concatenating all chunks in order yields
 * the original line texts.
 */

use crate::captions::CaptionLine;

/// Fixed number of lines per chunk
pub fn chunk_by_lines(lines: &[CaptionLine], chunk_size: usize) -> Vec<Vec<String>> {
    let chunk_size = chunk_size.max(1);
    lines
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().map(|line| line.text.clone()).collect())
        .collect()
}

/// Greedily pack lines until the next one would push the chunk past `budget` characters.
///
/// A line longer than the budget gets a chunk of its own.
pub fn chunk_by_chars(lines: &[CaptionLine], budget: usize) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_len = 0;

    for line in lines {
        let line_len = line.text.chars().count();
        if !buffer.is_empty() && buffer_len + line_len > budget {
            chunks.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }
        buffer.push(line.text.clone());
        buffer_len += line_len;
    }
    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}
