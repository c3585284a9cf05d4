//! Chunk packing for the report surface.
//!
//! Discord embeds cap both the size of a field and the number of fields,
//! while a scan can match any number of symbols. The packer fills fields
//! greedily in match order and, when the field budget runs out, appends a
//! "...and N more" note instead of silently dropping the tail.

use crate::types::DisplayChunk;

/// Separator between symbols inside one chunk.
pub const SEPARATOR: &str = ", ";

/// Pack `symbols` into at most `max_chunks` blocks of `prefix` followed by
/// comma-separated symbols, each no longer than `max_chars` characters.
///
/// The only block that may exceed `max_chars` is the last one when the
/// overflow note has to be appended to it. A single symbol too long for
/// any block is still placed, alone. Empty input yields no chunks.
pub fn pack(
    symbols: &[String],
    prefix: &str,
    max_chars: usize,
    max_chunks: usize,
) -> Vec<DisplayChunk> {
    let mut chunks: Vec<DisplayChunk> = Vec::new();
    if symbols.is_empty() || max_chunks == 0 {
        return chunks;
    }

    let prefix_len = prefix.chars().count();
    let sep_len = SEPARATOR.chars().count();

    let mut current: Vec<&str> = Vec::new();
    let mut current_len = prefix_len;
    let mut placed = 0usize;

    for sym in symbols {
        let sym_len = sym.chars().count();
        let added = if current.is_empty() { sym_len } else { sep_len + sym_len };

        if current.is_empty() || current_len + added <= max_chars {
            current.push(sym);
            current_len += added;
            continue;
        }

        placed += current.len();
        close_chunk(&mut chunks, prefix, &current);
        current.clear();

        if chunks.len() >= max_chunks {
            break;
        }

        current.push(sym);
        current_len = prefix_len + sym_len;
    }

    if !current.is_empty() && chunks.len() < max_chunks {
        placed += current.len();
        close_chunk(&mut chunks, prefix, &current);
    }

    let remaining = symbols.len() - placed;
    if remaining > 0 {
        let note = overflow_note(remaining);
        // Symbols are only left over after the loop filled every slot, so
        // in practice the note is always appended to the last chunk.
        if chunks.len() < max_chunks {
            chunks.push(DisplayChunk {
                index: chunks.len(),
                text: note,
            });
        } else if let Some(last) = chunks.last_mut() {
            last.text.push('\n');
            last.text.push_str(&note);
        }
    }

    chunks
}

/// Text appended when symbols did not fit.
pub fn overflow_note(remaining: usize) -> String {
    format!("...and {remaining} more")
}

fn close_chunk(chunks: &mut Vec<DisplayChunk>, prefix: &str, symbols: &[&str]) {
    chunks.push(DisplayChunk {
        index: chunks.len(),
        text: format!("{prefix}{}", symbols.join(SEPARATOR)),
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
