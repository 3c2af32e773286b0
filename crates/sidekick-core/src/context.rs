//! Context window extraction.
//!
//! Given a document snapshot and a cursor position, produces the bounded
//! text window sent to the inference engine: up to `lines_before` lines
//! above the cursor, up to `lines_after` lines below it, and the text of
//! the cursor line up to the cursor column.
//!
//! Extraction is deterministic and side-effect-free. Out-of-range
//! positions are clamped to the document, never rejected: a cursor past
//! the last line behaves as if it were on the last line, and a column
//! past the end of the line takes the whole line as prefix.

use crate::models::{snap_to_char_boundary, ContextWindow, DocumentSnapshot, Position};

/// Line bounds for the extraction window.
#[derive(Debug, Clone, Copy)]
pub struct ContextBounds {
    /// Maximum lines included above the cursor line.
    pub lines_before: usize,
    /// Maximum lines included below the cursor line.
    pub lines_after: usize,
}

impl Default for ContextBounds {
    fn default() -> Self {
        Self {
            lines_before: 10,
            lines_after: 5,
        }
    }
}

/// Extract a bounded context window around the cursor.
///
/// Identical `(snapshot, cursor, bounds)` inputs produce byte-identical
/// windows. The window never references line indices outside
/// `[0, snapshot.line_count())`.
pub fn extract(
    snapshot: &DocumentSnapshot,
    cursor: Position,
    bounds: &ContextBounds,
) -> ContextWindow {
    let line_count = snapshot.line_count();
    debug_assert!(line_count > 0, "snapshots always hold at least one line");

    let cursor_line = cursor.line.min(line_count.saturating_sub(1));
    let start = cursor_line.saturating_sub(bounds.lines_before);
    let end = line_count.min(cursor_line + 1 + bounds.lines_after);

    let preceding_lines = snapshot.lines()[start..cursor_line].to_vec();
    let following_lines = snapshot.lines()[cursor_line + 1..end].to_vec();

    let current_line = snapshot.line(cursor_line).unwrap_or("");
    let column = snap_to_char_boundary(current_line, cursor.column.min(current_line.len()));
    let current_line_prefix = current_line[..column].to_string();

    ContextWindow {
        preceding_lines,
        following_lines,
        current_line_prefix,
    }
}
