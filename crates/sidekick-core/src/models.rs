//! Core data models used throughout Sidekick.
//!
//! These types represent the document snapshots, context windows, file
//! excerpts, and results that flow through the completion and retrieval
//! pipeline.

use serde::Serialize;

use crate::engine::InferenceError;

/// A cursor position within a document: zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// An immutable snapshot of a document's text, split into lines.
///
/// The host editor supplies one snapshot per edit event; the pipeline
/// never mutates it, so identical snapshots always produce identical
/// context windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    lines: Vec<String>,
}

impl DocumentSnapshot {
    /// Build a snapshot from raw text. Splits on `\n`; an empty string
    /// yields a single empty line, matching how editors model an empty
    /// buffer.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Bounded slice of source text surrounding the cursor, used as model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    /// Lines strictly before the cursor line, in document order.
    pub preceding_lines: Vec<String>,
    /// Lines strictly after the cursor line, in document order.
    pub following_lines: Vec<String>,
    /// Text of the cursor line up to the cursor column.
    pub current_line_prefix: String,
}

/// A workspace file handed to the retrieval pipeline by the enumeration
/// collaborator, before truncation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// One corpus member after prefix truncation to the byte budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExcerpt {
    pub path: String,
    pub content: String,
}

/// A natural-language retrieval request over a capped corpus.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub corpus: Vec<FileExcerpt>,
}

/// Inference output for one completion attempt, tagged with the
/// generation it was admitted under.
///
/// A result whose generation is no longer current must be discarded by
/// the renderer, never displayed.
#[derive(Debug)]
pub struct CompletionResult {
    pub document_id: String,
    pub generation: u64,
    pub payload: Result<String, InferenceError>,
    pub latency_ms: u64,
}

/// Narration returned from a retrieval or explain request.
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub generation: u64,
    pub text: String,
    pub latency_ms: u64,
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
///
/// Used wherever a byte budget or byte column may land mid-character:
/// the result is always `<= index` and always a valid slice point.
pub(crate) fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Consumer contract for presentation.
///
/// The pipeline only hands over results whose generation was current at
/// delivery time; a sink that receives results through another channel
/// must itself discard any result tagged with a stale generation.
/// Error payloads are presentation decisions: "no suggestion available"
/// for completions, an inline error narration for search and explain.
pub trait RenderSink {
    fn render_completion(&self, result: &CompletionResult);
    fn render_search(&self, result: &SearchResult);
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn render_completion(&self, result: &CompletionResult) {
        (**self).render_completion(result)
    }

    fn render_search(&self, result: &SearchResult) {
        (**self).render_search(result)
    }
}

impl<S: RenderSink + ?Sized> RenderSink for std::sync::Arc<S> {
    fn render_completion(&self, result: &CompletionResult) {
        (**self).render_completion(result)
    }

    fn render_search(&self, result: &SearchResult) {
        (**self).render_search(result)
    }
}
