//! Retrieval-augmented search over a workspace corpus.
//!
//! The indexer does no relevance ranking of its own. It caps the corpus
//! at a configured number of files (in enumeration order — files beyond
//! the cap are excluded outright, never truncated-and-included), takes a
//! deterministic prefix excerpt of each retained file, assembles one
//! aggregate prompt embedding the query and all path-labelled excerpts,
//! and issues a single engine call. The engine's narration is returned
//! verbatim; the collaborator owns relevance judgment.
//!
//! An empty corpus still issues the call with zero excerpts, yielding a
//! "nothing found" style answer from the engine rather than a local
//! short-circuit. That is documented behavior, relied on by the CLI.

use crate::engine::{ChatMessage, EngineSession, InferenceError, SamplingOptions};
use crate::models::{snap_to_char_boundary, FileExcerpt, SearchQuery, SourceFile};

/// Corpus and excerpt bounds for one search.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalLimits {
    /// Maximum number of corpus files, taken in enumeration order.
    pub corpus_cap: usize,
    /// Byte budget per excerpt, taken from the start of the file.
    pub excerpt_budget: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            corpus_cap: 20,
            excerpt_budget: 500,
        }
    }
}

/// Default sampling for search narration.
pub fn search_sampling() -> SamplingOptions {
    SamplingOptions {
        temperature: 0.3,
        max_tokens: 300,
    }
}

/// Truncate one file to a prefix excerpt within the byte budget.
///
/// Deterministic: the same file and budget always produce the same
/// excerpt. The cut is snapped back to a UTF-8 char boundary, so the
/// excerpt is a pure prefix of the content and never exceeds the budget.
pub fn truncate_excerpt(file: &SourceFile, budget: usize) -> FileExcerpt {
    let cut = snap_to_char_boundary(&file.content, budget.min(file.content.len()));
    FileExcerpt {
        path: file.path.clone(),
        content: file.content[..cut].to_string(),
    }
}

/// Build a capped, truncated corpus from enumerated files.
///
/// Exactly the first `corpus_cap` files survive; the rest are silently
/// excluded (not an error — the enumeration collaborator decides order).
pub fn build_query(query: &str, files: &[SourceFile], limits: &RetrievalLimits) -> SearchQuery {
    let corpus = files
        .iter()
        .take(limits.corpus_cap)
        .map(|f| truncate_excerpt(f, limits.excerpt_budget))
        .collect();
    SearchQuery {
        text: query.to_string(),
        corpus,
    }
}

/// Render the aggregate search prompt: the query plus every excerpt
/// labelled with its file path.
pub fn build_search_prompt(query: &SearchQuery) -> String {
    let excerpts = query
        .corpus
        .iter()
        .map(|e| format!("File: {}\n{}", e.path, e.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Given this query: \"{query}\"\n\n\
         Find relevant code in this codebase:\n{excerpts}\n\n\
         List the most relevant files and why:",
        query = query.text,
    )
}

/// Run one retrieval-augmented search over an enumerated corpus.
///
/// Issues exactly one engine call and returns its narration verbatim.
pub async fn search(
    session: &EngineSession,
    query: &str,
    files: &[SourceFile],
    limits: &RetrievalLimits,
    sampling: SamplingOptions,
) -> Result<String, InferenceError> {
    let query = build_query(query, files, limits);
    let prompt = build_search_prompt(&query);
    let reply = session
        .chat(&[ChatMessage::user(prompt)], sampling)
        .await?;
    Ok(reply.text)
}
