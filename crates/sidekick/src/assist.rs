//! Host-facing pipeline surface.
//!
//! The [`Assistant`] exposes pure request-admission functions —
//! [`on_edit_event`](Assistant::on_edit_event),
//! [`on_explain_request`](Assistant::on_explain_request),
//! [`on_search_request`](Assistant::on_search_request) — and the host
//! environment wires its own event source to call them. No callback
//! registration state lives here; each call runs extract → admit →
//! one engine call → generation check → deliver.
//!
//! Explain and search flow through the same scheduler under reserved
//! channel ids, so a rapid re-invocation supersedes the previous one
//! exactly like a keystroke supersedes an older completion.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use sidekick_core::complete;
use sidekick_core::context;
use sidekick_core::engine::{EngineSession, InferenceError};
use sidekick_core::models::{
    CompletionResult, DocumentSnapshot, Position, RenderSink, SearchResult,
};
use sidekick_core::retrieve;
use sidekick_core::scheduler::{Delivery, RequestScheduler};

use crate::config::Config;
use crate::workspace::scan_workspace;

/// Scheduler channel for explain requests.
const EXPLAIN_CHANNEL: &str = "#explain";
/// Scheduler channel for search requests.
const SEARCH_CHANNEL: &str = "#search";

/// The assembled pipeline: configuration, engine session, scheduler,
/// and the renderer sink results are delivered to.
pub struct Assistant<S: RenderSink> {
    config: Config,
    session: EngineSession,
    scheduler: RequestScheduler,
    sink: S,
}

impl<S: RenderSink> Assistant<S> {
    pub fn new(config: Config, session: EngineSession, sink: S) -> Self {
        Self {
            config,
            session,
            scheduler: RequestScheduler::new(),
            sink,
        }
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    /// Handle one edit event: extract a context window, admit a
    /// completion request, and deliver the result unless a newer
    /// admission superseded it while the engine was thinking.
    pub async fn on_edit_event(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
        cursor: Position,
    ) -> Result<()> {
        let handle = self.scheduler.admit(document_id);
        debug!(
            document = document_id,
            generation = handle.generation,
            "admitted completion request"
        );

        let window = context::extract(snapshot, cursor, &self.config.context.bounds());
        let started = Instant::now();
        let payload = self
            .with_timeout(complete::complete(
                &self.session,
                &window,
                self.config.completion.sampling(),
            ))
            .await;

        if let Err(e) = &payload {
            warn!(document = document_id, error = %e, "completion failed");
        }

        let result = CompletionResult {
            document_id: document_id.to_string(),
            generation: handle.generation,
            payload,
            latency_ms: started.elapsed().as_millis() as u64,
        };

        match self.scheduler.complete(&handle, result) {
            Delivery::Delivered(result) => self.sink.render_completion(&result),
            Delivery::Stale => {
                debug!(
                    document = document_id,
                    generation = handle.generation,
                    "discarded stale completion"
                );
            }
        }
        Ok(())
    }

    /// Explain a code selection. Engine failures render as an inline
    /// error narration rather than propagating.
    pub async fn on_explain_request(&self, selection: &str) -> Result<()> {
        let handle = self.scheduler.admit(EXPLAIN_CHANNEL);
        let started = Instant::now();
        let narration = self
            .with_timeout(complete::explain(
                &self.session,
                selection,
                self.config.explain.sampling(),
            ))
            .await;
        self.deliver_narration(handle, narration, started);
        Ok(())
    }

    /// Search the workspace with a natural-language query.
    ///
    /// Enumerates the configured workspace, caps and truncates the
    /// corpus, and issues one engine call. An empty workspace still
    /// issues the call with zero excerpts.
    pub async fn on_search_request(&self, query: &str) -> Result<()> {
        let handle = self.scheduler.admit(SEARCH_CHANNEL);
        let files = scan_workspace(&self.config.workspace, self.config.retrieval.corpus_cap)?;
        debug!(
            files = files.len(),
            cap = self.config.retrieval.corpus_cap,
            "search corpus read"
        );

        let started = Instant::now();
        let narration = self
            .with_timeout(retrieve::search(
                &self.session,
                query,
                &files,
                &self.config.retrieval.limits(),
                self.config.retrieval.sampling(),
            ))
            .await;
        self.deliver_narration(handle, narration, started);
        Ok(())
    }

    fn deliver_narration(
        &self,
        handle: sidekick_core::scheduler::RequestHandle,
        narration: Result<String, InferenceError>,
        started: Instant,
    ) {
        let text = match narration {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "narration request failed");
                format!("Error: {}", e)
            }
        };
        let result = SearchResult {
            generation: handle.generation,
            text,
            latency_ms: started.elapsed().as_millis() as u64,
        };
        if let Delivery::Delivered(result) = self.scheduler.complete(&handle, result) {
            self.sink.render_search(&result);
        }
    }

    /// Wrap an engine call with the configured timeout; elapsing is
    /// treated identically to a collaborator failure.
    async fn with_timeout<F>(&self, fut: F) -> Result<String, InferenceError>
    where
        F: std::future::Future<Output = Result<String, InferenceError>>,
    {
        let limit = Duration::from_secs(self.config.engine.timeout_secs);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout),
        }
    }
}

/// Plain-text sink for the CLI.
pub struct ConsoleSink;

impl RenderSink for ConsoleSink {
    fn render_completion(&self, result: &CompletionResult) {
        match &result.payload {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("(no suggestion available: {})", e),
        }
    }

    fn render_search(&self, result: &SearchResult) {
        println!("{}", result.text);
    }
}

/// JSON-lines sink for machine consumption (`sk --json ...`).
pub struct JsonSink;

impl RenderSink for JsonSink {
    fn render_completion(&self, result: &CompletionResult) {
        let payload = match &result.payload {
            Ok(text) => serde_json::json!({ "suggestion": text }),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        println!(
            "{}",
            serde_json::json!({
                "document_id": result.document_id,
                "generation": result.generation,
                "latency_ms": result.latency_ms,
                "result": payload,
            })
        );
    }

    fn render_search(&self, result: &SearchResult) {
        match serde_json::to_string(result) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("(failed to encode result: {})", e),
        }
    }
}
