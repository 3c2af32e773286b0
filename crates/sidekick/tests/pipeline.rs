//! End-to-end pipeline tests against the scripted backend.

use std::sync::{Arc, Mutex};

use sidekick::assist::Assistant;
use sidekick::config::Config;
use sidekick_core::engine::{EngineSession, InferenceError, ScriptedBackend, SessionState};
use sidekick_core::models::{
    CompletionResult, DocumentSnapshot, Position, RenderSink, SearchResult,
};
use sidekick_core::platform::default_profile;
use sidekick_core::retrieve::{self, RetrievalLimits};
use sidekick_core::{complete, scheduler::Delivery};

/// Sink that records everything it is asked to render.
#[derive(Default)]
struct CapturingSink {
    completions: Mutex<Vec<(u64, Result<String, String>)>>,
    narrations: Mutex<Vec<(u64, String)>>,
}

impl RenderSink for CapturingSink {
    fn render_completion(&self, result: &CompletionResult) {
        self.completions.lock().unwrap().push((
            result.generation,
            result
                .payload
                .as_ref()
                .map(|s| s.clone())
                .map_err(|e| e.to_string()),
        ));
    }

    fn render_search(&self, result: &SearchResult) {
        self.narrations
            .lock()
            .unwrap()
            .push((result.generation, result.text.clone()));
    }
}

fn ready_session(backend: Arc<ScriptedBackend>) -> EngineSession {
    EngineSession::ready(default_profile(), Box::new(backend))
}

fn assistant_with(
    backend: Arc<ScriptedBackend>,
    config: Config,
) -> Assistant<Arc<CapturingSink>> {
    Assistant::new(config, ready_session(backend), Arc::new(CapturingSink::default()))
}

#[tokio::test]
async fn test_edit_event_delivers_completion() {
    let backend = Arc::new(ScriptedBackend::echoing("vec![1, 2, 3];"));
    let sink = Arc::new(CapturingSink::default());
    let assistant = Assistant::new(
        Config::minimal(),
        ready_session(backend.clone()),
        sink.clone(),
    );

    let snapshot = DocumentSnapshot::from_text("fn main() {\n    let x = ");
    assistant
        .on_edit_event("main.rs", &snapshot, Position::new(1, 12))
        .await
        .unwrap();

    let completions = sink.completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].0, 1);
    assert_eq!(completions[0].1, Ok("vec![1, 2, 3];".to_string()));
    assert_eq!(backend.call_count(), 1);

    // The prompt carried the extracted window.
    let calls = backend.calls();
    let prompt = &calls[0].messages[0].content;
    assert!(prompt.contains("fn main() {"));
    assert!(prompt.contains("Current line:     let x = "));
}

#[tokio::test]
async fn test_completion_uses_configured_sampling() {
    let backend = Arc::new(ScriptedBackend::echoing("done"));
    let assistant = assistant_with(backend.clone(), Config::minimal());

    let snapshot = DocumentSnapshot::from_text("let y = ");
    assistant
        .on_edit_event("doc", &snapshot, Position::new(0, 8))
        .await
        .unwrap();

    let call = &backend.calls()[0];
    assert!((call.sampling.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(call.sampling.max_tokens, 50);
}

#[tokio::test]
async fn test_sequential_edits_both_deliver_in_admission_order() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        "first".to_string(),
        "second".to_string(),
    ]));
    let sink = Arc::new(CapturingSink::default());
    let assistant = Assistant::new(
        Config::minimal(),
        ready_session(backend.clone()),
        sink.clone(),
    );

    let snapshot = DocumentSnapshot::from_text("let a = ");
    for _ in 0..2 {
        assistant
            .on_edit_event("doc", &snapshot, Position::new(0, 8))
            .await
            .unwrap();
    }

    let completions = sink.completions.lock().unwrap();
    let generations: Vec<u64> = completions.iter().map(|(g, _)| *g).collect();
    assert_eq!(generations, vec![1, 2]);
}

#[tokio::test]
async fn test_superseded_request_never_reaches_sink() {
    let backend = Arc::new(ScriptedBackend::echoing("late"));
    let sink = Arc::new(CapturingSink::default());
    let assistant = Assistant::new(
        Config::minimal(),
        ready_session(backend.clone()),
        sink.clone(),
    );

    // A request admitted before the edit event stands in for an
    // in-flight call that finishes late.
    let old = assistant.scheduler().admit("doc");

    let snapshot = DocumentSnapshot::from_text("let b = ");
    assistant
        .on_edit_event("doc", &snapshot, Position::new(0, 8))
        .await
        .unwrap();

    // The late result compares stale and is dropped.
    assert!(assistant.scheduler().complete(&old, ()).is_stale());

    let completions = sink.completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].0, 2);
}

#[tokio::test]
async fn test_engine_failure_delivers_error_payload() {
    // Session never reached Ready: the backend must not be called and
    // the sink sees an error payload, not silence.
    let sink = Arc::new(CapturingSink::default());
    let assistant = Assistant::new(
        Config::minimal(),
        EngineSession::new(default_profile()),
        sink.clone(),
    );

    let snapshot = DocumentSnapshot::from_text("let c = ");
    assistant
        .on_edit_event("doc", &snapshot, Position::new(0, 8))
        .await
        .unwrap();

    let completions = sink.completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    let err = completions[0].1.as_ref().unwrap_err();
    assert!(err.contains("unavailable"), "got: {err}");
}

#[tokio::test]
async fn test_unready_session_short_circuits_before_backend() {
    let backend = Arc::new(ScriptedBackend::echoing("never"));
    let mut session = EngineSession::new(default_profile());
    session.mark_loading();
    assert_eq!(session.state(), &SessionState::Loading);

    let window = sidekick_core::models::ContextWindow {
        preceding_lines: vec![],
        following_lines: vec![],
        current_line_prefix: "x".to_string(),
    };
    let err = complete::complete(&session, &window, complete::completion_sampling())
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Unavailable(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_explain_uses_its_own_sampling_and_returns_verbatim() {
    let backend = Arc::new(ScriptedBackend::echoing(
        "This command creates a mirrored zpool.\nIt uses two disks.",
    ));
    let session = ready_session(backend.clone());

    let narration = complete::explain(
        &session,
        "zpool create tank mirror /dev/da0 /dev/da1",
        complete::explain_sampling(),
    )
    .await
    .unwrap();

    // Multi-line narration survives untrimmed (only outer whitespace goes).
    assert!(narration.contains('\n'));

    let call = &backend.calls()[0];
    assert!((call.sampling.temperature - 0.5).abs() < f32::EPSILON);
    assert_eq!(call.sampling.max_tokens, 200);
    assert!(call.messages[0].content.contains("Explain this code concisely"));
}

#[tokio::test]
async fn test_search_empty_corpus_still_issues_one_call() {
    let backend = Arc::new(ScriptedBackend::echoing("Nothing relevant found."));
    let session = ready_session(backend.clone());

    let narration = retrieve::search(
        &session,
        "find config parser",
        &[],
        &RetrievalLimits::default(),
        retrieve::search_sampling(),
    )
    .await
    .unwrap();

    assert_eq!(narration, "Nothing relevant found.");
    assert_eq!(backend.call_count(), 1);
    let prompt = &backend.calls()[0].messages[0].content;
    assert!(prompt.contains("\"find config parser\""));
    assert!(!prompt.contains("File: "));
}

#[tokio::test]
async fn test_search_caps_corpus_at_twenty_of_twenty_five() {
    let backend = Arc::new(ScriptedBackend::echoing("see src/file0.rs"));
    let session = ready_session(backend.clone());

    let files: Vec<_> = (0..25)
        .map(|i| sidekick_core::models::SourceFile {
            path: format!("src/file{i}.rs"),
            content: format!("// contents of file {i}"),
        })
        .collect();

    retrieve::search(
        &session,
        "query",
        &files,
        &RetrievalLimits::default(),
        retrieve::search_sampling(),
    )
    .await
    .unwrap();

    let prompt = &backend.calls()[0].messages[0].content;
    assert!(prompt.contains("File: src/file0.rs"));
    assert!(prompt.contains("File: src/file19.rs"));
    assert!(!prompt.contains("File: src/file20.rs"));
}

#[tokio::test]
async fn test_scheduler_delivery_matches_state() {
    let backend = Arc::new(ScriptedBackend::echoing("x"));
    let assistant = assistant_with(backend, Config::minimal());

    let h1 = assistant.scheduler().admit("doc");
    let h2 = assistant.scheduler().admit("doc");
    assert!(matches!(
        assistant.scheduler().complete(&h2, "win"),
        Delivery::Delivered("win")
    ));
    assert!(assistant.scheduler().complete(&h1, "lose").is_stale());
}
