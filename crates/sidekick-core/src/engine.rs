//! Inference engine abstraction.
//!
//! The pipeline treats the inference engine as a black box behind the
//! [`ChatBackend`] trait: a stateless prompt-in, text-out call with
//! explicit sampling parameters. Concrete backends (a local
//! OpenAI-compatible HTTP endpoint, a scripted test backend) live in the
//! application crate or here in [`ScriptedBackend`]'s case.
//!
//! One-time engine setup — which model to load, the compute backend
//! hint, the worker thread count — is carried by [`EngineSession`], an
//! explicit lifecycle value owned by the caller and passed into the
//! completion and retrieval operations. There is no process-wide
//! "is a model loaded" flag.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::platform::PlatformProfile;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text returned by the engine for one call.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
}

/// Failure taxonomy for inference calls.
///
/// Stale results are not errors — they are a [`Delivery::Stale`]
/// value from the scheduler. These variants cover genuine collaborator
/// failures, which surface to the user as a non-fatal, retryable
/// message, never as a process-level fault.
///
/// [`Delivery::Stale`]: crate::scheduler::Delivery::Stale
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The engine is not loaded or the backend is unreachable.
    #[error("inference engine unavailable: {0}")]
    Unavailable(String),
    /// The caller-supplied timeout elapsed before the engine answered.
    #[error("inference call timed out")]
    Timeout,
    /// The engine answered with an error of its own.
    #[error("inference backend error: {0}")]
    Backend(String),
}

/// The inference collaborator: one chat completion per call.
///
/// Implementations must be stateless per call and `Send + Sync`; the
/// pipeline may hold several outstanding calls whose results it later
/// discards as stale.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue exactly one chat completion.
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError>;

    /// Identifier of the model answering calls (for display/logging).
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<B: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<B> {
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError> {
        (**self).chat_complete(messages, sampling).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Engine readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

/// Caller-owned engine lifecycle value.
///
/// Carries the resolved platform profile and the backend once loading
/// finished. [`EngineSession::chat`] refuses to call a backend that
/// never reached `Ready`, returning [`InferenceError::Unavailable`]
/// instead — the pipeline's "no suggestion" path, not a fault.
pub struct EngineSession {
    profile: PlatformProfile,
    state: SessionState,
    backend: Option<Box<dyn ChatBackend>>,
}

impl EngineSession {
    /// A fresh, unloaded session for the given profile.
    pub fn new(profile: PlatformProfile) -> Self {
        Self {
            profile,
            state: SessionState::Uninitialized,
            backend: None,
        }
    }

    /// Convenience constructor for a session that is immediately ready.
    pub fn ready(profile: PlatformProfile, backend: Box<dyn ChatBackend>) -> Self {
        Self {
            profile,
            state: SessionState::Ready,
            backend: Some(backend),
        }
    }

    pub fn mark_loading(&mut self) {
        self.state = SessionState::Loading;
    }

    pub fn mark_ready(&mut self, backend: Box<dyn ChatBackend>) {
        self.backend = Some(backend);
        self.state = SessionState::Ready;
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.backend = None;
        self.state = SessionState::Failed(reason.into());
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    /// Model identifier, once a backend is attached.
    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.model_name())
    }

    /// Issue one chat completion through the attached backend.
    ///
    /// Returns [`InferenceError::Unavailable`] without touching the
    /// backend unless the session is `Ready`.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError> {
        match (&self.state, &self.backend) {
            (SessionState::Ready, Some(backend)) => {
                backend.chat_complete(messages, sampling).await
            }
            (SessionState::Failed(reason), _) => {
                Err(InferenceError::Unavailable(reason.clone()))
            }
            _ => Err(InferenceError::Unavailable(
                "model not loaded; initialize the engine first".to_string(),
            )),
        }
    }
}

/// One call observed by [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub sampling: SamplingOptions,
}

/// Scripted in-memory backend for tests and offline demos.
///
/// Replies are dequeued in FIFO order; once the script runs dry every
/// call echoes a fixed fallback. All calls are recorded for inspection.
pub struct ScriptedBackend {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers every call with the same text.
    pub fn echoing(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            sampling,
        });

        let mut replies = self.replies.lock().unwrap();
        let text = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies
                .first()
                .cloned()
                .unwrap_or_else(|| "scripted reply".to_string())
        };
        Ok(ChatReply { text })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
