//! Concrete inference backends.
//!
//! Defines the [`ChatBackend`] implementations the application wires
//! into an `EngineSession`:
//! - **[`DisabledBackend`]** — answers every call with
//!   [`InferenceError::Unavailable`]; used when no engine is configured.
//! - **[`HttpBackend`]** — calls a local OpenAI-compatible
//!   `POST /v1/chat/completions` endpoint (llama.cpp server, LM Studio,
//!   `mlc_llm serve`, …).
//!
//! Use [`create_backend`] to instantiate the right one from config.
//! Neither backend retries: a failed or timed-out call surfaces as an
//! error payload and the user retriggers if they want another attempt.

use std::time::Duration;

use async_trait::async_trait;

use sidekick_core::engine::{ChatBackend, ChatMessage, ChatReply, InferenceError, SamplingOptions};

use crate::config::EngineConfig;

/// A no-op backend that always reports the engine as unavailable.
///
/// Used when `engine.provider = "disabled"`; completions render as
/// "no suggestion available" instead of failing the process.
pub struct DisabledBackend;

#[async_trait]
impl ChatBackend for DisabledBackend {
    async fn chat_complete(
        &self,
        _messages: &[ChatMessage],
        _sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError> {
        Err(InferenceError::Unavailable(
            "engine provider is disabled".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

/// Backend for a local OpenAI-compatible chat-completions endpoint.
pub struct HttpBackend {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a backend from engine config and the model identifier the
    /// platform profile selected (config's `engine.model` overrides it).
    pub fn new(config: &EngineConfig, profile_model: &str) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| profile_model.to_string()),
            client,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingOptions,
    ) -> Result<ChatReply, InferenceError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
                .collect::<Vec<_>>(),
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::Unavailable(e.to_string())
                } else {
                    InferenceError::Backend(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Backend(format!(
                "engine returned {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        parse_chat_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<ChatReply, InferenceError> {
    let text = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| {
            InferenceError::Backend("invalid engine response: missing choices[0].message.content".to_string())
        })?;

    Ok(ChatReply {
        text: text.to_string(),
    })
}

/// Create the appropriate [`ChatBackend`] based on configuration.
///
/// | Config value | Backend |
/// |--------------|---------|
/// | `"disabled"` | [`DisabledBackend`] |
/// | `"http"`     | [`HttpBackend`] |
pub fn create_backend(
    config: &EngineConfig,
    profile_model: &str,
) -> Result<Box<dyn ChatBackend>, InferenceError> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledBackend)),
        "http" => Ok(Box::new(HttpBackend::new(config, profile_model)?)),
        other => Err(InferenceError::Unavailable(format!(
            "unknown engine provider: {}",
            other
        ))),
    }
}
