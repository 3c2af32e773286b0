//! Inline completion and code explanation.
//!
//! Formats a [`ContextWindow`] into the fixed completion prompt template
//! (context block + current-line block + single-line instruction) and
//! issues exactly one call to the engine with deterministic-leaning
//! sampling. No retries here — retry is the caller's policy.
//!
//! Failure semantics: a collaborator error propagates as
//! [`InferenceError`]; the caller records it as a completed request
//! carrying an error payload and the renderer shows "no suggestion
//! available". Nothing in this module is fatal.

use crate::engine::{ChatMessage, EngineSession, InferenceError, SamplingOptions};
use crate::models::ContextWindow;

/// Default sampling for inline completion: low temperature, short output.
pub fn completion_sampling() -> SamplingOptions {
    SamplingOptions {
        temperature: 0.3,
        max_tokens: 50,
    }
}

/// Default sampling for explanations: a little warmer, longer output.
pub fn explain_sampling() -> SamplingOptions {
    SamplingOptions {
        temperature: 0.5,
        max_tokens: 200,
    }
}

/// Render the fixed completion prompt for a context window.
///
/// Preceding lines, the cursor line prefix, and following lines are laid
/// out in document order so the model sees the text exactly as it
/// surrounds the cursor.
pub fn build_completion_prompt(window: &ContextWindow) -> String {
    let mut context = String::new();
    for line in &window.preceding_lines {
        context.push_str(line);
        context.push('\n');
    }
    context.push_str(&window.current_line_prefix);
    if !window.following_lines.is_empty() {
        context.push('\n');
        for line in &window.following_lines {
            context.push_str(line);
            context.push('\n');
        }
    }

    format!(
        "You are a code completion assistant. Complete this code:\n\n\
         Context:\n{context}\n\n\
         Current line: {prefix}\n\n\
         Complete the current line (one line only):",
        context = context.trim_end_matches('\n'),
        prefix = window.current_line_prefix,
    )
}

/// Render the fixed explanation prompt for a code selection.
pub fn build_explain_prompt(code: &str) -> String {
    format!("Explain this code concisely:\n\n```\n{code}\n```\n\nExplanation:")
}

/// Request one inline completion for a context window.
///
/// The reply is trimmed to its first non-empty line; the prompt asks for
/// a single line and anything past the first newline is model chatter.
pub async fn complete(
    session: &EngineSession,
    window: &ContextWindow,
    sampling: SamplingOptions,
) -> Result<String, InferenceError> {
    let prompt = build_completion_prompt(window);
    let reply = session
        .chat(&[ChatMessage::user(prompt)], sampling)
        .await?;
    Ok(first_line(&reply.text))
}

/// Request a natural-language explanation of a code selection.
///
/// The narration is returned verbatim.
pub async fn explain(
    session: &EngineSession,
    code: &str,
    sampling: SamplingOptions,
) -> Result<String, InferenceError> {
    let prompt = build_explain_prompt(code);
    let reply = session
        .chat(&[ChatMessage::user(prompt)], sampling)
        .await?;
    Ok(reply.text.trim().to_string())
}

fn first_line(text: &str) -> String {
    text.trim().lines().next().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> ContextWindow {
        ContextWindow {
            preceding_lines: vec!["fn main() {".to_string()],
            following_lines: vec!["}".to_string()],
            current_line_prefix: "    let x = ".to_string(),
        }
    }

    #[test]
    fn test_completion_prompt_layout() {
        let prompt = build_completion_prompt(&window());
        assert!(prompt.starts_with("You are a code completion assistant."));
        assert!(prompt.contains("fn main() {\n    let x = \n}"));
        assert!(prompt.contains("Current line:     let x = "));
        assert!(prompt.ends_with("(one line only):"));
    }

    #[test]
    fn test_completion_prompt_without_following_lines() {
        let mut w = window();
        w.following_lines.clear();
        let prompt = build_completion_prompt(&w);
        assert!(prompt.contains("Context:\nfn main() {\n    let x = \n\n"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_completion_prompt(&window()),
            build_completion_prompt(&window())
        );
    }

    #[test]
    fn test_explain_prompt_wraps_code_fence() {
        let prompt = build_explain_prompt("zpool create tank");
        assert!(prompt.contains("```\nzpool create tank\n```"));
        assert!(prompt.ends_with("Explanation:"));
    }

    #[test]
    fn test_first_line_trims_chatter() {
        assert_eq!(first_line("  vec![1, 2, 3];\nAlso note that..."), "vec![1, 2, 3];");
        assert_eq!(first_line("\n\nanswer\n"), "answer");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_default_sampling_constants() {
        let c = completion_sampling();
        assert_eq!(c.max_tokens, 50);
        assert!((c.temperature - 0.3).abs() < f32::EPSILON);

        let e = explain_sampling();
        assert_eq!(e.max_tokens, 200);
        assert!((e.temperature - 0.5).abs() < f32::EPSILON);
    }
}
