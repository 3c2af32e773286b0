use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sidekick_core::context::ContextBounds;
use sidekick_core::engine::SamplingOptions;
use sidekick_core::retrieve::RetrievalLimits;

/// Application configuration.
///
/// Every truncation and sampling constant the pipeline uses is exposed
/// here rather than hard-coded; the defaults are the demo values from
/// the original assistant.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub completion: SamplingConfig,
    #[serde(default = "SamplingConfig::explain_defaults")]
    pub explain: SamplingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_lines_before")]
    pub lines_before: usize,
    #[serde(default = "default_lines_after")]
    pub lines_after: usize,
}

fn default_lines_before() -> usize {
    10
}
fn default_lines_after() -> usize {
    5
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            lines_before: default_lines_before(),
            lines_after: default_lines_after(),
        }
    }
}

impl ContextConfig {
    pub fn bounds(&self) -> ContextBounds {
        ContextBounds {
            lines_before: self.lines_before,
            lines_after: self.lines_after,
        }
    }
}

/// Temperature and output bound for one operation class.
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default = "default_completion_temperature")]
    pub temperature: f32,
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,
}

fn default_completion_temperature() -> f32 {
    0.3
}
fn default_completion_max_tokens() -> u32 {
    50
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_completion_temperature(),
            max_tokens: default_completion_max_tokens(),
        }
    }
}

impl SamplingConfig {
    fn explain_defaults() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 200,
        }
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum corpus files per search, taken in enumeration order.
    #[serde(default = "default_corpus_cap")]
    pub corpus_cap: usize,
    /// Prefix byte budget per file excerpt.
    #[serde(default = "default_excerpt_budget")]
    pub excerpt_budget_bytes: usize,
    #[serde(default = "default_completion_temperature")]
    pub temperature: f32,
    #[serde(default = "default_search_max_tokens")]
    pub max_tokens: u32,
}

fn default_corpus_cap() -> usize {
    20
}
fn default_excerpt_budget() -> usize {
    500
}
fn default_search_max_tokens() -> u32 {
    300
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_cap: default_corpus_cap(),
            excerpt_budget_bytes: default_excerpt_budget(),
            temperature: default_completion_temperature(),
            max_tokens: default_search_max_tokens(),
        }
    }
}

impl RetrievalConfig {
    pub fn limits(&self) -> RetrievalLimits {
        RetrievalLimits {
            corpus_cap: self.corpus_cap,
            excerpt_budget: self.excerpt_budget_bytes,
        }
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// `"http"` for a local OpenAI-compatible endpoint, or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the local engine (llama.cpp, LM Studio, mlc serve).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier override; defaults to the platform profile's.
    #[serde(default)]
    pub model: Option<String>,
    /// Host identifier override for profile resolution; defaults to the
    /// OS this binary was built for.
    #[serde(default)]
    pub host: Option<String>,
    /// Timeout applied to every inference call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            model: None,
            host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_globs() -> Vec<String> {
    ["**/*.rs", "**/*.js", "**/*.ts", "**/*.sh", "**/*.py"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.corpus_cap == 0 {
        anyhow::bail!("retrieval.corpus_cap must be >= 1");
    }
    if config.retrieval.excerpt_budget_bytes == 0 {
        anyhow::bail!("retrieval.excerpt_budget_bytes must be >= 1");
    }
    for (name, sampling) in [
        ("completion", &config.completion),
        ("explain", &config.explain),
    ] {
        if !(0.0..=2.0).contains(&sampling.temperature) {
            anyhow::bail!("{}.temperature must be in [0.0, 2.0]", name);
        }
        if sampling.max_tokens == 0 {
            anyhow::bail!("{}.max_tokens must be >= 1", name);
        }
    }
    if !(0.0..=2.0).contains(&config.retrieval.temperature) {
        anyhow::bail!("retrieval.temperature must be in [0.0, 2.0]");
    }
    if config.engine.timeout_secs == 0 {
        anyhow::bail!("engine.timeout_secs must be >= 1");
    }
    match config.engine.provider.as_str() {
        "disabled" | "http" => {}
        other => anyhow::bail!(
            "Unknown engine provider: '{}'. Must be disabled or http.",
            other
        ),
    }
    Ok(())
}

impl Config {
    /// Defaults-only config for commands that can run without a file.
    pub fn minimal() -> Self {
        Self::default()
    }
}
