//! Configuration for the RCA pipeline
//! Explicit struct passed at construction time, loadable from a TOML file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

// Main config structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RcaConfig {
    pub retrieval: RetrievalConfig,
    pub classifier: ClassifierConfig,
    pub context: ContextConfig,
    pub synthesis: SynthesisConfig,

    // Category keyword rules, checked in order; first best match wins
    pub categories: Vec<CategoryRule>,
}

// Similarity retrieval settings (hybrid mode only)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    // number of hits to request from the vector search collaborator
    pub top_k: usize,

    // hits below this similarity are dropped; cosine-style scale, backends
    // scoring on another scale map it via VectorSearch::calibrate_threshold
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            similarity_threshold: 0.7,
        }
    }
}

// Importance classifier settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    // path to a trained model weight file; absence is not fatal
    pub model_path: Option<PathBuf>,

    // keywords that mark a line as diagnostically significant (rule fallback)
    pub importance_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            importance_keywords: [
                "ERROR",
                "CRITICAL",
                "FAILED",
                "EXCEPTION",
                "TIMEOUT",
                "CONNECTION_LOST",
                "UNAVAILABLE",
                "DENIED",
                "REJECTED",
                "SPAWNING",
                "TERMINATING",
                "DESTROYED",
                "CLAIM",
                "RESOURCE",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// Reasoning context assembly limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    // cap on entries passed to the synthesizer
    pub max_context_logs: usize,

    // character budget for the assembled context
    pub max_context_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_logs: 50,
            max_context_chars: 2000,
        }
    }
}

/// LLM provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    #[default]
    Ollama,
}

// Reasoning synthesizer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub provider: LlmProvider,
    pub anthropic_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    // hard per-call timeout; timeout is terminal for the scenario, never retried
    pub timeout_seconds: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            anthropic_model: "claude-3-5-sonnet-20241022".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "qwen3:8b".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            timeout_seconds: 60,
        }
    }
}

// A category label with the keywords that select it
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Default category rules for cloud-infrastructure incidents
pub fn default_categories() -> Vec<CategoryRule> {
    fn rule(label: &str, keywords: &[&str]) -> CategoryRule {
        CategoryRule {
            label: label.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    vec![
        rule(
            "resource_shortage",
            &[
                "disk", "space", "memory", "insufficient", "quota", "capacity", "resource",
                "exhausted", "no valid host",
            ],
        ),
        rule(
            "network_issues",
            &[
                "network", "dhcp", "port", "subnet", "interface", "connectivity", "unreachable",
                "neutron",
            ],
        ),
        rule(
            "authentication_issues",
            &[
                "authentication", "token", "keystone", "credential", "unauthorized", "expired",
                "auth",
            ],
        ),
        rule(
            "service_failure",
            &["crash", "exception", "traceback", "unavailable", "restart", "terminated"],
        ),
    ]
}

impl RcaConfig {
    /// Config with the default category rules filled in
    pub fn with_defaults() -> Self {
        Self {
            categories: default_categories(),
            ..Default::default()
        }
    }

    /// Categories from the file if present, defaults otherwise
    pub fn categories_or_default(&self) -> Vec<CategoryRule> {
        if self.categories.is_empty() {
            default_categories()
        } else {
            self.categories.clone()
        }
    }
}

// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RcaConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: RcaConfig = toml::from_str(&content)?;
    Ok(config)
}
