// LLM completion contract shared by all backends

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("synthesis timed out after {0}s")]
    Timeout(u64),

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

/// Completion backend contract. Implementations do not retry internally;
/// retry/backoff policy belongs to the caller so latency accounting stays honest.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, SynthesisError>;

    fn provider(&self) -> &str;

    fn model(&self) -> &str;
}

/// Offline completion backend: answers with the first reply whose trigger
/// appears in the prompt. Used by tests and `cloudtracer evaluate --mock`.
#[derive(Debug, Clone, Default)]
pub struct CannedClient {
    rules: Vec<(String, String)>,
    fallback: String,
}

impl CannedClient {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    pub fn with_rule(mut self, trigger: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((trigger.into().to_lowercase(), reply.into()));
        self
    }
}

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, SynthesisError> {
        let prompt_lower = prompt.to_lowercase();
        for (trigger, reply) in &self.rules {
            if prompt_lower.contains(trigger) {
                return Ok(reply.clone());
            }
        }
        Ok(self.fallback.clone())
    }

    fn provider(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_client_routing() {
        let client = CannedClient::new("default reply")
            .with_rule("disk", "insufficient disk space on compute hosts")
            .with_rule("token", "token expired in keystone");

        let reply = client.complete("why is disk usage high", 100, 0.1).await.unwrap();
        assert_eq!(reply, "insufficient disk space on compute hosts");

        let reply = client.complete("something else entirely", 100, 0.1).await.unwrap();
        assert_eq!(reply, "default reply");
    }
}
