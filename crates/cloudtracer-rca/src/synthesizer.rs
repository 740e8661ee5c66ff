// Reasoning synthesis - turns issue description + curated log context
// into a free-text root-cause diagnosis via the configured LLM backend.

use std::time::Duration;
use tokio::time::timeout;

use crate::anthropic_client::AnthropicClient;
use crate::config::{LlmProvider, SynthesisConfig};
use crate::llm::{CompletionClient, SynthesisError};
use crate::ollama_client::OllamaClient;

pub struct ReasoningSynthesizer {
    client: Box<dyn CompletionClient>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl ReasoningSynthesizer {
    pub fn new(client: Box<dyn CompletionClient>, config: &SynthesisConfig) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Build the synthesizer with the backend the config selects
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, SynthesisError> {
        let client: Box<dyn CompletionClient> = match config.provider {
            LlmProvider::Anthropic => {
                Box::new(AnthropicClient::from_env(config.anthropic_model.clone())?)
            }
            LlmProvider::Ollama => Box::new(OllamaClient::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            )),
        };
        Ok(Self::new(client, config))
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    /// One completion call under the configured timeout. No retries here;
    /// the caller decides whether a failed scenario gets another attempt.
    pub async fn synthesize(&self, issue: &str, context: &str) -> Result<String, SynthesisError> {
        let prompt = self.build_prompt(issue, context);

        match timeout(
            self.timeout,
            self.client.complete(&prompt, self.max_tokens, self.temperature),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SynthesisError::Timeout(self.timeout.as_secs())),
        }
    }

    fn build_prompt(&self, issue: &str, context: &str) -> String {
        format!(
            r#"You are a senior cloud-infrastructure engineer performing root cause analysis on an OpenStack-style platform.

## REPORTED ISSUE
{}

## RELEVANT LOG ENTRIES (time-ordered)
```
{}
```

## INSTRUCTIONS
1. Identify the most likely root cause of the reported issue.
2. Cite the specific log entries that support your conclusion.
3. Note the failure chain across services where the logs show one.
4. Suggest one concrete remediation step.

Write the root cause first, in one clear sentence, then the supporting analysis.
If the logs are insufficient to conclude, say what additional data would help."#,
            issue, context
        )
    }
}
