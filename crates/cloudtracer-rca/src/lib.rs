// CloudTracer RCA pipeline - retrieval, classification and reasoning over log windows

pub mod analyzer;
pub mod anthropic_client;
pub mod classifier;
pub mod config;
pub mod llm;
pub mod ollama_client;
pub mod retriever;
pub mod synthesizer;

pub use analyzer::{AnalyzeError, RcaAnalyzer};
pub use anthropic_client::AnthropicClient;
pub use classifier::{ImportanceClassifier, ImportanceModel};
pub use config::{load_config, CategoryRule, ClassifierConfig, LlmProvider, RcaConfig};
pub use llm::{CannedClient, CompletionClient, SynthesisError};
pub use ollama_client::OllamaClient;
pub use retriever::{LexicalIndex, RetrievalError, SearchHit, SimilarityRetriever, VectorSearch};
pub use synthesizer::ReasoningSynthesizer;
