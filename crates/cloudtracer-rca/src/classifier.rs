// Importance classification of log entries
// Trained model when available, deterministic rule fallback otherwise.

use cloudtracer_core::{LogEntry, LogLevel};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Trained importance model: token weights plus a bias, squashed through
/// a logistic so scores land in (0,1). Training is out of scope; the
/// weight file is produced by the external training collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportanceModel {
    token_weights: HashMap<String, f32>,
    bias: f32,
}

impl ImportanceModel {
    /// Load a model from a JSON weight file. Absence or a malformed file
    /// is not fatal - the caller falls back to rule-based scoring.
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let content = match std::fs::read_to_string(path.as_ref()) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "importance model not loaded");
                return None;
            }
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "importance model file malformed");
                None
            }
        }
    }

    fn score_entry(&self, entry: &LogEntry) -> f32 {
        let message = entry.message.to_lowercase();
        let mut logit = self.bias;
        for token in message.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if let Some(weight) = self.token_weights.get(token) {
                logit += weight;
            }
        }
        1.0 / (1.0 + (-logit).exp())
    }
}

/// Scores each log entry's diagnostic importance in [0,1]. Same output
/// contract whether a trained model is loaded or the rule fallback runs,
/// so callers never branch on availability.
pub struct ImportanceClassifier {
    model: Option<ImportanceModel>,
    importance_keywords: Vec<String>,
}

impl ImportanceClassifier {
    pub fn new(model: Option<ImportanceModel>, importance_keywords: Vec<String>) -> Self {
        let importance_keywords = importance_keywords
            .into_iter()
            .map(|k| k.to_uppercase())
            .collect();
        Self {
            model,
            importance_keywords,
        }
    }

    /// Whether scoring runs on the rule-based fallback
    pub fn is_fallback(&self) -> bool {
        self.model.is_none()
    }

    /// One score per entry, same length and order as the input.
    /// Deterministic for a fixed model and fixed input; never fails.
    pub fn score(&self, entries: &[LogEntry]) -> Vec<f32> {
        match &self.model {
            Some(model) => entries.iter().map(|e| model.score_entry(e)).collect(),
            None => entries.iter().map(|e| self.rule_score(e)).collect(),
        }
    }

    // Rule fallback: severity above the informational threshold dominates,
    // configured importance keywords nudge the score upward.
    fn rule_score(&self, entry: &LogEntry) -> f32 {
        let base = match entry.level {
            LogLevel::Critical => 0.95,
            LogLevel::Error => 0.9,
            LogLevel::Warning => 0.6,
            LogLevel::Info => 0.3,
            LogLevel::Debug => 0.15,
            LogLevel::Trace => 0.1,
        };

        let message_upper = entry.message.to_uppercase();
        let keyword_hits = self
            .importance_keywords
            .iter()
            .filter(|k| message_upper.contains(k.as_str()))
            .count();

        (base + 0.05 * keyword_hits as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use chrono::{TimeZone, Utc};

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry::new(
            Utc.with_ymd_and_hms(2017, 5, 16, 1, 0, 0).unwrap(),
            "nova-compute",
            level,
            message,
        )
    }

    fn fallback_classifier() -> ImportanceClassifier {
        ImportanceClassifier::new(None, ClassifierConfig::default().importance_keywords)
    }

    #[test]
    fn test_fallback_scores_in_range_and_ordered_by_severity() {
        let classifier = fallback_classifier();
        assert!(classifier.is_fallback());

        let entries = vec![
            entry(LogLevel::Info, "instance booted"),
            entry(LogLevel::Warning, "disk usage at 90%"),
            entry(LogLevel::Error, "instance FAILED to spawn"),
        ];
        let scores = classifier.score(&entries);

        assert_eq!(scores.len(), entries.len());
        for s in &scores {
            assert!((0.0..=1.0).contains(s));
        }
        assert!(scores[0] < scores[1]);
        assert!(scores[1] < scores[2]);
    }

    #[test]
    fn test_keywords_raise_score() {
        let classifier = fallback_classifier();
        let plain = entry(LogLevel::Info, "nothing to see here");
        let loaded = entry(LogLevel::Info, "RESOURCE CLAIM rejected with TIMEOUT");
        let scores = classifier.score(&[plain, loaded]);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let classifier = fallback_classifier();
        let entries = vec![
            entry(LogLevel::Error, "No valid host was found"),
            entry(LogLevel::Warning, "insufficient disk space"),
        ];
        assert_eq!(classifier.score(&entries), classifier.score(&entries));
    }

    #[test]
    fn test_model_scoring() {
        let json = r#"{"token_weights":{"disk":1.5,"failed":2.0},"bias":-1.0}"#;
        let model: ImportanceModel = serde_json::from_str(json).unwrap();
        let classifier = ImportanceClassifier::new(Some(model), vec![]);
        assert!(!classifier.is_fallback());

        let scores = classifier.score(&[
            entry(LogLevel::Info, "disk allocation failed"),
            entry(LogLevel::Info, "instance booted"),
        ]);
        assert!(scores[0] > scores[1]);
        for s in &scores {
            assert!((0.0..=1.0).contains(s));
        }
    }

    #[test]
    fn test_missing_model_file_is_none() {
        assert!(ImportanceModel::load("/nonexistent/model.json").is_none());
    }
}
