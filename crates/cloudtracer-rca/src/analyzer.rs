// RCA orchestrator
// Runs: (optional) similarity retrieval -> importance classification ->
// context assembly -> reasoning synthesis, and merges the stage outputs
// into one AnalysisResult.

use cloudtracer_core::{AnalysisMode, AnalysisResult, LogEntry, LogWindow};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier::ImportanceClassifier;
use crate::config::{CategoryRule, RcaConfig};
use crate::llm::SynthesisError;
use crate::retriever::SimilarityRetriever;
use crate::synthesizer::ReasoningSynthesizer;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("issue description must not be empty")]
    EmptyIssue,

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

pub struct RcaAnalyzer {
    config: RcaConfig,
    categories: Vec<CategoryRule>,
    retriever: Option<SimilarityRetriever>,
    classifier: ImportanceClassifier,
    synthesizer: ReasoningSynthesizer,
}

impl RcaAnalyzer {
    pub fn new(
        config: RcaConfig,
        retriever: Option<SimilarityRetriever>,
        classifier: ImportanceClassifier,
        synthesizer: ReasoningSynthesizer,
    ) -> Self {
        let categories = config.categories_or_default();
        Self {
            config,
            categories,
            retriever,
            classifier,
            synthesizer,
        }
    }

    /// Analyze one issue over one log window. Retrieval and classifier
    /// degradation fall back silently (recorded in the result flags);
    /// synthesis failure propagates to the caller.
    pub async fn analyze(
        &self,
        issue_description: &str,
        window: &LogWindow,
        mode: AnalysisMode,
    ) -> Result<AnalysisResult, AnalyzeError> {
        if issue_description.trim().is_empty() {
            return Err(AnalyzeError::EmptyIssue);
        }

        let start = Instant::now();
        info!(mode = %mode, window_len = window.len(), "RCA analysis starting");

        // Stage 1: candidate narrowing (hybrid only)
        let (candidates, vector_db_used) = self.narrow_candidates(issue_description, window, mode).await;

        // Stage 2: importance scoring + selection
        let selected = self.select_entries(&candidates);
        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            fallback = self.classifier.is_fallback(),
            "entries selected"
        );

        // Stage 3: bounded context
        let context = self.build_context(&selected);

        // Stage 4: reasoning synthesis (failure is terminal for this analysis)
        let root_cause_analysis = self.synthesizer.synthesize(issue_description, &context).await?;

        // Stage 5: category extraction
        let issue_category = self.extract_category(issue_description, &root_cause_analysis);

        let elapsed_time = start.elapsed();
        info!(
            category = %issue_category,
            relevant_logs = selected.len(),
            vector_db_used,
            elapsed_ms = elapsed_time.as_millis(),
            "RCA analysis complete"
        );

        Ok(AnalysisResult {
            root_cause_analysis,
            issue_category,
            relevant_logs_count: selected.len(),
            analysis_mode: mode,
            vector_db_used,
            classifier_fallback: self.classifier.is_fallback(),
            elapsed_time,
        })
    }

    // Hybrid mode narrows via the retriever; any retrieval failure (or an
    // empty hit set) falls back to the full window without failing the run.
    async fn narrow_candidates(
        &self,
        issue: &str,
        window: &LogWindow,
        mode: AnalysisMode,
    ) -> (Vec<LogEntry>, bool) {
        if mode != AnalysisMode::Hybrid {
            return (window.entries().to_vec(), false);
        }

        let Some(retriever) = &self.retriever else {
            warn!("hybrid mode requested but no retriever configured");
            return (window.entries().to_vec(), false);
        };

        match retriever.retrieve(issue, self.config.retrieval.top_k, window).await {
            Ok(hits) if !hits.is_empty() => {
                debug!(hits = hits.len(), "retrieval narrowed candidates");
                (hits.into_iter().map(|(entry, _)| entry).collect(), true)
            }
            Ok(_) => {
                warn!("retrieval returned no hits, using full window");
                (window.entries().to_vec(), false)
            }
            Err(e) => {
                warn!(error = %e, "retrieval failed, using full window");
                (window.entries().to_vec(), false)
            }
        }
    }

    // Top-N by importance score, then back into timestamp order so the
    // synthesizer sees the cause/effect sequence.
    fn select_entries(&self, candidates: &[LogEntry]) -> Vec<LogEntry> {
        let scores = self.classifier.score(candidates);

        let mut indexed: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        indexed.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        indexed.truncate(self.config.context.max_context_logs);

        let mut selected: Vec<LogEntry> = indexed
            .into_iter()
            .map(|(i, _)| candidates[i].clone())
            .collect();
        selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        selected
    }

    // Join entries into the context string, cut off at the char budget
    fn build_context(&self, entries: &[LogEntry]) -> String {
        if entries.is_empty() {
            return "(no log entries in window)".to_string();
        }

        let budget = self.config.context.max_context_chars;
        let mut context = String::new();
        for entry in entries {
            let line = entry.context_line();
            if !context.is_empty() && context.len() + line.len() + 1 > budget {
                break;
            }
            if !context.is_empty() {
                context.push('\n');
            }
            if line.len() > budget {
                // single oversized line: keep a char-boundary prefix
                context.extend(line.chars().take(budget));
                break;
            }
            context.push_str(&line);
        }
        context
    }

    // First category whose keywords best match the diagnosis text; the
    // issue description participates so short diagnoses still categorize.
    fn extract_category(&self, issue: &str, narrative: &str) -> String {
        let haystack = format!("{} {}", narrative, issue).to_lowercase();

        let mut best: Option<(&str, usize)> = None;
        for rule in &self.categories {
            let hits = rule
                .keywords
                .iter()
                .filter(|k| haystack.contains(&k.to_lowercase()))
                .count();
            if hits > 0 && best.map_or(true, |(_, best_hits)| hits > best_hits) {
                best = Some((&rule.label, hits));
            }
        }

        best.map(|(label, _)| label.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ImportanceClassifier;
    use crate::config::ClassifierConfig;
    use crate::llm::CannedClient;
    use crate::retriever::LexicalIndex;
    use crate::synthesizer::ReasoningSynthesizer;
    use chrono::{Duration, TimeZone, Utc};
    use cloudtracer_core::LogLevel;

    fn disk_window() -> LogWindow {
        let base = Utc.with_ymd_and_hms(2017, 5, 16, 1, 0, 0).unwrap();
        LogWindow::from_entries(vec![
            LogEntry::new(base, "nova-api", LogLevel::Info, "POST /servers status: 202"),
            LogEntry::new(
                base + Duration::minutes(1),
                "nova-scheduler",
                LogLevel::Warning,
                "insufficient disk space: required 20GB, available 2GB",
            ),
            LogEntry::new(
                base + Duration::minutes(2),
                "nova-scheduler",
                LogLevel::Error,
                "No valid host was found",
            ),
        ])
    }

    fn analyzer(window: Option<&LogWindow>, reply: &str) -> RcaAnalyzer {
        let config = RcaConfig::with_defaults();
        let retriever = window.map(|w| {
            SimilarityRetriever::new(Box::new(LexicalIndex::from_window(w)), 0.1)
        });
        let classifier =
            ImportanceClassifier::new(None, ClassifierConfig::default().importance_keywords);
        let synthesizer =
            ReasoningSynthesizer::new(Box::new(CannedClient::new(reply)), &config.synthesis);
        RcaAnalyzer::new(config, retriever, classifier, synthesizer)
    }

    #[tokio::test]
    async fn test_fast_mode_never_uses_vector_db() {
        let window = disk_window();
        let analyzer = analyzer(Some(&window), "insufficient disk space on compute hosts");

        let result = analyzer
            .analyze("Instance launch failing with disk space errors", &window, AnalysisMode::Fast)
            .await
            .unwrap();

        assert!(!result.vector_db_used);
        assert_eq!(result.analysis_mode, AnalysisMode::Fast);
        assert!(result.relevant_logs_count <= window.len());
    }

    #[tokio::test]
    async fn test_hybrid_uses_retrieval_under_default_config() {
        let window = disk_window();
        let config = RcaConfig::with_defaults();
        let retriever = SimilarityRetriever::new(
            Box::new(LexicalIndex::from_window(&window)),
            config.retrieval.similarity_threshold,
        );
        let classifier =
            ImportanceClassifier::new(None, ClassifierConfig::default().importance_keywords);
        let synthesizer = ReasoningSynthesizer::new(
            Box::new(CannedClient::new("insufficient disk space on compute hosts")),
            &config.synthesis,
        );
        let analyzer = RcaAnalyzer::new(config, Some(retriever), classifier, synthesizer);

        let result = analyzer
            .analyze("Instance launch failing with disk space errors", &window, AnalysisMode::Hybrid)
            .await
            .unwrap();

        // defaults must not silently degrade hybrid to the full window
        assert!(result.vector_db_used);
        assert!(result.relevant_logs_count >= 1);
        assert!(result.relevant_logs_count < window.len());
    }

    #[tokio::test]
    async fn test_disk_space_scenario_end_to_end() {
        let window = disk_window();
        let analyzer = analyzer(
            Some(&window),
            "The scheduler rejected the instance because compute hosts ran out of disk space. \
             Insufficient disk space on the selected host prevented the spawn.",
        );

        let result = analyzer
            .analyze("Instance launch failing with disk space errors", &window, AnalysisMode::Hybrid)
            .await
            .unwrap();

        assert_eq!(result.issue_category, "resource_shortage");
        assert!(result.relevant_logs_count >= 1);
        assert!(result.vector_db_used);
    }

    #[tokio::test]
    async fn test_hybrid_without_retriever_falls_back() {
        let window = disk_window();
        let analyzer = analyzer(None, "disk space exhausted");

        let result = analyzer
            .analyze("disk errors", &window, AnalysisMode::Hybrid)
            .await
            .unwrap();

        assert!(!result.vector_db_used);
        assert_eq!(result.relevant_logs_count, window.len());
    }

    #[tokio::test]
    async fn test_empty_window_still_well_formed() {
        let window = LogWindow::default();
        let analyzer = analyzer(None, "cannot conclude without logs");

        let result = analyzer
            .analyze("something is broken", &window, AnalysisMode::Fast)
            .await
            .unwrap();

        assert_eq!(result.relevant_logs_count, 0);
        assert!(!result.issue_category.is_empty());
    }

    #[tokio::test]
    async fn test_empty_issue_rejected() {
        let window = disk_window();
        let analyzer = analyzer(None, "irrelevant");

        let result = analyzer.analyze("   ", &window, AnalysisMode::Fast).await;
        assert!(matches!(result, Err(AnalyzeError::EmptyIssue)));
    }

    #[tokio::test]
    async fn test_unmatched_diagnosis_is_unknown_category() {
        let window = disk_window();
        let analyzer = analyzer(None, "the gremlins did it");

        let result = analyzer
            .analyze("odd behavior observed", &window, AnalysisMode::Fast)
            .await
            .unwrap();
        assert_eq!(result.issue_category, "unknown");
    }

    #[tokio::test]
    async fn test_context_respects_char_budget() {
        let base = Utc.with_ymd_and_hms(2017, 5, 16, 1, 0, 0).unwrap();
        let entries: Vec<LogEntry> = (0..200)
            .map(|i| {
                LogEntry::new(
                    base + Duration::seconds(i),
                    "nova-compute",
                    LogLevel::Error,
                    format!("disk allocation failed on host {}: no space left on device", i),
                )
            })
            .collect();
        let window = LogWindow::from_entries(entries);
        let analyzer = analyzer(None, "disk space exhaustion");

        let result = analyzer
            .analyze("disk failures everywhere", &window, AnalysisMode::Fast)
            .await
            .unwrap();
        // selection cap, not the window size
        assert!(result.relevant_logs_count <= 50);
    }
}
