// Evaluation harness - turns a batch of (scenario, outcome) pairs into a
// MetricsReport. Pure aggregation: the same batch and timestamp always
// produce the same report.

use chrono::{DateTime, Utc};
use cloudtracer_core::{AnalysisMode, AnalysisResult};
use std::collections::BTreeSet;

use crate::metrics;
use crate::report::{MetricsReport, MetricsSection, ModeMetrics, OverallMetrics, ScenarioRecord};
use crate::scenario::EvaluationScenario;

/// One scenario's run under one mode. `outcome` carries the analysis
/// result or the error that aborted that scenario (never the whole batch).
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub scenario: EvaluationScenario,
    pub mode: AnalysisMode,
    pub outcome: Result<AnalysisResult, String>,
}

/// Harness knobs. The accuracy threshold defaults to 0.3, the setting for
/// real LLM responses; synthetic/mocked runs use the stricter 0.5.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub accuracy_threshold: f64,

    /// When non-empty, candidate sentences must carry one of these
    pub diagnostic_keywords: Vec<String>,

    pub max_candidates: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: 0.3,
            diagnostic_keywords: Vec::new(),
            max_candidates: 5,
        }
    }
}

impl EvalConfig {
    /// Stricter threshold for synthetic/mocked responses
    pub fn mocked() -> Self {
        Self {
            accuracy_threshold: 0.5,
            ..Default::default()
        }
    }
}

pub struct EvaluationHarness {
    config: EvalConfig,
}

impl EvaluationHarness {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Evaluate a batch, stamping the report with the current time
    pub fn evaluate(&self, runs: &[ScenarioRun]) -> MetricsReport {
        self.evaluate_at(runs, Utc::now())
    }

    /// Evaluate a batch with an explicit timestamp so the report is
    /// byte-reproducible for identical input.
    pub fn evaluate_at(&self, runs: &[ScenarioRun], timestamp: DateTime<Utc>) -> MetricsReport {
        let scenario_ids: BTreeSet<&str> =
            runs.iter().map(|r| r.scenario.scenario_id.as_str()).collect();

        let fast_mode = self.mode_metrics(runs, AnalysisMode::Fast);
        let hybrid_mode = self.mode_metrics(runs, AnalysisMode::Hybrid);

        let overall = match (&fast_mode, &hybrid_mode) {
            (Some(fast), Some(hybrid)) => {
                let average_mrr =
                    round4((fast.mean_reciprocal_rank + hybrid.mean_reciprocal_rank) / 2.0);
                Some(OverallMetrics {
                    average_mrr,
                    average_accuracy: round4(
                        (fast.root_cause_accuracy + hybrid.root_cause_accuracy) / 2.0,
                    ),
                    average_category_accuracy: round4(
                        (fast.category_accuracy + hybrid.category_accuracy) / 2.0,
                    ),
                    hybrid_improvement_mrr: round4(
                        hybrid.mean_reciprocal_rank - fast.mean_reciprocal_rank,
                    ),
                    hybrid_improvement_accuracy: round4(
                        hybrid.root_cause_accuracy - fast.root_cause_accuracy,
                    ),
                    total_scenarios: scenario_ids.len(),
                    system_performance: if average_mrr >= 0.5 {
                        "production_ready".to_string()
                    } else {
                        "needs_improvement".to_string()
                    },
                })
            }
            _ => None,
        };

        let scenarios = runs
            .iter()
            .map(|run| match &run.outcome {
                Ok(result) => ScenarioRecord {
                    scenario_id: run.scenario.scenario_id.clone(),
                    mode: run.mode.to_string(),
                    success: true,
                    error: None,
                    predicted_category: Some(result.issue_category.clone()),
                    relevant_logs_count: Some(result.relevant_logs_count),
                },
                Err(error) => ScenarioRecord {
                    scenario_id: run.scenario.scenario_id.clone(),
                    mode: run.mode.to_string(),
                    success: false,
                    error: Some(error.clone()),
                    predicted_category: None,
                    relevant_logs_count: None,
                },
            })
            .collect();

        MetricsReport {
            test_timestamp: timestamp.to_rfc3339(),
            scenarios_tested: scenario_ids.len(),
            metrics: MetricsSection {
                fast_mode,
                hybrid_mode,
                overall,
            },
            scenarios,
        }
    }

    // Metrics for one mode. Failed scenarios count toward scenarios_failed
    // and stay out of every metric denominator.
    fn mode_metrics(&self, runs: &[ScenarioRun], mode: AnalysisMode) -> Option<ModeMetrics> {
        let mode_runs: Vec<&ScenarioRun> = runs.iter().filter(|r| r.mode == mode).collect();
        if mode_runs.is_empty() {
            return None;
        }

        let failed = mode_runs.iter().filter(|r| r.outcome.is_err()).count();
        let successes: Vec<(&EvaluationScenario, &AnalysisResult)> = mode_runs
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|result| (&r.scenario, result)))
            .collect();

        if successes.is_empty() {
            return Some(ModeMetrics {
                mean_reciprocal_rank: 0.0,
                root_cause_accuracy: 0.0,
                category_accuracy: 0.0,
                scenarios_completed: 0,
                scenarios_failed: failed,
                avg_analysis_time: 0.0,
                avg_relevant_logs: 0.0,
            });
        }

        let ranked: Vec<Vec<String>> = successes
            .iter()
            .map(|(_, result)| {
                metrics::extract_candidates(
                    &result.root_cause_analysis,
                    &self.config.diagnostic_keywords,
                    self.config.max_candidates,
                )
            })
            .collect();
        let truths: Vec<String> = successes
            .iter()
            .map(|(scenario, _)| scenario.expected_root_cause.clone())
            .collect();
        let predictions: Vec<String> = successes
            .iter()
            .map(|(_, result)| result.root_cause_analysis.clone())
            .collect();

        let category_matches = successes
            .iter()
            .filter(|(scenario, result)| result.issue_category == scenario.expected_category)
            .count();

        let completed = successes.len();
        let total_time: f64 = successes.iter().map(|(_, r)| r.elapsed_seconds()).sum();
        let total_logs: usize = successes.iter().map(|(_, r)| r.relevant_logs_count).sum();

        Some(ModeMetrics {
            mean_reciprocal_rank: round4(metrics::mean_reciprocal_rank(&ranked, &truths)),
            root_cause_accuracy: round4(metrics::root_cause_accuracy(
                &predictions,
                &truths,
                self.config.accuracy_threshold,
            )),
            category_accuracy: round4(category_matches as f64 / completed as f64),
            scenarios_completed: completed,
            scenarios_failed: failed,
            avg_analysis_time: round2(total_time / completed as f64),
            avg_relevant_logs: round1(total_logs as f64 / completed as f64),
        })
    }
}

impl Default for EvaluationHarness {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn scenario(id: &str, expected_cause: &str, expected_category: &str) -> EvaluationScenario {
        EvaluationScenario {
            scenario_id: id.to_string(),
            issue_description: format!("issue for {}", id),
            expected_root_cause: expected_cause.to_string(),
            expected_category: expected_category.to_string(),
            keywords: BTreeSet::new(),
        }
    }

    fn result(mode: AnalysisMode, narrative: &str, category: &str) -> AnalysisResult {
        AnalysisResult {
            root_cause_analysis: narrative.to_string(),
            issue_category: category.to_string(),
            relevant_logs_count: 4,
            analysis_mode: mode,
            vector_db_used: mode == AnalysisMode::Hybrid,
            classifier_fallback: true,
            elapsed_time: Duration::from_millis(1500),
        }
    }

    fn good_runs(mode: AnalysisMode) -> Vec<ScenarioRun> {
        vec![
            ScenarioRun {
                scenario: scenario(
                    "disk",
                    "insufficient disk space available compute hosts",
                    "resource_shortage",
                ),
                mode,
                outcome: Ok(result(
                    mode,
                    "The compute hosts had insufficient disk space available. \
                     Scheduler rejected the request as a consequence.",
                    "resource_shortage",
                )),
            },
            ScenarioRun {
                scenario: scenario(
                    "auth",
                    "token validation failed authentication expired",
                    "authentication_issues",
                ),
                mode,
                outcome: Ok(result(
                    mode,
                    "Token validation failed because the token had expired. \
                     Authentication errors cascaded to nova-api.",
                    "authentication_issues",
                )),
            },
        ]
    }

    #[test]
    fn test_perfect_batch_scores_one() {
        let harness = EvaluationHarness::default();
        let report = harness.evaluate(&good_runs(AnalysisMode::Fast));

        let fast = report.metrics.fast_mode.unwrap();
        assert_eq!(fast.mean_reciprocal_rank, 1.0);
        assert_eq!(fast.root_cause_accuracy, 1.0);
        assert_eq!(fast.category_accuracy, 1.0);
        assert_eq!(fast.scenarios_completed, 2);
        assert_eq!(fast.scenarios_failed, 0);
        assert_eq!(fast.avg_analysis_time, 1.5);
        assert_eq!(fast.avg_relevant_logs, 4.0);
        assert!(report.metrics.hybrid_mode.is_none());
        assert!(report.metrics.overall.is_none());
    }

    #[test]
    fn test_failed_scenario_counted_and_excluded() {
        let harness = EvaluationHarness::default();
        let mut runs = good_runs(AnalysisMode::Fast);
        runs.push(ScenarioRun {
            scenario: scenario("timeout", "never completed", "unknown"),
            mode: AnalysisMode::Fast,
            outcome: Err("synthesis timed out after 60s".to_string()),
        });

        let report = harness.evaluate(&runs);
        let fast = report.metrics.fast_mode.unwrap();
        assert_eq!(fast.scenarios_failed, 1);
        // failed scenario excluded from denominators: both successes match
        assert_eq!(fast.root_cause_accuracy, 1.0);
        assert_eq!(fast.scenarios_completed, 2);

        // failed scenario still appears in the detail with its error
        let record = report
            .scenarios
            .iter()
            .find(|r| r.scenario_id == "timeout")
            .unwrap();
        assert!(!record.success);
        assert!(record.error.as_ref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_overall_and_hybrid_delta() {
        let harness = EvaluationHarness::default();
        let mut runs = good_runs(AnalysisMode::Fast);
        runs.extend(good_runs(AnalysisMode::Hybrid));

        let report = harness.evaluate(&runs);
        let overall = report.metrics.overall.unwrap();
        assert_eq!(overall.average_mrr, 1.0);
        assert_eq!(overall.hybrid_improvement_mrr, 0.0);
        assert_eq!(overall.total_scenarios, 2);
        assert_eq!(overall.system_performance, "production_ready");
        assert_eq!(report.scenarios_tested, 2);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let harness = EvaluationHarness::default();
        let runs = good_runs(AnalysisMode::Fast);
        let ts = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();

        let first = serde_json::to_string(&harness.evaluate_at(&runs, ts)).unwrap();
        let second = serde_json::to_string(&harness.evaluate_at(&runs, ts)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_failures_zero_metrics() {
        let harness = EvaluationHarness::default();
        let runs = vec![ScenarioRun {
            scenario: scenario("only", "some cause", "unknown"),
            mode: AnalysisMode::Hybrid,
            outcome: Err("LLM API error: quota exceeded".to_string()),
        }];

        let report = harness.evaluate(&runs);
        let hybrid = report.metrics.hybrid_mode.unwrap();
        assert_eq!(hybrid.scenarios_completed, 0);
        assert_eq!(hybrid.scenarios_failed, 1);
        assert_eq!(hybrid.mean_reciprocal_rank, 0.0);
    }
}
