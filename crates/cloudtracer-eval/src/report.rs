// Metrics report artifact - the JSON contract external tooling reads.
// Top-level keys test_timestamp / scenarios_tested / metrics and the nested
// metric field names are fixed; CI and dashboards parse them.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub test_timestamp: String,
    pub scenarios_tested: usize,
    pub metrics: MetricsSection,

    /// Per-scenario detail, failed scenarios included with their error
    #[serde(default)]
    pub scenarios: Vec<ScenarioRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_mode: Option<ModeMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_mode: Option<ModeMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<OverallMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeMetrics {
    pub mean_reciprocal_rank: f64,
    pub root_cause_accuracy: f64,
    pub category_accuracy: f64,
    pub scenarios_completed: usize,
    pub scenarios_failed: usize,
    pub avg_analysis_time: f64,
    pub avg_relevant_logs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub average_mrr: f64,
    pub average_accuracy: f64,
    pub average_category_accuracy: f64,
    pub hybrid_improvement_mrr: f64,
    pub hybrid_improvement_accuracy: f64,
    pub total_scenarios: usize,
    pub system_performance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_id: String,
    pub mode: String,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_logs_count: Option<usize>,
}

impl MetricsReport {
    /// Persist the report as pretty-printed JSON
    pub fn write_artifact<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Plain-text summary table for terminal output
    pub fn summary_table(&self) -> String {
        fn cell(metrics: &Option<ModeMetrics>, pick: impl Fn(&ModeMetrics) -> f64) -> String {
            metrics
                .as_ref()
                .map(|m| format!("{:.4}", pick(m)))
                .unwrap_or_else(|| "N/A".to_string())
        }

        let fast = &self.metrics.fast_mode;
        let hybrid = &self.metrics.hybrid_mode;
        let overall = &self.metrics.overall;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Metric", "Fast Mode", "Hybrid Mode", "Overall"
        );
        let _ = writeln!(out, "{}", "-".repeat(63));
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Mean Reciprocal Rank",
            cell(fast, |m| m.mean_reciprocal_rank),
            cell(hybrid, |m| m.mean_reciprocal_rank),
            overall
                .as_ref()
                .map(|o| format!("{:.4}", o.average_mrr))
                .unwrap_or_else(|| "N/A".to_string()),
        );
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Root Cause Accuracy",
            cell(fast, |m| m.root_cause_accuracy),
            cell(hybrid, |m| m.root_cause_accuracy),
            overall
                .as_ref()
                .map(|o| format!("{:.4}", o.average_accuracy))
                .unwrap_or_else(|| "N/A".to_string()),
        );
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Category Accuracy",
            cell(fast, |m| m.category_accuracy),
            cell(hybrid, |m| m.category_accuracy),
            overall
                .as_ref()
                .map(|o| format!("{:.4}", o.average_category_accuracy))
                .unwrap_or_else(|| "N/A".to_string()),
        );
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Scenarios Completed",
            fast.as_ref()
                .map(|m| m.scenarios_completed.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            hybrid
                .as_ref()
                .map(|m| m.scenarios_completed.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            overall
                .as_ref()
                .map(|o| o.total_scenarios.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        );
        let _ = writeln!(
            out,
            "{:<25} {:<12} {:<12} {:<12}",
            "Avg Analysis Time (s)",
            fast.as_ref()
                .map(|m| format!("{:.2}", m.avg_analysis_time))
                .unwrap_or_else(|| "N/A".to_string()),
            hybrid
                .as_ref()
                .map(|m| format!("{:.2}", m.avg_analysis_time))
                .unwrap_or_else(|| "N/A".to_string()),
            "N/A",
        );
        if let Some(o) = overall {
            let _ = writeln!(
                out,
                "{:<25} {:<12} {:<12} {:<12}",
                "System Performance", "N/A", "N/A", o.system_performance
            );
        }
        out
    }
}
