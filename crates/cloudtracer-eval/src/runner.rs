// Batch scenario runner - drives the analyzer over a scenario set with
// bounded concurrency and hands the full batch to the harness at once.

use cloudtracer_core::{AnalysisMode, LogWindow};
use cloudtracer_rca::RcaAnalyzer;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

use crate::harness::ScenarioRun;
use crate::scenario::{EvaluationScenario, MalformedScenario};

const DEFAULT_CONCURRENCY: usize = 4;

pub struct BatchRunner {
    analyzer: Arc<RcaAnalyzer>,
    max_concurrency: usize,
}

impl BatchRunner {
    pub fn new(analyzer: Arc<RcaAnalyzer>) -> Self {
        Self {
            analyzer,
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Run every scenario under every requested mode. Malformed fixtures
    /// abort the batch before any analysis starts; per-scenario analysis
    /// errors are captured in the run outcome instead.
    pub async fn run(
        &self,
        scenarios: &[EvaluationScenario],
        window: &LogWindow,
        modes: &[AnalysisMode],
    ) -> Result<Vec<ScenarioRun>, MalformedScenario> {
        for scenario in scenarios {
            scenario.validate()?;
        }

        let jobs: Vec<(EvaluationScenario, AnalysisMode)> = modes
            .iter()
            .flat_map(|mode| scenarios.iter().map(move |s| (s.clone(), *mode)))
            .collect();
        info!(
            scenarios = scenarios.len(),
            modes = modes.len(),
            concurrency = self.max_concurrency,
            "evaluation batch starting"
        );

        // every job completes before any aggregation happens
        let mut runs: Vec<ScenarioRun> = stream::iter(jobs)
            .map(|(scenario, mode)| {
                let analyzer = Arc::clone(&self.analyzer);
                async move {
                    let outcome = analyzer
                        .analyze(&scenario.issue_description, window, mode)
                        .await
                        .map_err(|e| e.to_string());
                    if let Err(error) = &outcome {
                        warn!(
                            scenario_id = %scenario.scenario_id,
                            mode = %mode,
                            %error,
                            "scenario analysis failed"
                        );
                    }
                    ScenarioRun {
                        scenario,
                        mode,
                        outcome,
                    }
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        // deterministic ordering regardless of completion order
        runs.sort_by(|a, b| {
            a.mode
                .to_string()
                .cmp(&b.mode.to_string())
                .then_with(|| a.scenario.scenario_id.cmp(&b.scenario.scenario_id))
        });
        Ok(runs)
    }
}
