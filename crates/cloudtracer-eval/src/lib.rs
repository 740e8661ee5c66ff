// CloudTracer evaluation harness - scores diagnosis quality over scenario batches

pub mod harness;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scenario;

pub use harness::{EvalConfig, EvaluationHarness, ScenarioRun};
pub use report::{MetricsReport, ModeMetrics, OverallMetrics, ScenarioRecord};
pub use runner::BatchRunner;
pub use scenario::{builtin_scenarios, sample_log_window, EvaluationScenario, MalformedScenario};
