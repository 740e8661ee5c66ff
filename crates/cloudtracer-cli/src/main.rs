// CloudTracer CLI - Retrieval-Augmented Root Cause Analysis

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloudtracer_core::{AnalysisMode, LogWindow};
use cloudtracer_eval::{
    builtin_scenarios, sample_log_window, BatchRunner, EvalConfig, EvaluationHarness,
    MetricsReport, ModeMetrics,
};
use cloudtracer_rca::{
    load_config, CannedClient, CompletionClient, ImportanceClassifier, ImportanceModel,
    LexicalIndex, RcaAnalyzer, RcaConfig, ReasoningSynthesizer, SimilarityRetriever,
};

#[derive(Parser)]
#[command(name = "cloudtracer")]
#[command(version = "0.1.0")]
#[command(about = "Retrieval-augmented root cause analysis for cloud logs", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML); defaults apply when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose one issue against a log window
    Analyze {
        /// Issue description in natural language
        issue: String,

        /// Log window file, one JSON entry per line
        #[arg(short, long)]
        logs: PathBuf,

        /// Analysis mode (fast, hybrid)
        #[arg(short, long, default_value = "fast")]
        mode: AnalysisMode,
    },

    /// Run the scenario evaluation suite and write a metrics report
    Evaluate {
        /// Report artifact path
        #[arg(short, long, default_value = "rca_metrics_report.json")]
        output: PathBuf,

        /// Use the offline scripted backend instead of a live LLM
        #[arg(long)]
        mock: bool,

        /// Root-cause accuracy threshold override
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Log window file; the builtin sample window when absent
        #[arg(short, long)]
        logs: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RcaConfig::with_defaults(),
    };

    match cli.command {
        Commands::Analyze { issue, logs, mode } => {
            run_analyze(config, &issue, &logs, mode).await?;
        }
        Commands::Evaluate {
            output,
            mock,
            threshold,
            logs,
        } => {
            run_evaluate(config, &output, mock, threshold, logs.as_deref()).await?;
        }
    }

    Ok(())
}

fn load_window(path: &Path) -> Result<LogWindow, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(LogWindow::from_json_lines(&content)?)
}

fn build_analyzer(
    config: RcaConfig,
    window: &LogWindow,
    client: Option<Box<dyn CompletionClient>>,
) -> Result<RcaAnalyzer, Box<dyn std::error::Error>> {
    let retriever = SimilarityRetriever::new(
        Box::new(LexicalIndex::from_window(window)),
        config.retrieval.similarity_threshold,
    );
    let model = config.classifier.model_path.as_ref().and_then(ImportanceModel::load);
    let classifier = ImportanceClassifier::new(model, config.classifier.importance_keywords.clone());
    let synthesizer = match client {
        Some(client) => ReasoningSynthesizer::new(client, &config.synthesis),
        None => ReasoningSynthesizer::from_config(&config.synthesis)?,
    };
    Ok(RcaAnalyzer::new(config, Some(retriever), classifier, synthesizer))
}

async fn run_analyze(
    config: RcaConfig,
    issue: &str,
    logs: &Path,
    mode: AnalysisMode,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "🔎 Root Cause Analysis".cyan().bold());
    println!("{}", "─".repeat(60).dimmed());
    println!("{} {}", "Issue:".dimmed(), issue);
    println!("{} {}", "Mode:".dimmed(), mode.to_string().magenta());

    let window = load_window(logs)?;
    println!("{} {} entries from {:?}", "Window:".dimmed(), window.len(), logs);

    let analyzer = build_analyzer(config, &window, None)?;
    let result = analyzer.analyze(issue, &window, mode).await?;

    println!("\n{}", "Diagnosis:".green().bold());
    println!("{}", result.root_cause_analysis);

    println!("\n{}", "─".repeat(60).dimmed());
    println!(
        "{} {} | {} {} | {} {:.2}s",
        "Category:".dimmed(),
        result.issue_category.yellow(),
        "Relevant logs:".dimmed(),
        result.relevant_logs_count.to_string().cyan(),
        "Time:".dimmed(),
        result.elapsed_seconds()
    );
    if result.vector_db_used {
        println!("{}", "Similarity retrieval narrowed the context".dimmed());
    }
    if result.classifier_fallback {
        println!("{}", "Importance scoring used keyword rules (no trained model)".dimmed());
    }

    Ok(())
}

// Offline backend for --mock runs: issue-description phrases route each
// builtin scenario to a scripted diagnosis.
fn mock_client() -> Box<dyn CompletionClient> {
    Box::new(
        CannedClient::new("no clear diagnosis available from the provided logs")
            .with_rule(
                "instance launch failing",
                "Insufficient disk space available on the compute hosts. \
                 The scheduler rejected every candidate host as a result.",
            )
            .with_rule(
                "cannot obtain ip addresses",
                "DHCP lease allocation failed so network configuration hit a timeout. \
                 Instances never received IP addresses.",
            )
            .with_rule(
                "across platform components",
                "Token validation failed because the keystone token had expired. \
                 Authentication errors then cascaded across components.",
            ),
    )
}

async fn run_evaluate(
    config: RcaConfig,
    output: &Path,
    mock: bool,
    threshold: Option<f64>,
    logs: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "📊 RCA Evaluation Suite".cyan().bold());
    println!("{}", "─".repeat(60).dimmed());

    let window = match logs {
        Some(path) => load_window(path)?,
        None => sample_log_window(),
    };
    let scenarios = builtin_scenarios();
    println!(
        "{} {} scenarios over {} log entries{}",
        "Running:".dimmed(),
        scenarios.len(),
        window.len(),
        if mock { " (mocked backend)".yellow().to_string() } else { String::new() }
    );

    let client = if mock { Some(mock_client()) } else { None };
    let analyzer = Arc::new(build_analyzer(config, &window, client)?);

    let runs = BatchRunner::new(analyzer)
        .run(&scenarios, &window, &[AnalysisMode::Fast, AnalysisMode::Hybrid])
        .await?;

    let mut eval_config = if mock { EvalConfig::mocked() } else { EvalConfig::default() };
    if let Some(threshold) = threshold {
        eval_config.accuracy_threshold = threshold;
    }
    let report = EvaluationHarness::new(eval_config).evaluate(&runs);
    report.write_artifact(output)?;

    print_report(&report);
    println!("\n{} {:?}", "Report written to".dimmed(), output);
    Ok(())
}

fn print_report(report: &MetricsReport) {
    fn metric(m: &Option<ModeMetrics>, pick: impl Fn(&ModeMetrics) -> f64) -> String {
        m.as_ref().map(|m| format!("{:.4}", pick(m))).unwrap_or_else(|| "N/A".to_string())
    }

    let fast = &report.metrics.fast_mode;
    let hybrid = &report.metrics.hybrid_mode;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Fast Mode", "Hybrid Mode"]);
    table.add_row(vec![
        "Mean Reciprocal Rank".to_string(),
        metric(fast, |m| m.mean_reciprocal_rank),
        metric(hybrid, |m| m.mean_reciprocal_rank),
    ]);
    table.add_row(vec![
        "Root Cause Accuracy".to_string(),
        metric(fast, |m| m.root_cause_accuracy),
        metric(hybrid, |m| m.root_cause_accuracy),
    ]);
    table.add_row(vec![
        "Category Accuracy".to_string(),
        metric(fast, |m| m.category_accuracy),
        metric(hybrid, |m| m.category_accuracy),
    ]);
    fn count(m: &Option<ModeMetrics>, pick: impl Fn(&ModeMetrics) -> usize) -> String {
        m.as_ref().map(|m| pick(m).to_string()).unwrap_or_else(|| "N/A".to_string())
    }

    table.add_row(vec![
        "Scenarios Completed".to_string(),
        count(fast, |m| m.scenarios_completed),
        count(hybrid, |m| m.scenarios_completed),
    ]);
    table.add_row(vec![
        "Scenarios Failed".to_string(),
        count(fast, |m| m.scenarios_failed),
        count(hybrid, |m| m.scenarios_failed),
    ]);
    table.add_row(vec![
        "Avg Analysis Time (s)".to_string(),
        metric(fast, |m| m.avg_analysis_time),
        metric(hybrid, |m| m.avg_analysis_time),
    ]);
    println!("{table}");

    if let Some(overall) = &report.metrics.overall {
        println!(
            "\n{} {} | {} {} | {} {}",
            "Overall MRR:".dimmed(),
            format!("{:.4}", overall.average_mrr).green(),
            "Hybrid MRR gain:".dimmed(),
            format!("{:+.4}", overall.hybrid_improvement_mrr).yellow(),
            "Verdict:".dimmed(),
            if overall.system_performance == "production_ready" {
                overall.system_performance.green().bold()
            } else {
                overall.system_performance.red().bold()
            }
        );
    }
}
