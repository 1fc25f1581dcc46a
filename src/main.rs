use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use pipetimer::data::Thresholds;
use pipetimer::{
    report, EventLogAggregator, JobDefinitionProcessor, RawJob, RawRun, RawRunOutput,
    RunDetailProcessor, RunHistoryAnalyzer, RunListPage, RunRecord, Settings, TracingDiagnostics,
};

#[derive(Parser, Debug)]
#[command(name = "pipetimer")]
#[command(version, about = "Efficiency reports for Spark/Databricks job runs")]
struct Args {
    /// Settings file (TOML, JSON or YAML); PIPETIMER_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a Spark event log (plain or gzip-compressed)
    ParseLog {
        /// Path to the event log
        path: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze run history from a run-record list or a runs/list page
    History {
        /// JSON file: an array of run records, or a `jobs/runs/list` response
        runs: PathBuf,

        /// Only keep listed runs with these result states (runs/list input only)
        #[arg(long, value_delimiter = ',')]
        result_state: Vec<String>,

        /// Print chart points (start time, duration in minutes) instead of the report
        #[arg(long, conflicts_with = "json")]
        plot_points: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a single run
    Run {
        /// JSON file from `jobs/runs/get`
        run: PathBuf,

        /// JSON file from `jobs/runs/get-output`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a job definition
    Job {
        /// JSON file from `jobs/get`
        job: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())?;
    init_tracing(&settings.log_level, args.verbose);
    if let Some(path) = args.config.as_deref().filter(|p| !p.exists()) {
        warn!("Settings file {} not found, using defaults", path.display());
    }
    debug!(?settings, "Loaded settings");

    let thresholds = settings.thresholds();
    match args.command {
        Command::ParseLog { path, json } => parse_log(&path, json),
        Command::History {
            runs,
            result_state,
            plot_points,
            json,
        } => history(&runs, &result_state, plot_points, json, thresholds),
        Command::Run { run, output, json } => {
            run_summary(&run, output.as_deref(), json, thresholds)
        }
        Command::Job { job, json } => job_details(&job, json),
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str, verbose: u8) {
    let level = match verbose {
        0 => log_level,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_log(path: &Path, json: bool) -> Result<()> {
    let aggregator = EventLogAggregator::new(TracingDiagnostics::boxed("event_log"));
    let parsed = aggregator.parse_file(path)?;
    let summary = parsed.summary();

    if json {
        print_json(&summary)
    } else {
        println!("{}", report::render_event_log(&summary));
        Ok(())
    }
}

fn history(
    path: &Path,
    result_states: &[String],
    plot_points: bool,
    json: bool,
    thresholds: Thresholds,
) -> Result<()> {
    let analyzer = RunHistoryAnalyzer::new(TracingDiagnostics::boxed("history"), thresholds);

    let input: serde_json::Value = read_json(path)?;
    let records: Vec<RunRecord> = if input.is_array() {
        serde_json::from_value(input)
            .with_context(|| format!("{} is not a list of run records", path.display()))?
    } else {
        let page: RunListPage = serde_json::from_value(input)
            .with_context(|| format!("{} is not a runs/list response", path.display()))?;
        let filter: Vec<&str> = result_states.iter().map(String::as_str).collect();
        analyzer.select_completed_runs(&page.runs, Some(filter.as_slice()))
    };

    if plot_points {
        return print_json(&analyzer.plot_points(&records));
    }

    let history_report = analyzer.analyze(&records);
    if json {
        match &history_report {
            Some(report) => print_json(report),
            None => print_json(&serde_json::json!({ "error": "No runs to analyze." })),
        }
    } else {
        println!("{}", report::render_history(history_report.as_ref()));
        Ok(())
    }
}

fn run_summary(
    run_path: &Path,
    output_path: Option<&Path>,
    json: bool,
    thresholds: Thresholds,
) -> Result<()> {
    let run: RawRun = read_json(run_path)?;
    let output: Option<RawRunOutput> = output_path.map(read_json).transpose()?;

    let processor = RunDetailProcessor::new(TracingDiagnostics::boxed("run"), thresholds);
    let summary = processor.process(Some(&run), output.as_ref());

    if json {
        print_json(&summary)
    } else {
        println!("{}", report::render_run_summary(summary.as_ref()));
        Ok(())
    }
}

fn job_details(path: &Path, json: bool) -> Result<()> {
    let job: RawJob = read_json(path)?;
    let processor = JobDefinitionProcessor::new(TracingDiagnostics::boxed("job"));
    let details = processor.process(Some(&job));

    if json {
        print_json(&details)
    } else {
        println!("{}", report::render_job_details(details.as_ref()));
        Ok(())
    }
}
