//! Dona CLI - command-line interface for dona-metrics
//!
//! Commands:
//! - donors: List donor ids present in a dataset
//! - grid: Day×hour or day×conversation activity grid for one donor
//! - burstiness: B1/B2 indices and donor-level views
//! - gini: Gini coefficient and Lorenz curve over per-contact counts
//! - balance: Sent/received word bias per conversation
//! - series: Per-day totals with an optional moving average
//! - report: Full donor report payload
//! - doctor: Diagnose dataset health and configuration

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use dona_metrics::balance::{compute_interaction_balance, summarize_balance, DEFAULT_BALANCED_BELOW};
use dona_metrics::burstiness::{
    aggregate_burstiness, burstiness_by_conversation, classify_b1, dominant_behavior,
    most_extreme_chat,
};
use dona_metrics::dataset::{filter_conversation, filter_date_range, sent_only, Dataset};
use dona_metrics::gini::{calculate_gini, conversation_counts, lorenz_curve};
use dona_metrics::grid::{day_conversation_grid, day_hour_grid, sent_received_grid, threshold_grid};
use dona_metrics::report::{BalanceSection, BurstinessSection, InequalitySection, ReportEncoder};
use dona_metrics::series::{daily_series, moving_average, DailyMetric};
use dona_metrics::types::{BurstinessThresholds, CountMetric, Event};
use dona_metrics::{AnalysisError, PRODUCER_NAME, VERSION};

/// Dona - statistical computation core for donated message-log analysis
#[derive(Parser)]
#[command(name = "dona")]
#[command(version = VERSION)]
#[command(about = "Analyze communication behavior in donated message logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatasetArgs {
    /// Donation table path (NDJSON or JSON array)
    #[arg(long)]
    donations: PathBuf,

    /// Message table path (NDJSON or JSON array)
    #[arg(long)]
    messages: PathBuf,

    /// Restrict donations to one source platform (e.g. "WhatsApp")
    #[arg(long)]
    source: Option<String>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Donor id to analyze
    #[arg(short, long)]
    donor: String,

    /// Restrict to one conversation id
    #[arg(long)]
    chat: Option<String>,

    /// Inclusive start day (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Inclusive end day (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// List donor ids present in the dataset
    Donors {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Build an activity grid for one donor
    Grid {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Grid axis
        #[arg(long, default_value = "hour")]
        axis: GridAxis,

        /// Cell aggregation for the hour axis
        #[arg(long, default_value = "words")]
        metric: MetricArg,

        /// Binarize cells: active iff value >= threshold
        #[arg(long)]
        threshold: Option<u64>,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Burstiness indices and donor-level views
    Burstiness {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Which view to print
        #[arg(long, default_value = "full")]
        view: BurstinessView,

        /// B1 below this classifies Regular
        #[arg(long, default_value = "-0.2", allow_hyphen_values = true)]
        regular_below: f64,

        /// B1 above this classifies Bursty
        #[arg(long, default_value = "0.2")]
        bursty_above: f64,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Gini coefficient and Lorenz curve over per-contact counts
    Gini {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Count messages or summed words
        #[arg(long, default_value = "messages")]
        metric: MetricArg,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Sent/received word bias per conversation
    Balance {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Mean |bias| below this classifies Balanced
        #[arg(long, default_value_t = DEFAULT_BALANCED_BELOW)]
        balanced_below: f64,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Per-day totals over the donor's full calendar range
    Series {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Per-day quantity
        #[arg(long, default_value = "words")]
        metric: SeriesMetric,

        /// Also emit a trailing moving average with this window
        #[arg(long)]
        window: Option<usize>,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Full donor report payload
    Report {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Diagnose dataset health and configuration
    Doctor {
        /// Donation table to check
        #[arg(long)]
        donations: Option<PathBuf>,

        /// Message table to check
        #[arg(long)]
        messages: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GridAxis {
    /// Day × hour-of-day, donor-sent messages
    Hour,
    /// Day × conversation, message counts over all traffic
    Chat,
    /// Day × conversation, sent/received combined encoding
    Combined,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Messages,
    Words,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeriesMetric {
    Words,
    Messages,
    ActiveConversations,
}

impl From<SeriesMetric> for DailyMetric {
    fn from(metric: SeriesMetric) -> Self {
        match metric {
            SeriesMetric::Words => DailyMetric::Words,
            SeriesMetric::Messages => DailyMetric::Messages,
            SeriesMetric::ActiveConversations => DailyMetric::ActiveConversations,
        }
    }
}

impl From<MetricArg> for CountMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Messages => CountMetric::Messages,
            MetricArg::Words => CountMetric::Words,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BurstinessView {
    /// Union of all event days as one day-set
    Aggregate,
    /// One result per conversation
    PerChat,
    /// Most frequent classification label(s)
    Dominant,
    /// Conversation with the largest |B1|
    Extreme,
    /// All of the above
    Full,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DonaCliError> {
    match cli.command {
        Commands::Donors { dataset } => {
            let dataset = load_dataset(&dataset)?;
            print_value(&serde_json::json!({ "donors": dataset.donor_ids() }), OutputFormat::JsonPretty)
        }

        Commands::Grid {
            dataset,
            selection,
            axis,
            metric,
            threshold,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;

            let value = match axis {
                GridAxis::Hour => {
                    let sent = sent_only(&events, &selection.donor);
                    let grid = day_hour_grid(&sent, metric.into())?;
                    match threshold {
                        Some(t) => serde_json::to_value(threshold_grid(&grid, t))?,
                        None => serde_json::to_value(grid)?,
                    }
                }
                GridAxis::Chat => {
                    let grid = day_conversation_grid(&events)?;
                    match threshold {
                        Some(t) => serde_json::to_value(threshold_grid(&grid, t))?,
                        None => serde_json::to_value(grid)?,
                    }
                }
                GridAxis::Combined => {
                    serde_json::to_value(sent_received_grid(&events, &selection.donor)?)?
                }
            };
            print_value(&value, output_format)
        }

        Commands::Burstiness {
            dataset,
            selection,
            view,
            regular_below,
            bursty_above,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;
            let sent = sent_only(&events, &selection.donor);
            let thresholds = BurstinessThresholds {
                regular_below,
                bursty_above,
            };

            let per_chat = burstiness_by_conversation(&sent, &thresholds);
            let aggregate = aggregate_burstiness(&sent);
            let section = BurstinessSection {
                aggregate,
                aggregate_class: classify_b1(aggregate.b1, &thresholds),
                dominant: dominant_behavior(&per_chat),
                most_extreme: most_extreme_chat(&per_chat).cloned(),
                per_chat,
            };

            let value = match view {
                BurstinessView::Aggregate => serde_json::json!({
                    "aggregate": section.aggregate,
                    "class": section.aggregate_class,
                }),
                BurstinessView::PerChat => serde_json::to_value(&section.per_chat)?,
                BurstinessView::Dominant => serde_json::to_value(&section.dominant)?,
                BurstinessView::Extreme => serde_json::to_value(&section.most_extreme)?,
                BurstinessView::Full => serde_json::to_value(&section)?,
            };
            print_value(&value, output_format)
        }

        Commands::Gini {
            dataset,
            selection,
            metric,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;
            let metric: CountMetric = metric.into();

            let counts = conversation_counts(&events, &selection.donor, metric);
            let section = InequalitySection {
                metric,
                gini: calculate_gini(&counts),
                lorenz: lorenz_curve(&counts),
            };
            print_value(&serde_json::to_value(&section)?, output_format)
        }

        Commands::Balance {
            dataset,
            selection,
            balanced_below,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;

            let records = compute_interaction_balance(&events, &selection.donor);
            let section = BalanceSection {
                summary: summarize_balance(&records, balanced_below),
                records,
            };
            print_value(&serde_json::to_value(&section)?, output_format)
        }

        Commands::Series {
            dataset,
            selection,
            metric,
            window,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;
            let series = daily_series(&events, metric.into())?;

            let value = match window {
                Some(window) => serde_json::json!({
                    "metric": series.metric,
                    "days": series.days,
                    "values": series.values,
                    "moving_average": moving_average(&series.values, window),
                }),
                None => serde_json::to_value(&series)?,
            };
            print_value(&value, output_format)
        }

        Commands::Report {
            dataset,
            selection,
            output_format,
        } => {
            let loaded = load_dataset(&dataset)?;
            let events = select_events(&loaded, &selection)?;
            let report = ReportEncoder::new().encode(&selection.donor, &events)?;
            print_value(&serde_json::to_value(&report)?, output_format)
        }

        Commands::Doctor {
            donations,
            messages,
            json,
        } => cmd_doctor(donations.as_deref(), messages.as_deref(), json),
    }
}

fn load_dataset(args: &DatasetArgs) -> Result<Dataset, DonaCliError> {
    let donations = fs::read_to_string(&args.donations)?;
    let messages = fs::read_to_string(&args.messages)?;
    let mut dataset = Dataset::from_json(&donations, &messages)?;
    if let Some(source) = &args.source {
        dataset = dataset.restrict_to_source(source);
    }
    Ok(dataset)
}

fn select_events(dataset: &Dataset, selection: &SelectionArgs) -> Result<Vec<Event>, DonaCliError> {
    let mut events = dataset.donor_events(&selection.donor)?;
    if let Some(chat) = &selection.chat {
        events = filter_conversation(events, chat)?;
    }
    events = filter_date_range(events, selection.start, selection.end);
    Ok(events)
}

fn print_value(value: &serde_json::Value, format: OutputFormat) -> Result<(), DonaCliError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn cmd_doctor(
    donations: Option<&std::path::Path>,
    messages: Option<&std::path::Path>,
    json: bool,
) -> Result<(), DonaCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{PRODUCER_NAME} {VERSION}"),
    });

    match (donations, messages) {
        (Some(donations_path), Some(messages_path)) => {
            match (
                fs::read_to_string(donations_path),
                fs::read_to_string(messages_path),
            ) {
                (Ok(donations_text), Ok(messages_text)) => {
                    match Dataset::from_json(&donations_text, &messages_text) {
                        Ok(dataset) => {
                            checks.push(DoctorCheck {
                                name: "dataset".to_string(),
                                status: CheckStatus::Ok,
                                message: format!(
                                    "{} donations, {} messages, {} donors",
                                    dataset.donation_count(),
                                    dataset.message_count(),
                                    dataset.donor_ids().len()
                                ),
                            });
                        }
                        Err(e) => {
                            checks.push(DoctorCheck {
                                name: "dataset".to_string(),
                                status: CheckStatus::Error,
                                message: format!("Dataset does not parse: {e}"),
                            });
                        }
                    }
                }
                (donations_read, messages_read) => {
                    let mut failures = Vec::new();
                    if let Err(e) = donations_read {
                        failures.push(format!("donations: {e}"));
                    }
                    if let Err(e) = messages_read {
                        failures.push(format!("messages: {e}"));
                    }
                    checks.push(DoctorCheck {
                        name: "dataset".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read dataset ({})", failures.join("; ")),
                    });
                }
            }
        }
        (None, None) => {
            checks.push(DoctorCheck {
                name: "dataset".to_string(),
                status: CheckStatus::Warning,
                message: "No dataset paths supplied, skipping dataset check".to_string(),
            });
        }
        _ => {
            checks.push(DoctorCheck {
                name: "dataset".to_string(),
                status: CheckStatus::Warning,
                message: "Both --donations and --messages are needed for a dataset check"
                    .to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Dona Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(DonaCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum DonaCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for DonaCliError {
    fn from(e: io::Error) -> Self {
        DonaCliError::Io(e)
    }
}

impl From<AnalysisError> for DonaCliError {
    fn from(e: AnalysisError) -> Self {
        DonaCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for DonaCliError {
    fn from(e: serde_json::Error) -> Self {
        DonaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DonaCliError> for CliError {
    fn from(e: DonaCliError) -> Self {
        match e {
            DonaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DonaCliError::Analysis(AnalysisError::EmptyInput(message)) => CliError {
                code: "NO_DATA".to_string(),
                message,
                hint: Some("Widen the date range or drop the conversation filter".to_string()),
            },
            DonaCliError::Analysis(e @ AnalysisError::UnknownDonor(_)) => CliError {
                code: "UNKNOWN_DONOR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'dona donors' to list valid donor ids".to_string()),
            },
            DonaCliError::Analysis(e @ AnalysisError::UnknownConversation(_)) => CliError {
                code: "UNKNOWN_CONVERSATION".to_string(),
                message: e.to_string(),
                hint: Some("Conversation ids are listed in the grid and report outputs".to_string()),
            },
            DonaCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            DonaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DonaCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
