//! Insights CLI - Command-line interface for the conversation analytics engine
//!
//! Commands:
//! - compute: Compute insights for conversation snapshots (batch mode)
//! - config: Print the default engine configuration
//! - doctor: Diagnose configuration and store health
//! - schema: Describe input and output formats

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use campus_insights::pipeline::{parse_snapshot_batch, parse_snapshot_lines};
use campus_insights::{
    persist_best_effort, ConversationInsights, InsightsConfig,
    InsightsEngine, InsightsError, JsonFileInsightsStore, ParticipantPair, INSIGHTS_VERSION,
    PRODUCER_NAME,
};
use tracing_subscriber::EnvFilter;

/// Insights - Conversation analytics for two-party chats
#[derive(Parser)]
#[command(name = "insights")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Compute conversation insights from message histories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute insights for conversation snapshots
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Order user_a / user_b lexicographically before computing
        #[arg(long)]
        canonicalize: bool,

        /// Merge results into this JSON insights store
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Print the default engine configuration
    Config {
        /// Output as compact JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and store health
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check an insights store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A snapshot object or an array of snapshots
    Json,
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one insights record per line)
    Ndjson,
    /// JSON array of insights records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (conversation snapshot)
    Input,
    /// Output schema (conversation insights)
    Output,
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by RUST_LOG (default: warn)
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), InsightsCliError> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            input_format,
            output_format,
            config,
            canonicalize,
            store,
        } => cmd_compute(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            canonicalize,
            store.as_deref(),
        ),

        Commands::Config { json } => cmd_config(json),

        Commands::Doctor {
            config,
            store,
            json,
        } => cmd_doctor(config.as_deref(), store.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_compute(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    canonicalize: bool,
    store: Option<&Path>,
) -> Result<(), InsightsCliError> {
    let engine = match config {
        Some(path) => InsightsEngine::with_config(load_config(path)?)?,
        None => InsightsEngine::default(),
    };

    let input_data = read_input(input)?;
    let mut snapshots = match input_format {
        InputFormat::Json => parse_snapshot_batch(&input_data)?,
        InputFormat::Ndjson => parse_snapshot_lines(&input_data)?,
    };

    if snapshots.is_empty() {
        return Err(InsightsCliError::NoSnapshots);
    }

    if canonicalize {
        for snapshot in &mut snapshots {
            let pair = ParticipantPair::canonical(snapshot.user_a.clone(), snapshot.user_b.clone());
            snapshot.user_a = pair.user_a;
            snapshot.user_b = pair.user_b;
        }
    }

    let results: Vec<ConversationInsights> = snapshots
        .iter()
        .map(|snapshot| engine.compute_snapshot(snapshot))
        .collect();

    // Store writes are best-effort: the computed output is still emitted
    if let Some(store_path) = store {
        let sink = JsonFileInsightsStore::new(store_path);
        let failed = results
            .iter()
            .filter(|insights| !persist_best_effort(&sink, insights))
            .count();
        if failed > 0 {
            tracing::warn!(
                store = %store_path.display(),
                failed,
                "Some insights could not be written to the store"
            );
        }
    }

    let output_data = format_output(&results, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_config(json: bool) -> Result<(), InsightsCliError> {
    let config = InsightsConfig::default();
    if json {
        println!("{}", serde_json::to_string(&config)?);
    } else {
        println!("{}", config.to_json()?);
    }
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, store: Option<&Path>, json: bool) -> Result<(), InsightsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "insights_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Insights version {}", INSIGHTS_VERSION),
    });

    if let Some(config_path) = config {
        let check = match load_config(config_path) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (burst gap {} ms, weights {}/{}/{})",
                    config.burst_gap_ms,
                    config.volume_weight,
                    config.reciprocity_weight,
                    config.responsiveness_weight
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    if let Some(store_path) = store {
        let check = if store_path.exists() {
            match JsonFileInsightsStore::new(store_path).load() {
                Ok(documents) => DoctorCheck {
                    name: "store".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Store readable ({} conversations)", documents.len()),
                },
                Err(e) => DoctorCheck {
                    name: "store".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            }
        } else {
            DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Warning,
                message: "Store file does not exist (it will be created on first write)".to_string(),
            }
        };
        checks.push(check);
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
            message: "stdin is a pipe (ready for `compute -i -`)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: INSIGHTS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Insights Doctor Report");
        println!("======================");
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
        Err(InsightsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), InsightsCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: conversation snapshot");
                println!();
                println!("- conversation_id: Opaque conversation key");
                println!("- user_a, user_b: Participant ids (use --canonicalize to order them)");
                println!("- messages: Array of messages, in any order");
                println!("  - sender_id (or senderId): Sender user id");
                println!("  - timestamp: Milliseconds since epoch");
                println!("  - other fields (id, message, receiverId, ...) are ignored");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: conversation insights");
                println!();
                println!("- conversation_id, user_a, user_b: Passed through from input");
                println!("- total_messages, a_sent, b_sent: Message counts");
                println!("- reciprocity: min(a_sent, b_sent) / max(a_sent, b_sent), 0-1");
                println!("- median_reply_time_ms: Median alternating-sender reply gap, or null");
                println!("- activity_score: 0.45 volume + 0.35 reciprocity + 0.20 responsiveness");
                println!("- bursts_total: Conversation sessions (gaps over 20 minutes split)");
                println!("- a_burst_starts, b_burst_starts: Sessions opened by each participant");
                println!("- a_last_word, b_last_word: Sessions closed by each participant");
                println!("- updated_at: Computation time, ms since epoch");
            }
        }
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, InsightsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: &Path) -> Result<InsightsConfig, InsightsError> {
    let content = fs::read_to_string(path)?;
    InsightsConfig::from_json(&content)
}

fn format_output(
    results: &[ConversationInsights],
    format: &OutputFormat,
) -> Result<String, InsightsCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for insights in results {
                lines.push(serde_json::to_string(insights)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "conversation.snapshot",
        "description": "Two-party message history to analyze",
        "type": "object",
        "required": ["conversation_id", "user_a", "user_b"],
        "properties": {
            "conversation_id": { "type": "string" },
            "user_a": { "type": "string" },
            "user_b": { "type": "string" },
            "messages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "sender_id": { "type": "string" },
                        "timestamp": { "type": "integer", "description": "ms since epoch" },
                        "id": { "type": "string" },
                        "message": { "type": "string" }
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "conversation.insights",
        "description": "Summary metrics for one two-party conversation",
        "type": "object",
        "required": [
            "conversation_id", "user_a", "user_b", "total_messages", "a_sent", "b_sent",
            "reciprocity", "median_reply_time_ms", "activity_score", "bursts_total",
            "a_burst_starts", "b_burst_starts", "a_last_word", "b_last_word", "updated_at"
        ],
        "properties": {
            "conversation_id": { "type": "string" },
            "user_a": { "type": "string" },
            "user_b": { "type": "string" },
            "total_messages": { "type": "integer", "minimum": 0 },
            "a_sent": { "type": "integer", "minimum": 0 },
            "b_sent": { "type": "integer", "minimum": 0 },
            "reciprocity": { "type": "number", "minimum": 0, "maximum": 1 },
            "median_reply_time_ms": { "type": ["integer", "null"], "minimum": 0 },
            "activity_score": { "type": "number", "minimum": 0, "maximum": 1 },
            "bursts_total": { "type": "integer", "minimum": 0 },
            "a_burst_starts": { "type": "integer", "minimum": 0 },
            "b_burst_starts": { "type": "integer", "minimum": 0 },
            "a_last_word": { "type": "integer", "minimum": 0 },
            "b_last_word": { "type": "integer", "minimum": 0 },
            "updated_at": { "type": "integer" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum InsightsCliError {
    Io(io::Error),
    Insights(InsightsError),
    Json(serde_json::Error),
    NoSnapshots,
    DoctorFailed,
}

impl From<io::Error> for InsightsCliError {
    fn from(e: io::Error) -> Self {
        InsightsCliError::Io(e)
    }
}

impl From<InsightsError> for InsightsCliError {
    fn from(e: InsightsError) -> Self {
        InsightsCliError::Insights(e)
    }
}

impl From<serde_json::Error> for InsightsCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightsCliError> for CliError {
    fn from(e: InsightsCliError) -> Self {
        match e {
            InsightsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightsCliError::Insights(InsightsError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'insights config' to see a valid configuration".to_string()),
            },
            InsightsCliError::Insights(InsightsError::Parse(msg)) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'insights schema input' for the expected format".to_string()),
            },
            InsightsCliError::Insights(e) => CliError {
                code: "INSIGHTS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'insights schema input' for the expected format".to_string()),
            },
            InsightsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightsCliError::NoSnapshots => CliError {
                code: "NO_SNAPSHOTS".to_string(),
                message: "No conversation snapshots found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            InsightsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
