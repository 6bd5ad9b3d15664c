//! SafeScan - PII detection, data classification and compliance reporting
//!
//! Command-line wrapper around the library for classifying, redacting and
//! reporting on local files or stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use safescan::{
    audit::ComplianceReporter,
    config::SafeScanConfig,
    privacy::{ClassificationContext, DataClassifier, DataInput, Redactor},
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "safescan")]
#[command(version)]
#[command(about = "PII detection, data classification and compliance reporting")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SAFESCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a file (or stdin) and print the result as JSON
    Classify {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,

        /// Identifier recorded in the result
        #[arg(long)]
        data_id: Option<String>,

        /// Caller context as key=value (repeatable)
        #[arg(long = "context", value_parser = parse_context_pair)]
        context: Vec<(String, String)>,
    },

    /// Redact detected PII and print the redacted input
    Redact {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
    },

    /// Classify files and print an aggregate compliance report
    Report {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,

        /// Report window in days (defaults to reporting.default_window_days)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON objects and arrays are structured, anything else is text
    Auto,
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("safescan={}", log_level).into()),
    );
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => SafeScanConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SafeScanConfig::default(),
    };

    match cli.command {
        Commands::Classify {
            input,
            format,
            data_id,
            context,
        } => {
            let context: ClassificationContext = context.into_iter().collect();
            run_classify(&config, input.as_deref(), format, data_id.as_deref(), &context)?;
        }
        Commands::Redact { input, format } => {
            run_redact(&config, input.as_deref(), format)?;
        }
        Commands::Report {
            inputs,
            format,
            days,
        } => {
            run_report(&config, &inputs, format, days).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn run_classify(
    config: &SafeScanConfig,
    path: Option<&Path>,
    format: InputFormat,
    data_id: Option<&str>,
    context: &ClassificationContext,
) -> Result<()> {
    let classifier = DataClassifier::new(config)?;
    let input = read_input(path, format)?;
    let context = (!context.is_empty()).then_some(context);

    let result = classifier.classify(&input, data_id, context)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_redact(config: &SafeScanConfig, path: Option<&Path>, format: InputFormat) -> Result<()> {
    let classifier = DataClassifier::new(config)?;
    let redactor = Redactor::new(&config.redaction);
    let input = read_input(path, format)?;

    let result = classifier.classify(&input, None, None)?;
    match redactor.redact(&input, &result) {
        DataInput::Text(text) => print!("{}", text),
        DataInput::Structured(value) => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

async fn run_report(
    config: &SafeScanConfig,
    paths: &[PathBuf],
    format: InputFormat,
    days: Option<u32>,
) -> Result<()> {
    let classifier = DataClassifier::new(config)?;
    let reporter = ComplianceReporter::new(&config.reporting)?;

    for path in paths {
        let input = read_input(Some(path.as_path()), format)?;
        let data_id = path.display().to_string();
        match classifier.classify(&input, Some(data_id.as_str()), None) {
            Ok(result) => reporter.add_result(&result).await?,
            Err(e) if e.is_validation_error() => {
                tracing::warn!(path = %path.display(), "Skipping input: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let report = match days {
        Some(days) => reporter.generate_report(days).await?,
        None => reporter.generate_default_report().await?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_input(path: Option<&Path>, format: InputFormat) -> Result<DataInput> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    Ok(match format {
        InputFormat::Text => DataInput::Text(content),
        InputFormat::Json => DataInput::from(
            serde_json::from_str::<serde_json::Value>(&content).context("Input is not valid JSON")?,
        ),
        InputFormat::Auto => match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                DataInput::Structured(value)
            }
            _ => DataInput::Text(content),
        },
    })
}

fn parse_context_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn show_config(config: Option<&SafeScanConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
