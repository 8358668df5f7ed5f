//! # logsift - CLI Entry Point
//!
//! Command-line front end for the log parsing pipeline.
//!
//! Commands:
//! - `parse`       - Parse a log and print records, service summaries and hints
//! - `search`      - Parse a log and print only the records matching a query
//! - `init-config` - Generate a default configuration file

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use logsift::loader::{InputSource, Loaded, Loader};
use logsift::{
    search, LogFormat, LogRecord, ParseOutput, Pipeline, Query, SiftConfig, SiftError,
    SiftResult,
};

/// logsift - classify and summarize auth.log, syslog and Apache access logs.
#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value_os_t = SiftConfig::default_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Where the log text comes from, shared by `parse` and `search`.
#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Log format: auth.log, syslog or apache_access.
    #[arg(short, long)]
    format: Option<String>,

    /// Read the log from a file.
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Use inline log text.
    #[arg(long)]
    text: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a log and print records, per-service summaries and hints.
    Parse {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Parse a log and print the records matching a query.
    ///
    /// Query words of the form `field=value` filter that field; other words
    /// are matched against the message.
    Search {
        #[command(flatten)]
        input: InputArgs,

        /// Query terms, e.g. `service=sshd severity=high`.
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Generate a default configuration file.
    InitConfig,
}

#[tokio::main]
async fn main() -> SiftResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { input } => cmd_parse(&cli.config, input).await,
        Commands::Search { input, query } => cmd_search(&cli.config, input, &query).await,
        Commands::InitConfig => cmd_init_config(&cli.config),
    }
}

fn load_config(config_path: &Path) -> SiftResult<SiftConfig> {
    if config_path.exists() {
        info!("Loading configuration from: {}", config_path.display());
        SiftConfig::from_file(config_path)
    } else {
        info!("No config file found, using defaults. Run 'init-config' to generate one.");
        Ok(SiftConfig::default())
    }
}

/// Load the input and run the pipeline. `None` means the load went stale.
async fn run_input(config: &SiftConfig, input: &InputArgs) -> SiftResult<Option<ParseOutput>> {
    let format = match &input.format {
        Some(tag) => tag.parse::<LogFormat>()?,
        None => config.general.default_format,
    };

    let source = match (&input.text, &input.file) {
        (Some(text), _) => InputSource::Text(text.clone()),
        (None, file) => InputSource::File(file.clone()),
    };

    let text = match Loader::default().load(source).await? {
        Loaded::Current(text) => text,
        Loaded::Stale => return Ok(None),
    };

    Pipeline::from_config(config).run(&text, format).map(Some)
}

/// Parse a log and print everything the pipeline produced.
async fn cmd_parse(config_path: &Path, input: InputArgs) -> SiftResult<()> {
    let config = load_config(config_path)?;
    let Some(output) = run_input(&config, &input).await? else {
        warn!("Input superseded by a newer run; nothing to print");
        return Ok(());
    };

    if input.json || config.output.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Format: {}", output.format);
    println!();
    print_records(&output.records, output.format, config.output.max_rows);
    println!();
    print_services(&output);
    println!();
    for hint in &output.hints {
        println!("  {:<32} {}", hint.title, hint.value);
    }

    Ok(())
}

/// Parse a log and print only the matching records.
async fn cmd_search(config_path: &Path, input: InputArgs, words: &[String]) -> SiftResult<()> {
    let config = load_config(config_path)?;
    let Some(output) = run_input(&config, &input).await? else {
        warn!("Input superseded by a newer run; nothing to print");
        return Ok(());
    };

    let query = Query::parse(&words.join(" "));
    let hits = search(&output.records, &query)?;
    info!("{} of {} record(s) matched", hits.len(), output.records.len());

    if input.json || config.output.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    let owned: Vec<LogRecord> = hits.into_iter().cloned().collect();
    print_records(&owned, output.format, config.output.max_rows);
    Ok(())
}

/// Generate a default configuration file.
fn cmd_init_config(config_path: &Path) -> SiftResult<()> {
    if config_path.exists() {
        return Err(SiftError::Config(format!(
            "Configuration file already exists: {}. Remove it first or use a different path.",
            config_path.display()
        )));
    }

    SiftConfig::write_default(config_path)?;
    println!("Default configuration written to: {}", config_path.display());
    println!();
    println!("Key settings:");
    println!("  [general] - default_format used when --format is omitted");
    println!("  [hints]   - top_paths listed by the Most Requested Path hint");
    println!("  [output]  - json output and max_rows printed per table");

    Ok(())
}

// ---------------------------------------------------------------------------
// Table output
// ---------------------------------------------------------------------------

fn dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn print_records(records: &[LogRecord], format: LogFormat, max_rows: usize) {
    let max_rows = if max_rows == 0 { usize::MAX } else { max_rows };
    match format {
        LogFormat::ApacheAccess => {
            println!(
                "{:<39} {:<7} {:<30} {:>6} {:>8} {:<8}",
                "IP", "METHOD", "PATH", "STATUS", "BYTES", "SEVERITY"
            );
            for r in records.iter().take(max_rows) {
                let status = r.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                println!(
                    "{:<39} {:<7} {:<30} {:>6} {:>8} {:<8}",
                    dash(&r.ip),
                    dash(&r.method),
                    dash(&r.path),
                    status,
                    dash(&r.bytes),
                    r.severity.as_str()
                );
            }
        }
        LogFormat::Auth | LogFormat::Syslog => {
            println!(
                "{:<32} {:<16} {:<18} {:<8} MESSAGE",
                "TIMESTAMP", "HOST", "SERVICE", "SEVERITY"
            );
            for r in records.iter().take(max_rows) {
                println!(
                    "{:<32} {:<16} {:<18} {:<8} {}",
                    r.timestamp,
                    dash(&r.host),
                    r.service,
                    r.severity.as_str(),
                    r.message
                );
            }
        }
    }

    if records.len() > max_rows {
        println!("... {} more record(s) not shown", records.len() - max_rows);
    }
}

fn print_services(output: &ParseOutput) {
    println!(
        "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "SERVICE", "EVENTS", "LOW", "MEDIUM", "HIGH", "CRITICAL"
    );
    for s in &output.summaries {
        println!(
            "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
            s.service,
            s.logged_events(),
            s.counts.low,
            s.counts.medium,
            s.counts.high,
            s.counts.critical
        );
    }
    let t = &output.totals;
    println!(
        "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Total", t.records, t.counts.low, t.counts.medium, t.counts.high, t.counts.critical
    );
}
