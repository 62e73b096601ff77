//! rdlbind CLI - Inspect report definitions and load their datasets
//!
//! Usage:
//!   rdlbind inspect <file.rdlc>
//!   rdlbind load <file.rdlc> [--dataset <name>]... [--param NAME=VALUE]... [--prompt]
//!
//! Examples:
//!   rdlbind inspect reports/sales.rdlc
//!   rdlbind load reports/sales.rdlc --dataset Orders --param ID=42
//!   RDLBIND_LOG=rdlbind=debug rdlbind load reports/sales.rdlc --prompt

use clap::{Parser, Subcommand};
use rdlbind::binding::ReportParameters;
use rdlbind::config::{ConnectionRequest, Settings};
use rdlbind::definition::{parse_definition, ReportDefinition};
use rdlbind::engine::{
    ConfiguredCredentials, Connect, CredentialProvider, EngineResult, SqliteConnection,
};
use rdlbind::error::render_chain;
use rdlbind::report::{load_report_data, LoadOutcome};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rdlbind")]
#[command(about = "rdlbind - Inspect report definitions and load their datasets")]
#[command(version)]
struct Cli {
    /// Path to a settings file (defaults to RDLBIND_CONFIG, ./rdlbind.toml, user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show data sources, datasets and report parameters
    Inspect {
        /// Path to the .rdl/.rdlc file
        file: PathBuf,
    },

    /// Execute dataset queries and print the results as JSON
    Load {
        /// Path to the .rdl/.rdlc file
        file: PathBuf,

        /// Dataset to load (repeatable; loads every dataset if omitted)
        #[arg(short, long = "dataset")]
        datasets: Vec<String>,

        /// Report parameter value as NAME=VALUE (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Prompt for credentials on the terminal instead of using settings
        #[arg(long)]
        prompt: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", render_chain(&e));
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match cli.command {
        Commands::Inspect { file } => cmd_inspect(&file),
        Commands::Load {
            file,
            datasets,
            params,
            prompt,
        } => cmd_load(&file, datasets, &params, prompt, settings),
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_env("RDLBIND_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_definition(file: &Path) -> Result<ReportDefinition, ExitCode> {
    parse_definition(file).map_err(|e| {
        eprintln!("Error: {}", e.render());
        ExitCode::FAILURE
    })
}

fn cmd_inspect(file: &Path) -> ExitCode {
    let definition = match read_definition(file) {
        Ok(d) => d,
        Err(code) => return code,
    };

    println!("File: {}", file.display());
    if let Some(ns) = &definition.namespace {
        println!("Namespace: {}", ns);
    }
    println!();

    if !definition.data_sources.is_empty() {
        println!("Data sources:");
        for source in &definition.data_sources {
            match &source.reference {
                Some(reference) => println!(
                    "  - {} (via {}.rds): {}",
                    source.name, reference, source.connection_string
                ),
                None => println!("  - {}: {}", source.name, source.connection_string),
            }
        }
        println!();
    }

    if !definition.datasets.is_empty() {
        println!("Datasets:");
        for dataset in &definition.datasets {
            println!("  - {} (source: {})", dataset.name, dataset.data_source_name);
            println!("      {}", dataset.command_text);
            for binding in &dataset.query_parameters {
                println!("      {} <- {}", binding.name, binding.value_expression);
            }
        }
        println!();
    }

    if !definition.parameters.is_empty() {
        println!("Report parameters:");
        for param in &definition.parameters {
            let mut line = format!("  - {} ({})", param.name, param.data_type.as_str());
            if param.multi_value {
                line.push_str(" multi-value");
            }
            let defaults: Vec<&str> = param
                .default_values
                .iter()
                .chain(&param.default_expressions)
                .map(String::as_str)
                .collect();
            if !defaults.is_empty() {
                line.push_str(&format!(" default: {}", defaults.join(", ")));
            }
            if let Some(prompt) = &param.prompt {
                line.push_str(&format!(" \"{}\"", prompt));
            }
            println!("{}", line);
        }
    } else {
        println!("No report parameters declared.");
    }

    ExitCode::SUCCESS
}

fn cmd_load(
    file: &Path,
    datasets: Vec<String>,
    assignments: &[String],
    prompt: bool,
    settings: Settings,
) -> ExitCode {
    let definition = match read_definition(file) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let overrides = match ReportParameters::from_assignments(assignments) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut params = ReportParameters::from_defaults(&definition.parameters);
    params.merge(settings.parameters.clone());
    params.merge(overrides);

    let datasets = if datasets.is_empty() {
        definition
            .datasets
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        datasets
    };

    let mut configured = ConfiguredCredentials::new(settings);
    let mut prompter = TerminalPrompt;
    let credentials: &mut dyn CredentialProvider = if prompt {
        &mut prompter
    } else {
        &mut configured
    };

    match load_report_data(file, &datasets, &params, credentials) {
        Ok(LoadOutcome::Loaded(tables)) => {
            let output: serde_json::Map<String, serde_json::Value> = tables
                .iter()
                .map(|(name, table)| {
                    let value = serde_json::to_value(table.as_ref())
                        .unwrap_or(serde_json::Value::Null);
                    (name.clone(), value)
                })
                .collect();
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Ok(LoadOutcome::Aborted) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.render());
            ExitCode::FAILURE
        }
    }
}

/// Asks for credentials on stderr/stdin. End of input cancels.
struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(label: &str, current: &str) -> io::Result<Option<String>> {
        let mut stderr = io::stderr();
        if current.is_empty() {
            write!(stderr, "{}: ", label)?;
        } else {
            write!(stderr, "{} [{}]: ", label, current)?;
        }
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim_end_matches(['\r', '\n']);
        Ok(Some(if answer.is_empty() {
            current.to_string()
        } else {
            answer.to_string()
        }))
    }
}

impl CredentialProvider for TerminalPrompt {
    fn connect(&mut self, mut request: ConnectionRequest) -> EngineResult<Connect> {
        eprintln!("Connect to data source '{}'", request.data_source_name);

        let io_err = |e: io::Error| rdlbind::engine::EngineError::message(e.to_string());
        let Some(host) = Self::ask("Host", &request.host).map_err(io_err)? else {
            return Ok(Connect::Cancelled);
        };
        request.host = host;

        if !request.integrated_security {
            let Some(user) = Self::ask("User", "").map_err(io_err)? else {
                return Ok(Connect::Cancelled);
            };
            let Some(password) = Self::ask("Password", "").map_err(io_err)? else {
                return Ok(Connect::Cancelled);
            };
            request = request.with_credentials(user, password);
        }

        let connection = SqliteConnection::open(&request.to_connection_string())?;
        Ok(Connect::Connected(Box::new(connection)))
    }
}
