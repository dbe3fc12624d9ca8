//! Agent Dispatch - command line entry point
//!
//! Reads tasks as JSON, dispatches them and prints the results on stdout.
//! Logs go to stderr.

use agent_dispatch::config::DispatcherConfig;
use agent_dispatch::observability::{init_default_logging, metrics};
use agent_dispatch::protocol::{Task, TaskResult};
use agent_dispatch::Dispatcher;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{error, info, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["agent-dispatch.toml", "config/agent-dispatch.toml"];

/// Dispatch KPI and log-analysis tasks to specialized agents
#[derive(Parser)]
#[command(name = "agent-dispatch")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "AGENT_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Print a metrics snapshot to stderr before exiting
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one task, or a JSON array of tasks in order
    Run {
        /// Task file, or `-` for stdin
        #[arg(short, long, value_name = "FILE")]
        task: PathBuf,

        /// Print system status after the last task
        #[arg(long)]
        status: bool,
    },
    /// Dispatch newline-delimited JSON tasks from stdin, one result per line
    Lines,
    /// Print the status of an idle dispatcher
    Status,
    /// Validate configuration
    Config {
        /// Print the effective configuration as TOML
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { task, status } => run_tasks(&config, &task, status).await,
        Commands::Lines => run_lines(&config).await,
        Commands::Status => print_json(&Dispatcher::new(&config).system_status().into_value(), true),
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if cli.metrics {
        match serde_json::to_string_pretty(&metrics().get_metrics()) {
            Ok(snapshot) => eprintln!("{snapshot}"),
            Err(e) => warn!("Failed to render metrics: {}", e),
        }
    }

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: Option<&Path>) -> CliResult<DispatcherConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(DispatcherConfig::load_from_file(path)?);
    }

    for candidate in DEFAULT_CONFIG_PATHS.map(PathBuf::from) {
        if candidate.exists() {
            info!("Loading configuration from: {}", candidate.display());
            return Ok(DispatcherConfig::load_from_file(&candidate)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(DispatcherConfig::default())
}

async fn read_input(path: &Path) -> CliResult<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).await?;
        Ok(input)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

async fn run_tasks(config: &DispatcherConfig, path: &Path, show_status: bool) -> CliResult<()> {
    let input: Value = serde_json::from_str(&read_input(path).await?)?;
    let tasks: Vec<Task> = match &input {
        Value::Array(items) => items.iter().map(Task::from_value).collect(),
        single => vec![Task::from_value(single)],
    };

    let dispatcher = Dispatcher::new(config);
    for task in &tasks {
        let result = dispatcher.dispatch(task).await;
        print_json(&result.into_value(), true)?;
    }

    if show_status {
        print_json(&dispatcher.system_status().into_value(), true)?;
    }
    Ok(())
}

async fn run_lines(config: &DispatcherConfig) -> CliResult<()> {
    let dispatcher = Dispatcher::new(config);
    let mut lines = BufReader::new(io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<Value>(&line) {
            Ok(value) => dispatcher.dispatch(&Task::from_value(&value)).await,
            Err(e) => TaskResult::error(format!("Invalid task JSON: {e}")),
        };
        print_json(&result.into_value(), false)?;
    }
    Ok(())
}

fn handle_config_command(config: &DispatcherConfig, show: bool) -> CliResult<()> {
    config.validate()?;
    info!("Configuration is valid");

    if show {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn print_json(value: &Value, pretty: bool) -> CliResult<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
