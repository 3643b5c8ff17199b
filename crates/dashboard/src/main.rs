mod cli;
mod metrics;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::Value;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use poolscout_core::{
    load_config, validate_config, BatchItem, Config, DashboardError, DisplaySync,
    DownloadOrchestrator, HttpBackend, LogFormat, LoggingConfig, NoopDisplay,
    PageStateReconciler, ProgressConfig, ProgressPoller, SelectedDate, SubmitOutcome,
};

use cli::{Cli, Command};
use terminal::TerminalDisplay;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "POOLSCOUT_CONFIG";

const DEFAULT_CONFIG: &str = "poolscout.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Determine config path
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config.logging);
    info!("Configuration loaded from {:?}", config_path);
    info!("Backend: {}", config.backend.base_url);

    let app = App::new(&config, cli.json)?;

    let started = Instant::now();
    let result = app.execute(&cli.command).await;
    metrics::record_command(
        cli.command.name(),
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );

    if cli.print_metrics {
        print!("{}", metrics::encode_metrics()?);
    }

    let report = result?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Logs go to stderr; stdout carries rendered rows and JSON reports.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Wired services for one command.
struct App {
    progress: ProgressConfig,
    backend: Arc<HttpBackend>,
    display: Arc<dyn DisplaySync>,
    input: Arc<SelectedDate>,
    reconciler: Arc<PageStateReconciler>,
}

impl App {
    fn new(config: &Config, json: bool) -> Result<Self> {
        let backend = Arc::new(
            HttpBackend::new(config.backend.clone()).context("Failed to create backend client")?,
        );

        // JSON mode keeps stdout machine-readable.
        let display: Arc<dyn DisplaySync> = if json {
            Arc::new(NoopDisplay)
        } else {
            Arc::new(TerminalDisplay::new())
        };

        let input = Arc::new(SelectedDate::new());
        let reconciler = Arc::new(PageStateReconciler::new(
            backend.clone(),
            Arc::clone(&display),
            input.clone(),
        ));

        Ok(Self {
            progress: config.progress.clone(),
            backend,
            display,
            input,
            reconciler,
        })
    }

    async fn execute(&self, command: &Command) -> Result<Value> {
        self.input.select(command.date());
        match command {
            Command::Saved(args) => {
                let counts = self.reconciler.refresh_for_date(&args.date).await?;
                Ok(serde_json::to_value(counts)?)
            }
            Command::Search(args) => {
                self.reconciler.search_date(&args.date).await?;
                Ok(serde_json::to_value(self.reconciler.counts().await)?)
            }
            Command::Download(args) => self.download(&args.date).await,
        }
    }

    /// Search `date`, submit every unsaved facility, and follow the batch
    /// until it leaves flight.
    async fn download(&self, date: &str) -> Result<Value> {
        let records = self.reconciler.search_date(date).await?;
        let found = records.len();
        let items: Vec<BatchItem> = records
            .into_iter()
            .filter_map(BatchItem::from_facility)
            .collect();
        if items.len() < found {
            warn!(
                "Skipping {} facilities without an inspection id",
                found - items.len()
            );
        }

        let orchestrator = DownloadOrchestrator::new(
            self.progress.clone(),
            self.backend.clone(),
            Arc::clone(&self.display),
            Arc::clone(&self.reconciler),
        );

        // Started before submitting: the backend may hold the submission
        // open until every download has finished.
        let poller = ProgressPoller::new(self.backend.clone(), self.progress.poll_interval());
        let (tx, mut rx) = mpsc::channel(self.progress.channel_capacity);
        let mut primed = poller.primed();
        let poll_handle = poller.start(tx);

        let batch = async {
            // The baseline snapshot has to describe the backend before this batch.
            if primed.wait_for(|primed| *primed).await.is_err() {
                warn!("Progress poller closed before its first poll");
            }
            tokio::join!(orchestrator.submit(items), orchestrator.drive(&mut rx))
        };
        let (outcome, final_counts) = tokio::select! {
            result = batch => result,
            _ = signal::ctrl_c() => {
                poller.stop();
                bail!("Interrupted while a download batch was in flight");
            }
        };

        poller.stop();
        if let Some(handle) = poll_handle {
            if let Err(e) = handle.await {
                warn!("Progress poller task failed: {}", e);
            }
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(DashboardError::EmptyBatch) => {
                info!("Every facility for {} is already saved", date);
                return Ok(serde_json::to_value(orchestrator.status().await)?);
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            SubmitOutcome::Accepted { batch_id, .. } => {
                if final_counts.is_none() {
                    bail!("Batch {} stopped before every download finished", batch_id);
                }
            }
            SubmitOutcome::RemoteBusy { message, .. } => {
                warn!("Backend busy: {}", message);
            }
        }

        Ok(serde_json::to_value(orchestrator.status().await)?)
    }
}
