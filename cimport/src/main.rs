//! cimport - contact spreadsheet import CLI
//!
//! Uploads one or more `.xlsx`/`.csv` files to the contact service and
//! creates an import job for each. Progress goes to stdout, logs to stderr
//! (or the configured log file).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use cimport::{
    ImportPipeline, ImportSettings, PipelineEvent, ProgressObserver, SettingsOverrides,
};
use cimport_common::config::{LoggingConfig, TomlConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for cimport
#[derive(Parser, Debug)]
#[command(name = "cimport")]
#[command(about = "Upload contact spreadsheets and start import jobs")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to $CIMPORT_CONFIG, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Contact service base URL
    #[arg(long, env = "CIMPORT_HOST")]
    host: Option<String>,

    /// API token key
    #[arg(long, env = "CIMPORT_TOKEN_KEY")]
    token_key: Option<String>,

    /// API token secret
    #[arg(long, env = "CIMPORT_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Account key
    #[arg(long, env = "CIMPORT_ACCOUNT_KEY")]
    account_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "CIMPORT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Files to import (.xlsx or .csv)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            host: self.host.clone(),
            token_key: self.token_key.clone(),
            token_secret: self.token_secret.clone(),
            account_key: self.account_key.clone(),
            request_timeout_secs: self.timeout_secs,
        }
    }
}

/// Prints the progress lines for one file
struct ConsoleProgress {
    prefix: String,
}

impl ConsoleProgress {
    fn new(path: &Path, multiple: bool) -> Self {
        let prefix = if multiple {
            format!("[{}] ", path.display())
        } else {
            String::new()
        };
        Self { prefix }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Resolved(descriptor) => {
                println!("{}File: {}", self.prefix, descriptor.name())
            }
            PipelineEvent::Registered(intent) => {
                println!("{}Upload ID: {}", self.prefix, intent.id)
            }
            PipelineEvent::Transferred { .. } => {
                println!("{}Successfully uploaded file.", self.prefix)
            }
            PipelineEvent::Submitted(job) => println!("{}Import ID: {}", self.prefix, job.id),
            PipelineEvent::Failed { error, .. } => eprintln!("{}{}", self.prefix, error),
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("cimport={0},cimport_common={0}", logging.level)))
        .context("Invalid log level")?;

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::discover(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&toml_config.logging)?;

    let settings = ImportSettings::resolve(args.overrides(), &toml_config)?;
    info!(
        host = %settings.host,
        files = args.files.len(),
        "Starting cimport {}",
        env!("CARGO_PKG_VERSION")
    );

    // One pipeline (and one pair of HTTP clients) per file
    let multiple = args.files.len() > 1;
    let runs = args.files.iter().map(|path| {
        let settings = &settings;
        async move {
            let progress = ConsoleProgress::new(path, multiple);
            let pipeline = match ImportPipeline::new(settings) {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    eprintln!("{}{}", progress.prefix, e);
                    return Err(e);
                }
            };
            pipeline.run_with(path, &progress).await
        }
    });
    let results = futures::future::join_all(runs).await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        bail!("{} of {} imports failed", failed, results.len());
    }

    info!("All imports submitted");
    Ok(())
}
