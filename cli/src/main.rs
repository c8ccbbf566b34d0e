mod prompt;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use migrator::migration::probe::render_diagnostics;
use migrator::migration::{AutoConfirm, CancellationSignal, Confirmation, LoggingEventHandler};
use migrator::services::client::{CachedCredentialResolver, SessionContextSwitcher};
use migrator::{BatchOrchestrator, HttpManagementClient, MigrationError, RunFile};

use crate::prompt::StdinConfirmation;

const DEFAULT_LOG_FILTER: &str = "model_migrator=info,migrator=info";
const VERBOSE_LOG_FILTER: &str = "model_migrator=debug,migrator=debug";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe instances and print which API versions they answer
    Probe {
        /// Path to a run file TOML
        run_file: PathBuf,
        #[arg(long, value_enum, default_value_t = Side::Both)]
        side: Side,
    },
    /// Copy models from the source instance to the destination instance
    Migrate {
        /// Path to a run file TOML
        run_file: PathBuf,
        /// Delete orphaned destination models without asking
        #[arg(long, conflicts_with = "no")]
        yes: bool,
        /// Never delete destination models; conflicts fail the model
        #[arg(long)]
        no: bool,
        /// Migrate only these model ids (repeatable, overrides the run file)
        #[arg(long = "only", value_name = "MODEL_ID")]
        only: Vec<String>,
        /// Override the copy-operation poll interval
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Override the overall time allowed per copy operation
        #[arg(long)]
        poll_timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    Source,
    Destination,
    Both,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("model-migrator: could not start the async runtime: {err}");
            return ExitCode::from(2);
        }
    };
    let code = runtime.block_on(run(args));
    // A prompt abandoned on cancellation still holds a thread blocked on stdin.
    runtime.shutdown_background();
    code
}

async fn run(args: Args) -> ExitCode {
    let result = match args.cmd {
        Command::Probe { run_file, side } => cmd_probe(&run_file, side).await,
        Command::Migrate {
            run_file,
            yes,
            no,
            only,
            poll_interval_ms,
            poll_timeout_secs,
        } => {
            let cancel = CancellationSignal::new();
            let confirmation: Arc<dyn Confirmation> = if yes {
                Arc::new(AutoConfirm::accept())
            } else if no {
                Arc::new(AutoConfirm::decline())
            } else {
                Arc::new(StdinConfirmation::new(cancel.clone()))
            };
            let overrides = PollOverrides {
                interval_ms: poll_interval_ms,
                timeout_secs: poll_timeout_secs,
            };
            cmd_migrate(&run_file, confirmation, cancel, only, overrides).await
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("model-migrator: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("model-migrator: tracing initialization failed: {err}");
    }
}

fn load_run_file(path: &Path) -> Result<RunFile> {
    RunFile::load(path).with_context(|| format!("loading run file {}", path.display()))
}

fn build_orchestrator(
    run: &RunFile,
    confirmation: Arc<dyn Confirmation>,
) -> Result<BatchOrchestrator> {
    let client =
        HttpManagementClient::new(&run.settings.http).context("creating HTTP client")?;
    let credentials = CachedCredentialResolver::new(run.credential_resolver());
    let switcher = SessionContextSwitcher::new(run.signed_in_domains.iter().cloned());

    Ok(BatchOrchestrator::new(
        Arc::new(client),
        Arc::new(credentials),
        Arc::new(switcher),
    )
    .with_config(run.settings.clone())
    .with_confirmation(confirmation)
    .with_event_handler(Arc::new(LoggingEventHandler)))
}

async fn cmd_probe(path: &Path, side: Side) -> Result<ExitCode> {
    let run = load_run_file(path)?;
    let orchestrator = build_orchestrator(&run, Arc::new(AutoConfirm::decline()))?;

    let instances = match side {
        Side::Source => vec![&run.source.instance],
        Side::Destination => vec![&run.destination.instance],
        Side::Both => vec![&run.source.instance, &run.destination.instance],
    };

    let mut code = ExitCode::SUCCESS;
    for instance in instances {
        match orchestrator.probe(instance).await {
            Ok(report) => println!("{}", report.render_table()),
            Err(MigrationError::NoCapableVersion {
                instance,
                diagnostics,
            }) => {
                println!(
                    "Capability probe for {}\n{}No supported API version\n",
                    instance,
                    render_diagnostics(&diagnostics)
                );
                code = ExitCode::from(1);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("probing {}", instance));
            }
        }
    }
    Ok(code)
}

struct PollOverrides {
    interval_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

async fn cmd_migrate(
    path: &Path,
    confirmation: Arc<dyn Confirmation>,
    cancel: CancellationSignal,
    only: Vec<String>,
    overrides: PollOverrides,
) -> Result<ExitCode> {
    let mut run = load_run_file(path)?;
    if let Some(interval_ms) = overrides.interval_ms {
        run.settings.poll.interval_ms = interval_ms;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        run.settings.poll.max_duration_secs = timeout_secs;
    }
    run.validate().context("applying command-line overrides")?;

    let filter = if only.is_empty() {
        run.resources.clone()
    } else {
        only
    };

    let orchestrator = build_orchestrator(&run, confirmation)?.with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling the migration");
            cancel.cancel();
        }
    });

    info!(
        "Migrating from {} to {}",
        run.source.instance, run.destination.instance
    );
    let report = orchestrator
        .migrate(&run.source.instance, &run.destination.instance, &filter)
        .await
        .context("migration aborted")?;

    print!("{}", report.render_summary());

    if report.has_failures() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
