// ABOUTME: Command-line entry point for the Terraform deployment client
// ABOUTME: Parses arguments, sets up logging and dispatches deploy/status/watch/generate

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tf_deployer::deploy::{cancel_pair, ConsoleStatus, Phase, StatusSink};
use tf_deployer::snippets::SnippetWatcher;
use tf_deployer::{DeployConfig, DeployForm, Deployer, FormEncoding, JobHandle, RemoteClient};

#[derive(Parser)]
#[command(name = "tf-deploy")]
#[command(
    about = "Submit Terraform configuration to a deployment backend and track the job",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "TF_DEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Backend URL, overrides the configuration file
    #[arg(long, global = true, env = "DEPLOY_BASE_URL")]
    base_url: Option<String>,

    /// Log protocol details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit configuration and wait for the deployment to finish
    Deploy(DeployArgs),
    /// Track a job that was already submitted
    Status {
        /// Status URL or path returned by the trigger endpoint
        status_url: String,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Keep a file in sync with the latest snippet pushed from chat
    Watch {
        /// File the snippet is written to
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate configuration from a plain-language description
    Generate {
        prompt: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DeployArgs {
    /// Configuration file, or '-' for stdin
    #[arg(short, long, default_value = "main.tf")]
    file: PathBuf,

    /// DigitalOcean token sent along with the configuration
    #[arg(long, env = "DO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Refuse to submit without a token
    #[arg(long)]
    require_token: bool,

    #[arg(long, value_enum)]
    encoding: Option<FormEncoding>,

    /// Accept any 2xx acknowledgement, not only 202
    #[arg(long)]
    accept_any_success: bool,

    #[command(flatten)]
    timing: TimingArgs,
}

#[derive(Args)]
struct TimingArgs {
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    max_wait_ms: Option<u64>,
}

impl TimingArgs {
    fn apply(&self, config: &mut DeployConfig) {
        if let Some(interval) = self.interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(max_wait) = self.max_wait_ms {
            config.max_wait_ms = max_wait;
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "tf_deployer=debug,tf_deploy=debug"
    } else {
        "tf_deployer=warn,tf_deploy=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_configuration(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read configuration from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))
}

fn client_for(config: &DeployConfig) -> Result<Arc<RemoteClient>> {
    Ok(Arc::new(RemoteClient::new(
        &config.base_url,
        config.request_timeout(),
    )?))
}

/// Cancel tracking on Ctrl-C.
fn cancel_on_interrupt(deployer: &Arc<Deployer>) -> tokio::task::JoinHandle<()> {
    let deployer = deployer.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            deployer.cancel();
        }
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = DeployConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Deploy(args) => {
            if let Some(encoding) = args.encoding {
                config.encoding = encoding;
            }
            config.require_credential |= args.require_token;
            config.accept_any_success |= args.accept_any_success;
            args.timing.apply(&mut config);
            config.validate()?;

            let mut form = DeployForm::new(read_configuration(&args.file)?);
            form.credential = args.token;

            let deployer = Arc::new(Deployer::new(
                client_for(&config)?,
                Arc::new(ConsoleStatus::new()),
                config,
            ));
            let interrupt = cancel_on_interrupt(&deployer);
            let result = deployer.submit(&form).await;
            interrupt.abort();

            Ok(if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Status { status_url, timing } => {
            timing.apply(&mut config);
            config.validate()?;
            let handle = JobHandle::new(status_url).context("Status URL must not be empty")?;

            let deployer = Arc::new(Deployer::new(
                client_for(&config)?,
                Arc::new(ConsoleStatus::new()),
                config,
            ));
            let interrupt = cancel_on_interrupt(&deployer);
            let result = deployer.track(handle).await;
            interrupt.abort();

            Ok(if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Watch { output } => {
            config.validate()?;
            let client = client_for(&config)?;
            let status = ConsoleStatus::new();
            status.set(&format!("Waiting for snippets, writing to {}", output.display()));

            let (handle, signal) = cancel_pair();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.cancel();
                }
            });

            let mut form = DeployForm::default();
            SnippetWatcher::new()
                .watch(client.as_ref(), config.snippet_interval(), signal, |code| {
                    let message = form.load_from_chat(code);
                    match std::fs::write(&output, &form.configuration) {
                        Ok(()) => status.show(&Phase::SnippetLoaded(message)),
                        Err(e) => warn!("Failed to write {}: {}", output.display(), e),
                    }
                })
                .await?;
            interrupt.abort();
            status.finish("Stopped watching for snippets.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate { prompt, output } => {
            config.validate()?;
            let client = client_for(&config)?;
            let code = client.generate(&prompt).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &code)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote generated configuration to {}", path.display());
                }
                None => println!("{}", code),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
