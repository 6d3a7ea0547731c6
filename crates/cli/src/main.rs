// Flowrun CLI
//
// Design Decision: Use clap derive with env fallbacks, .env is loaded first via dotenvy.
// Design Decision: Setup failures (config, session creation, invocation) exit 1; every
// polling outcome, including timeout and a flow-reported failure, exits 0.
// Design Decision: Tracing goes to stderr so stdout carries only the report.

mod commands;
mod input;
mod output;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use flowrun_engine::config::{
    DEFAULT_API_URL, DEFAULT_ARTEFACT_PATTERN, DEFAULT_EMPTY_STREAK_LIMIT, DEFAULT_INITIAL_DELAY,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
use flowrun_engine::{ApiConfig, FlowClient, FlowTarget, PollConfig, Timestamp};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flowrun")]
#[command(about = "Run a FlowHunt flow in a new session and wait for its output")]
#[command(version)]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "FLOWHUNT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// API key
    #[arg(long, env = "FLOWHUNT_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress progress output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a session for a flow, send a message and wait for the result
    Run {
        /// Message text; "-" or nothing reads stdin
        message: Option<String>,

        /// Read the message from a file
        #[arg(long, short, conflicts_with = "message")]
        file: Option<PathBuf>,

        /// Workspace ID
        #[arg(long, env = "FLOWHUNT_WORKSPACE_ID")]
        workspace_id: String,

        /// Flow ID
        #[arg(long, env = "FLOWHUNT_FLOW_ID")]
        flow_id: String,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait for events of an existing session
    Poll {
        /// Session ID
        #[arg(long, short)]
        session: String,

        /// Only consider events created after this timestamp
        #[arg(long, default_value = "0")]
        since: Timestamp,

        #[command(flatten)]
        poll: PollArgs,
    },
}

#[derive(Args)]
pub struct PollArgs {
    /// Maximum number of poll requests
    #[arg(long, env = "FLOWHUNT_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Seconds between polls
    #[arg(long, env = "FLOWHUNT_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub poll_interval: u64,

    /// Seconds to wait before the first poll
    #[arg(long, env = "FLOWHUNT_INITIAL_DELAY", default_value_t = DEFAULT_INITIAL_DELAY.as_secs())]
    pub initial_delay: u64,

    /// Empty polls after AI output that mark the flow as done
    #[arg(long, default_value_t = DEFAULT_EMPTY_STREAK_LIMIT)]
    pub empty_streak: u32,

    /// Artefact name to download (case-insensitive substring)
    #[arg(
        long,
        env = "FLOWHUNT_ARTEFACT_PATTERN",
        default_value_t = DEFAULT_ARTEFACT_PATTERN.to_string()
    )]
    pub artefact_pattern: String,
}

impl PollArgs {
    pub fn to_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.max_attempts,
            poll_interval: Duration::from_secs(self.poll_interval),
            initial_delay: Duration::from_secs(self.initial_delay),
            empty_streak_limit: self.empty_streak,
            artefact_pattern: self.artefact_pattern.clone(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowrun=info,flowrun_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = FlowClient::new(&ApiConfig::new(&cli.api_url, cli.api_key));
    let output_format = output::OutputFormat::from_str(&cli.output);

    match cli.command {
        Commands::Run {
            message,
            file,
            workspace_id,
            flow_id,
            poll,
        } => {
            let message = input::read_message(message.as_deref(), file.as_deref())?;
            commands::run::run(
                &client,
                output_format,
                cli.quiet,
                &FlowTarget::new(workspace_id, flow_id),
                &message,
                &poll.to_config(),
            )
            .await
        }
        Commands::Poll {
            session,
            since,
            poll,
        } => {
            commands::poll::run(
                &client,
                output_format,
                cli.quiet,
                &session,
                since,
                &poll.to_config(),
            )
            .await
        }
    }
}

/// `--help` and `--version` keep clap's own exit path
fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => err.exit(),
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}
