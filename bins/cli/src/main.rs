//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{run_bootstrap, run_proxy};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode, to_json_line};
use ledger_ops_config::ProxyOptions;
use ledger_ops_infra::{BootstrapLocalArgs, process_env};
use ledger_ops_shared::{ErrorEnvelope, redact_if_secret};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Env var holding the `tracing` filter directive.
const LOG_FILTER_ENV: &str = "LEDGER_OPS_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "ledger-ops",
    version,
    about = "Operator tooling for a ledger deployment",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render the proxy config from the environment, then exec the server.
    ProxyEntrypoint {
        /// Config file rendered in place.
        #[arg(long)]
        config_file: Option<PathBuf>,
        /// Server program that takes over once rendering is done.
        #[arg(long)]
        server_bin: Option<String>,
        /// Render and print a summary without starting the server.
        #[arg(long)]
        render_only: bool,
    },
    /// Provision, configure and start a tagged cluster.
    Bootstrap {
        /// Tag applied to every instance of the cluster.
        tag: Option<String>,
        /// Number of nodes to provision.
        num_nodes: Option<String>,
        /// Optional TOML file overriding paths, tools and commands.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory holding the helper scripts (defaults to current directory).
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Print the step plan without running anything.
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_with_parse_error(&error),
    };
    init_tracing();
    let mode = OutputMode::from_args(&cli.output);

    match run(cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_parse_error(error: &clap::Error) -> std::process::ExitCode {
    let _ = error.print();
    if error.use_stderr() {
        std::process::ExitCode::from(ExitCode::Failure.as_u8())
    } else {
        std::process::ExitCode::from(ExitCode::Ok.as_u8())
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn run(command: Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    tracing::debug!(output = ?mode.format, "dispatching command");
    match command {
        Commands::ProxyEntrypoint {
            config_file,
            server_bin,
            render_only,
        } => {
            let options = proxy_options(config_file, server_bin);
            run_proxy(mode, &process_env(), &options, render_only)
        },
        Commands::Bootstrap {
            tag,
            num_nodes,
            config,
            workdir,
            dry_run,
        } => {
            let args = BootstrapLocalArgs {
                tag,
                node_count: num_nodes,
                config_path: config,
                workdir: workdir.unwrap_or_default(),
            };
            run_bootstrap(mode, &args, dry_run)
        },
    }
}

fn proxy_options(config_file: Option<PathBuf>, server_bin: Option<String>) -> ProxyOptions {
    let defaults = ProxyOptions::default();
    ProxyOptions {
        config_file: config_file.unwrap_or(defaults.config_file),
        server_program: server_bin.unwrap_or(defaults.server_program),
    }
}

/// Render a failed run. Text goes to stderr; JSON goes to stdout so callers
/// can parse it.
pub(crate) fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = ExitCode::for_error(error);
    let metadata: serde_json::Map<String, serde_json::Value> = error
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), redact_if_secret(key, value).into()))
        .collect();

    if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": {
                "code": error.code.to_string(),
                "kind": error.kind.to_string(),
                "message": error.message,
                "meta": metadata,
            },
        });
        let stdout = to_json_line(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\"}}\n".to_string()
        });
        return CliOutput {
            stdout,
            stderr: String::new(),
            exit_code,
        };
    }

    let mut stderr = String::new();
    let _ = writeln!(stderr, "error: {}: {}", error.code, error.message);
    for (key, value) in &metadata {
        let value = value.as_str().unwrap_or_default();
        let _ = writeln!(stderr, "  {key}: {value}");
    }
    CliOutput {
        stdout: String::new(),
        stderr,
        exit_code,
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
