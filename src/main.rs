//! bayescli - a command-line shell for the BayesServer inference service.
//!
//! Connects to a BayesServer instance over a websocket and drives it with a
//! small line-oriented command language, either from an interactive prompt,
//! a script file, or a single one-shot command.

mod channel;
mod interpreter;
mod protocol;
mod session;

use anyhow::Result;
use channel::{ConnectError, WsChannel};
use clap::Parser;
use session::Session;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bayescli")]
#[command(author, version, about = "A command-line shell for the BayesServer inference service")]
#[command(long_about = "Drives a running BayesServer over its websocket protocol.\n\nCommands: print <text...>, load_network <file>, clear_evidence <node>,\nget_belief <node>, set_evidence <node> <state>, observe <node> <value>.\nLines starting with ';' are comments; 'exit' leaves the interactive shell.")]
struct Cli {
    /// Websocket host to connect to
    #[arg(value_name = "HOST")]
    host: String,

    /// Websocket port to connect to
    #[arg(value_name = "PORT")]
    port: u16,

    /// Script file to load
    #[arg(short = 's', long = "script", value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Execute single command and disconnect
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Quiet unless RUST_LOG says otherwise; logs go to stderr so they never
    // mix with command output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let channel = match WsChannel::connect(&cli.host, cli.port).await {
        Ok(channel) => channel,
        Err(ConnectError::Refused { url }) => {
            eprintln!(
                "Error connecting to websocket ({url}). Make sure the BayesServer is running."
            );
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(channel);

    // An interrupt is a graceful, user-initiated exit: the session future
    // is dropped, abandoning any in-flight request and closing the channel.
    let outcome = tokio::select! {
        outcome = drive(session, &cli) => outcome,
        _ = tokio::signal::ctrl_c() => Ok(ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run exactly one input mode over the session.
///
/// Single-command mode takes priority, then script replay, then the
/// interactive prompt.
async fn drive(mut session: Session<WsChannel>, cli: &Cli) -> Result<ExitCode> {
    if let Some(command) = &cli.command {
        debug!(%command, "single-command mode");
        session.run_single(command).await?;
        // One-shot mode exits non-zero once the command is done, whatever
        // the server said; callers rely on it as a "done" marker.
        Ok(ExitCode::FAILURE)
    } else if let Some(script) = &cli.script {
        debug!(script = %script.display(), "script mode");
        session.run_script(script).await?;
        Ok(ExitCode::SUCCESS)
    } else {
        debug!("interactive mode");
        session.run_interactive().await?;
        Ok(ExitCode::SUCCESS)
    }
}
