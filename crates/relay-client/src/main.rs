//! Chat relay client entry point.
//!
//! # Usage
//!
//! ```text
//! relay-client <HOST> <PORT>
//! ```
//!
//! Each line typed on stdin is sent as one message; every message the relay
//! sends back is printed on stdout.  Logs go to stderr (default level `warn`,
//! override with `RUST_LOG`) so stdout carries message bodies only.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_client::application::chat::ChatClient;
use relay_client::infrastructure::display::stdout::StdoutDisplay;
use relay_client::infrastructure::input::stdin::LineReader;
use relay_client::infrastructure::network::{connect, ClientConnectionConfig, CLIENT_SESSION_ID};
use relay_core::{CloseReason, Session};

/// Terminal client for the chat relay.
#[derive(Debug, Parser)]
#[command(name = "relay-client", about = "Terminal client for the chat relay", version)]
struct Cli {
    /// Host name or IP address of the relay.
    host: String,

    /// TCP port of the relay.
    port: u16,
}

impl Cli {
    fn into_connection_config(self) -> ClientConnectionConfig {
        ClientConnectionConfig::new(self.host, self.port)
    }
}

fn main() -> ExitCode {
    // Wrong argument count: usage on stderr and exit code 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("relay-client: failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };
    let result = runtime.block_on(run(cli.into_connection_config()));
    // A stdin read may still be parked on a blocking thread; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relay-client: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(config: ClientConnectionConfig) -> anyhow::Result<()> {
    let stream = connect(&config).await?;
    let (session, handle) = Session::new(CLIENT_SESSION_ID, stream, config.outbound_queue_limit);

    let client = ChatClient::new(LineReader::stdin(), Arc::new(StdoutDisplay));
    let reason = client
        .run(session, handle)
        .await
        .with_context(|| format!("connection to {} failed", config.target()))?;

    match reason {
        CloseReason::PeerClosed => warn!("relay closed the connection"),
        CloseReason::Drained | CloseReason::LocalClose => info!("session finished: {reason:?}"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
