//! Chat relay server entry point.
//!
//! # Usage
//!
//! ```text
//! relay-server [OPTIONS] <PORT>...
//!
//! Arguments:
//!   <PORT>...          One or more TCP ports; each runs an independent relay
//!
//! Options:
//!   --bind <IP>        Address to bind every port to [default: 0.0.0.0]
//!   --config <PATH>    Optional TOML config file
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, init tracing
//!  └─ bind every port up front (any failure aborts startup)
//!  └─ one RelayServer task per port, each with its own BroadcastRegistry
//!  └─ Ctrl-C clears the shared running flag; accept loops exit
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relay_server::infrastructure::network::listener::{listen_addr, RelayServer};
use relay_server::infrastructure::storage::config::{load_config, RelayConfig};

/// Relays every message a client sends to every connected client.
#[derive(Debug, Parser)]
#[command(name = "relay-server", about = "Minimal TCP chat relay", version)]
struct Cli {
    /// TCP ports to listen on.  Each port is a separate room.
    #[arg(required = true, num_args = 1..)]
    ports: Vec<u16>,

    /// IP address to bind to.  Overrides `server.bind_address` from the config.
    #[arg(long)]
    bind: Option<String>,

    /// Path to a TOML config file.  A missing file means defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges CLI flags over the file config and resolves every listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or an address is invalid.
    fn into_plan(self) -> anyhow::Result<(RelayConfig, Vec<SocketAddr>)> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => RelayConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }

        let addrs = self
            .ports
            .iter()
            .map(|&port| listen_addr(&config.server.bind_address, port))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((config, addrs))
    }
}

fn main() -> ExitCode {
    // Missing ports or bad flags: usage on stderr and exit code 1.
    // `--help` / `--version` print to stdout and exit 0.
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

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relay-server: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, addrs) = cli.into_plan()?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("chat relay starting on {} port(s)", addrs.len());

    // Bind everything first so a taken port aborts startup cleanly.
    let mut servers = Vec::with_capacity(addrs.len());
    for addr in addrs {
        let server = RelayServer::bind(addr, config.server.outbound_queue_limit)
            .await
            .with_context(|| format!("failed to start relay on {addr}"))?;
        servers.push(server);
    }

    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl-C signal: {e}"),
        }
    });

    let mut relays = JoinSet::new();
    for server in servers {
        relays.spawn(server.run(Arc::clone(&running)));
    }
    while let Some(joined) = relays.join_next().await {
        if let Err(e) = joined {
            error!("relay task failed: {e}");
        }
    }

    info!("chat relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
