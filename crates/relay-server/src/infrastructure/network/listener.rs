//! RelayServer: accept loop and per-session task management for one port.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections.
//! 3. Running each connection as a [`Session`] in its own Tokio task, joined
//!    to this port's [`BroadcastRegistry`] for as long as it lives.
//! 4. Stopping the accept loop when the shared `running` flag is cleared.
//!
//! Each port gets its own `RelayServer` and its own registry, so rooms on
//! different ports never see each other's messages.
//!
//! # Scalability
//!
//! The accept loop never blocks on a session: it spawns a task for the new
//! connection and immediately goes back to accepting.  There is no connection
//! cap and no idle timeout.

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use relay_core::{Session, SessionId, SessionIdAllocator};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::broadcast::BroadcastRegistry;
use crate::application::history::HISTORY_CAPACITY;

/// How often the accept loop re-checks the `running` flag while idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Error type for listener setup.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid port {port}: relay ports must be between 1 and 65535")]
    InvalidPort { port: u16 },
    #[error("invalid bind address '{address}'")]
    InvalidBindAddress { address: String },
}

/// Builds the socket address a relay listens on.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidBindAddress`] if `bind_address` is not an IP
/// address and [`NetworkError::InvalidPort`] for port 0.
pub fn listen_addr(bind_address: &str, port: u16) -> Result<SocketAddr, NetworkError> {
    let ip: IpAddr = bind_address
        .parse()
        .map_err(|_| NetworkError::InvalidBindAddress {
            address: bind_address.to_string(),
        })?;
    if port == 0 {
        return Err(NetworkError::InvalidPort { port });
    }
    Ok(SocketAddr::new(ip, port))
}

/// One independent relay: a bound listener plus its broadcast registry.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<BroadcastRegistry>,
    ids: Arc<SessionIdAllocator>,
    outbound_queue_limit: usize,
}

impl RelayServer {
    /// Binds `addr`.  Port 0 picks an ephemeral port; see [`local_addr`].
    ///
    /// `outbound_queue_limit` is raised to [`HISTORY_CAPACITY`] when smaller,
    /// so a newcomer's history replay always fits in its queue.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] if the port is in use or the
    /// process lacks permission to bind it.
    ///
    /// [`local_addr`]: Self::local_addr
    pub async fn bind(addr: SocketAddr, outbound_queue_limit: usize) -> Result<Self, NetworkError> {
        let bind_failed = |source| NetworkError::BindFailed { addr, source };
        let listener = TcpListener::bind(addr).await.map_err(bind_failed)?;
        let local_addr = listener.local_addr().map_err(bind_failed)?;

        if outbound_queue_limit < HISTORY_CAPACITY {
            warn!(
                requested = outbound_queue_limit,
                applied = HISTORY_CAPACITY,
                "outbound queue limit below history capacity; raising it"
            );
        }
        let outbound_queue_limit = outbound_queue_limit.max(HISTORY_CAPACITY);

        Ok(Self {
            listener,
            local_addr,
            registry: Arc::new(BroadcastRegistry::new()),
            ids: Arc::new(SessionIdAllocator::new()),
            outbound_queue_limit,
        })
    }

    /// The address actually bound, including the real port when bound to 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Per-session outbound queue limit in effect, after raising it to
    /// [`HISTORY_CAPACITY`].
    pub fn outbound_queue_limit(&self) -> usize {
        self.outbound_queue_limit
    }

    /// Shared handle to this relay's registry.
    pub fn registry(&self) -> Arc<BroadcastRegistry> {
        Arc::clone(&self.registry)
    }

    /// Runs the accept loop until `running` is set to `false`.
    ///
    /// Sessions that are already running are not stopped; they end with their
    /// connections or when the runtime shuts down.
    pub async fn run(self, running: Arc<AtomicBool>) {
        info!("relay listening on {}", self.local_addr);

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop on {}", self.local_addr);
                break;
            }

            // Time out periodically so the flag is re-checked even when no
            // client is connecting.
            match timeout(ACCEPT_POLL_INTERVAL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    let id = self.ids.next();
                    let registry = Arc::clone(&self.registry);
                    let limit = self.outbound_queue_limit;
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, id, registry, limit).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient (e.g. too many open files); keep accepting.
                    error!("accept error on {}: {e}", self.local_addr);
                }
                Err(_) => {}
            }
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Lifecycle of one accepted connection: join, relay until closed, leave.
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    id: SessionId,
    registry: Arc<BroadcastRegistry>,
    outbound_queue_limit: usize,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(session = %id, "could not disable Nagle: {e}");
    }

    let (session, handle) = Session::new(id, stream, outbound_queue_limit);
    info!(session = %id, %peer_addr, "client connected");

    // History is replayed into the outbound queue before the writer starts,
    // so the newcomer sees it ahead of any live message.
    registry.join(handle);
    let outcome = session.run(|message| registry.deliver(message)).await;
    registry.leave(id);

    match outcome {
        Ok(reason) => info!(session = %id, %peer_addr, ?reason, "session closed"),
        Err(e) => warn!(session = %id, %peer_addr, "session closed with error: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
