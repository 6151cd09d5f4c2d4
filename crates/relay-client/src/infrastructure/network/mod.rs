//! Network infrastructure for the client application.
//!
//! Resolves the relay's `<host> <port>` and opens the TCP connection the
//! client's single session runs over.  Every resolved address is tried in
//! order until one accepts; there is no reconnection once a session ends.

use std::io;
use std::net::SocketAddr;

use relay_core::{SessionId, SessionState, DEFAULT_OUTBOUND_QUEUE_LIMIT};
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info};

/// Errors that can occur while connecting to the relay.
#[derive(Debug, Error)]
pub enum ClientNetworkError {
    /// Name resolution failed.
    #[error("failed to resolve {target}: {source}")]
    Resolution {
        target: String,
        #[source]
        source: io::Error,
    },
    /// Name resolution succeeded but returned nothing.
    #[error("{target} resolved to no addresses")]
    NoAddresses { target: String },
    /// Every resolved address refused or failed; `source` is the last error.
    #[error("failed to connect to {target} (last tried {addr}): {source}")]
    ConnectFailed {
        target: String,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Configuration for the client's connection.
#[derive(Debug, Clone)]
pub struct ClientConnectionConfig {
    /// Host name or IP address of the relay.
    pub host: String,
    /// TCP port of the relay.
    pub port: u16,
    /// Messages that may wait in the outbound queue before input is paused.
    pub outbound_queue_limit: usize,
}

impl ClientConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            outbound_queue_limit: DEFAULT_OUTBOUND_QUEUE_LIMIT,
        }
    }

    /// `host:port`, as shown in logs and errors.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The client only ever has one session.
pub const CLIENT_SESSION_ID: SessionId = SessionId::from_raw(1);

/// Resolves the relay address and connects to the first address that accepts.
///
/// # Errors
///
/// Returns [`ClientNetworkError::Resolution`] or
/// [`ClientNetworkError::NoAddresses`] when the host cannot be resolved, and
/// [`ClientNetworkError::ConnectFailed`] when no resolved address accepts.
pub async fn connect(config: &ClientConnectionConfig) -> Result<TcpStream, ClientNetworkError> {
    let target = config.target();
    debug!(session = %CLIENT_SESSION_ID, state = ?SessionState::Connecting, "resolving {target}");

    let addrs: Vec<SocketAddr> = lookup_host((config.host.as_str(), config.port))
        .await
        .map_err(|source| ClientNetworkError::Resolution {
            target: target.clone(),
            source,
        })?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("connected to relay at {addr}");
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("could not disable Nagle: {e}");
                }
                return Ok(stream);
            }
            Err(e) => {
                debug!("connect to {addr} failed: {e}");
                last_error = Some((addr, e));
            }
        }
    }

    match last_error {
        Some((addr, source)) => Err(ClientNetworkError::ConnectFailed {
            target,
            addr,
            source,
        }),
        None => Err(ClientNetworkError::NoAddresses { target }),
    }
}
