//! Tokio driver for one connection's read/write pipeline.
//!
//! # Ownership model
//!
//! A [`Session`] is consumed by [`Session::run`], which is normally the body
//! of one tokio task.  That task exclusively owns the stream and the inbound
//! frame buffer, so handler code for one session never runs concurrently with
//! itself.  Everyone else (the broadcast registry, the client's stdin pump)
//! holds a cloneable [`SessionHandle`]:
//!
//! ```text
//!   registry ──┐                          ┌──► read loop ──► on_message(msg)
//!   stdin    ──┼─► SessionHandle ─mpsc──► │
//!              │        │                 └──► write loop ──► stream
//!              └────────┴─ close() ─watch─► shutdown branch
//! ```
//!
//! The three branches are raced in a single `tokio::select!`.  Whichever
//! finishes first decides the [`CloseReason`] or [`SessionError`]; the others
//! are dropped, the stream is shut down, and the outbound channel is closed so
//! later enqueues become silent no-ops.
//!
//! # Queue bound
//!
//! The outbound channel holds at most `outbound_queue_limit` messages that
//! the writer has not picked up yet.  [`SessionHandle::enqueue_outbound`]
//! never waits: when the channel is full the session is closed with
//! [`SessionError::Overflow`] rather than buffering without limit for a
//! reader that is not keeping up.  [`SessionHandle::send`] waits for space
//! instead and is meant for local input sources.
//!
//! Between writes the writer moves up to another `outbound_queue_limit`
//! messages from the channel into its own FIFO, so one session buffers at
//! most twice the limit before it overflows.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::protocol::frame::ProtocolError;
use crate::protocol::message::Message;
use crate::session::id::SessionId;
use crate::session::participant::Participant;
use crate::session::read::{InboundFrame, ReadState, SessionState};
use crate::session::write::{OutboundQueue, WriteState};

/// Default number of outbound messages a session may have waiting in its
/// channel.  The writer's FIFO can hold as many again.
pub const DEFAULT_OUTBOUND_QUEUE_LIMIT: usize = 1024;

/// Why a session ended with an error.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from or writing to the stream failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The peer sent a header that cannot be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer stopped reading and its outbound queue filled up.
    #[error("outbound queue overflow: more than {limit} messages pending")]
    Overflow { limit: usize },
}

/// Why a session ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed its side of the stream at (or inside) a header.
    PeerClosed,
    /// [`SessionHandle::close`] was called.
    LocalClose,
    /// Every handle was dropped and all queued messages were written.
    Drained,
}

/// Result of handing a message to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    /// The session is closing or closed; the message was discarded.
    Closed,
    /// The queue was full; the message was discarded and the session closed.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Open,
    Requested,
    Overflow,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable, thread-safe reference to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    limit: usize,
    outbound: mpsc::Sender<Message>,
    shutdown: Arc<watch::Sender<Shutdown>>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queues `message` without waiting.
    ///
    /// Safe to call from any task, including while the session is tearing
    /// down, in which case it returns [`Enqueue::Closed`] and does nothing.
    pub fn enqueue_outbound(&self, message: Message) -> Enqueue {
        if self.is_closing() {
            return Enqueue::Closed;
        }
        match self.outbound.try_send(message) {
            Ok(()) => Enqueue::Queued,
            Err(TrySendError::Closed(_)) => Enqueue::Closed,
            Err(TrySendError::Full(_)) => {
                let first = self.request_shutdown(Shutdown::Overflow);
                if first {
                    warn!(
                        session = %self.id,
                        limit = self.limit,
                        "outbound queue full; closing slow session"
                    );
                }
                Enqueue::Overflow
            }
        }
    }

    /// Queues `message`, waiting for queue space if necessary.
    ///
    /// Returns [`Enqueue::Closed`] if the session ends before space frees up.
    pub async fn send(&self, message: Message) -> Enqueue {
        if self.is_closing() {
            return Enqueue::Closed;
        }
        match self.outbound.send(message).await {
            Ok(()) => Enqueue::Queued,
            Err(_) => Enqueue::Closed,
        }
    }

    /// Forces the session to shut its transport down.  Idempotent.
    pub fn close(&self) {
        if self.request_shutdown(Shutdown::Requested) {
            debug!(session = %self.id, "close requested");
        }
    }

    /// Returns `true` once the session has been asked to close or has ended.
    pub fn is_closing(&self) -> bool {
        *self.shutdown.borrow() != Shutdown::Open || self.outbound.is_closed()
    }

    /// Moves the shutdown signal out of `Open`.  Returns `true` for the call
    /// that actually flipped it.
    fn request_shutdown(&self, reason: Shutdown) -> bool {
        self.shutdown.send_if_modified(|state| {
            if *state == Shutdown::Open {
                *state = reason;
                true
            } else {
                false
            }
        })
    }
}

impl Participant for SessionHandle {
    fn id(&self) -> SessionId {
        self.id
    }

    fn deliver(&self, message: &Message) {
        if self.enqueue_outbound(message.clone()) == Enqueue::Closed {
            trace!(session = %self.id, "dropped message for closing session");
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One connection's pipeline, ready to be driven by [`Session::run`].
pub struct Session<S> {
    id: SessionId,
    limit: usize,
    stream: S,
    outbound: mpsc::Receiver<Message>,
    shutdown: watch::Receiver<Shutdown>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream` and returns the session together with its first handle.
    ///
    /// A limit of 0 is treated as 1.
    pub fn new(id: SessionId, stream: S, outbound_queue_limit: usize) -> (Self, SessionHandle) {
        let limit = outbound_queue_limit.max(1);
        let (outbound_tx, outbound_rx) = mpsc::channel(limit);
        let (shutdown_tx, shutdown_rx) = watch::channel(Shutdown::Open);

        let session = Self {
            id,
            limit,
            stream,
            outbound: outbound_rx,
            shutdown: shutdown_rx,
        };
        let handle = SessionHandle {
            id,
            limit,
            outbound: outbound_tx,
            shutdown: Arc::new(shutdown_tx),
        };
        (session, handle)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Runs the read and write pipelines until the session closes.
    ///
    /// Every complete inbound message is passed to `on_message`, in arrival
    /// order, from this task.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for transport failures, undecodable headers
    /// and outbound overflow.  All are fatal; there is no retry.
    pub async fn run<F>(self, mut on_message: F) -> Result<CloseReason, SessionError>
    where
        F: FnMut(Message),
    {
        let Self {
            id,
            limit,
            stream,
            mut outbound,
            mut shutdown,
        } = self;
        let (mut reader, mut writer) = tokio::io::split(stream);

        debug!(session = %id, state = ?SessionState::AwaitingHeader, "session started");

        let result = tokio::select! {
            r = read_loop(id, &mut reader, &mut on_message) => r,
            r = write_loop(id, &mut writer, &mut outbound, limit) => r,
            signal = wait_for_shutdown(&mut shutdown) => match signal {
                Shutdown::Overflow => Err(SessionError::Overflow { limit }),
                Shutdown::Open | Shutdown::Requested => Ok(CloseReason::LocalClose),
            },
        };

        // From here on enqueue attempts see a closed channel.
        outbound.close();
        let mut stream = reader.unsplit(writer);
        if let Err(e) = stream.shutdown().await {
            trace!(session = %id, "transport shutdown: {e}");
        }

        debug!(session = %id, state = ?SessionState::Closed, "session ended");
        result
    }
}

// ── Pipelines ─────────────────────────────────────────────────────────────────

async fn read_loop<R, F>(
    id: SessionId,
    reader: &mut R,
    on_message: &mut F,
) -> Result<CloseReason, SessionError>
where
    R: AsyncRead + Unpin,
    F: FnMut(Message),
{
    let mut frame = InboundFrame::new();
    loop {
        let awaiting = frame.state();
        match reader.read_exact(frame.pending()).await {
            Ok(_) => {}
            Err(e)
                if e.kind() == io::ErrorKind::UnexpectedEof
                    && awaiting == ReadState::AwaitingHeader =>
            {
                return Ok(CloseReason::PeerClosed);
            }
            Err(e) => return Err(SessionError::Transport(e)),
        }

        match frame.complete()? {
            Some(message) => {
                trace!(session = %id, body_length = message.body_length(), "message received");
                on_message(message);
            }
            None => {
                trace!(session = %id, state = ?SessionState::from(frame.state()), "header decoded");
            }
        }
    }
}

async fn write_loop<W>(
    id: SessionId,
    writer: &mut W,
    outbound: &mut mpsc::Receiver<Message>,
    limit: usize,
) -> Result<CloseReason, SessionError>
where
    W: AsyncWrite + Unpin,
{
    let mut queue = OutboundQueue::new();
    loop {
        // Idle: nothing in flight until the next message arrives.
        let Some(first) = outbound.recv().await else {
            return Ok(CloseReason::Drained);
        };
        queue.enqueue(first);
        trace!(session = %id, state = ?WriteState::Writing, "write started");

        while let Some(message) = queue.in_flight() {
            writer.write_all(message.frame()).await?;
            // Pick up whatever arrived during the write, without waiting.
            while queue.len() < limit {
                match outbound.try_recv() {
                    Ok(more) => {
                        queue.enqueue(more);
                    }
                    Err(_) => break,
                }
            }
            queue.complete_write();
        }

        writer.flush().await?;
        trace!(session = %id, state = ?queue.state(), "outbound queue drained");
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<Shutdown>) -> Shutdown {
    let signalled = shutdown
        .wait_for(|state| *state != Shutdown::Open)
        .await
        .map(|state| *state);
    match signalled {
        Ok(state) => state,
        // Every handle is gone: only the write loop can end the session now.
        Err(_) => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
