//! ChatClient: connects operator input and output to one relay session.
//!
//! # Flow
//!
//! ```text
//!   InputSource ──lines──► pump_input ──send()──► SessionHandle ─┐
//!                                                                 ▼
//!   MessageDisplay ◄──show()── on_message ◄── Session::run ◄── relay
//! ```
//!
//! Both halves run concurrently on the calling task:
//!
//! - When input ends, the pump drops the last [`SessionHandle`].  The session
//!   then writes everything still queued and closes
//!   ([`CloseReason::Drained`]).  Lines typed just before end of input are
//!   therefore never lost.
//! - When the relay closes the connection first, the pump is abandoned
//!   mid-read and the client finishes immediately.
//!
//! The pump uses [`SessionHandle::send`], which waits for queue space, so a
//! fast input source is slowed down rather than dropped.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{CloseReason, Enqueue, Message, Session, SessionError, SessionHandle};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Source of outbound lines, such as the operator's terminal.
#[async_trait]
pub trait InputSource: Send {
    /// Returns the next line without its line terminator, or `None` once
    /// input has ended.
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Sink for received messages, such as the operator's terminal.
///
/// Called synchronously from the session's read loop, once per message, in
/// arrival order.
pub trait MessageDisplay: Send + Sync {
    fn show(&self, message: &Message) -> io::Result<()>;
}

/// Sends every line from `input` through `handle` until input ends, input
/// fails, or the session closes.
///
/// Consumes `handle`, so when this returns the caller no longer keeps the
/// session's outbound side open.  Returns the number of lines queued.
///
/// # Errors
///
/// Returns the input source's I/O error.  Lines queued before the error are
/// still delivered.
pub async fn pump_input<I: InputSource>(mut input: I, handle: SessionHandle) -> io::Result<usize> {
    let mut sent = 0;
    while let Some(line) = input.next_line().await? {
        match handle.send(Message::new(line)).await {
            Enqueue::Queued => sent += 1,
            // `send` waits for space, so only `Closed` is possible here.
            Enqueue::Closed | Enqueue::Overflow => {
                debug!(session = %handle.id(), "session closed; no longer reading input");
                break;
            }
        }
    }
    Ok(sent)
}

/// The client's single use case.
pub struct ChatClient<I, D> {
    input: I,
    display: Arc<D>,
}

impl<I, D> ChatClient<I, D>
where
    I: InputSource,
    D: MessageDisplay,
{
    pub fn new(input: I, display: Arc<D>) -> Self {
        Self { input, display }
    }

    /// Runs until the session closes.
    ///
    /// `handle` must be the only handle to `session` still alive, otherwise
    /// the session cannot drain and close when input ends.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the connection failed or the relay sent
    /// something undecodable.
    pub async fn run<S>(
        self,
        session: Session<S>,
        handle: SessionHandle,
    ) -> Result<CloseReason, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Self { input, display } = self;

        let relay = session.run(|message| {
            if let Err(e) = display.show(&message) {
                warn!("failed to display message: {e}");
            }
        });
        let pump = pump_input(input, handle);
        tokio::pin!(relay, pump);

        tokio::select! {
            result = &mut relay => result,
            pumped = &mut pump => {
                match pumped {
                    Ok(sent) => info!(sent, "end of input; flushing queued messages"),
                    Err(e) => warn!("input failed: {e}; flushing queued messages"),
                }
                relay.await
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display::mock::RecordingDisplay;
    use crate::infrastructure::input::mock::ScriptedInput;
    use relay_core::{encode_frame, SessionId, MAX_BODY_LENGTH};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_pump_sends_each_line_in_order_then_releases_handle() {
        // Arrange
        let (local, mut peer) = duplex(4096);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let input = ScriptedInput::new(["first", "second", "third"]);

        // Act
        let sent = assert_ok!(pump_input(input, handle).await);
        let reason = assert_ok!(session.run(|_| {}).await);
        let mut wire = Vec::new();
        assert_ok!(peer.read_to_end(&mut wire).await);

        // Assert
        assert_eq!(sent, 3);
        assert_eq!(reason, CloseReason::Drained);
        let expected: Vec<u8> = ["first", "second", "third"]
            .iter()
            .flat_map(|l| encode_frame(l.as_bytes()))
            .collect();
        assert_eq!(wire, expected);
    }

    #[tokio::test]
    async fn test_pump_stops_when_session_is_closed() {
        let (local, _peer) = duplex(64);
        let (_session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        handle.close();

        let sent = assert_ok!(pump_input(ScriptedInput::new(["ignored"]), handle).await);

        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_chat_flushes_queued_lines_when_input_ends() {
        // Arrange
        let (local, mut peer) = duplex(64 * 1024);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let display = Arc::new(RecordingDisplay::new());
        let client = ChatClient::new(ScriptedInput::new(["a", "b"]), Arc::clone(&display));

        // Act
        let reason = assert_ok!(client.run(session, handle).await);
        let mut wire = Vec::new();
        assert_ok!(peer.read_to_end(&mut wire).await);

        // Assert
        assert_eq!(reason, CloseReason::Drained);
        let mut expected = encode_frame(b"a");
        expected.extend(encode_frame(b"b"));
        assert_eq!(wire, expected);
    }

    #[tokio::test]
    async fn test_chat_displays_received_messages_until_relay_closes() {
        // Arrange: input never ends, so only the relay can end the session
        let (local, mut peer) = duplex(4096);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let display = Arc::new(RecordingDisplay::new());
        let client = ChatClient::new(ScriptedInput::hanging(Vec::<&str>::new()), Arc::clone(&display));
        let mut frames = encode_frame(b"hello");
        frames.extend(encode_frame(b"world"));

        // Act
        peer.write_all(&frames).await.unwrap();
        drop(peer);
        let reason = assert_ok!(client.run(session, handle).await);

        // Assert
        assert_eq!(reason, CloseReason::PeerClosed);
        assert_eq!(display.texts(), ["hello", "world"]);
    }

    #[tokio::test]
    async fn test_display_failure_does_not_end_session() {
        let (local, mut peer) = duplex(4096);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let display = Arc::new(RecordingDisplay::failing());
        let client = ChatClient::new(ScriptedInput::hanging(Vec::<&str>::new()), display);

        peer.write_all(&encode_frame(b"x")).await.unwrap();
        drop(peer);
        let reason = assert_ok!(client.run(session, handle).await);

        assert_eq!(reason, CloseReason::PeerClosed);
    }

    #[tokio::test]
    async fn test_input_error_still_flushes_earlier_lines() {
        let (local, mut peer) = duplex(4096);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let client = ChatClient::new(
            ScriptedInput::failing(["kept"]),
            Arc::new(RecordingDisplay::new()),
        );

        let reason = assert_ok!(client.run(session, handle).await);
        let mut wire = Vec::new();
        assert_ok!(peer.read_to_end(&mut wire).await);

        assert_eq!(reason, CloseReason::Drained);
        assert_eq!(wire, encode_frame(b"kept"));
    }

    #[tokio::test]
    async fn test_long_line_is_truncated_to_max_body() {
        let (local, mut peer) = duplex(4096);
        let (session, handle) = Session::new(SessionId::from_raw(1), local, 16);
        let long = "y".repeat(MAX_BODY_LENGTH + 100);

        assert_ok!(pump_input(ScriptedInput::new([long.as_str()]), handle).await);
        assert_ok!(session.run(|_| {}).await);
        let mut wire = Vec::new();
        assert_ok!(peer.read_to_end(&mut wire).await);

        assert_eq!(&wire[..4], b" 512");
        assert_eq!(wire.len(), 4 + MAX_BODY_LENGTH);
    }
}
