//! Network infrastructure: the TCP session to the peer.
//!
//! Architecture:
//! - [`Session`] owns one socket exclusively and performs one exchange at a
//!   time: frame and write a command, wait the post-send delay, then read
//!   either a text line or an image reply.
//! - Image replies are handed to [`reassembler::reassemble`], which detects
//!   the encoding from the first chunk.
//! - [`SharedSession`] serialises access when more than one task needs the
//!   same session.
//!
//! All I/O failures are converted to [`TransportError`] here; no raw
//! `std::io::Error` leaves this module.
//!
//! # Reply attribution
//!
//! The protocol has no request IDs: a reply belongs to the command written
//! last.  Anything that reaches the client before a command is written (a
//! reply that arrived after its deadline, or the newline trailing a hex
//! image) is discarded by [`Session::send_command`] before the write.  A hex
//! image's newline that only shows up after the next command went out is
//! skipped by the next text read.
//!
//! `Session` is generic over the stream so tests can drive it over an
//! in-memory pipe instead of a real socket.

pub mod reassembler;
pub mod shared;

use std::io;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use sysbot_core::protocol::encode_command;
use sysbot_core::{Command, ImageEncoding, ImageResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::console::{ConnectionError, ConsoleLink, TransportError};
pub use reassembler::{reassemble, Reassembled};
pub use shared::SharedSession;

/// Timing and buffer settings for a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on TCP connect (including name resolution).
    pub connect_timeout: Duration,
    /// Pause after every command so the peer's main loop can keep up.
    pub command_delay: Duration,
    /// Deadline for a text reply.
    pub text_timeout: Duration,
    /// Deadline for a whole image reply.
    pub binary_timeout: Duration,
    /// Size of each socket read during image reassembly.
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            command_delay: Duration::from_millis(50),
            text_timeout: Duration::from_secs(2),
            binary_timeout: Duration::from_secs(10),
            read_buffer_size: 4096,
        }
    }
}

/// Last known health of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// One TCP session to the peer.
pub struct Session<S = TcpStream> {
    stream: Option<BufReader<S>>,
    /// Address used by [`Session::reconnect`]; `None` for sessions built
    /// from an existing stream.
    peer: Option<String>,
    config: SessionConfig,
    /// Current receive deadline.  Starts at `config.text_timeout`.
    timeout: Duration,
    state: ConnectionState,
    /// The last hex image ended at its `FFD9` token before the peer's
    /// trailing newline was read.
    pending_terminator: bool,
}

impl Session<TcpStream> {
    /// Opens a TCP connection to `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConnectFailed`] on refusal, name
    /// resolution failure, or when the connect timeout elapses.
    pub async fn connect(addr: &str, config: SessionConfig) -> Result<Self, ConnectionError> {
        let stream = dial(addr, config.connect_timeout).await?;
        info!("connected to peer at {addr}");

        let mut session = Session::from_stream(stream, config);
        session.peer = Some(addr.to_string());
        Ok(session)
    }

    /// Drops the current socket (if any) and dials the remembered address
    /// again.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::NotConnected`] if the session never had an address,
    /// otherwise the same errors as [`Session::connect`].
    pub async fn reconnect(&mut self) -> Result<(), ConnectionError> {
        let addr = self.peer.clone().ok_or(ConnectionError::NotConnected)?;
        self.disconnect().await;

        let stream = dial(&addr, self.config.connect_timeout).await?;
        self.stream = Some(BufReader::new(stream));
        self.state = ConnectionState::Connected;
        self.pending_terminator = false;
        info!("reconnected to peer at {addr}");
        Ok(())
    }
}

async fn dial(addr: &str, connect_timeout: Duration) -> Result<TcpStream, ConnectionError> {
    let connect_failed = |source| ConnectionError::ConnectFailed {
        addr: addr.to_string(),
        source,
    };

    let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(result) => result.map_err(connect_failed)?,
        Err(_) => {
            return Err(connect_failed(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {connect_timeout:?}"),
            )))
        }
    };

    // Commands are tiny; don't let Nagle hold them back.
    if let Err(e) = stream.set_nodelay(true) {
        debug!("could not set TCP_NODELAY: {e}");
    }
    Ok(stream)
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an already-connected stream.
    pub fn from_stream(stream: S, config: SessionConfig) -> Self {
        Self {
            stream: Some(BufReader::new(stream)),
            peer: None,
            config,
            timeout: config.text_timeout,
            state: ConnectionState::Connected,
            pending_terminator: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Last known socket health.  Does not probe the peer.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The current receive deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Replaces the receive deadline until the returned guard is dropped.
    ///
    /// The guard derefs to the session, so exchanges can run through it.  The
    /// previous deadline is restored on every exit path, including early
    /// returns with `?` and panics.
    pub fn override_timeout(&mut self, timeout: Duration) -> TimeoutOverride<'_, S> {
        let previous = std::mem::replace(&mut self.timeout, timeout);
        TimeoutOverride {
            session: self,
            previous,
        }
    }

    // ── Exchanges ─────────────────────────────────────────────────────────────

    /// Frames and writes `command`, then waits the configured command delay.
    ///
    /// Input that is already buffered or readable without waiting is
    /// discarded first; it cannot be the reply to `command`.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::NotConnected`] if the session is closed, or
    /// [`ConnectionError::Io`] if the write fails (the session is then marked
    /// disconnected).
    pub async fn send_command(&mut self, command: &Command) -> Result<(), TransportError> {
        let bytes = encode_command(command);
        self.discard_stale_input().await?;
        let stream = self.stream_mut()?;

        let written = match stream.write_all(&bytes).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            return Err(self.fail(e));
        }

        debug!("sent {:?}", command.as_str());
        tokio::time::sleep(self.config.command_delay).await;
        Ok(())
    }

    /// Reads one text reply using the current deadline.
    pub async fn receive_text(&mut self) -> Result<String, TransportError> {
        let timeout = self.timeout;
        self.receive_text_within(timeout).await
    }

    /// Reads one newline-terminated text reply, without its line terminator.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Timeout`] if no complete line arrives in time.  The
    ///   session stays connected.
    /// - [`ConnectionError::Closed`] if the peer closed the socket.
    pub async fn receive_text_within(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            let stream = self.stream_mut()?;
            let mut line = Vec::new();

            match tokio::time::timeout_at(deadline, stream.read_until(b'\n', &mut line)).await {
                Err(_) => {
                    warn!("no text reply within {timeout:?}");
                    return Err(TransportError::Timeout(timeout));
                }
                Ok(Err(e)) => return Err(self.fail(e)),
                Ok(Ok(0)) => {
                    self.mark_closed();
                    return Err(ConnectionError::Closed.into());
                }
                Ok(Ok(_)) => {
                    let leftover = std::mem::take(&mut self.pending_terminator);
                    while matches!(line.last(), Some(b'\n' | b'\r')) {
                        line.pop();
                    }
                    if leftover && line.is_empty() {
                        debug!("skipped newline left over from a hex image");
                        continue;
                    }
                    let text = String::from_utf8_lossy(&line).into_owned();
                    debug!("received {text:?}");
                    return Ok(text);
                }
            }
        }
    }

    /// Reassembles one image reply with a scoped deadline of `timeout`.
    ///
    /// Returns `Ok(None)` when nothing arrived and a possibly incomplete
    /// response when the deadline cut the stream short.
    ///
    /// # Errors
    ///
    /// [`TransportError::Connection`] only.  Timeouts degrade to a partial
    /// result.
    pub async fn receive_binary(
        &mut self,
        buffer_size: usize,
        timeout: Duration,
    ) -> Result<Option<ImageResponse>, TransportError> {
        let mut scoped = self.override_timeout(timeout);
        scoped.read_image(buffer_size).await
    }

    async fn read_image(
        &mut self,
        buffer_size: usize,
    ) -> Result<Option<ImageResponse>, TransportError> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;

        let out = match reassemble(stream, buffer_size, timeout).await {
            Ok(out) => out,
            Err(e) => return Err(self.fail(e)),
        };
        if out.peer_closed {
            self.mark_closed();
        }
        self.pending_terminator = out.response.as_ref().is_some_and(|response| {
            response.encoding() == ImageEncoding::Hex
                && response.is_complete()
                && !response.as_bytes().ends_with(b"\n")
        });
        Ok(out.response)
    }

    /// Shuts the socket down and marks the session disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("shutdown failed: {e}");
            }
            info!("disconnected from peer");
        }
        self.state = ConnectionState::Disconnected;
        self.pending_terminator = false;
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn stream_mut(&mut self) -> Result<&mut BufReader<S>, TransportError> {
        self.stream
            .as_mut()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    /// Drops every byte that is buffered or readable without waiting.
    ///
    /// Never blocks.  A peer that has closed is left for the next read to
    /// report.
    async fn discard_stale_input(&mut self) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;
        let mut discarded = Vec::new();

        loop {
            // Poll once; `Pending` means nothing is readable right now.
            let ready = std::future::poll_fn(|cx| match Pin::new(&mut *stream).poll_fill_buf(cx) {
                Poll::Pending => Poll::Ready(Ok(None)),
                Poll::Ready(Ok(buf)) => Poll::Ready(Ok(Some(buf.to_vec()))),
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            })
            .await;

            match ready {
                Ok(Some(bytes)) if !bytes.is_empty() => {
                    Pin::new(&mut *stream).consume(bytes.len());
                    discarded.extend_from_slice(&bytes);
                }
                Ok(_) => break,
                Err(e) => return Err(self.fail(e)),
            }
        }

        if discarded.is_empty() {
            return Ok(());
        }
        if discarded.iter().all(|b| matches!(b, b'\r' | b'\n')) {
            debug!("dropped {} stray line terminator byte(s)", discarded.len());
        } else {
            warn!(
                "dropped {} byte(s) of unattributable input: {:?}",
                discarded.len(),
                String::from_utf8_lossy(&discarded)
            );
        }
        self.pending_terminator = false;
        Ok(())
    }

    fn fail(&mut self, error: io::Error) -> TransportError {
        warn!("connection lost: {error}");
        self.stream = None;
        self.state = ConnectionState::Disconnected;
        ConnectionError::Io(error).into()
    }

    fn mark_closed(&mut self) {
        info!("peer closed the connection");
        self.stream = None;
        self.state = ConnectionState::Disconnected;
    }
}

#[async_trait]
impl<S> ConsoleLink for Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_command(&mut self, command: &Command) -> Result<(), TransportError> {
        Session::send_command(self, command).await
    }

    async fn receive_text(&mut self) -> Result<String, TransportError> {
        Session::receive_text(self).await
    }

    async fn receive_image(&mut self) -> Result<Option<ImageResponse>, TransportError> {
        let SessionConfig {
            read_buffer_size,
            binary_timeout,
            ..
        } = self.config;
        self.receive_binary(read_buffer_size, binary_timeout).await
    }

    fn is_connected(&self) -> bool {
        Session::is_connected(self)
    }
}

// ── Scoped timeout ────────────────────────────────────────────────────────────

/// Guard returned by [`Session::override_timeout`].
pub struct TimeoutOverride<'a, S> {
    session: &'a mut Session<S>,
    previous: Duration,
}

impl<S> Deref for TimeoutOverride<'_, S> {
    type Target = Session<S>;

    fn deref(&self) -> &Session<S> {
        self.session
    }
}

impl<S> DerefMut for TimeoutOverride<'_, S> {
    fn deref_mut(&mut self) -> &mut Session<S> {
        self.session
    }
}

impl<S> Drop for TimeoutOverride<'_, S> {
    fn drop(&mut self) {
        self.session.timeout = self.previous;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
