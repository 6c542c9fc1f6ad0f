//! The console link seam and the transport error taxonomy.
//!
//! Every use case in this layer talks to the peer through [`ConsoleLink`].
//! The infrastructure `Session` implements it over TCP; unit tests use
//! recording doubles or the generated `MockConsoleLink`.
//!
//! # Error taxonomy
//!
//! All I/O failures are converted to one of two kinds before they leave the
//! transport:
//!
//! - [`TransportError::Connection`] – the socket is unavailable or closed.
//!   Fatal to the session; never retried internally.
//! - [`TransportError::Timeout`] – no reply within the deadline.  Text
//!   queries surface it; binary reads degrade to a partial result instead.

use std::time::Duration;

use async_trait::async_trait;
use sysbot_core::{Command, ImageResponse};
use thiserror::Error;

/// Socket-level failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// TCP connect (or name resolution) failed.
    #[error("failed to connect to peer at {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// The session has no open socket.
    #[error("session is not connected")]
    NotConnected,

    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by a [`ConsoleLink`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("no reply from peer within {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection(_))
    }
}

/// One command/response channel to the peer.
///
/// Implementations must allow only one outstanding exchange at a time: the
/// protocol carries no correlation IDs, so a reply can only be attributed to
/// the command sent immediately before it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsoleLink: Send {
    /// Frames and writes one command, then waits the post-send delay.
    async fn send_command(&mut self, command: &Command) -> Result<(), TransportError>;

    /// Reads one newline-terminated text reply.
    async fn receive_text(&mut self) -> Result<String, TransportError>;

    /// Reassembles one image reply.
    ///
    /// Returns `Ok(None)` when no data arrived at all, and a possibly
    /// incomplete [`ImageResponse`] when the deadline cut the stream short.
    async fn receive_image(&mut self) -> Result<Option<ImageResponse>, TransportError>;

    /// Last known socket health.  Does not probe the peer.
    fn is_connected(&self) -> bool;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
