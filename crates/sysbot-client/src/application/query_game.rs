//! QueryGameUseCase: metadata and icon queries against the peer.
//!
//! Each query is one command followed by one reply.  Queries are independent:
//! a failed icon fetch never aborts a metadata fetch and vice versa.
//!
//! # The "no game running" sentinel
//!
//! `getTitleID` answers `0000000000000000` when no game is running.  In that
//! state [`QueryGameUseCase::get_game_info`] does not send any further query
//! and returns [`GameInfo::no_game_running`] instead.
//!
//! # Icon fallback
//!
//! `game icon` is always the primary path.  When [`IconOptions`] enables it,
//! a failed or empty icon reply is retried once with `pixelPeek`, which
//! captures the current screen instead.  The fallback is opt-in and never the
//! default.

use sysbot_core::domain::game::metadata_or_default;
use sysbot_core::{Command, DecodeError, GameInfo, ImagePayload, TitleId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::console::{ConsoleLink, TransportError};

/// Errors returned by [`QueryGameUseCase::get_game_icon`].
#[derive(Debug, Error)]
pub enum IconError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer sent nothing before the deadline.
    #[error("peer returned no image data")]
    NoData,

    /// The bytes could not be turned into a complete JPEG.
    #[error("invalid image: {0}")]
    Invalid(#[from] DecodeError),
}

/// Options controlling icon retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IconOptions {
    /// Retry a failed `game icon` once with `pixelPeek`.
    pub pixel_peek_fallback: bool,
}

/// The game query use case.
///
/// Borrows the link mutably for its lifetime, so no other exchange can be
/// interleaved with a query.
pub struct QueryGameUseCase<'a, L: ConsoleLink + ?Sized> {
    link: &'a mut L,
    options: IconOptions,
}

impl<'a, L: ConsoleLink + ?Sized> QueryGameUseCase<'a, L> {
    pub fn new(link: &'a mut L, options: IconOptions) -> Self {
        Self { link, options }
    }

    /// Sends `command` and returns the trimmed text reply.
    async fn exchange_text(&mut self, command: &Command) -> Result<String, TransportError> {
        self.link.send_command(command).await?;
        let reply = self.link.receive_text().await?;
        debug!("{command} -> {:?}", reply.trim());
        Ok(reply.trim().to_string())
    }

    /// Queries the running title ID.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the exchange fails or times out.
    pub async fn get_title_id(&mut self) -> Result<TitleId, TransportError> {
        let reply = self.exchange_text(&Command::get_title_id()).await?;
        Ok(TitleId::new(&reply))
    }

    /// Queries the game name; an empty reply becomes `"-"`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the exchange fails or times out.
    pub async fn get_game_name(&mut self) -> Result<String, TransportError> {
        let reply = self.exchange_text(&Command::game_name()).await?;
        Ok(metadata_or_default(&reply))
    }

    /// Queries the game version; an empty reply becomes `"-"`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the exchange fails or times out.
    pub async fn get_game_version(&mut self) -> Result<String, TransportError> {
        let reply = self.exchange_text(&Command::game_version()).await?;
        Ok(metadata_or_default(&reply))
    }

    /// Queries the game author; an empty reply becomes `"-"`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the exchange fails or times out.
    pub async fn get_game_author(&mut self) -> Result<String, TransportError> {
        let reply = self.exchange_text(&Command::game_author()).await?;
        Ok(metadata_or_default(&reply))
    }

    /// Queries the title ID and, unless it is the sentinel, the name, version
    /// and author.
    ///
    /// Stops at the first failed query.  A timed-out field is not papered
    /// over with `"-"`: its reply may still be in flight, and the caller has
    /// to know the bundle is incomplete.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] of the first query that failed or timed
    /// out.
    pub async fn get_game_info(&mut self) -> Result<GameInfo, TransportError> {
        let title_id = self.get_title_id().await?;
        if title_id.is_no_game_running() {
            debug!("no game running; skipping metadata queries");
            return Ok(GameInfo::no_game_running());
        }

        let name = self.get_game_name().await?;
        let version = self.get_game_version().await?;
        let author = self.get_game_author().await?;

        Ok(GameInfo {
            title_id,
            name,
            version,
            author,
        })
    }

    /// Fetches the game icon as a validated JPEG.
    ///
    /// Callers should check the title ID first; with no game running the
    /// peer has no icon to send.
    ///
    /// # Errors
    ///
    /// - [`IconError::Transport`] on a connection failure (never retried).
    /// - [`IconError::NoData`] / [`IconError::Invalid`] when neither the
    ///   primary path nor the optional fallback produced a complete JPEG.
    pub async fn get_game_icon(&mut self) -> Result<ImagePayload, IconError> {
        match self.fetch_image(&Command::game_icon()).await {
            Ok(payload) => Ok(payload),
            Err(IconError::Transport(e)) if e.is_connection() => Err(IconError::Transport(e)),
            Err(e) if self.options.pixel_peek_fallback => {
                warn!("game icon failed ({e}); falling back to pixelPeek");
                self.fetch_image(&Command::pixel_peek()).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_image(&mut self, command: &Command) -> Result<ImagePayload, IconError> {
        self.link.send_command(command).await?;
        let response = self.link.receive_image().await?.ok_or(IconError::NoData)?;

        if !response.is_complete() {
            warn!(
                "{command}: image reply ended without end marker after {} bytes ({:?})",
                response.len(),
                response.encoding()
            );
        }
        let payload = ImagePayload::try_from_response(response)?;
        debug!("{command}: received {} byte JPEG", payload.len());
        Ok(payload)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::console::{ConnectionError, MockConsoleLink};
    use std::collections::VecDeque;
    use std::time::Duration;
    use sysbot_core::protocol::binary_to_hex_text;
    use sysbot_core::ImageResponse;

    // ── Scripted test double ──────────────────────────────────────────────────

    /// Replies from a script and records every command sent.
    #[derive(Default)]
    struct ScriptedLink {
        sent: Vec<String>,
        text_replies: VecDeque<Result<String, TransportError>>,
        image_replies: VecDeque<Result<Option<ImageResponse>, TransportError>>,
    }

    impl ScriptedLink {
        fn with_text(replies: &[&str]) -> Self {
            Self {
                text_replies: replies.iter().map(|r| Ok(r.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl ConsoleLink for ScriptedLink {
        async fn send_command(&mut self, command: &Command) -> Result<(), TransportError> {
            self.sent.push(command.to_string());
            Ok(())
        }

        async fn receive_text(&mut self) -> Result<String, TransportError> {
            self.text_replies
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout(Duration::from_millis(1))))
        }

        async fn receive_image(&mut self) -> Result<Option<ImageResponse>, TransportError> {
            self.image_replies.pop_front().unwrap_or(Ok(None))
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    const JPEG: [u8; 6] = [0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9];

    // ── Metadata ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_game_info_queries_all_fields_when_game_running() {
        // Arrange
        let mut link =
            ScriptedLink::with_text(&["0100ABCD12340000\r\n", "Test Game\n", "1.0.2\n", "Studio\n"]);

        // Act
        let info = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_info()
            .await
            .unwrap();

        // Assert
        assert_eq!(info.title_id.as_str(), "0100ABCD12340000");
        assert_eq!(info.name, "Test Game");
        assert_eq!(info.version, "1.0.2");
        assert_eq!(info.author, "Studio");
        assert_eq!(
            link.sent,
            vec!["getTitleID", "game name", "game version", "game author"]
        );
    }

    #[tokio::test]
    async fn test_get_game_info_sentinel_skips_metadata_queries() {
        // Arrange
        let mut link = ScriptedLink::with_text(&["0000000000000000\n"]);

        // Act
        let info = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_info()
            .await
            .unwrap();

        // Assert – only getTitleID went out, and the default bundle came back
        assert_eq!(info, GameInfo::no_game_running());
        assert_eq!(link.sent, vec!["getTitleID"]);
    }

    #[tokio::test]
    async fn test_get_game_info_surfaces_field_timeout_and_stops() {
        // Arrange – the title answers, `game name` never does
        let mut link = ScriptedLink::with_text(&["0100000000010000"]);

        // Act
        let result = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_info()
            .await;

        // Assert – no further query is sent behind an unanswered one
        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert_eq!(link.sent, vec!["getTitleID", "game name"]);
    }

    #[tokio::test]
    async fn test_get_game_info_propagates_connection_errors() {
        // Arrange
        let mut link = ScriptedLink::with_text(&["0100000000010000"]);
        link.text_replies
            .push_back(Err(ConnectionError::Closed.into()));

        // Act
        let result = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_info()
            .await;

        // Assert
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }

    #[tokio::test]
    async fn test_blank_metadata_reply_becomes_dash() {
        let mut link = ScriptedLink::with_text(&["\r\n"]);
        let name = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_name()
            .await
            .unwrap();
        assert_eq!(name, "-");
    }

    #[tokio::test]
    async fn test_get_title_id_surfaces_timeout() {
        // Arrange – a mock link whose reply never arrives
        let mut link = MockConsoleLink::new();
        link.expect_send_command()
            .withf(|cmd| cmd.as_str() == "getTitleID")
            .times(1)
            .returning(|_| Ok(()));
        link.expect_receive_text()
            .times(1)
            .returning(|| Err(TransportError::Timeout(Duration::from_secs(2))));

        // Act
        let result = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_title_id()
            .await;

        // Assert
        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }

    // ── Icon ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_game_icon_converts_hex_reply() {
        // Arrange
        let mut link = ScriptedLink::default();
        let hex = format!("{}\n", binary_to_hex_text(&JPEG));
        link.image_replies
            .push_back(Ok(Some(ImageResponse::Hex(hex.into_bytes()))));

        // Act
        let icon = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_icon()
            .await
            .unwrap();

        // Assert
        assert_eq!(icon.as_bytes(), &JPEG);
        assert_eq!(link.sent, vec!["game icon"]);
    }

    #[tokio::test]
    async fn test_get_game_icon_without_fallback_reports_no_data() {
        let mut link = ScriptedLink::default();

        let result = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_icon()
            .await;

        assert!(matches!(result, Err(IconError::NoData)));
        assert_eq!(link.sent, vec!["game icon"]);
    }

    #[tokio::test]
    async fn test_get_game_icon_partial_reply_is_invalid_image() {
        // Arrange – start marker but no end marker (deadline hit mid-stream)
        let mut link = ScriptedLink::default();
        link.image_replies
            .push_back(Ok(Some(ImageResponse::Binary(vec![0xFF, 0xD8, 0x00, 0x11]))));

        // Act
        let result = QueryGameUseCase::new(&mut link, IconOptions::default())
            .get_game_icon()
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(IconError::Invalid(DecodeError::MissingEndMarker))
        ));
    }

    #[tokio::test]
    async fn test_get_game_icon_falls_back_to_pixel_peek_when_enabled() {
        // Arrange – the primary path yields nothing, the fallback a real JPEG
        let mut link = ScriptedLink::default();
        link.image_replies.push_back(Ok(None));
        link.image_replies
            .push_back(Ok(Some(ImageResponse::Binary(JPEG.to_vec()))));
        let options = IconOptions {
            pixel_peek_fallback: true,
        };

        // Act
        let icon = QueryGameUseCase::new(&mut link, options)
            .get_game_icon()
            .await
            .unwrap();

        // Assert
        assert_eq!(icon.as_bytes(), &JPEG);
        assert_eq!(link.sent, vec!["game icon", "pixelPeek"]);
    }

    #[tokio::test]
    async fn test_get_game_icon_never_falls_back_after_connection_error() {
        // Arrange
        let mut link = ScriptedLink::default();
        link.image_replies
            .push_back(Err(ConnectionError::Closed.into()));
        let options = IconOptions {
            pixel_peek_fallback: true,
        };

        // Act
        let result = QueryGameUseCase::new(&mut link, options).get_game_icon().await;

        // Assert
        assert!(matches!(result, Err(IconError::Transport(_))));
        assert_eq!(link.sent, vec!["game icon"]);
    }
}
