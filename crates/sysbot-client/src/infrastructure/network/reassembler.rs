//! Streaming reassembly of image replies.
//!
//! The peer answers `game icon` with a JPEG that may arrive as raw bytes or as
//! printable hex digits, split over any number of socket reads.  The first
//! chunk decides which: if it starts with the `FFD8` token the stream is
//! hex, otherwise it is binary.  Chunks are then appended until the end
//! marker shows up, the peer closes the socket, or the deadline passes.
//!
//! A missing end marker is not an error here.  Whatever arrived is returned
//! and validation happens later in [`sysbot_core::ImagePayload`].

use std::io;
use std::time::Duration;

use sysbot_core::protocol::{is_complete, looks_like_hex_image};
use sysbot_core::{ImageEncoding, ImageResponse};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Result of one reassembly.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reassembled {
    /// `None` when not a single byte arrived.
    pub response: Option<ImageResponse>,
    /// The peer closed the stream (a zero-length read) before completion.
    pub peer_closed: bool,
    /// The deadline elapsed before completion.
    pub timed_out: bool,
}

enum ChunkRead {
    Data(usize),
    Closed,
    DeadlineElapsed,
}

/// Reads one image reply from `reader`.
///
/// `buffer_size` is the size of each socket read; `timeout` bounds the whole
/// reassembly, not each read.
///
/// # Errors
///
/// Only I/O errors from the reader itself.  Timeouts and early EOF are
/// reported through the flags on [`Reassembled`].
pub async fn reassemble<R>(
    reader: &mut R,
    buffer_size: usize,
    timeout: Duration,
) -> io::Result<Reassembled>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let deadline = Instant::now() + timeout;
    let mut read_tmp = vec![0u8; buffer_size.max(1)];
    let mut buffer: Vec<u8> = Vec::new();
    let mut encoding: Option<ImageEncoding> = None;
    let mut outcome = Reassembled::default();

    loop {
        match read_chunk(reader, &mut read_tmp, deadline).await? {
            ChunkRead::Data(n) => {
                let chunk = &read_tmp[..n];
                let mode = *encoding.get_or_insert_with(|| detect(chunk));
                buffer.extend_from_slice(chunk);
                debug!("image chunk: {n} bytes ({} total, {mode:?})", buffer.len());

                if is_complete(&buffer, mode) {
                    break;
                }
            }
            ChunkRead::Closed => {
                outcome.peer_closed = true;
                break;
            }
            ChunkRead::DeadlineElapsed => {
                outcome.timed_out = true;
                break;
            }
        }
    }

    if outcome.timed_out && !buffer.is_empty() {
        warn!(
            "image read hit the {timeout:?} deadline after {} bytes; returning partial data",
            buffer.len()
        );
    }

    outcome.response = encoding.map(|mode| match mode {
        ImageEncoding::Hex => ImageResponse::Hex(buffer),
        ImageEncoding::Binary => ImageResponse::Binary(buffer),
    });
    Ok(outcome)
}

fn detect(first_chunk: &[u8]) -> ImageEncoding {
    if looks_like_hex_image(first_chunk) {
        ImageEncoding::Hex
    } else {
        ImageEncoding::Binary
    }
}

async fn read_chunk<R>(reader: &mut R, buf: &mut [u8], deadline: Instant) -> io::Result<ChunkRead>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match tokio::time::timeout_at(deadline, reader.read(buf)).await {
        Ok(Ok(0)) => Ok(ChunkRead::Closed),
        Ok(Ok(n)) => Ok(ChunkRead::Data(n)),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(ChunkRead::DeadlineElapsed),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sysbot_core::protocol::binary_to_hex_text;
    use tokio::io::AsyncWriteExt;

    fn jpeg(len: usize) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend((0..len - 4).map(|i| (i % 200) as u8));
        bytes.extend([0xFF, 0xD9]);
        bytes
    }

    #[tokio::test]
    async fn test_binary_stream_split_over_many_chunks() {
        // Arrange – a small duplex buffer forces many short reads
        let image = jpeg(10_000);
        let (mut peer, mut client) = tokio::io::duplex(512);
        let sent = image.clone();
        let writer = tokio::spawn(async move {
            peer.write_all(&sent).await.unwrap();
            peer
        });

        // Act
        let out = reassemble(&mut client, 4096, Duration::from_secs(5))
            .await
            .unwrap();

        // Assert
        assert_eq!(out.response, Some(ImageResponse::Binary(image)));
        assert!(!out.peer_closed);
        assert!(!out.timed_out);
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_hex_stream_is_detected_and_kept_as_text() {
        // Arrange
        let text = format!("{}\n", binary_to_hex_text(&jpeg(3_000)));
        let (mut peer, mut client) = tokio::io::duplex(700);
        let sent = text.clone();
        let writer = tokio::spawn(async move {
            peer.write_all(sent.as_bytes()).await.unwrap();
            peer
        });

        // Act
        let out = reassemble(&mut client, 4096, Duration::from_secs(5))
            .await
            .unwrap();

        // Assert
        assert_eq!(out.response, Some(ImageResponse::Hex(text.into_bytes())));
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_single_chunk_hex_reply_completes() {
        let text = binary_to_hex_text(&jpeg(16));
        let (mut peer, mut client) = tokio::io::duplex(4096);
        peer.write_all(text.as_bytes()).await.unwrap();

        let out = reassemble(&mut client, 4096, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(out.response, Some(ImageResponse::Hex(text.into_bytes())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_partial_binary_data() {
        // Arrange – start marker but the end marker never comes
        let (mut peer, mut client) = tokio::io::duplex(4096);
        peer.write_all(&[0xFF, 0xD8, 0x10, 0x20]).await.unwrap();

        // Act
        let out = reassemble(&mut client, 4096, Duration::from_secs(10))
            .await
            .unwrap();

        // Assert
        assert!(out.timed_out);
        let response = out.response.unwrap();
        assert_eq!(response.as_bytes(), &[0xFF, 0xD8, 0x10, 0x20]);
        assert!(!response.is_complete());
        drop(peer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_yields_no_data() {
        let (_peer, mut client) = tokio::io::duplex(64);

        let out = reassemble(&mut client, 4096, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(out.response, None);
        assert!(out.timed_out);
    }

    #[tokio::test]
    async fn test_peer_close_stops_binary_reassembly() {
        // Arrange
        let (mut peer, mut client) = tokio::io::duplex(64);
        peer.write_all(&[0xFF, 0xD8, 0x01]).await.unwrap();
        drop(peer);

        // Act
        let out = reassemble(&mut client, 4096, Duration::from_secs(1))
            .await
            .unwrap();

        // Assert
        assert!(out.peer_closed);
        assert_eq!(
            out.response,
            Some(ImageResponse::Binary(vec![0xFF, 0xD8, 0x01]))
        );
    }
}
