//! Image reply types.
//!
//! The peer answers `game icon` (and `pixelPeek`) with a JPEG, but it may send
//! the JPEG as raw bytes *or* as ASCII hex digits.  The reassembler on the
//! client side detects which from the first chunk and hands back an
//! [`ImageResponse`] tagged with the encoding it committed to.  Converting that
//! into a validated [`ImagePayload`] is shared logic and lives here.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::{
    hex_text_to_binary, is_complete, DecodeError, JPEG_END_MARKER, JPEG_START_MARKER,
};

/// How an image reply was encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// Raw JPEG bytes (`0xFF 0xD8 ... 0xFF 0xD9`).
    Binary,
    /// Printable hex digits (`"FFD8...FFD9"`).
    Hex,
}

/// An image reply exactly as it was accumulated from the socket.
///
/// The bytes may be incomplete when the read deadline elapsed before the end
/// marker arrived.  Use [`ImageResponse::is_complete`] or
/// [`ImagePayload::try_from_response`] to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResponse {
    /// Raw binary bytes.
    Binary(Vec<u8>),
    /// Hex text, still in its ASCII byte form.
    Hex(Vec<u8>),
}

impl ImageResponse {
    /// Returns the encoding the reassembler committed to.
    pub fn encoding(&self) -> ImageEncoding {
        match self {
            ImageResponse::Binary(_) => ImageEncoding::Binary,
            ImageResponse::Hex(_) => ImageEncoding::Hex,
        }
    }

    /// Returns the accumulated bytes without conversion.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ImageResponse::Binary(bytes) | ImageResponse::Hex(bytes) => bytes,
        }
    }

    /// Number of bytes accumulated on the wire.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Returns `true` if the end-of-image marker was received.
    pub fn is_complete(&self) -> bool {
        is_complete(self.as_bytes(), self.encoding())
    }
}

/// A complete, validated JPEG image.
///
/// Invariant: the bytes start with `0xFF 0xD8` and end with `0xFF 0xD9`.
/// Icons are usually some tens of kilobytes, but size is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Validates raw JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if either JPEG marker is missing.
    pub fn from_binary(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if !bytes.starts_with(&JPEG_START_MARKER) {
            return Err(DecodeError::MissingStartMarker);
        }
        if !bytes.ends_with(&JPEG_END_MARKER) {
            return Err(DecodeError::MissingEndMarker);
        }
        Ok(Self { bytes })
    }

    /// Converts a reassembled reply into a validated image, unhexing it first
    /// when it arrived in hex mode.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the hex text is malformed or either JPEG
    /// marker is missing (for example, a reply truncated by the read
    /// deadline).
    pub fn try_from_response(response: ImageResponse) -> Result<Self, DecodeError> {
        match response {
            ImageResponse::Binary(bytes) => Self::from_binary(bytes),
            ImageResponse::Hex(text) => {
                let binary = hex_text_to_binary(&String::from_utf8_lossy(&text))?;
                Self::from_binary(binary)
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl TryFrom<ImageResponse> for ImagePayload {
    type Error = DecodeError;

    fn try_from(response: ImageResponse) -> Result<Self, Self::Error> {
        Self::try_from_response(response)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
