//! Framing codec for the sysbot line protocol.
//!
//! Wire format (outbound):
//! ```text
//! <ASCII command text>\r\n
//! ```
//!
//! Inbound replies are either a short text line or a JPEG image.  Images
//! arrive in one of two encodings for the *same* command, and nothing on the
//! wire says which one:
//!
//! ```text
//! raw binary:  FF D8 .. .. .. FF D9
//! hex ASCII:   "FFD8....FFD9\n"
//! ```
//!
//! The functions in this module recognise both forms from their JPEG
//! start/end markers.  They are pure: no I/O, no clocks, no allocation beyond
//! the returned values.

use thiserror::Error;

use crate::protocol::commands::Command;
use crate::protocol::image::ImageEncoding;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Two-byte line terminator appended to every outbound command.
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

/// JPEG start-of-image marker in raw binary form.
pub const JPEG_START_MARKER: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker in raw binary form.
pub const JPEG_END_MARKER: [u8; 2] = [0xFF, 0xD9];

/// JPEG start-of-image marker as rendered by the peer in hex mode.
pub const HEX_START_TOKEN: &str = "FFD8";

/// JPEG end-of-image marker as rendered by the peer in hex mode.
pub const HEX_END_TOKEN: &str = "FFD9";

/// Number of trailing characters searched for [`HEX_END_TOKEN`].
///
/// The peer may append a line terminator (and occasionally padding) after the
/// last hex pair, so the token is looked for near the end rather than exactly
/// at it.
pub const HEX_TAIL_WINDOW: usize = 8;

/// Errors that can occur while converting an image reply to binary JPEG bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload contained no bytes (or only whitespace).
    #[error("image payload is empty")]
    Empty,

    /// Hex text must contain an even number of digits.
    #[error("hex payload has odd length {len}")]
    OddLength { len: usize },

    /// A character outside `[0-9A-Fa-f]` was found in the hex text.
    #[error("invalid hex character {character:?} at index {index}")]
    InvalidHexCharacter { character: char, index: usize },

    /// The decoded bytes do not begin with `0xFF 0xD8`.
    #[error("payload does not start with the JPEG start-of-image marker")]
    MissingStartMarker,

    /// The decoded bytes do not end with `0xFF 0xD9`.
    #[error("payload does not end with the JPEG end-of-image marker")]
    MissingEndMarker,
}

// ── Outbound framing ──────────────────────────────────────────────────────────

/// Encodes a [`Command`] into the exact bytes to write to the socket.
///
/// The command text is copied verbatim and `\r\n` is appended exactly once.
/// [`Command`] guarantees the text itself never contains a terminator, so the
/// result always holds exactly one line.
///
/// # Examples
///
/// ```rust
/// use sysbot_core::protocol::{encode_command, Command};
///
/// let bytes = encode_command(&Command::get_title_id());
/// assert_eq!(bytes, b"getTitleID\r\n");
/// ```
pub fn encode_command(command: &Command) -> Vec<u8> {
    let text = command.as_str().as_bytes();
    let mut buf = Vec::with_capacity(text.len() + LINE_TERMINATOR.len());
    buf.extend_from_slice(text);
    buf.extend_from_slice(LINE_TERMINATOR);
    buf
}

// ── Inbound image recognition ─────────────────────────────────────────────────

/// Returns `true` if `bytes` look like the start of a hex-encoded JPEG.
///
/// The buffer is decoded permissively (invalid UTF-8 sequences become
/// replacement characters instead of failing) and, after trimming
/// whitespace, must begin with the `FFD8` token.  Raw binary JPEG data starts
/// with the byte `0xFF`, which never decodes to the letter `F`, so the two
/// encodings cannot be confused.
pub fn looks_like_hex_image(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_start();
    trimmed
        .get(..HEX_START_TOKEN.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HEX_START_TOKEN))
}

/// Returns `true` once `buffer` holds a complete image in the given encoding.
///
/// - [`ImageEncoding::Binary`]: the last two bytes are `0xFF 0xD9`.
/// - [`ImageEncoding::Hex`]: the last [`HEX_TAIL_WINDOW`] characters (after
///   trailing whitespace is removed) contain the `FFD9` token on a byte
///   boundary, i.e. at an even offset from the first hex digit.  A token
///   straddling two pairs (`..AFFD9B..`) does not count.
pub fn is_complete(buffer: &[u8], encoding: ImageEncoding) -> bool {
    match encoding {
        ImageEncoding::Binary => buffer.ends_with(&JPEG_END_MARKER),
        ImageEncoding::Hex => {
            let trimmed = trim_ascii_end(buffer);
            let first_digit = trimmed
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .unwrap_or(trimmed.len());
            let digits = &trimmed[first_digit..];
            let tail_start = digits.len().saturating_sub(HEX_TAIL_WINDOW);
            digits
                .windows(HEX_END_TOKEN.len())
                .enumerate()
                .skip(tail_start)
                .filter(|(offset, _)| offset % 2 == 0)
                .any(|(_, window)| window.eq_ignore_ascii_case(HEX_END_TOKEN.as_bytes()))
        }
    }
}

// ── Hex conversion ────────────────────────────────────────────────────────────

/// Converts a hex-encoded image reply into raw JPEG bytes.
///
/// Surrounding whitespace (including the peer's trailing newline) is ignored.
///
/// # Errors
///
/// - [`DecodeError::Empty`] if there is nothing to decode.
/// - [`DecodeError::OddLength`] / [`DecodeError::InvalidHexCharacter`] if the
///   text is not valid hex.
/// - [`DecodeError::MissingStartMarker`] if the decoded bytes do not begin
///   with `0xFF 0xD8`.
///
/// # Examples
///
/// ```rust
/// use sysbot_core::protocol::hex_text_to_binary;
///
/// let bytes = hex_text_to_binary("FFD8AB12FFD9\n").unwrap();
/// assert_eq!(bytes, vec![0xFF, 0xD8, 0xAB, 0x12, 0xFF, 0xD9]);
/// ```
pub fn hex_text_to_binary(text: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = hex::decode(trimmed).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidHexCharacter {
            character: c,
            index,
        },
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            DecodeError::OddLength { len: trimmed.len() }
        }
    })?;

    if !bytes.starts_with(&JPEG_START_MARKER) {
        return Err(DecodeError::MissingStartMarker);
    }
    Ok(bytes)
}

/// Renders raw bytes as uppercase hex text, the way the peer does in hex mode.
pub fn binary_to_hex_text(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

fn trim_ascii_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
