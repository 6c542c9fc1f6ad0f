//! Protocol module containing command framing, command builders, and image
//! payload recognition.

pub mod codec;
pub mod commands;
pub mod image;

pub use codec::{
    binary_to_hex_text, encode_command, hex_text_to_binary, is_complete, looks_like_hex_image,
    DecodeError,
};
pub use commands::{Command, CommandError};
pub use image::{ImageEncoding, ImagePayload, ImageResponse};
