//! # sysbot-core
//!
//! Shared library for the sysbot remote-control client containing the
//! line-oriented wire codec, image payload types, and the controller input
//! domain (buttons, sticks, and the macro parser).
//!
//! It has zero dependencies on sockets, async runtimes, or the file system.
//! Everything here is a pure function over bytes or strings, which is what
//! makes it easy to test in isolation.
//!
//! # Architecture overview (for beginners)
//!
//! The peer is an automation service running on a game console.  It listens
//! on a TCP socket and accepts plain ASCII commands such as `getTitleID` or
//! `click A`, each terminated by `\r\n`.  Most replies are short text lines;
//! a few (the game icon) are whole JPEG images that the peer may send either
//! as raw bytes or as printable hex digits.
//!
//! - **`protocol`** – How bytes travel over the wire.  Commands are framed
//!   with a line terminator, and image replies are recognised by their JPEG
//!   start/end markers in either encoding.
//!
//! - **`domain`** – Controller input and game metadata types with no I/O:
//!   buttons, stick deflections, the macro parser that compiles a string
//!   like `"+ZL,B,W1000,-ZL"` into ordered steps, and the title ID sentinel.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `sysbot_core::Command` instead of `sysbot_core::protocol::commands::Command`.
pub use domain::button::Button;
pub use domain::game::{GameInfo, TitleId};
pub use domain::sequence::{parse_macro, SequenceError, SequenceStep};
pub use domain::stick::{RangeError, StickName, StickVector};
pub use protocol::codec::{encode_command, DecodeError};
pub use protocol::commands::{Command, CommandError};
pub use protocol::image::{ImageEncoding, ImagePayload, ImageResponse};
