//! sysbot-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does sysbot-client do? (for beginners)
//!
//! The *peer* is an automation service running on a game console.  It accepts
//! one ASCII command at a time over TCP and answers with either a short text
//! line or a JPEG image.  The protocol has no request IDs, so the client must
//! strictly alternate: send one command, read its whole reply, then send the
//! next.
//!
//! The client:
//!
//! 1. Connects over TCP and sends the controller configuration commands.
//! 2. Queries game metadata (`getTitleID`, `game name`, ...) and treats the
//!    all-zero title ID as "no game running".
//! 3. Fetches the game icon, detecting from the first chunk whether the peer
//!    chose raw binary or hex text, and reassembles it across many reads.
//! 4. Compiles button/stick macros such as `"+ZL,B,W1000,-ZL"` and replays
//!    them in order with the right pauses.

/// Application layer: query and input use cases.
pub mod application;

/// Infrastructure layer: TCP session, image reassembly, and configuration.
pub mod infrastructure;
