//! Application layer use cases for the client.
//!
//! # What use cases does the client have?
//!
//! - **`console`** – The [`console::ConsoleLink`] trait every use case talks
//!   to, plus the transport error taxonomy.  The TCP session in the
//!   infrastructure layer implements it; tests substitute doubles.
//!
//! - **`configure_session`** – Sends the `configure ...` commands the peer
//!   expects once at the start of every session.
//!
//! - **`query_game`** – Title ID, name, version, author and icon queries,
//!   including the "no game running" short-circuit and the opt-in
//!   `pixelPeek` icon fallback.
//!
//! - **`run_sequence`** – Replays parsed macros and direct button/stick
//!   commands while tracking which buttons are held, so a cleanup pass can
//!   return the controller to neutral.

pub mod configure_session;
pub mod console;
pub mod query_game;
pub mod run_sequence;
