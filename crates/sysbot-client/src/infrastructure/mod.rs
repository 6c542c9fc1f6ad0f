//! Infrastructure layer for the client application.
//!
//! Contains the OS-facing adapters: the TCP session to the peer and the
//! TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `sysbot_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – `Session` owns the TCP socket, frames commands, reads
//!   text replies and reassembles image replies under a scoped timeout.
//!   `SharedSession` serialises concurrent callers.
//!
//! - **`storage`** – Reads and writes `config.toml`.

pub mod network;
pub mod storage;
