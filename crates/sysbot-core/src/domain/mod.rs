//! Domain layer: controller input and game metadata types.
//!
//! Everything in this module is pure – no sockets, no clocks, no OS calls.
//!
//! # Sub-modules
//!
//! - **`button`** – The fixed set of controller buttons the peer understands.
//! - **`stick`** – Analog stick names and signed 16-bit deflection vectors.
//! - **`sequence`** – The macro parser that turns `"+ZL,B,W1000,-ZL"` into an
//!   ordered list of [`sequence::SequenceStep`] values.
//! - **`game`** – Title ID sentinel handling and the composed metadata bundle.

pub mod button;
pub mod game;
pub mod sequence;
pub mod stick;
