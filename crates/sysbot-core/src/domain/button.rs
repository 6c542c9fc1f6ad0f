//! Controller buttons understood by the peer.
//!
//! The peer names buttons with short uppercase identifiers (`A`, `DUP`, `ZL`,
//! `PLUS`, ...).  [`Button`] is the typed form; [`Button::wire_name`] gives the
//! exact string used in `press`/`release`/`click` commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a known button.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown button: {0:?}")]
pub struct UnknownButton(pub String);

/// One button of the virtual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Button {
    // Face buttons
    A,
    B,
    X,
    Y,
    // D-pad
    DUp,
    DDown,
    DLeft,
    DRight,
    // Shoulders and triggers
    L,
    R,
    ZL,
    ZR,
    // System
    Plus,
    Minus,
    Home,
    Capture,
    // Stick clicks
    LStick,
    RStick,
}

impl Button {
    /// Every button, in wire-table order.
    pub const ALL: [Button; 18] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::DUp,
        Button::DDown,
        Button::DLeft,
        Button::DRight,
        Button::L,
        Button::R,
        Button::ZL,
        Button::ZR,
        Button::Plus,
        Button::Minus,
        Button::LStick,
        Button::RStick,
        Button::Home,
        Button::Capture,
    ];

    /// The identifier the peer expects on the wire.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::DUp => "DUP",
            Button::DDown => "DDOWN",
            Button::DLeft => "DLEFT",
            Button::DRight => "DRIGHT",
            Button::L => "L",
            Button::R => "R",
            Button::ZL => "ZL",
            Button::ZR => "ZR",
            Button::Plus => "PLUS",
            Button::Minus => "MINUS",
            Button::Home => "HOME",
            Button::Capture => "CAPTURE",
            Button::LStick => "LSTICK",
            Button::RStick => "RSTICK",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Button {
    type Err = UnknownButton;

    /// Parses a wire name.  Matching ignores ASCII case so macros may be
    /// written as `a,b` as well as `A,B`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .into_iter()
            .find(|b| b.wire_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
