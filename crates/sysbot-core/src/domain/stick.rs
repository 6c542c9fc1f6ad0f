//! Analog stick names and deflection vectors.
//!
//! # Coordinate convention
//!
//! Each axis is a signed 16-bit value in `[-32768, 32767]` (`-0x8000` to
//! `0x7FFF`).  `(0, 0)` is neutral.  **Positive Y is up**, which is the
//! opposite of typical screen coordinates:
//!
//! ```text
//!                 (0, 0x7FFF)  FULL_UP
//!                      |
//! (-0x8000, 0) ----- (0,0) ----- (0x7FFF, 0)
//!   FULL_LEFT          |           FULL_RIGHT
//!                 (0, -0x8000) FULL_DOWN
//! ```
//!
//! Values are never clamped.  Anything outside the 16-bit range is rejected
//! with [`RangeError`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stick axis value fell outside the signed 16-bit range.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("stick value {value} is outside the signed 16-bit range [-32768, 32767]")]
pub struct RangeError {
    pub value: i64,
}

/// Returned when a string does not name a stick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown stick {0:?}: expected LEFT or RIGHT")]
pub struct UnknownStick(pub String);

/// Which analog stick a `setStick` command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickName {
    Left,
    Right,
}

impl StickName {
    /// The identifier the peer expects on the wire.  Case-sensitive.
    pub const fn wire_name(self) -> &'static str {
        match self {
            StickName::Left => "LEFT",
            StickName::Right => "RIGHT",
        }
    }
}

impl fmt::Display for StickName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for StickName {
    type Err = UnknownStick;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEFT" => Ok(StickName::Left),
            "RIGHT" => Ok(StickName::Right),
            other => Err(UnknownStick(other.to_string())),
        }
    }
}

/// Deflection of one analog stick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StickVector {
    pub x: i16,
    pub y: i16,
}

impl StickVector {
    pub const NEUTRAL: StickVector = StickVector { x: 0, y: 0 };
    pub const FULL_UP: StickVector = StickVector { x: 0, y: i16::MAX };
    pub const FULL_DOWN: StickVector = StickVector { x: 0, y: i16::MIN };
    pub const FULL_LEFT: StickVector = StickVector { x: i16::MIN, y: 0 };
    pub const FULL_RIGHT: StickVector = StickVector { x: i16::MAX, y: 0 };

    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Builds a vector from wider integers, rejecting out-of-range axes.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] for the first axis outside `[-32768, 32767]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sysbot_core::StickVector;
    ///
    /// assert!(StickVector::try_new(0x7FFF, -0x8000).is_ok());
    /// assert!(StickVector::try_new(0x8000, 0).is_err());
    /// ```
    pub fn try_new(x: i64, y: i64) -> Result<Self, RangeError> {
        Ok(Self {
            x: check_axis(x)?,
            y: check_axis(y)?,
        })
    }

    pub const fn is_neutral(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Narrows one axis value to `i16`.
pub fn check_axis(value: i64) -> Result<i16, RangeError> {
    i16::try_from(value).map_err(|_| RangeError { value })
}

/// Formats an axis value as the signed hex literal the peer accepts.
///
/// `0x7FFF` → `"0x7FFF"`, `-0x8000` → `"-0x8000"`, `0` → `"0x0"`.
pub fn format_signed_hex(value: i16) -> String {
    let magnitude = i32::from(value).unsigned_abs();
    if value < 0 {
        format!("-0x{magnitude:X}")
    } else {
        format!("0x{magnitude:X}")
    }
}

/// Parses a signed hex literal such as `7FFF`, `0x7FFF`, `-8000` or `-0x8000`.
///
/// Returns `None` when the text is not hex at all.  Valid hex that is too
/// large for `i64` saturates so that the caller reports it as out of range
/// rather than as malformed.
pub fn parse_signed_hex(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, 16).unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
