//! Input macro parser.
//!
//! A macro is a comma-separated string describing what a human would do with
//! a physical controller, in order:
//!
//! | Token shape | Step                          | Example        |
//! |-------------|-------------------------------|----------------|
//! | `BUTTON`    | [`SequenceStep::PressAndRelease`] | `A`        |
//! | `+BUTTON`   | [`SequenceStep::Hold`]        | `+ZL`          |
//! | `-BUTTON`   | [`SequenceStep::Release`]     | `-ZL`          |
//! | `Wn`        | [`SequenceStep::Wait`] (n ms) | `W1000`        |
//! | `%x,y`      | [`SequenceStep::SetLeftStick`]  | `%7FFF,0`    |
//! | `&x,y`      | [`SequenceStep::SetRightStick`] | `&0,-8000`   |
//!
//! Stick values are signed hex (an optional `0x` prefix is accepted).  Note
//! that a stick token swallows the *next* comma-separated piece as its Y
//! value, so `"%7FFF,0,A"` is two steps, not three.
//!
//! # All-or-nothing parsing
//!
//! [`parse_macro`] either returns the full step list or an error naming the
//! first bad token and its position (the zero-based index of the token, where
//! a stick token counts once).  Nothing is sent to the peer until the whole
//! macro has parsed, so a typo at the end cannot leave half a macro executed.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::domain::button::Button;
use crate::domain::stick::{check_axis, parse_signed_hex, StickName, StickVector};
use crate::protocol::commands::Command;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ParseReason {
    #[error("unknown button")]
    UnknownButton,
    #[error("empty token")]
    EmptyToken,
    #[error("wait duration must be a non-negative integer of milliseconds")]
    InvalidWait,
    #[error("stick value is not a signed hex number")]
    InvalidStickValue,
    #[error("stick token is missing its Y value")]
    MissingStickY,
}

/// Errors produced by [`parse_macro`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// The token is malformed or names an unknown button.
    #[error("invalid macro token {token:?} at position {position}: {reason}")]
    Parse {
        position: usize,
        token: String,
        reason: ParseReason,
    },

    /// A stick value is valid hex but does not fit in a signed 16-bit axis.
    #[error("stick value {value} in token {token:?} at position {position} is outside [-32768, 32767]")]
    Range {
        position: usize,
        token: String,
        value: i64,
    },
}

impl SequenceError {
    /// Zero-based index of the offending token.
    pub fn position(&self) -> usize {
        match self {
            SequenceError::Parse { position, .. } | SequenceError::Range { position, .. } => {
                *position
            }
        }
    }
}

/// One primitive controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceStep {
    PressAndRelease(Button),
    Hold(Button),
    Release(Button),
    /// Pause for the given number of milliseconds.
    Wait(u64),
    SetLeftStick(StickVector),
    SetRightStick(StickVector),
}

impl SequenceStep {
    /// The wire command for this step, or `None` for [`SequenceStep::Wait`],
    /// which is performed locally.
    pub fn to_command(&self) -> Option<Command> {
        match *self {
            SequenceStep::PressAndRelease(button) => Some(Command::click(button)),
            SequenceStep::Hold(button) => Some(Command::press(button)),
            SequenceStep::Release(button) => Some(Command::release(button)),
            SequenceStep::Wait(_) => None,
            SequenceStep::SetLeftStick(v) => Some(Command::set_stick(StickName::Left, v)),
            SequenceStep::SetRightStick(v) => Some(Command::set_stick(StickName::Right, v)),
        }
    }

    /// How long this step pauses, if it is a wait.
    pub fn wait_duration(&self) -> Option<Duration> {
        match *self {
            SequenceStep::Wait(ms) => Some(Duration::from_millis(ms)),
            _ => None,
        }
    }
}

impl fmt::Display for SequenceStep {
    /// Renders the step back in macro token form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SequenceStep::PressAndRelease(b) => write!(f, "{b}"),
            SequenceStep::Hold(b) => write!(f, "+{b}"),
            SequenceStep::Release(b) => write!(f, "-{b}"),
            SequenceStep::Wait(ms) => write!(f, "W{ms}"),
            SequenceStep::SetLeftStick(v) => write!(f, "%{},{}", macro_hex(v.x), macro_hex(v.y)),
            SequenceStep::SetRightStick(v) => write!(f, "&{},{}", macro_hex(v.x), macro_hex(v.y)),
        }
    }
}

fn macro_hex(value: i16) -> String {
    let magnitude = i32::from(value).unsigned_abs();
    if value < 0 {
        format!("-{magnitude:X}")
    } else {
        format!("{magnitude:X}")
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Parses a macro string into an ordered list of steps.
///
/// A blank macro parses to an empty list.
///
/// # Errors
///
/// Returns [`SequenceError::Parse`] for the first malformed or unknown token
/// and [`SequenceError::Range`] for the first out-of-range stick value.
///
/// # Examples
///
/// ```rust
/// use sysbot_core::{parse_macro, Button, SequenceStep};
///
/// let steps = parse_macro("+ZL,B,W1000,-ZL").unwrap();
/// assert_eq!(
///     steps,
///     vec![
///         SequenceStep::Hold(Button::ZL),
///         SequenceStep::PressAndRelease(Button::B),
///         SequenceStep::Wait(1000),
///         SequenceStep::Release(Button::ZL),
///     ]
/// );
/// ```
pub fn parse_macro(text: &str) -> Result<Vec<SequenceStep>, SequenceError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut pieces = text.split(',').map(str::trim);
    let mut steps = Vec::new();
    let mut position = 0;

    while let Some(piece) = pieces.next() {
        let step = match piece.chars().next() {
            None => return Err(parse_error(position, piece, ParseReason::EmptyToken)),
            Some('+') => SequenceStep::Hold(parse_button(position, piece, &piece[1..])?),
            Some('-') => SequenceStep::Release(parse_button(position, piece, &piece[1..])?),
            Some('%') => SequenceStep::SetLeftStick(parse_stick(position, piece, pieces.next())?),
            Some('&') => {
                SequenceStep::SetRightStick(parse_stick(position, piece, pieces.next())?)
            }
            Some('W' | 'w') => SequenceStep::Wait(parse_wait(position, piece)?),
            Some(_) => SequenceStep::PressAndRelease(parse_button(position, piece, piece)?),
        };
        steps.push(step);
        position += 1;
    }

    trace!("parsed macro into {} steps", steps.len());
    Ok(steps)
}

fn parse_error(position: usize, token: &str, reason: ParseReason) -> SequenceError {
    SequenceError::Parse {
        position,
        token: token.to_string(),
        reason,
    }
}

fn parse_button(position: usize, token: &str, name: &str) -> Result<Button, SequenceError> {
    name.parse()
        .map_err(|_| parse_error(position, token, ParseReason::UnknownButton))
}

fn parse_wait(position: usize, token: &str) -> Result<u64, SequenceError> {
    let digits = &token[1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_error(position, token, ParseReason::InvalidWait));
    }
    digits
        .parse()
        .map_err(|_| parse_error(position, token, ParseReason::InvalidWait))
}

fn parse_stick(
    position: usize,
    x_piece: &str,
    y_piece: Option<&str>,
) -> Result<StickVector, SequenceError> {
    let Some(y_piece) = y_piece else {
        return Err(parse_error(position, x_piece, ParseReason::MissingStickY));
    };
    let token = format!("{x_piece},{y_piece}");

    let axis = |text: &str| -> Result<i16, SequenceError> {
        let value = parse_signed_hex(text)
            .ok_or_else(|| parse_error(position, &token, ParseReason::InvalidStickValue))?;
        check_axis(value).map_err(|e| SequenceError::Range {
            position,
            token: token.clone(),
            value: e.value,
        })
    };

    let x = axis(&x_piece[1..])?;
    let y = axis(y_piece)?;
    Ok(StickVector::new(x, y))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
