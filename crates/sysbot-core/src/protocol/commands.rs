//! Command builders for every message the client sends.
//!
//! A [`Command`] is an immutable ASCII line *without* its terminator; the
//! terminator is added by [`crate::protocol::codec::encode_command`].
//!
//! # Command table
//!
//! | Builder                                | Wire text                               |
//! |----------------------------------------|-----------------------------------------|
//! | [`Command::get_title_id`]              | `getTitleID`                            |
//! | [`Command::game_name`]                 | `game name`                             |
//! | [`Command::game_version`]              | `game version`                          |
//! | [`Command::game_author`]               | `game author`                           |
//! | [`Command::game_icon`]                 | `game icon`                             |
//! | [`Command::pixel_peek`]                | `pixelPeek`                             |
//! | [`Command::configure_controller_type`] | `configure controllerType 3`            |
//! | [`Command::press`]                     | `press A`                               |
//! | [`Command::release`]                   | `release A`                             |
//! | [`Command::click`]                     | `click A`                               |
//! | [`Command::set_stick`]                 | `setStick LEFT 0x7FFF -0x8000`          |

use std::fmt;

use thiserror::Error;

use crate::domain::button::Button;
use crate::domain::stick::{format_signed_hex, StickName, StickVector};

/// Errors raised when building a command from caller-supplied text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command text is empty")]
    Empty,

    /// The text contains `\r` or `\n`, which would split it into two commands.
    #[error("command text contains a line terminator: {0:?}")]
    ContainsLineTerminator(String),

    #[error("command text is not ASCII: {0:?}")]
    NonAscii(String),
}

/// One outbound command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    text: String,
}

impl Command {
    /// Wraps arbitrary caller text as a command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the text is empty, is not ASCII, or
    /// contains an embedded line terminator.
    pub fn new(text: impl Into<String>) -> Result<Self, CommandError> {
        let text = text.into();
        if text.is_empty() {
            return Err(CommandError::Empty);
        }
        if !text.is_ascii() {
            return Err(CommandError::NonAscii(text));
        }
        if text.contains(['\r', '\n']) {
            return Err(CommandError::ContainsLineTerminator(text));
        }
        Ok(Self { text })
    }

    /// Built-in commands are assembled from known-safe parts only.
    fn trusted(text: String) -> Self {
        debug_assert!(text.is_ascii() && !text.contains(['\r', '\n']));
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get_title_id() -> Self {
        Self::trusted("getTitleID".to_string())
    }

    pub fn game_name() -> Self {
        Self::trusted("game name".to_string())
    }

    pub fn game_version() -> Self {
        Self::trusted("game version".to_string())
    }

    pub fn game_author() -> Self {
        Self::trusted("game author".to_string())
    }

    pub fn game_icon() -> Self {
        Self::trusted("game icon".to_string())
    }

    /// Screen capture command, only used as an opt-in fallback for icons.
    pub fn pixel_peek() -> Self {
        Self::trusted("pixelPeek".to_string())
    }

    // ── Session configuration ─────────────────────────────────────────────────

    pub fn configure_controller_type(controller_type: u8) -> Self {
        Self::trusted(format!("configure controllerType {controller_type}"))
    }

    pub fn configure_button_click_sleep_time(millis: u32) -> Self {
        Self::trusted(format!("configure buttonClickSleepTime {millis}"))
    }

    pub fn configure_main_loop_sleep_time(millis: u32) -> Self {
        Self::trusted(format!("configure mainLoopSleepTime {millis}"))
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn press(button: Button) -> Self {
        Self::trusted(format!("press {}", button.wire_name()))
    }

    pub fn release(button: Button) -> Self {
        Self::trusted(format!("release {}", button.wire_name()))
    }

    pub fn click(button: Button) -> Self {
        Self::trusted(format!("click {}", button.wire_name()))
    }

    pub fn set_stick(stick: StickName, vector: StickVector) -> Self {
        Self::trusted(format!(
            "setStick {} {} {}",
            stick.wire_name(),
            format_signed_hex(vector.x),
            format_signed_hex(vector.y)
        ))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_commands_match_wire_table() {
        assert_eq!(Command::get_title_id().as_str(), "getTitleID");
        assert_eq!(Command::game_name().as_str(), "game name");
        assert_eq!(Command::game_version().as_str(), "game version");
        assert_eq!(Command::game_author().as_str(), "game author");
        assert_eq!(Command::game_icon().as_str(), "game icon");
        assert_eq!(Command::pixel_peek().as_str(), "pixelPeek");
    }

    #[test]
    fn test_configure_commands_match_wire_table() {
        assert_eq!(
            Command::configure_controller_type(3).as_str(),
            "configure controllerType 3"
        );
        assert_eq!(
            Command::configure_button_click_sleep_time(50).as_str(),
            "configure buttonClickSleepTime 50"
        );
        assert_eq!(
            Command::configure_main_loop_sleep_time(50).as_str(),
            "configure mainLoopSleepTime 50"
        );
    }

    #[test]
    fn test_button_commands_use_wire_names() {
        assert_eq!(Command::press(Button::ZL).as_str(), "press ZL");
        assert_eq!(Command::release(Button::DUp).as_str(), "release DUP");
        assert_eq!(Command::click(Button::Plus).as_str(), "click PLUS");
    }

    #[test]
    fn test_set_stick_formats_signed_hex() {
        // Arrange
        let vector = StickVector::new(i16::MAX, i16::MIN);

        // Act
        let cmd = Command::set_stick(StickName::Left, vector);

        // Assert
        assert_eq!(cmd.as_str(), "setStick LEFT 0x7FFF -0x8000");
    }

    #[test]
    fn test_set_stick_neutral_is_stable() {
        let first = Command::set_stick(StickName::Right, StickVector::NEUTRAL);
        let second = Command::set_stick(StickName::Right, StickVector::NEUTRAL);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "setStick RIGHT 0x0 0x0");
    }

    #[test]
    fn test_new_rejects_embedded_terminators() {
        assert!(matches!(
            Command::new("click A\r\nclick B"),
            Err(CommandError::ContainsLineTerminator(_))
        ));
        assert!(matches!(
            Command::new("click A\n"),
            Err(CommandError::ContainsLineTerminator(_))
        ));
    }

    #[test]
    fn test_new_rejects_empty_and_non_ascii() {
        assert_eq!(Command::new(""), Err(CommandError::Empty));
        assert!(matches!(Command::new("clické"), Err(CommandError::NonAscii(_))));
    }

    #[test]
    fn test_display_matches_as_str() {
        let cmd = Command::click(Button::Home);
        assert_eq!(cmd.to_string(), cmd.as_str());
    }
}
