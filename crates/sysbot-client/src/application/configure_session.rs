//! Session start-up configuration.
//!
//! The peer expects three `configure` commands once per session, in this
//! order, before any input is injected:
//!
//! ```text
//! configure controllerType 3
//! configure buttonClickSleepTime 50
//! configure mainLoopSleepTime 50
//! ```

use sysbot_core::Command;
use tracing::info;

use crate::application::console::{ConsoleLink, TransportError};

/// Controller settings pushed to the peer at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Controller type code; `3` is the standard pro-style controller.
    pub controller_type: u8,
    /// How long the peer holds a button for a `click`, in milliseconds.
    pub button_click_sleep_ms: u32,
    /// Peer main-loop cadence in milliseconds.
    pub main_loop_sleep_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_type: 3,
            button_click_sleep_ms: 50,
            main_loop_sleep_ms: 50,
        }
    }
}

impl ControllerConfig {
    /// The configuration commands in the order the peer requires.
    pub fn commands(&self) -> [Command; 3] {
        [
            Command::configure_controller_type(self.controller_type),
            Command::configure_button_click_sleep_time(self.button_click_sleep_ms),
            Command::configure_main_loop_sleep_time(self.main_loop_sleep_ms),
        ]
    }
}

/// Sends the configuration commands, stopping at the first failure.
///
/// # Errors
///
/// Returns the [`TransportError`] of the first command that could not be sent.
pub async fn configure_controller<L>(
    link: &mut L,
    config: &ControllerConfig,
) -> Result<(), TransportError>
where
    L: ConsoleLink + ?Sized,
{
    for command in config.commands() {
        link.send_command(&command).await?;
    }
    info!(
        "controller configured (type {}, click {} ms, loop {} ms)",
        config.controller_type, config.button_click_sleep_ms, config.main_loop_sleep_ms
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::console::{ConnectionError, MockConsoleLink};
    use mockall::Sequence;

    #[tokio::test]
    async fn test_configure_sends_commands_in_required_order() {
        // Arrange
        let mut link = MockConsoleLink::new();
        let mut seq = Sequence::new();
        for expected in [
            "configure controllerType 3",
            "configure buttonClickSleepTime 50",
            "configure mainLoopSleepTime 50",
        ] {
            link.expect_send_command()
                .withf(move |cmd| cmd.as_str() == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        // Act
        let result = configure_controller(&mut link, &ControllerConfig::default()).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_configure_stops_at_first_failure() {
        // Arrange – the first command fails, so no further commands may be sent
        let mut link = MockConsoleLink::new();
        link.expect_send_command()
            .times(1)
            .returning(|_| Err(ConnectionError::Closed.into()));

        // Act
        let result = configure_controller(&mut link, &ControllerConfig::default()).await;

        // Assert
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }

    #[test]
    fn test_custom_values_flow_into_commands() {
        let config = ControllerConfig {
            controller_type: 1,
            button_click_sleep_ms: 80,
            main_loop_sleep_ms: 20,
        };
        let lines: Vec<String> = config.commands().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "configure controllerType 1",
                "configure buttonClickSleepTime 80",
                "configure mainLoopSleepTime 20",
            ]
        );
    }
}
