//! A session shared between tasks.
//!
//! The protocol has no request IDs, so a reply belongs to whichever command
//! was written last.  [`SharedSession`] holds its lock across the whole
//! send-then-receive exchange, never just the send.

use std::sync::Arc;

use sysbot_core::{Command, ImageResponse};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::application::console::{ConsoleLink, TransportError};

/// A cloneable handle to one link, serialising every exchange.
pub struct SharedSession<L> {
    inner: Arc<Mutex<L>>,
}

impl<L> Clone for SharedSession<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: ConsoleLink> SharedSession<L> {
    pub fn new(link: L) -> Self {
        Self {
            inner: Arc::new(Mutex::new(link)),
        }
    }

    /// Sends `command` and reads its text reply under one lock.
    pub async fn exchange_text(&self, command: &Command) -> Result<String, TransportError> {
        let mut link = self.inner.lock().await;
        debug!("exchange (text): {command}");
        link.send_command(command).await?;
        link.receive_text().await
    }

    /// Sends `command` and reassembles its image reply under one lock.
    pub async fn exchange_image(
        &self,
        command: &Command,
    ) -> Result<Option<ImageResponse>, TransportError> {
        let mut link = self.inner.lock().await;
        debug!("exchange (image): {command}");
        link.send_command(command).await?;
        link.receive_image().await
    }

    /// Sends a command that has no reply (input and configuration).
    pub async fn send(&self, command: &Command) -> Result<(), TransportError> {
        self.inner.lock().await.send_command(command).await
    }

    /// Locks the link for a longer sequence, such as a whole macro.
    pub async fn lock(&self) -> MutexGuard<'_, L> {
        self.inner.lock().await
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.is_connected()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::run_sequence::InputSequencer;

    /// Answers each text query with the command it last received, yielding
    /// in between so an unserialised caller would interleave.
    #[derive(Default)]
    struct EchoLink {
        last: Option<String>,
        log: Vec<String>,
    }

    #[async_trait::async_trait]
    impl ConsoleLink for EchoLink {
        async fn send_command(&mut self, command: &Command) -> Result<(), TransportError> {
            self.last = Some(command.to_string());
            self.log.push(command.to_string());
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn receive_text(&mut self) -> Result<String, TransportError> {
            tokio::task::yield_now().await;
            Ok(self.last.take().unwrap_or_default())
        }

        async fn receive_image(&mut self) -> Result<Option<ImageResponse>, TransportError> {
            Ok(self.last.take().map(|c| ImageResponse::Binary(c.into_bytes())))
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_exchanges_receive_their_own_replies() {
        // Arrange
        let shared = SharedSession::new(EchoLink::default());
        let queries = [
            Command::get_title_id(),
            Command::game_name(),
            Command::game_version(),
            Command::game_author(),
        ];

        // Act
        let mut handles = Vec::new();
        for round in 0..25 {
            let command = queries[round % queries.len()].clone();
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let reply = shared.exchange_text(&command).await.unwrap();
                (command, reply)
            }));
        }

        // Assert – every caller got the reply to its own command
        for handle in handles {
            let (command, reply) = handle.await.unwrap();
            assert_eq!(reply, command.as_str());
        }
        assert_eq!(shared.lock().await.log.len(), 25);
    }

    #[tokio::test]
    async fn test_exchange_image_holds_lock_for_whole_exchange() {
        let shared = SharedSession::new(EchoLink::default());

        let image = shared.exchange_image(&Command::game_icon()).await.unwrap();

        assert_eq!(image, Some(ImageResponse::Binary(b"game icon".to_vec())));
    }

    #[tokio::test]
    async fn test_lock_runs_a_macro_without_interleaving() {
        // Arrange
        let shared = SharedSession::new(EchoLink::default());

        // Act
        {
            let mut link = shared.lock().await;
            InputSequencer::new(&mut *link)
                .run_macro("+A,B,-A")
                .await
                .unwrap();
        }
        shared.send(&Command::click(sysbot_core::Button::X)).await.unwrap();

        // Assert
        assert_eq!(
            shared.lock().await.log,
            vec!["press A", "click B", "release A", "click X"]
        );
        assert!(shared.is_connected().await);
    }
}
