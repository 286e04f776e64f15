//! Owner broadcast to every known chat.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{
    domain::ChatId, messaging::port::MessagingPort, store::DirectoryStore, Result,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn summary(&self) -> String {
        format!(
            "Broadcast complete. {} groups failed to receive the message, probably due to being kicked.",
            self.failed
        )
    }
}

/// Text following the command word of `/broadcast <text>`.
///
/// `None` when the command carries no body, in which case nothing is sent.
pub fn broadcast_body(command_text: &str) -> Option<&str> {
    let (_, rest) = command_text.trim_start().split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    (!rest.is_empty()).then_some(rest)
}

pub struct Broadcaster {
    store: Arc<dyn DirectoryStore>,
    messenger: Arc<dyn MessagingPort>,
    delay: Duration,
}

impl Broadcaster {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        messenger: Arc<dyn MessagingPort>,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            messenger,
            delay,
        }
    }

    /// Send `text` to every known chat.
    ///
    /// A failed delivery is counted and the loop moves on; only a store failure
    /// aborts the broadcast.
    pub async fn broadcast(&self, text: &str) -> Result<BroadcastReport> {
        let chats = self.store.all_chats().await?;
        let mut report = BroadcastReport::default();

        for (idx, chat) in chats.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            report.attempted += 1;
            if let Err(e) = self.messenger.send_text(chat.chat_id, text).await {
                report.failed += 1;
                tracing::warn!(
                    chat_id = chat.chat_id.0,
                    chat_name = %chat.chat_name,
                    error = %e,
                    "couldn't send broadcast"
                );
            }
        }

        tracing::info!(
            attempted = report.attempted,
            failed = report.failed,
            "broadcast finished"
        );
        Ok(report)
    }

    /// Broadcast, then tell the invoker how it went.
    pub async fn broadcast_and_report(
        &self,
        text: &str,
        reply_to: ChatId,
    ) -> Result<BroadcastReport> {
        let report = self.broadcast(text).await?;
        if let Err(e) = self.messenger.send_text(reply_to, &report.summary()).await {
            tracing::warn!(chat_id = reply_to.0, error = %e, "failed to report broadcast result");
        }
        Ok(report)
    }
}
