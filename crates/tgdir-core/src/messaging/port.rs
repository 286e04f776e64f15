use async_trait::async_trait;

use crate::{
    domain::{ChatId, ChatProfile, MessageRef},
    Result,
};

/// Outbound calls into the host messaging platform.
///
/// Implementations map "no such chat/user" API failures to
/// [`Error::ChatNotFound`](crate::Error::ChatNotFound) so callers can tell them
/// apart from transient delivery errors.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send text verbatim, without any parse mode.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<MessageRef>;

    async fn get_chat(&self, id: i64) -> Result<ChatProfile>;

    async fn leave_chat(&self, chat_id: ChatId) -> Result<()>;
}
