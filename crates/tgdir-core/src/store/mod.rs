//! Directory of users and chats seen by the bot.
//!
//! Records are created lazily on first observation and updated in place. The
//! only re-keying path is [`DirectoryStore::migrate_chat`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, UserId},
    Result,
};

mod directory;
mod shared;

pub use directory::Directory;
pub use shared::SharedDirectory;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub chat_id: ChatId,
    pub chat_name: String,
    #[serde(default)]
    pub restricted: bool,
}

/// Store capability handed to every component.
///
/// Errors returned here are persistence failures and are fatal to the caller's
/// operation.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Upsert the user and, when `chat` is given, the chat and the membership.
    async fn record_activity(
        &self,
        user_id: UserId,
        username: Option<&str>,
        chat: Option<(ChatId, &str)>,
    ) -> Result<()>;

    /// Users currently stored with exactly this handle, in storage order.
    async fn users_by_handle(&self, username: &str) -> Result<Vec<UserRecord>>;

    async fn chat(&self, chat_id: ChatId) -> Result<Option<ChatRecord>>;

    async fn restriction(&self, chat_id: ChatId) -> Result<bool>;

    async fn set_restriction(&self, chat_id: ChatId, restricted: bool) -> Result<()>;

    async fn all_chats(&self) -> Result<Vec<ChatRecord>>;

    async fn num_users(&self) -> Result<usize>;

    async fn num_chats(&self) -> Result<usize>;

    async fn user_num_chats(&self, user_id: UserId) -> Result<usize>;

    async fn migrate_chat(&self, old_id: ChatId, new_id: ChatId) -> Result<()>;
}
