use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
///
/// Negative ids denote groups, supergroups and channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl ChatId {
    pub fn is_group(self) -> bool {
        self.0 < 0
    }
}

impl From<UserId> for ChatId {
    /// Private chats share the id of the user on the other side.
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// A user as seen on an inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

/// A chat as seen on an inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
}

/// Live profile of a user or chat, as reported by the platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatProfile {
    pub id: i64,
    pub username: Option<String>,
    pub title: Option<String>,
    pub first_name: Option<String>,
}
