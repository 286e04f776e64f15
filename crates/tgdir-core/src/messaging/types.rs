use crate::domain::{ChatInfo, Participant};

/// Inbound update model, reduced to what the directory cares about.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingEvent {
    Text(TextMessage),
    Forwarded(ForwardedMessage),
    MembershipChange(MembershipChange),
    ChatMigrated(ChatMigration),
}

/// Any regular message (text, media, commands).
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat: ChatInfo,
    pub sender: Participant,
    pub reply_to: Option<Participant>,
}

#[derive(Clone, Debug)]
pub struct ForwardedMessage {
    pub chat: ChatInfo,
    pub sender: Participant,
    pub origin: Participant,
}

/// New members joined `chat`, added by `actor`.
#[derive(Clone, Debug)]
pub struct MembershipChange {
    pub chat: ChatInfo,
    pub actor: Participant,
    pub added: Vec<Participant>,
}

/// The platform upgraded a chat to a new identity (group -> supergroup).
#[derive(Clone, Copy, Debug)]
pub struct ChatMigration {
    pub old_id: crate::domain::ChatId,
    pub new_id: crate::domain::ChatId,
}

impl IncomingEvent {
    pub fn chat(&self) -> Option<&ChatInfo> {
        match self {
            IncomingEvent::Text(m) => Some(&m.chat),
            IncomingEvent::Forwarded(m) => Some(&m.chat),
            IncomingEvent::MembershipChange(m) => Some(&m.chat),
            IncomingEvent::ChatMigrated(_) => None,
        }
    }
}
