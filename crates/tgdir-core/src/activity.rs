//! Feeds inbound group traffic into the directory.

use crate::{
    domain::{ChatInfo, Participant},
    hooks::on_chat_identity_migrated,
    messaging::types::IncomingEvent,
    store::DirectoryStore,
    Result,
};

/// Record everyone an event lets us observe.
///
/// Only group-like chats are tracked; private chats are ignored apart from
/// migrations, which are never private.
pub async fn record_event(store: &dyn DirectoryStore, event: &IncomingEvent) -> Result<()> {
    match event {
        IncomingEvent::ChatMigrated(m) => on_chat_identity_migrated(store, m.old_id, m.new_id).await,
        _ if !event.chat().is_some_and(|c| c.id.is_group()) => Ok(()),
        IncomingEvent::Text(m) => {
            observe(store, &m.sender, Some(&m.chat)).await?;
            if let Some(author) = &m.reply_to {
                observe(store, author, Some(&m.chat)).await?;
            }
            Ok(())
        }
        IncomingEvent::Forwarded(m) => {
            observe(store, &m.sender, Some(&m.chat)).await?;
            // The original author was not necessarily ever in this chat.
            observe(store, &m.origin, None).await
        }
        IncomingEvent::MembershipChange(m) => observe(store, &m.actor, Some(&m.chat)).await,
    }
}

async fn observe(
    store: &dyn DirectoryStore,
    user: &Participant,
    chat: Option<&ChatInfo>,
) -> Result<()> {
    store
        .record_activity(
            user.id,
            user.username.as_deref(),
            chat.map(|c| (c.id, c.title.as_deref().unwrap_or_default())),
        )
        .await
}
