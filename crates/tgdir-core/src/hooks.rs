//! Hooks other parts of the bot call into: `/info`, `/stats`, chat migration,
//! and the `/chatlist` export.

use crate::{
    domain::{ChatId, UserId},
    messaging::port::MessagingPort,
    store::DirectoryStore,
    Result,
};

pub const CHATLIST_FILE_NAME: &str = "chatlist.txt";
pub const CHATLIST_CAPTION: &str = "Here is the list of chats in my database.";

/// One line for a user's `/info` card (HTML).
pub async fn user_info_summary(
    store: &dyn DirectoryStore,
    bot_id: UserId,
    user_id: UserId,
) -> Result<String> {
    if user_id == bot_id {
        return Ok("I've seen them in... Wow. Are they stalking me? \
They're in all the same places I am... oh. It's me."
            .to_string());
    }
    let num_chats = store.user_num_chats(user_id).await?;
    Ok(format!(
        "I've seen them in <code>{num_chats}</code> chats in total."
    ))
}

pub async fn global_stats_summary(store: &dyn DirectoryStore) -> Result<String> {
    let users = store.num_users().await?;
    let chats = store.num_chats().await?;
    Ok(format!("{users} users, across {chats} chats"))
}

/// The platform moved a chat to a new id (group upgraded to supergroup).
pub async fn on_chat_identity_migrated(
    store: &dyn DirectoryStore,
    old_id: ChatId,
    new_id: ChatId,
) -> Result<()> {
    store.migrate_chat(old_id, new_id).await?;
    tracing::info!(old_id = old_id.0, new_id = new_id.0, "chat migrated");
    Ok(())
}

/// Plain-text chat list sent as the `/chatlist` attachment.
pub async fn chat_list_document(store: &dyn DirectoryStore) -> Result<Vec<u8>> {
    let mut out = "List of chats.\n".to_string();
    for chat in store.all_chats().await? {
        out.push_str(&format!("{} - ({})\n", chat.chat_name, chat.chat_id.0));
    }
    Ok(out.into_bytes())
}

/// Send the chat list to `chat_id` as a `chatlist.txt` attachment.
///
/// Store failures propagate; a rejected upload is logged and dropped.
pub async fn send_chat_list(
    store: &dyn DirectoryStore,
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
) -> Result<()> {
    let doc = chat_list_document(store).await?;
    if let Err(e) = messenger
        .send_document(chat_id, doc, CHATLIST_FILE_NAME, CHATLIST_CAPTION)
        .await
    {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send chat list");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::SharedDirectory, testing::FakeMessenger};

    #[tokio::test]
    async fn stats_reflect_distinct_users_and_chats() {
        let store = SharedDirectory::in_memory();
        store
            .record_activity(UserId(1), Some("alice"), Some((ChatId(-1), "A")))
            .await
            .unwrap();
        store
            .record_activity(UserId(2), Some("bobby"), Some((ChatId(-2), "B")))
            .await
            .unwrap();
        store
            .record_activity(UserId(1), Some("alice"), Some((ChatId(-2), "B")))
            .await
            .unwrap();

        assert_eq!(
            global_stats_summary(&store).await.unwrap(),
            "2 users, across 2 chats"
        );
        assert_eq!(
            user_info_summary(&store, UserId(99), UserId(1)).await.unwrap(),
            "I've seen them in <code>2</code> chats in total."
        );
    }

    #[tokio::test]
    async fn bot_gets_the_joke() {
        let store = SharedDirectory::in_memory();
        let text = user_info_summary(&store, UserId(99), UserId(99))
            .await
            .unwrap();
        assert!(text.ends_with("oh. It's me."));
    }

    #[tokio::test]
    async fn migration_hook_rekeys_chat() {
        let store = SharedDirectory::in_memory();
        store
            .record_activity(UserId(1), Some("alice"), Some((ChatId(-1), "A")))
            .await
            .unwrap();

        on_chat_identity_migrated(&store, ChatId(-1), ChatId(-1001))
            .await
            .unwrap();

        assert!(store.chat(ChatId(-1)).await.unwrap().is_none());
        assert!(store.chat(ChatId(-1001)).await.unwrap().is_some());
        assert_eq!(store.user_num_chats(UserId(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn chat_list_lists_every_chat() {
        let store = SharedDirectory::in_memory();
        store
            .record_activity(UserId(1), None, Some((ChatId(-2), "Dogs")))
            .await
            .unwrap();
        store
            .record_activity(UserId(1), None, Some((ChatId(-1), "Cats")))
            .await
            .unwrap();

        let doc = chat_list_document(&store).await.unwrap();
        assert_eq!(
            String::from_utf8(doc).unwrap(),
            "List of chats.\nDogs - (-2)\nCats - (-1)\n"
        );
    }

    #[tokio::test]
    async fn chat_list_is_sent_as_attachment() {
        let store = SharedDirectory::in_memory();
        store
            .record_activity(UserId(1), None, Some((ChatId(-5), "Birds")))
            .await
            .unwrap();
        let messenger = FakeMessenger::default();

        send_chat_list(&store, &messenger, ChatId(7)).await.unwrap();

        assert_eq!(
            messenger.documents(),
            vec![(
                ChatId(7),
                "List of chats.\nBirds - (-5)\n".to_string(),
                "chatlist.txt".to_string(),
                "Here is the list of chats in my database.".to_string(),
            )]
        );
        assert!(messenger.sends().is_empty());
    }
}
