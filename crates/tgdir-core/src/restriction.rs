//! Per-chat restriction: operators can ban the bot from a chat, and the bot
//! leaves again whenever a non-operator re-adds it.

use std::sync::Arc;

use crate::{
    domain::{ChatId, ChatInfo, Participant, UserId},
    formatting::{escape_html, mention_html},
    messaging::port::MessagingPort,
    store::DirectoryStore,
    Result,
};

const NOT_IN_DATABASE: &str = "I can't seem to find the chat in my database. \
Use /chatlist to obtain a list of chats in my database.";

const READDED_NOTICE: &str = "I have been restricted by my admins from this chat! \
Request any of my admins to add me to this chat.";

/// Malformed `/restrict` or `/unrestrict` arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageError {
    WrongArgCount,
    InvalidChatId,
}

impl UsageError {
    /// Help text for `command` (HTML).
    pub fn message(self, command: &str) -> String {
        match self {
            UsageError::WrongArgCount => format!(
                "Incorrect number of arguments. Please use <code>/{command} chat_id</code>."
            ),
            UsageError::InvalidChatId => {
                "Invalid chat id! Make sure you include the '-' sign in the chat id.".to_string()
            }
        }
    }
}

/// Parse the single `chat_id` argument; group ids carry a leading `-`.
pub fn parse_chat_arg(args: &str) -> std::result::Result<ChatId, UsageError> {
    let mut parts = args.split_whitespace();
    let (Some(raw), None) = (parts.next(), parts.next()) else {
        return Err(UsageError::WrongArgCount);
    };
    if !raw.starts_with('-') {
        return Err(UsageError::InvalidChatId);
    }
    raw.parse::<i64>()
        .map(ChatId)
        .map_err(|_| UsageError::InvalidChatId)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestrictOutcome {
    UnknownChat,
    AlreadyRestricted,
    /// `left == false` means the leave call failed: the chat is restricted in the
    /// directory while the bot may still be a member.
    Restricted { title: String, left: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnrestrictOutcome {
    UnknownChat,
    NotRestricted,
    Unrestricted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotAddedOutcome {
    NotRestricted,
    Refused { left: bool },
    Lifted,
}

pub struct RestrictionWorkflow {
    store: Arc<dyn DirectoryStore>,
    messenger: Arc<dyn MessagingPort>,
    operators: Vec<UserId>,
}

impl RestrictionWorkflow {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        messenger: Arc<dyn MessagingPort>,
        operators: Vec<UserId>,
    ) -> Self {
        Self {
            store,
            messenger,
            operators,
        }
    }

    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operators.contains(&user_id)
    }

    /// Restrict the bot from `chat_id` on behalf of `actor`, replying in `reply_to`.
    ///
    /// Steps run in this order: look up the title, post the notice in the chat,
    /// leave, persist, report to the invoker, notify the operators. Every
    /// platform call is best-effort; the flag is persisted even when leaving
    /// failed, and only a store failure aborts the sequence.
    pub async fn restrict(
        &self,
        chat_id: ChatId,
        actor: &Participant,
        reply_to: ChatId,
    ) -> Result<RestrictOutcome> {
        let Some(record) = self.store.chat(chat_id).await? else {
            self.notify(reply_to, NOT_IN_DATABASE).await;
            return Ok(RestrictOutcome::UnknownChat);
        };
        if record.restricted {
            self.notify(reply_to, "I'm already restricted from that chat!")
                .await;
            return Ok(RestrictOutcome::AlreadyRestricted);
        }

        let title = match self.messenger.get_chat(chat_id.0).await {
            Ok(profile) => profile.title.unwrap_or(record.chat_name),
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "failed to fetch chat title");
                record.chat_name
            }
        };

        let notice = format!(
            "I have been restricted by my admins from this chat. \
Request any of my admins to add me to this chat.\n\n{}",
            self.operator_roster().await
        );
        self.notify(chat_id, &notice).await;

        let left = match self.messenger.leave_chat(chat_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    chat_id = chat_id.0,
                    error = %e,
                    "failed to leave chat; persisting restriction anyway"
                );
                false
            }
        };

        self.store.set_restriction(chat_id, true).await?;
        tracing::info!(chat_id = chat_id.0, actor = actor.id.0, left, "chat restricted");

        let title_html = escape_html(&title);
        let report = if left {
            format!("Successfully left chat <b>{title_html}</b>!")
        } else {
            format!(
                "Chat <b>{title_html}</b> is now restricted, but I couldn't leave it. \
Please remove me from the chat manually."
            )
        };
        self.notify(reply_to, &report).await;

        self.notify_operators(&format!(
            "{} has restricted me from being added to the chat <b>{title_html}</b>.",
            mention_html(actor.id, &actor.first_name)
        ))
        .await;

        Ok(RestrictOutcome::Restricted { title, left })
    }

    pub async fn unrestrict(
        &self,
        chat_id: ChatId,
        actor: &Participant,
        reply_to: ChatId,
    ) -> Result<UnrestrictOutcome> {
        let Some(record) = self.store.chat(chat_id).await? else {
            self.notify(reply_to, NOT_IN_DATABASE).await;
            return Ok(UnrestrictOutcome::UnknownChat);
        };
        if !record.restricted {
            self.notify(reply_to, "I'm not restricted from that chat!")
                .await;
            return Ok(UnrestrictOutcome::NotRestricted);
        }

        self.store.set_restriction(chat_id, false).await?;
        tracing::info!(chat_id = chat_id.0, actor = actor.id.0, "chat unrestricted");

        self.notify(
            reply_to,
            &format!(
                "Successfully removed all restrictions on the chat with id <code>{}</code>",
                chat_id.0
            ),
        )
        .await;
        self.notify_operators(&format!(
            "{} has removed my restrictions on the chat with id <code>{}</code>.",
            mention_html(actor.id, &actor.first_name),
            chat_id.0
        ))
        .await;

        Ok(UnrestrictOutcome::Unrestricted)
    }

    /// The bot itself was added to `chat` by `added_by`.
    pub async fn on_bot_added(
        &self,
        chat: &ChatInfo,
        added_by: &Participant,
    ) -> Result<BotAddedOutcome> {
        if !self.store.restriction(chat.id).await? {
            return Ok(BotAddedOutcome::NotRestricted);
        }

        if !self.is_operator(added_by.id) {
            self.notify(chat.id, READDED_NOTICE).await;
            let left = match self.messenger.leave_chat(chat.id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(chat_id = chat.id.0, error = %e, "failed to leave restricted chat");
                    false
                }
            };
            tracing::info!(
                chat_id = chat.id.0,
                added_by = added_by.id.0,
                left,
                "refused restricted chat"
            );
            return Ok(BotAddedOutcome::Refused { left });
        }

        self.store.set_restriction(chat.id, false).await?;
        tracing::info!(chat_id = chat.id.0, added_by = added_by.id.0, "restriction lifted by operator");

        self.notify_operators(&format!(
            "{} has added me to the chat <b>{}</b> and removed my restrictions.",
            mention_html(added_by.id, &added_by.first_name),
            escape_html(chat.title.as_deref().unwrap_or_default())
        ))
        .await;

        Ok(BotAddedOutcome::Lifted)
    }

    async fn operator_roster(&self) -> String {
        let mut roster = "<b>My Admins:</b>".to_string();
        for op in &self.operators {
            let name = match self.messenger.get_chat(op.0).await {
                Ok(profile) => profile.first_name.unwrap_or_else(|| op.0.to_string()),
                Err(e) => {
                    tracing::warn!(user_id = op.0, error = %e, "failed to fetch operator profile");
                    op.0.to_string()
                }
            };
            roster.push_str(&format!("\n - {}", mention_html(*op, &name)));
        }
        roster
    }

    async fn notify(&self, chat_id: ChatId, html: &str) {
        if let Err(e) = self.messenger.send_html(chat_id, html).await {
            tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send notice");
        }
    }

    async fn notify_operators(&self, html: &str) {
        for op in &self.operators {
            self.notify(ChatId::from(*op), html).await;
        }
    }
}
