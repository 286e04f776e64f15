//! Telegram adapter (teloxide).
//!
//! This crate implements the `tgdir-core` MessagingPort over the Telegram Bot API
//! and wires inbound updates into the core.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod events;
pub mod handlers;
pub mod router;

use tgdir_core::{
    domain::{ChatId, ChatProfile, MessageId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        match &e {
            RequestError::Api(ApiError::ChatNotFound | ApiError::UserNotFound) => {
                Error::ChatNotFound(e.to_string())
            }
            _ => Error::External(format!("telegram error: {e}")),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::debug!(wait = ?d, "telegram asked us to retry later");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        bytes: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let file = InputFile::memory(bytes.clone()).file_name(file_name.to_string());
                self.bot
                    .send_document(Self::tg_chat(chat_id), file)
                    .caption(caption.to_string())
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn get_chat(&self, id: i64) -> Result<ChatProfile> {
        let chat = self
            .with_retry(|| self.bot.get_chat(teloxide::types::ChatId(id)))
            .await?;
        Ok(ChatProfile {
            id: chat.id.0,
            username: chat.username().map(str::to_string),
            title: chat.title().map(str::to_string),
            first_name: chat.first_name().map(str::to_string),
        })
    }

    async fn leave_chat(&self, chat_id: ChatId) -> Result<()> {
        self.with_retry(|| self.bot.leave_chat(Self::tg_chat(chat_id)))
            .await?;
        Ok(())
    }
}
