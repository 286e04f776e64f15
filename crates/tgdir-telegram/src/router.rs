use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tgdir_core::{
    broadcast::Broadcaster,
    config::Config,
    domain::UserId,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    resolver::IdentityResolver,
    restriction::RestrictionWorkflow,
    store::{DirectoryStore, SharedDirectory},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub bot_id: UserId,
    pub store: Arc<dyn DirectoryStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub resolver: Arc<IdentityResolver>,
    pub broadcaster: Arc<Broadcaster>,
    pub restrictions: Arc<RestrictionWorkflow>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        bot_id: UserId,
        store: Arc<dyn DirectoryStore>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        let resolver = Arc::new(IdentityResolver::new(
            store.clone(),
            messenger.clone(),
            cfg.lookup_timeout,
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            store.clone(),
            messenger.clone(),
            cfg.broadcast_delay,
        ));
        let restrictions = Arc::new(RestrictionWorkflow::new(
            store.clone(),
            messenger.clone(),
            cfg.operator_ids.iter().copied().map(UserId).collect(),
        ));
        Self {
            cfg,
            bot_id,
            store,
            messenger,
            resolver,
            broadcaster,
            restrictions,
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_id = UserId(me.user.id.0 as i64);
    tracing::info!(username = %me.username(), "tgdir started");

    let store = Arc::new(SharedDirectory::open(&cfg.directory_file).await?);
    tracing::info!(
        path = %cfg.directory_file.display(),
        users = store.num_users().await?,
        chats = store.num_chats().await?,
        "directory loaded"
    );
    tracing::info!(operators = cfg.operator_ids.len(), "access control configured");

    // Broadcasts fan out to every known chat; throttle on top of the adapter's
    // RetryAfter retry.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let state = Arc::new(AppState::new(cfg, bot_id, store, messenger));

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
