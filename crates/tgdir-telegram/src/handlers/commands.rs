use std::sync::Arc;

use teloxide::prelude::*;

use tgdir_core::{
    broadcast::broadcast_body,
    config::Config,
    domain::{ChatId, Participant, UserId},
    formatting::escape_html,
    hooks::{global_stats_summary, send_chat_list, user_info_summary},
    restriction::parse_chat_arg,
};

use crate::events::participant;
use crate::router::AppState;

const STORE_FAILURE: &str = "Something went wrong while reading or updating my database.";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

async fn reply(state: &AppState, chat_id: ChatId, html: &str) {
    if let Err(e) = state.messenger.send_html(chat_id, html).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
    }
}

/// What a command resolves to once the caller's privileges are applied.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Broadcast(String),
    ChatList,
    Restrict,
    Unrestrict,
    Stats,
    Info,
}

/// `None` for unknown commands, commands outside the caller's privileges and
/// a `/broadcast` without a body.
fn route(cmd: &str, text: &str, actor: UserId, cfg: &Config) -> Option<Route> {
    match cmd {
        "broadcast" if cfg.is_owner(actor) => {
            broadcast_body(text).map(|body| Route::Broadcast(body.to_string()))
        }
        "chatlist" if cfg.is_operator(actor) => Some(Route::ChatList),
        "restrict" if cfg.is_operator(actor) => Some(Route::Restrict),
        "unrestrict" if cfg.is_operator(actor) => Some(Route::Unrestrict),
        "stats" if cfg.is_operator(actor) => Some(Route::Stats),
        "info" => Some(Route::Info),
        _ => None,
    }
}

pub async fn handle_command(msg: &Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let actor = participant(user);
    let chat_id = ChatId(msg.chat.id.0);
    let (cmd, arg) = parse_command(text);

    let Some(route) = route(&cmd, text, actor.id, &state.cfg) else {
        return Ok(());
    };

    match route {
        Route::Broadcast(body) => handle_broadcast(&state, body, chat_id),
        Route::ChatList => {
            if let Err(e) =
                send_chat_list(state.store.as_ref(), state.messenger.as_ref(), chat_id).await
            {
                tracing::error!(error = %e, "chatlist failed");
                reply(&state, chat_id, STORE_FAILURE).await;
            }
        }
        Route::Restrict => match parse_chat_arg(&arg) {
            Err(usage) => reply(&state, chat_id, &usage.message("restrict")).await,
            Ok(target) => {
                if let Err(e) = state.restrictions.restrict(target, &actor, chat_id).await {
                    tracing::error!(chat_id = target.0, error = %e, "restrict failed");
                    reply(&state, chat_id, STORE_FAILURE).await;
                }
            }
        },
        Route::Unrestrict => match parse_chat_arg(&arg) {
            Err(usage) => reply(&state, chat_id, &usage.message("unrestrict")).await,
            Ok(target) => {
                if let Err(e) = state.restrictions.unrestrict(target, &actor, chat_id).await {
                    tracing::error!(chat_id = target.0, error = %e, "unrestrict failed");
                    reply(&state, chat_id, STORE_FAILURE).await;
                }
            }
        },
        Route::Stats => match global_stats_summary(state.store.as_ref()).await {
            Ok(summary) => reply(&state, chat_id, &escape_html(&summary)).await,
            Err(e) => {
                tracing::error!(error = %e, "stats failed");
                reply(&state, chat_id, STORE_FAILURE).await;
            }
        },
        Route::Info => {
            let replied = msg
                .reply_to_message()
                .and_then(|r| r.from())
                .map(participant);
            handle_info(&state, chat_id, &actor, replied, &arg).await;
        }
    }

    Ok(())
}

/// Broadcasts run in the background so the dispatcher keeps serving updates
/// while the per-chat delay ticks.
fn handle_broadcast(state: &Arc<AppState>, body: String, reply_to: ChatId) {
    let broadcaster = state.broadcaster.clone();
    tokio::spawn(async move {
        if let Err(e) = broadcaster.broadcast_and_report(&body, reply_to).await {
            tracing::error!(error = %e, "broadcast aborted");
        }
    });
}

/// Target of `/info`: explicit argument, else the replied-to author, else the
/// caller.
enum InfoTarget {
    Id(UserId),
    Handle(String),
}

fn info_target(arg: &str, replied: Option<&Participant>, actor: &Participant) -> InfoTarget {
    let arg = arg.trim();
    if arg.is_empty() {
        return InfoTarget::Id(replied.unwrap_or(actor).id);
    }
    match arg.parse::<i64>() {
        Ok(id) => InfoTarget::Id(UserId(id)),
        Err(_) => InfoTarget::Handle(arg.to_string()),
    }
}

async fn handle_info(
    state: &AppState,
    chat_id: ChatId,
    actor: &Participant,
    replied: Option<Participant>,
    arg: &str,
) {
    let user_id = match info_target(arg, replied.as_ref(), actor) {
        InfoTarget::Id(id) => id,
        InfoTarget::Handle(handle) => match state.resolver.resolve(&handle).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                reply(state, chat_id, "I don't seem to have interacted with this user before.")
                    .await;
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "user lookup failed");
                reply(state, chat_id, STORE_FAILURE).await;
                return;
            }
        },
    };

    match user_info_summary(state.store.as_ref(), state.bot_id, user_id).await {
        Ok(summary) => {
            let body = format!("<b>User info</b>:\nID: <code>{}</code>\n\n{summary}", user_id.0);
            reply(state, chat_id, &body).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "user info failed");
            reply(state, chat_id, STORE_FAILURE).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const OWNER: UserId = UserId(1);
    const OPERATOR: UserId = UserId(2);
    const STRANGER: UserId = UserId(3);

    fn cfg() -> Config {
        Config {
            telegram_bot_token: "token".to_string(),
            owner_id: OWNER.0,
            operator_ids: vec![OWNER.0, OPERATOR.0],
            directory_file: "/tmp/tgdir-test.json".into(),
            broadcast_delay: Duration::ZERO,
            lookup_timeout: Duration::from_secs(1),
        }
    }

    fn route_text(text: &str, actor: UserId) -> Option<Route> {
        let (cmd, _) = parse_command(text);
        route(&cmd, text, actor, &cfg())
    }

    fn p(id: i64) -> Participant {
        Participant {
            id: UserId(id),
            username: None,
            first_name: format!("user{id}"),
        }
    }

    #[test]
    fn parses_command_with_bot_suffix() {
        assert_eq!(
            parse_command("/Restrict@dirbot -100 "),
            ("restrict".to_string(), "-100".to_string())
        );
        assert_eq!(
            parse_command("/chatlist"),
            ("chatlist".to_string(), String::new())
        );
        assert_eq!(
            parse_command("/broadcast hello  world"),
            ("broadcast".to_string(), "hello  world".to_string())
        );
    }

    #[test]
    fn info_target_precedence() {
        let actor = p(1);
        let replied = p(2);

        assert!(matches!(
            info_target("", None, &actor),
            InfoTarget::Id(UserId(1))
        ));
        assert!(matches!(
            info_target("", Some(&replied), &actor),
            InfoTarget::Id(UserId(2))
        ));
        assert!(matches!(
            info_target("42", Some(&replied), &actor),
            InfoTarget::Id(UserId(42))
        ));
        assert!(matches!(
            info_target("@alice", None, &actor),
            InfoTarget::Handle(ref h) if h == "@alice"
        ));
    }

    #[test]
    fn broadcast_is_owner_only() {
        assert_eq!(
            route_text("/broadcast hello all", OWNER),
            Some(Route::Broadcast("hello all".to_string()))
        );
        assert_eq!(
            route_text("/broadcast@dirbot hi", OWNER),
            Some(Route::Broadcast("hi".to_string()))
        );
        assert_eq!(route_text("/broadcast hello all", OPERATOR), None);
        assert_eq!(route_text("/broadcast hello all", STRANGER), None);
    }

    #[test]
    fn broadcast_without_body_routes_nowhere() {
        assert_eq!(route_text("/broadcast", OWNER), None);
        assert_eq!(route_text("/broadcast@dirbot", OWNER), None);
        assert_eq!(route_text("/broadcast@dirbot   ", OWNER), None);
    }

    #[test]
    fn operator_commands_ignore_strangers() {
        for (text, expected) in [
            ("/chatlist", Route::ChatList),
            ("/restrict -1", Route::Restrict),
            ("/unrestrict -1", Route::Unrestrict),
            ("/stats", Route::Stats),
        ] {
            assert_eq!(route_text(text, STRANGER), None, "{text}");
            assert_eq!(route_text(text, OPERATOR).as_ref(), Some(&expected), "{text}");
            assert_eq!(route_text(text, OWNER), Some(expected), "{text}");
        }
    }

    #[test]
    fn info_is_open_and_unknown_commands_are_ignored() {
        assert_eq!(route_text("/info @alice", STRANGER), Some(Route::Info));
        assert_eq!(route_text("/start", OWNER), None);
        assert_eq!(route_text("/help", STRANGER), None);
    }
}
