//! Internal chat channels

use shared::error::AppError;
use shared::live::LiveEvent;
use shared::models::{ChatMessage, ChatMessageCreate, ChatQuery};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::policy::{self, Action, Resource};
use crate::state::AppState;
use crate::validation::{MAX_CHAT_LEN, clamp_limit, validate_required_text};
use crate::ServiceResult;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;
const MAX_CHANNEL_LEN: usize = 50;

/// Channel names are short lowercase slugs
fn normalize_channel(channel: &str) -> Result<String, AppError> {
    let channel = channel.trim().to_lowercase();
    validate_required_text(&channel, "channel", MAX_CHANNEL_LEN)?;
    if !channel
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(AppError::with_message(
            shared::error::ErrorCode::InvalidFormat,
            "channel may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(channel)
}

/// Latest messages of a channel, oldest first
pub async fn list(
    state: &AppState,
    user: &CurrentUser,
    channel: &str,
    query: ChatQuery,
) -> ServiceResult<Vec<ChatMessage>> {
    policy::ensure(user, Action::Read, &Resource::Chat)?;
    let channel = normalize_channel(channel)?;
    let limit = clamp_limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT);
    state.store.list_chat_messages(&channel, &query, limit).await
}

pub async fn post(
    state: &AppState,
    user: &CurrentUser,
    channel: &str,
    data: ChatMessageCreate,
) -> ServiceResult<ChatMessage> {
    policy::ensure(user, Action::Create, &Resource::Chat)?;
    let channel = normalize_channel(channel)?;
    validate_required_text(&data.body, "body", MAX_CHAT_LEN)?;

    let message = ChatMessage {
        id: snowflake_id(),
        channel,
        author_id: user.id,
        author_name: user.full_name.clone(),
        body: data.body.trim().to_string(),
        created_at: now_millis(),
    };
    state.store.insert_chat_message(&message).await?;
    tracing::debug!(channel = %message.channel, author = user.id, "Chat message posted");
    state.live.publish(LiveEvent::ChatPosted(message.clone()));
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::usuario;
    use shared::error::ErrorCode;
    use shared::live::Topic;
    use shared::models::{Area, DEFAULT_CHANNEL};

    fn say(body: &str) -> ChatMessageCreate {
        ChatMessageCreate { body: body.into() }
    }

    #[tokio::test]
    async fn posts_are_published_and_listed_oldest_first() {
        let state = AppState::in_memory();
        let mut rx = state.live.subscribe();
        let user = usuario(2, Area::Almacen);

        post(&state, &user, DEFAULT_CHANNEL, say("Buenos días")).await.unwrap();
        post(&state, &user, "General", say("Llegó el camión")).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic(), Topic::Chat);

        let messages = list(&state, &user, DEFAULT_CHANNEL, ChatQuery::default())
            .await
            .unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["Buenos días", "Llegó el camión"]);

        let latest = list(
            &state,
            &user,
            DEFAULT_CHANNEL,
            ChatQuery {
                limit: Some(1),
                before: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(latest[0].body, "Llegó el camión");
    }

    #[tokio::test]
    async fn empty_bodies_and_odd_channels_are_rejected() {
        let state = AppState::in_memory();
        let user = usuario(2, Area::Almacen);

        let err = post(&state, &user, DEFAULT_CHANNEL, say("   ")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RequiredField);

        let err = post(&state, &user, "../etc", say("hola")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFormat);
    }
}
