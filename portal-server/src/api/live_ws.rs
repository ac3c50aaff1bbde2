//! Live change-feed WebSocket
//!
//! GET /api/live/ws?token=<JWT>&topics=notifications,chat&area=<Area>
//!
//! Browsers cannot set headers on a WebSocket handshake, so the session token
//! travels in the query string.
//!
//! Protocol:
//! - Server → Client: [`LiveMessage`] (Ready, Event, Resync)
//! - Client → Server: [`LiveCommand`] (Subscribe)

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::live::{LiveCommand, LiveMessage, Topic};
use shared::models::Area;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::session::{token_error, verify_token};
use crate::auth::CurrentUser;
use crate::live::{ConnectionGuard, MAX_CONNECTIONS_PER_USER, Subscription};
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/live/ws", get(handle_live_ws))
}

#[derive(Deserialize)]
pub struct LiveQuery {
    token: String,
    /// Comma-separated topics; empty or absent means all
    topics: Option<String>,
    /// Notification routing area; only administrators may pick another area
    area: Option<Area>,
}

/// Resolve the notification filter for a session
fn session_area(user: &CurrentUser, requested: Option<Area>) -> Option<Area> {
    if user.is_admin() {
        requested
    } else {
        Some(user.area)
    }
}

pub async fn handle_live_ws(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_token(&query.token, &state.jwt_secret).map_err(|e| {
        tracing::debug!("Live WS JWT validation failed: {e}");
        token_error(&e)
    })?;
    let user = CurrentUser::from(claims);

    let guard = state.live.try_acquire(user.id).map_err(|open| {
        AppError::with_message(
            ErrorCode::TooManyRequests,
            format!("Too many live connections ({open}/{MAX_CONNECTIONS_PER_USER})"),
        )
    })?;

    let subscription = Subscription {
        topics: Topic::parse_list(query.topics.as_deref().unwrap_or_default()),
        area: session_area(&user, query.area),
    };

    Ok(ws.on_upgrade(move |socket| live_session(socket, state, user, subscription, guard)))
}

async fn live_session(
    socket: WebSocket,
    state: AppState,
    user: CurrentUser,
    mut subscription: Subscription,
    _guard: ConnectionGuard,
) {
    let (mut sink, mut stream) = socket.split();
    let mut hub_rx = state.live.subscribe();

    tracing::info!(user_id = user.id, topics = ?subscription.topics, "Live WS connected");

    let ready = LiveMessage::Ready {
        topics: subscription.topics.clone(),
    };
    if send_message(&mut sink, &ready).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(event) => {
                        if subscription.accepts(&event)
                            && send_message(&mut sink, &LiveMessage::Event { event }).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(user_id = user.id, lagged = n, "Live subscriber lagged, requesting resync");
                        hub_rx = state.live.subscribe();
                        if send_message(&mut sink, &LiveMessage::Resync).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<LiveCommand>(&text) {
                            Ok(LiveCommand::Subscribe { topics }) => {
                                subscription.topics = if topics.is_empty() {
                                    Topic::ALL.to_vec()
                                } else {
                                    topics
                                };
                                let ready = LiveMessage::Ready {
                                    topics: subscription.topics.clone(),
                                };
                                if send_message(&mut sink, &ready).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::debug!(user_id = user.id, "Ignoring malformed live command: {e}"),
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user_id = user.id, "Live WS disconnected");
}

async fn send_message<S>(sink: &mut S, msg: &LiveMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
