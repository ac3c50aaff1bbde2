//! Notifications
//!
//! Rows are addressed to one area or to everyone (`Todos`). A single `read`
//! flag is kept per row.

use shared::error::AppError;
use shared::live::LiveEvent;
use shared::models::{Area, Notification, NotificationCreate, Recipient};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::policy::{self, Action, Resource};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text};
use crate::{ServiceError, ServiceResult};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Insert a notification and push it to live subscribers
pub async fn notify(state: &AppState, draft: NotificationCreate) -> ServiceResult<Notification> {
    validate_required_text(&draft.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&draft.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&draft.link, "link", MAX_URL_LEN)?;

    let notification = Notification {
        id: snowflake_id(),
        recipient: draft.recipient,
        title: draft.title,
        description: draft.description,
        link: draft.link,
        read: false,
        created_at: now_millis(),
    };
    state.store.insert_notification(&notification).await?;
    state
        .live
        .publish(LiveEvent::NotificationCreated(notification.clone()));
    Ok(notification)
}

/// [`notify`] for side effects of another write: failures are logged only
pub async fn notify_best_effort(state: &AppState, draft: NotificationCreate) {
    let recipient = draft.recipient;
    if let Err(e) = notify(state, draft).await {
        tracing::warn!(recipient = recipient.as_str(), error = %e, "Failed to send notification");
    }
}

/// Notifications visible to `area` (own area plus broadcast).
///
/// Administrators may look at another area; everyone else always reads their own.
pub async fn list_for(
    state: &AppState,
    user: &CurrentUser,
    area: Option<Area>,
    unread_only: bool,
    limit: Option<i64>,
) -> ServiceResult<Vec<Notification>> {
    let area = match area {
        Some(area) if user.is_admin() => area,
        _ => user.area,
    };
    let limit = crate::validation::clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
    state
        .store
        .list_notifications(Some(area), unread_only, limit)
        .await
}

pub async fn mark_read(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<Notification> {
    let notification = state
        .store
        .find_notification(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    policy::ensure(
        user,
        Action::Update,
        &Resource::Notification {
            recipient: notification.recipient,
        },
    )?;

    if !notification.read {
        if !state.store.mark_notification_read(id).await? {
            return Err(not_found(id));
        }
        state.live.publish(LiveEvent::NotificationRead { id });
    }
    Ok(Notification {
        read: true,
        ..notification
    })
}

/// Mark everything visible to the caller's area as read; returns how many changed
pub async fn mark_all_read(state: &AppState, user: &CurrentUser) -> ServiceResult<usize> {
    policy::ensure(
        user,
        Action::Update,
        &Resource::Notification {
            recipient: Recipient::Area(user.area),
        },
    )?;
    let ids = state.store.mark_all_notifications_read(user.area).await?;
    for id in &ids {
        state.live.publish(LiveEvent::NotificationRead { id: *id });
    }
    Ok(ids.len())
}

fn not_found(id: i64) -> ServiceError {
    AppError::new(shared::error::ErrorCode::NotificationNotFound)
        .with_detail("notification_id", id)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{admin, usuario};
    use shared::error::ErrorCode;
    use shared::live::Topic;

    #[tokio::test]
    async fn area_sees_own_and_broadcast_rows() {
        let state = AppState::in_memory();
        notify(&state, NotificationCreate::new(Area::Almacen, "Pedido aprobado", "Pedido #1"))
            .await
            .unwrap();
        notify(&state, NotificationCreate::new(Recipient::Broadcast, "Comunicado", "Reunión general"))
            .await
            .unwrap();
        notify(&state, NotificationCreate::new(Area::Seguridad, "Permiso", "Nuevo permiso"))
            .await
            .unwrap();

        let almacen = usuario(2, Area::Almacen);
        let rows = list_for(&state, &almacen, None, false, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|n| n.recipient.reaches(Area::Almacen)));

        // a non-admin cannot peek at another area
        let rows = list_for(&state, &almacen, Some(Area::Seguridad), false, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let rows = list_for(&state, &admin(), Some(Area::Seguridad), false, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|n| n.title == "Permiso"));
    }

    #[tokio::test]
    async fn mark_read_respects_recipient() {
        let state = AppState::in_memory();
        let n = notify(&state, NotificationCreate::new(Area::Seguridad, "Permiso", "Nuevo"))
            .await
            .unwrap();

        let err = mark_read(&state, &usuario(2, Area::Almacen), n.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);

        let read = mark_read(&state, &usuario(3, Area::Seguridad), n.id)
            .await
            .unwrap();
        assert!(read.read);

        let unread = list_for(&state, &usuario(3, Area::Seguridad), None, true, None)
            .await
            .unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn mark_all_read_only_touches_visible_rows() {
        let state = AppState::in_memory();
        for _ in 0..3 {
            notify(&state, NotificationCreate::new(Area::Almacen, "Stock", "Bajo"))
                .await
                .unwrap();
        }
        notify(&state, NotificationCreate::new(Area::Gerencia, "Informe", "Mensual"))
            .await
            .unwrap();

        let mut rx = state.live.subscribe();
        let changed = mark_all_read(&state, &usuario(2, Area::Almacen)).await.unwrap();
        assert_eq!(changed, 3);
        for _ in 0..3 {
            assert!(matches!(rx.try_recv(), Ok(LiveEvent::NotificationRead { .. })));
        }
        assert_eq!(mark_all_read(&state, &usuario(2, Area::Almacen)).await.unwrap(), 0);

        let gerencia = list_for(&state, &usuario(4, Area::Gerencia), None, true, None)
            .await
            .unwrap();
        assert_eq!(gerencia.len(), 1);
    }

    #[tokio::test]
    async fn unknown_notification() {
        let state = AppState::in_memory();
        let err = mark_read(&state, &admin(), 12345).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotificationNotFound);
    }

    #[tokio::test]
    async fn notify_publishes_live_event() {
        let state = AppState::in_memory();
        let mut rx = state.live.subscribe();
        let n = notify(&state, NotificationCreate::new(Area::Almacen, "Hola", "Mundo"))
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic(), Topic::Notifications);
        assert_eq!(event, LiveEvent::NotificationCreated(n));
    }
}
