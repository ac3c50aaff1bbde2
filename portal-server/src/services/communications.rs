//! Company-wide announcements

use shared::models::{Communication, CommunicationCreate, NotificationCreate, Recipient};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::policy::{self, Action, Resource};
use crate::services::notifications::notify_best_effort;
use crate::state::AppState;
use crate::validation::{MAX_BODY_LEN, MAX_NAME_LEN, validate_required_text};
use crate::ServiceResult;

pub async fn list(state: &AppState, user: &CurrentUser) -> ServiceResult<Vec<Communication>> {
    policy::ensure(user, Action::Read, &Resource::Communication)?;
    state.store.list_communications().await
}

/// Publish an announcement and tell every area about it
pub async fn create(
    state: &AppState,
    user: &CurrentUser,
    data: CommunicationCreate,
) -> ServiceResult<Communication> {
    policy::ensure(user, Action::Create, &Resource::Communication)?;
    validate_required_text(&data.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&data.body, "body", MAX_BODY_LEN)?;

    let communication = Communication {
        id: snowflake_id(),
        title: data.title.trim().to_string(),
        body: data.body,
        priority: data.priority,
        author_id: user.id,
        author_name: user.full_name.clone(),
        created_at: now_millis(),
    };
    state.store.insert_communication(&communication).await?;
    tracing::info!(
        communication_id = communication.id,
        priority = communication.priority.as_str(),
        "Communication published"
    );

    notify_best_effort(
        state,
        NotificationCreate::new(
            Recipient::Broadcast,
            format!("Comunicado: {}", communication.title),
            format!("Prioridad {}", communication.priority.as_str()),
        )
        .with_link("/comunicados"),
    )
    .await;
    Ok(communication)
}

pub async fn delete(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<()> {
    policy::ensure(user, Action::Delete, &Resource::Communication)?;
    state.store.delete_communication(id).await?;
    tracing::info!(communication_id = id, "Communication deleted");
    Ok(())
}
