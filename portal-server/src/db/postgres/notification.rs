//! Notifications

use async_trait::async_trait;
use shared::models::{Area, BROADCAST_RECIPIENT, Notification, Recipient};

use super::{PgStore, decode};
use crate::db::NotificationRepository;
use crate::{BoxError, ServiceResult};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient: String,
    title: String,
    description: String,
    link: Option<String>,
    read: bool,
    created_at: i64,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = BoxError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient: decode(&row.recipient, "recipient", Recipient::from_db)?,
            title: row.title,
            description: row.description,
            link: row.link,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> ServiceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient, title, description, link, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient.as_str())
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(&notification.link)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_notification(&self, id: i64) -> ServiceResult<Option<Notification>> {
        let row: Option<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, recipient, title, description, link, read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Notification::try_from).transpose()?)
    }

    async fn list_notifications(
        &self,
        area: Option<Area>,
        unread_only: bool,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, recipient, title, description, link, read, created_at
            FROM notifications
            WHERE ($1::TEXT IS NULL OR recipient = $1 OR recipient = $2)
              AND (NOT $3 OR read = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(area.map(|a| a.as_str()))
        .bind(BROADCAST_RECIPIENT)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        let notifications = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self, area: Area) -> ServiceResult<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE read = FALSE AND (recipient = $1 OR recipient = $2)
            RETURNING id
            "#,
        )
        .bind(area.as_str())
        .bind(BROADCAST_RECIPIENT)
        .fetch_all(self.pool())
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
