//! Gallery posts, communications and chat messages

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Area, ChatMessage, ChatQuery, Communication, GalleryPost, Priority};

use super::{LIST_LIMIT, PgStore, decode};
use crate::db::ContentRepository;
use crate::{BoxError, ServiceResult};

#[derive(sqlx::FromRow)]
struct GalleryRow {
    id: i64,
    title: String,
    description: Option<String>,
    image_url: String,
    area: String,
    author_id: i64,
    author_name: String,
    created_at: i64,
}

impl TryFrom<GalleryRow> for GalleryPost {
    type Error = BoxError;

    fn try_from(row: GalleryRow) -> Result<Self, Self::Error> {
        Ok(GalleryPost {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            area: decode(&row.area, "gallery area", Area::from_db)?,
            author_id: row.author_id,
            author_name: row.author_name,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommunicationRow {
    id: i64,
    title: String,
    body: String,
    priority: String,
    author_id: i64,
    author_name: String,
    created_at: i64,
}

impl TryFrom<CommunicationRow> for Communication {
    type Error = BoxError;

    fn try_from(row: CommunicationRow) -> Result<Self, Self::Error> {
        Ok(Communication {
            id: row.id,
            title: row.title,
            body: row.body,
            priority: decode(&row.priority, "priority", Priority::from_db)?,
            author_id: row.author_id,
            author_name: row.author_name,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChatRow {
    id: i64,
    channel: String,
    author_id: i64,
    author_name: String,
    body: String,
    created_at: i64,
}

impl From<ChatRow> for ChatMessage {
    fn from(row: ChatRow) -> Self {
        ChatMessage {
            id: row.id,
            channel: row.channel,
            author_id: row.author_id,
            author_name: row.author_name,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

const GALLERY_COLUMNS: &str =
    "id, title, description, image_url, area, author_id, author_name, created_at";

#[async_trait]
impl ContentRepository for PgStore {
    async fn list_gallery_posts(&self, area: Option<Area>) -> ServiceResult<Vec<GalleryPost>> {
        let rows: Vec<GalleryRow> = sqlx::query_as(&format!(
            r#"
            SELECT {GALLERY_COLUMNS}
            FROM gallery_posts
            WHERE ($1::TEXT IS NULL OR area = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(area.map(|a| a.as_str()))
        .bind(LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        let posts = rows
            .into_iter()
            .map(GalleryPost::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn find_gallery_post(&self, id: i64) -> ServiceResult<Option<GalleryPost>> {
        let row: Option<GalleryRow> = sqlx::query_as(&format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(GalleryPost::try_from).transpose()?)
    }

    async fn insert_gallery_post(&self, post: &GalleryPost) -> ServiceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO gallery_posts ({GALLERY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.image_url)
        .bind(post.area.as_str())
        .bind(post.author_id)
        .bind(&post.author_name)
        .bind(post.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_gallery_post(&self, id: i64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM gallery_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::new(ErrorCode::GalleryPostNotFound)
                .with_detail("post_id", id)
                .into());
        }
        Ok(())
    }

    async fn list_communications(&self) -> ServiceResult<Vec<Communication>> {
        let rows: Vec<CommunicationRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, priority, author_id, author_name, created_at
            FROM communications
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        let communications = rows
            .into_iter()
            .map(Communication::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(communications)
    }

    async fn insert_communication(&self, communication: &Communication) -> ServiceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO communications (id, title, body, priority, author_id, author_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(communication.id)
        .bind(&communication.title)
        .bind(&communication.body)
        .bind(communication.priority.as_str())
        .bind(communication.author_id)
        .bind(&communication.author_name)
        .bind(communication.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_communication(&self, id: i64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM communications WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::new(ErrorCode::CommunicationNotFound)
                .with_detail("communication_id", id)
                .into());
        }
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        channel: &str,
        query: &ChatQuery,
        limit: i64,
    ) -> ServiceResult<Vec<ChatMessage>> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            r#"
            SELECT id, channel, author_id, author_name, body, created_at
            FROM chat_messages
            WHERE channel = $1 AND ($2::BIGINT IS NULL OR created_at < $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(channel)
        .bind(query.before)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        let mut messages: Vec<ChatMessage> = rows.into_iter().map(ChatMessage::from).collect();
        messages.reverse();
        Ok(messages)
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> ServiceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, channel, author_id, author_name, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(&message.channel)
        .bind(message.author_id)
        .bind(&message.author_name)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
