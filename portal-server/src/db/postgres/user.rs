//! Users

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{Area, ManagedUser, UserRole, UserStatus, UserUpdate};

use super::{PgStore, decode, is_unique_violation};
use crate::db::{UserCredentials, UserRepository, user_not_found};
use crate::{BoxError, ServiceError, ServiceResult};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    full_name: String,
    role: String,
    area: String,
    status: String,
    created_at: i64,
}

impl TryFrom<UserRow> for ManagedUser {
    type Error = BoxError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(ManagedUser {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role: decode(&row.role, "role", UserRole::from_db)?,
            area: decode(&row.area, "area", Area::from_db)?,
            status: decode(&row.status, "user status", UserStatus::from_db)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, username, full_name, role, area, status, created_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn find_credentials(&self, username: &str) -> ServiceResult<Option<UserCredentials>> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        match row {
            Some(row) => Ok(Some(UserCredentials {
                user: row.user.try_into()?,
                password_hash: row.password_hash,
            })),
            None => Ok(None),
        }
    }

    async fn find_user(&self, id: i64) -> ServiceResult<Option<ManagedUser>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(ManagedUser::try_from).transpose()?)
    }

    async fn list_users(&self) -> ServiceResult<Vec<ManagedUser>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
                .fetch_all(self.pool())
                .await?;
        let users = rows
            .into_iter()
            .map(ManagedUser::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn count_users(&self) -> ServiceResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn insert_user(&self, user: &ManagedUser, password_hash: &str) -> ServiceResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO users ({USER_COLUMNS}, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.area.as_str())
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(password_hash)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::new(ErrorCode::UsernameExists)
                    .with_detail("username", user.username.as_str())
                    .into()
            } else {
                ServiceError::from(e)
            }
        })?;
        Ok(())
    }

    async fn activate_user(&self, id: i64) -> ServiceResult<ManagedUser> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET status = $1
            WHERE id = $2 AND status = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(UserStatus::Activo.as_str())
        .bind(id)
        .bind(UserStatus::Pendiente.as_str())
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(row.try_into()?),
            None => match self.find_user(id).await? {
                Some(_) => Err(AppError::new(ErrorCode::UserAlreadyActive).into()),
                None => Err(user_not_found(id).into()),
            },
        }
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> ServiceResult<ManagedUser> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($1, full_name),
                role = COALESCE($2, role),
                area = COALESCE($3, area)
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&update.full_name)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.area.map(|a| a.as_str()))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        let row = row.ok_or_else(|| user_not_found(id))?;
        Ok(row.try_into()?)
    }

    async fn delete_user(&self, id: i64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(id).into());
        }
        Ok(())
    }
}
