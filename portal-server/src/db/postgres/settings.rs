//! Company settings (single row, id = 1)

use async_trait::async_trait;
use shared::models::{CompanySettings, CompanySettingsUpdate};

use super::PgStore;
use crate::ServiceResult;
use crate::db::SettingsRepository;

#[derive(sqlx::FromRow)]
struct SettingsRow {
    company_name: String,
    logo_url: Option<String>,
    contact_email: Option<String>,
    updated_at: i64,
}

impl From<SettingsRow> for CompanySettings {
    fn from(row: SettingsRow) -> Self {
        CompanySettings {
            company_name: row.company_name,
            logo_url: row.logo_url,
            contact_email: row.contact_email,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SettingsRepository for PgStore {
    async fn get_settings(&self) -> ServiceResult<CompanySettings> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT company_name, logo_url, contact_email, updated_at FROM company_settings WHERE id = 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(CompanySettings::from).unwrap_or_default())
    }

    async fn update_settings(
        &self,
        update: &CompanySettingsUpdate,
        now: i64,
    ) -> ServiceResult<CompanySettings> {
        let defaults = CompanySettings::default();
        let row: SettingsRow = sqlx::query_as(
            r#"
            INSERT INTO company_settings (id, company_name, logo_url, contact_email, updated_at)
            VALUES (1, COALESCE($1, $5), $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                company_name = COALESCE($1, company_settings.company_name),
                logo_url = COALESCE($2, company_settings.logo_url),
                contact_email = COALESCE($3, company_settings.contact_email),
                updated_at = $4
            RETURNING company_name, logo_url, contact_email, updated_at
            "#,
        )
        .bind(&update.company_name)
        .bind(&update.logo_url)
        .bind(&update.contact_email)
        .bind(now)
        .bind(&defaults.company_name)
        .fetch_one(self.pool())
        .await?;
        Ok(row.into())
    }
}
