//! Company settings (single row)

use shared::error::{AppError, ErrorCode};
use shared::models::{CompanySettings, CompanySettingsUpdate};
use shared::util::now_millis;

use crate::auth::CurrentUser;
use crate::policy::{self, Action, Resource};
use crate::state::AppState;
use crate::validation::{MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text};
use crate::ServiceResult;

/// Readable without a session (login page branding)
pub async fn get(state: &AppState) -> ServiceResult<CompanySettings> {
    state.store.get_settings().await
}

pub async fn update(
    state: &AppState,
    user: &CurrentUser,
    data: CompanySettingsUpdate,
) -> ServiceResult<CompanySettings> {
    policy::ensure(user, Action::Update, &Resource::Settings)?;

    if let Some(name) = &data.company_name {
        validate_required_text(name, "company_name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.logo_url, "logo_url", MAX_URL_LEN)?;
    validate_optional_text(&data.contact_email, "contact_email", MAX_NAME_LEN)?;
    if let Some(email) = &data.contact_email
        && !email.is_empty()
        && !email.contains('@')
    {
        return Err(AppError::with_message(ErrorCode::InvalidFormat, "contact_email is not an email address")
            .with_detail("field", "contact_email")
            .into());
    }

    let settings = state.store.update_settings(&data, now_millis()).await?;
    tracing::info!(company = %settings.company_name, by = user.id, "Company settings updated");
    Ok(settings)
}
