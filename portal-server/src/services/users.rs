//! Accounts, login and registration

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Area, LoginRequest, LoginResponse, ManagedUser, NotificationCreate, UserCreate, UserRegister,
    UserRole, UserStatus, UserUpdate,
};
use shared::util::{now_millis, snowflake_id};

use crate::auth::{CurrentUser, create_token};
use crate::config::Config;
use crate::db::user_not_found;
use crate::policy::{self, Action, Resource};
use crate::services::notifications::notify_best_effort;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};
use crate::validation::{MAX_NAME_LEN, validate_password, validate_required_text, validate_username};
use crate::ServiceResult;

/// Verify credentials and issue a session token.
///
/// Unknown usernames and wrong passwords are indistinguishable to the caller.
pub async fn login(state: &AppState, req: LoginRequest) -> ServiceResult<LoginResponse> {
    let username = normalize_username(&req.username);
    let credentials = state
        .store
        .find_credentials(&username)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &credentials.password_hash) {
        tracing::info!(username = %username, "Login rejected: bad password");
        return Err(AppError::invalid_credentials().into());
    }
    if !credentials.user.status.can_login() {
        return Err(AppError::new(ErrorCode::AccountPending).into());
    }

    let token = create_token(&credentials.user, &state.jwt_secret, state.jwt_expiry_hours)
        .map_err(|e| {
            tracing::error!("JWT creation failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    tracing::info!(user_id = credentials.user.id, "User logged in");
    Ok(LoginResponse {
        token,
        user: credentials.user,
    })
}

/// Self-service sign-up; the account waits in `Pendiente` until an
/// administrator activates it.
pub async fn register(state: &AppState, data: UserRegister) -> ServiceResult<ManagedUser> {
    let user = insert(
        state,
        &data.username,
        &data.full_name,
        &data.password,
        UserRole::Usuario,
        data.area,
        UserStatus::Pendiente,
    )
    .await?;

    notify_best_effort(
        state,
        NotificationCreate::new(
            Area::Administracion,
            "Nuevo usuario pendiente",
            format!("{} ({}) solicitó acceso para {}", user.full_name, user.username, user.area),
        )
        .with_link("/usuarios"),
    )
    .await;
    Ok(user)
}

/// Admin-created account, active immediately
pub async fn create_user(
    state: &AppState,
    user: &CurrentUser,
    data: UserCreate,
) -> ServiceResult<ManagedUser> {
    policy::ensure(user, Action::Create, &Resource::User { id: 0 })?;
    insert(
        state,
        &data.username,
        &data.full_name,
        &data.password,
        data.role,
        data.area,
        UserStatus::Activo,
    )
    .await
}

pub async fn list_users(state: &AppState, user: &CurrentUser) -> ServiceResult<Vec<ManagedUser>> {
    policy::ensure(user, Action::Read, &Resource::User { id: 0 })?;
    state.store.list_users().await
}

/// A single account; users may read their own
pub async fn get_user(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<ManagedUser> {
    policy::ensure(user, Action::Read, &Resource::User { id })?;
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| user_not_found(id).into())
}

pub async fn activate_user(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<ManagedUser> {
    policy::ensure(user, Action::Approve, &Resource::User { id })?;
    let activated = state.store.activate_user(id).await?;
    tracing::info!(user_id = id, by = user.id, "User activated");
    Ok(activated)
}

pub async fn update_user(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    mut data: UserUpdate,
) -> ServiceResult<ManagedUser> {
    policy::ensure(user, Action::Update, &Resource::User { id })?;
    if let Some(name) = &data.full_name {
        validate_required_text(name, "full_name", MAX_NAME_LEN)?;
        data.full_name = Some(name.trim().to_string());
    }
    let updated = state.store.update_user(id, &data).await?;
    tracing::info!(user_id = id, role = updated.role.as_str(), area = %updated.area, "User updated");
    Ok(updated)
}

pub async fn delete_user(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<()> {
    policy::ensure(user, Action::Delete, &Resource::User { id })?;
    if id == user.id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf).into());
    }
    state.store.delete_user(id).await?;
    tracing::info!(user_id = id, by = user.id, "User deleted");
    Ok(())
}

/// Create the first administrator from configuration when no account exists
pub async fn ensure_bootstrap_admin(state: &AppState, config: &Config) -> ServiceResult<()> {
    if state.store.count_users().await? > 0 {
        return Ok(());
    }
    let (Some(username), Some(password)) = (
        config.bootstrap_admin_username.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        tracing::warn!(
            "No users exist and BOOTSTRAP_ADMIN_USERNAME/BOOTSTRAP_ADMIN_PASSWORD are unset; nobody can log in"
        );
        return Ok(());
    };

    let admin = insert(
        state,
        username,
        "Administrador",
        password,
        UserRole::Administrador,
        Area::Administracion,
        UserStatus::Activo,
    )
    .await?;
    tracing::info!(username = %admin.username, "Bootstrap administrator created");
    Ok(())
}

fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

async fn insert(
    state: &AppState,
    username: &str,
    full_name: &str,
    password: &str,
    role: UserRole,
    area: Area,
    status: UserStatus,
) -> ServiceResult<ManagedUser> {
    let username = normalize_username(username);
    validate_username(&username)?;
    validate_required_text(full_name, "full_name", MAX_NAME_LEN)?;
    validate_password(password)?;

    let password_hash = hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let user = ManagedUser {
        id: snowflake_id(),
        username,
        full_name: full_name.trim().to_string(),
        role,
        area,
        status,
        created_at: now_millis(),
    };
    state.store.insert_user(&user, &password_hash).await?;
    tracing::info!(
        user_id = user.id,
        role = role.as_str(),
        status = status.as_str(),
        "User account created"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_token;
    use crate::services::test_support::{admin, usuario};

    fn signup(username: &str) -> UserRegister {
        UserRegister {
            username: username.into(),
            full_name: "María Quispe".into(),
            password: "cosecha2026".into(),
            area: Area::Produccion,
        }
    }

    fn credentials(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn pending_accounts_cannot_log_in_until_activated() {
        let state = AppState::in_memory();
        let user = register(&state, signup("MQuispe")).await.unwrap();
        assert_eq!(user.username, "mquispe");
        assert_eq!(user.status, UserStatus::Pendiente);

        let to_admin = state
            .store
            .list_notifications(Some(Area::Administracion), false, 10)
            .await
            .unwrap();
        assert_eq!(to_admin.len(), 1);

        let err = login(&state, credentials("mquispe", "cosecha2026"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountPending);

        activate_user(&state, &admin(), user.id).await.unwrap();
        let err = activate_user(&state, &admin(), user.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserAlreadyActive);

        let session = login(&state, credentials(" MQUISPE ", "cosecha2026"))
            .await
            .unwrap();
        let claims = verify_token(&session.token, &state.jwt_secret).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.area, Area::Produccion);
        assert_eq!(claims.role, UserRole::Usuario);
    }

    #[tokio::test]
    async fn bad_credentials_look_the_same() {
        let state = AppState::in_memory();
        create_user(
            &state,
            &admin(),
            UserCreate {
                username: "jperez".into(),
                full_name: "Juan Pérez".into(),
                password: "tractor99".into(),
                role: UserRole::Usuario,
                area: Area::Almacen,
            },
        )
        .await
        .unwrap();

        for req in [credentials("jperez", "wrong-pass"), credentials("nadie", "tractor99")] {
            let err = login(&state, req).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidCredentials);
        }
        assert!(login(&state, credentials("jperez", "tractor99")).await.is_ok());
    }

    #[tokio::test]
    async fn usernames_are_unique_and_validated() {
        let state = AppState::in_memory();
        register(&state, signup("mquispe")).await.unwrap();

        let err = register(&state, signup("MQUISPE")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UsernameExists);

        let err = register(&state, signup("a b")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFormat);

        let err = register(
            &state,
            UserRegister {
                password: "123".into(),
                ..signup("otro")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn user_management_is_admin_only() {
        let state = AppState::in_memory();
        let pending = register(&state, signup("mquispe")).await.unwrap();
        let plain = usuario(pending.id, Area::Produccion);

        assert_eq!(
            list_users(&state, &plain).await.unwrap_err().code(),
            ErrorCode::AdminRequired
        );
        assert_eq!(
            activate_user(&state, &plain, pending.id).await.unwrap_err().code(),
            ErrorCode::AdminRequired
        );
        // reading yourself is fine
        assert!(get_user(&state, &plain, pending.id).await.is_ok());

        let updated = update_user(
            &state,
            &admin(),
            pending.id,
            UserUpdate {
                area: Some(Area::Almacen),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.area, Area::Almacen);
        assert_eq!(updated.full_name, "María Quispe");
    }

    #[tokio::test]
    async fn admins_cannot_delete_themselves() {
        let state = AppState::in_memory();
        let me = admin();
        let err = delete_user(&state, &me, me.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserCannotDeleteSelf);

        let other = register(&state, signup("mquispe")).await.unwrap();
        delete_user(&state, &me, other.id).await.unwrap();
        let err = delete_user(&state, &me, other.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn bootstrap_admin_only_on_empty_table() {
        let state = AppState::in_memory();
        let config = Config {
            database_url: String::new(),
            database_max_connections: 1,
            http_port: 0,
            environment: "development".into(),
            jwt_secret: "test-secret".into(),
            jwt_expiry_hours: 1,
            cors_allowed_origin: None,
            bootstrap_admin_username: Some("Admin".into()),
            bootstrap_admin_password: Some("cambiar123".into()),
            auth_limits: Default::default(),
        };

        ensure_bootstrap_admin(&state, &config).await.unwrap();
        ensure_bootstrap_admin(&state, &config).await.unwrap();
        let users = state.store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, UserRole::Administrador);

        let session = login(&state, credentials("admin", "cambiar123")).await.unwrap();
        assert_eq!(session.user.status, UserStatus::Activo);
    }
}
