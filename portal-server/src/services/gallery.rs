//! Area photo gallery

use shared::error::{AppError, ErrorCode};
use shared::models::{Area, GalleryPost, GalleryPostCreate};
use shared::util::{now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::policy::{self, Action, Resource};
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
};
use crate::ServiceResult;

/// Newest first, optionally for one area
pub async fn list_posts(
    state: &AppState,
    user: &CurrentUser,
    area: Option<Area>,
) -> ServiceResult<Vec<GalleryPost>> {
    policy::ensure(user, Action::Read, &Resource::GalleryPost { author_id: user.id })?;
    state.store.list_gallery_posts(area).await
}

pub async fn create_post(
    state: &AppState,
    user: &CurrentUser,
    data: GalleryPostCreate,
) -> ServiceResult<GalleryPost> {
    policy::ensure(user, Action::Create, &Resource::GalleryPost { author_id: user.id })?;

    validate_required_text(&data.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    let image_url = data.image_url.trim();
    validate_required_text(image_url, "image_url", MAX_URL_LEN)?;
    if !(image_url.starts_with("https://")
        || image_url.starts_with("http://")
        || image_url.starts_with('/'))
    {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "image_url must be an http(s) URL or an absolute path",
        )
        .with_detail("field", "image_url")
        .into());
    }

    let post = GalleryPost {
        id: snowflake_id(),
        title: data.title.trim().to_string(),
        description: data.description,
        image_url: image_url.to_string(),
        area: data.area.unwrap_or(user.area),
        author_id: user.id,
        author_name: user.full_name.clone(),
        created_at: now_millis(),
    };
    state.store.insert_gallery_post(&post).await?;
    tracing::info!(post_id = post.id, area = %post.area, "Gallery post created");
    Ok(post)
}

/// Authors delete their own posts; administrators delete any
pub async fn delete_post(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<()> {
    let post = state
        .store
        .find_gallery_post(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GalleryPostNotFound).with_detail("post_id", id))?;
    policy::ensure(
        user,
        Action::Delete,
        &Resource::GalleryPost {
            author_id: post.author_id,
        },
    )?;
    state.store.delete_gallery_post(id).await?;
    tracing::info!(post_id = id, by = user.id, "Gallery post deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{admin, usuario};

    fn photo(title: &str) -> GalleryPostCreate {
        GalleryPostCreate {
            title: title.into(),
            description: None,
            image_url: "https://cdn.agronorte.pe/cosecha.jpg".into(),
            area: None,
        }
    }

    #[tokio::test]
    async fn posts_default_to_author_area() {
        let state = AppState::in_memory();
        let author = usuario(2, Area::Produccion);
        let post = create_post(&state, &author, photo("Cosecha de maíz")).await.unwrap();
        assert_eq!(post.area, Area::Produccion);

        let own = list_posts(&state, &author, Some(Area::Produccion)).await.unwrap();
        assert_eq!(own.len(), 1);
        let other = list_posts(&state, &author, Some(Area::Almacen)).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn only_author_or_admin_deletes() {
        let state = AppState::in_memory();
        let author = usuario(2, Area::Produccion);
        let first = create_post(&state, &author, photo("Uno")).await.unwrap();
        let second = create_post(&state, &author, photo("Dos")).await.unwrap();

        let err = delete_post(&state, &usuario(3, Area::Produccion), first.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);

        delete_post(&state, &author, first.id).await.unwrap();
        delete_post(&state, &admin(), second.id).await.unwrap();
        let err = delete_post(&state, &author, second.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::GalleryPostNotFound);
    }

    #[tokio::test]
    async fn image_url_must_be_a_link() {
        let state = AppState::in_memory();
        let err = create_post(
            &state,
            &admin(),
            GalleryPostCreate {
                image_url: "javascript:alert(1)".into(),
                ..photo("Mala")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFormat);
    }
}
