use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum_macros::debug_handler;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::routes::user::read_image;
use crate::types::response;
use crate::utils::auth::Identity;

#[instrument(skip(state))]
pub(crate) async fn get_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<response::Post>>, Error> {
    let posts = state.posts.get_all().await?;

    Ok(Json(posts))
}

#[instrument(skip(state))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<response::Post>, Error> {
    let post = state.posts.get(id).await?;

    Ok(Json(post))
}

#[debug_handler]
#[instrument(skip(state, identity, multipart))]
pub(crate) async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let (title, content, image) = read_post_fields(&mut multipart).await?;

    let post = state
        .posts
        .create(identity.user_id, &title, &content, image)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, identity, multipart))]
pub(crate) async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<response::Post>, Error> {
    let (title, content, image) = read_post_fields(&mut multipart).await?;

    let post = state
        .posts
        .update(id, identity.user_id, &title, &content, image)
        .await?;

    Ok(Json(post))
}

#[instrument(skip(state, identity))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    state.posts.delete(id, identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub(crate) async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<i32>, Error> {
    let views = state.posts.increment_views(id).await?;

    Ok(Json(views))
}

#[instrument(skip(state))]
pub(crate) async fn image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let (bytes, content_type) = state.posts.load_image(id).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

async fn read_post_fields(
    multipart: &mut Multipart,
) -> Result<(String, String, Option<crate::utils::upload::UploadedImage>), Error> {
    let mut title = None;
    let mut content = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "content" => content = Some(field.text().await?),
            "image" => image = read_image(field).await?,
            _ => (),
        }
    }

    let title = title.ok_or(Error::MissingField("title"))?;
    let content = content.ok_or(Error::MissingField("content"))?;

    Ok((title, content, image))
}
