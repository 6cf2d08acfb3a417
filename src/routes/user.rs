use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum_macros::debug_handler;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::{request, response};
use crate::utils::auth::Identity;
use crate::utils::upload::UploadedImage;

#[instrument(skip(state))]
pub(crate) async fn get_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<response::User>>, Error> {
    let users = state.users.get_all().await?;

    Ok(Json(users))
}

#[instrument(skip(state))]
pub(crate) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<response::User>, Error> {
    let user = state.users.get(id).await?;

    Ok(Json(user))
}

#[debug_handler]
#[instrument(skip(state, multipart))]
pub(crate) async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let mut email = None;
    let mut password = None;
    let mut nickname = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "email" => email = Some(field.text().await?),
            "password" => password = Some(field.text().await?),
            "nickname" => nickname = Some(field.text().await?),
            "image" => image = read_image(field).await?,
            _ => (),
        }
    }

    let email = email.ok_or(Error::InvalidEmail)?;
    let password = password.ok_or_else(|| Error::InvalidPassword("Password is required".to_owned()))?;
    let nickname = nickname.ok_or(Error::InvalidNickname)?;

    let user = state
        .users
        .register(&email, &password, &nickname, image)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub(crate) async fn email_available(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<response::Availability>, Error> {
    let taken = state.users.email_taken(&email).await?;

    Ok(Json(response::Availability { available: !taken }))
}

#[instrument(skip(state))]
pub(crate) async fn nickname_available(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<response::Availability>, Error> {
    let taken = state.users.nickname_taken(&nickname).await?;

    Ok(Json(response::Availability { available: !taken }))
}

#[instrument(skip(state, identity, params))]
pub(crate) async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(params): Json<request::UpdatePasswordData>,
) -> Result<impl IntoResponse, Error> {
    state
        .users
        .update_password(id, identity.user_id, &params.password)
        .await?;

    Ok(Json("Password updated"))
}

#[instrument(skip(state, identity, multipart))]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let mut nickname = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "nickname" => nickname = Some(field.text().await?),
            "image" => image = read_image(field).await?,
            _ => (),
        }
    }

    state
        .users
        .update_profile(id, identity.user_id, nickname.as_deref(), image)
        .await?;

    Ok(Json("Profile updated"))
}

#[instrument(skip(state, identity))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    state.users.delete(id, identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub(crate) async fn image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let (bytes, content_type) = state.users.load_image(id).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// An image part with no content counts as "no image".
pub(crate) async fn read_image(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<UploadedImage>, Error> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await?.to_vec();

    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedImage { file_name, bytes }))
}
