use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::{request, response};
use crate::utils::auth::Identity;

#[instrument(skip(state))]
pub(crate) async fn get_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<response::Comment>>, Error> {
    let comments = state.comments.get_by_post(post_id).await?;

    Ok(Json(comments))
}

#[instrument(skip(state, identity, params))]
pub(crate) async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(params): Json<request::NewCommentData>,
) -> Result<impl IntoResponse, Error> {
    let comment = state
        .comments
        .create(params.post_id, identity.user_id, &params.content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, identity, params))]
pub(crate) async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(params): Json<request::UpdateCommentData>,
) -> Result<Json<response::Comment>, Error> {
    let comment = state
        .comments
        .update(id, identity.user_id, &params.content)
        .await?;

    Ok(Json(comment))
}

#[instrument(skip(state, identity))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    state.comments.delete(id, identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
