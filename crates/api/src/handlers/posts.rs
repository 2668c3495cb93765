//! Handlers for the `/posts` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use guildhall_core::forum::NewPost;
use guildhall_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use super::validate_input;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireMember, RequireModerator};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /posts`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 64))]
    pub game: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
}

/// Request body for `POST /posts/{id}/replies`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

/// GET /api/v1/posts
pub async fn list_posts(State(state): State<AppState>) -> impl IntoResponse {
    let posts = state.posts.list_posts().await;
    Json(DataResponse { data: posts })
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    RequireMember(user): RequireMember,
    Json(input): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let post = state
        .posts
        .create_post(
            user.user_id,
            NewPost {
                game: input.game,
                title: input.title,
                body: input.body,
            },
        )
        .await;

    tracing::info!(post_id = post.id, user_id = user.user_id, game = %post.game, "Post created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: post })))
}

/// POST /api/v1/posts/{id}/replies
pub async fn create_reply(
    State(state): State<AppState>,
    RequireMember(user): RequireMember,
    Path(post_id): Path<DbId>,
    Json(input): Json<CreateReplyRequest>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let reply = state
        .posts
        .create_reply(post_id, user.user_id, input.body)
        .await?;

    tracing::info!(post_id, reply_id = reply.id, user_id = user.user_id, "Reply created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: reply })))
}

/// DELETE /api/v1/posts/{id}
///
/// Moderation removal. Game masters and admins only.
pub async fn delete_post(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Path(post_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.posts.delete_post(post_id).await?;

    tracing::info!(post_id, moderator_id = user.user_id, "Post removed");

    Ok(StatusCode::NO_CONTENT)
}
