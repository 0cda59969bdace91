//! Post comments: public listing and submission for moderation.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::COMMENT_TAG;
use crate::api::dto::CreateCommentRequest;
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::Comment;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// `GET|POST /{id}/comments`, nested under `/api/posts`.
pub fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_comments, create_comment))
}

/// GET /api/posts/{id}/comments - Approved comments, oldest first
#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = COMMENT_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Approved comments", body = Vec<Comment>),
        (status = 404, description = "Post not found or not published")
    )
)]
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state.services.comments.list_approved(id).await?;
    Ok(Json(comments))
}

/// POST /api/posts/{id}/comments - Submit a comment or reply
///
/// The comment stays `pending` until an admin approves the matching
/// notification.
#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = COMMENT_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment stored for moderation", body = Comment),
        (status = 404, description = "Post or parent comment not found")
    )
)]
async fn create_comment(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let actor = auth_user.map(|Extension(user)| user.actor());
    let comment = state
        .services
        .comments
        .submit(id, payload.into_draft(), actor.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
