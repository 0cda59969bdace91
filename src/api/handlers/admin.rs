//! Admin post management and dashboard statistics.
//!
//! Every handler here checks the administrator role itself; the router
//! only guarantees an authenticated caller.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::ADMIN_TAG;
use crate::api::dto::{CreatePostRequest, PagedResponse, PostListQuery, UpdatePostRequest};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::BlogPost;
use crate::services::SiteStats;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Routes under `/api/admin`.
///
/// Routes:
/// - GET /posts                - All posts, optionally by status
/// - POST /posts               - Create a post
/// - GET /posts/{id}           - Any post by id
/// - PUT /posts/{id}           - Update a post
/// - DELETE /posts/{id}        - Delete a post
/// - POST /posts/{id}/publish  - Publish a draft
/// - GET /stats                - Dashboard counters
pub fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_posts, create_post))
        .routes(routes!(get_post, update_post, delete_post))
        .routes(routes!(publish_post))
        .routes(routes!(stats))
}

/// GET /api/admin/posts - List posts of any status
#[utoipa::path(
    get,
    path = "/posts",
    tag = ADMIN_TAG,
    params(PostListQuery),
    responses(
        (status = 200, description = "Posts, newest first", body = PagedResponse<BlogPost>),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearerAuth" = []))
)]
async fn list_posts(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<PostListQuery>,
) -> AppResult<Json<PagedResponse<BlogPost>>> {
    auth_user.require_admin()?;

    let params = query.pagination();
    let (posts, total) = state
        .services
        .posts
        .list(query.status, params.offset(), params.limit())
        .await?;
    Ok(Json(PagedResponse::new(posts, &params, total)))
}

/// POST /api/admin/posts - Create a post
#[utoipa::path(
    post,
    path = "/posts",
    tag = ADMIN_TAG,
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = BlogPost),
        (status = 400, description = "Invalid request")
    ),
    security(("bearerAuth" = []))
)]
async fn create_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<BlogPost>)> {
    auth_user.require_admin()?;

    let post = state
        .services
        .posts
        .create(payload.into_draft(), Some(&auth_user.actor()))
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/admin/posts/{id} - Get a post of any status
#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = ADMIN_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 404, description = "Post not found")
    ),
    security(("bearerAuth" = []))
)]
async fn get_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<Json<BlogPost>> {
    auth_user.require_admin()?;
    Ok(Json(state.services.posts.get(id).await?))
}

/// PUT /api/admin/posts/{id} - Update a post
#[utoipa::path(
    put,
    path = "/posts/{id}",
    tag = ADMIN_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = BlogPost),
        (status = 404, description = "Post not found")
    ),
    security(("bearerAuth" = []))
)]
async fn update_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> AppResult<Json<BlogPost>> {
    auth_user.require_admin()?;

    let post = state
        .services
        .posts
        .update(id, payload.into_update())
        .await?;
    Ok(Json(post))
}

/// DELETE /api/admin/posts/{id} - Delete a post and its comments
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = ADMIN_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found")
    ),
    security(("bearerAuth" = []))
)]
async fn delete_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth_user.require_admin()?;
    state.services.posts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/posts/{id}/publish - Publish a draft
#[utoipa::path(
    post,
    path = "/posts/{id}/publish",
    tag = ADMIN_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post published", body = BlogPost),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Post is already published")
    ),
    security(("bearerAuth" = []))
)]
async fn publish_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<Json<BlogPost>> {
    auth_user.require_admin()?;

    let post = state
        .services
        .posts
        .publish(id, Some(&auth_user.actor()))
        .await?;
    Ok(Json(post))
}

/// GET /api/admin/stats - Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = ADMIN_TAG,
    responses(
        (status = 200, description = "Site statistics", body = SiteStats),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearerAuth" = []))
)]
async fn stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<SiteStats>> {
    auth_user.require_admin()?;
    Ok(Json(state.services.stats.collect().await?))
}
