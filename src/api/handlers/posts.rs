//! Public blog post endpoints and likes.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::POST_TAG;
use crate::api::dto::{PagedResponse, PaginationParams};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::{BlogPost, PostStatus};
use crate::state::AppState;
use crate::utils::validate::ValidatedQuery;

/// Routes under `/api/posts`; served behind the optional auth layer.
///
/// Routes:
/// - GET /              - Published posts, newest first
/// - GET /slug/{slug}   - One published post
/// - POST /{id}/like    - Like a post
pub fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_published))
        .routes(routes!(get_by_slug))
        .routes(routes!(like_post))
}

/// GET /api/posts - List published posts
#[utoipa::path(
    get,
    path = "/",
    tag = POST_TAG,
    params(PaginationParams),
    responses(
        (status = 200, description = "Published posts", body = PagedResponse<BlogPost>)
    )
)]
async fn list_published(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<BlogPost>>> {
    let (posts, total) = state
        .services
        .posts
        .list(Some(PostStatus::Published), params.offset(), params.limit())
        .await?;
    Ok(Json(PagedResponse::new(posts, &params, total)))
}

/// GET /api/posts/slug/{slug} - Get a published post
#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = POST_TAG,
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "The post", body = BlogPost),
        (status = 404, description = "No published post with this slug")
    )
)]
async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPost>> {
    let post = state.services.posts.get_published(&slug).await?;
    Ok(Json(post))
}

/// POST /api/posts/{id}/like - Like a post
///
/// Anonymous likes are counted too; the author is told who liked when the
/// caller is signed in.
#[utoipa::path(
    post,
    path = "/{id}/like",
    tag = POST_TAG,
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with the new like count", body = BlogPost),
        (status = 404, description = "Post not found or not published")
    )
)]
async fn like_post(
    State(state): State<AppState>,
    auth_user: Option<Extension<AuthUser>>,
    Path(id): Path<i32>,
) -> AppResult<Json<BlogPost>> {
    let liker = auth_user.map(|Extension(user)| user.actor());
    let post = state.services.posts.like(id, liker.as_ref()).await?;
    Ok(Json(post))
}
