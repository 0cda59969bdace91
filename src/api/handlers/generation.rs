//! LLM-backed generation endpoints.
//!
//! Every route needs a signed-in caller; the daily post trigger is
//! admin-only. Responses name the provider that answered.

use axum::{Extension, Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::GENERATION_TAG;
use crate::api::dto::{
    AudienceRequest, AudienceResponse, BlogPostRequest, BlogPostResponse, DailyPostRequest,
    ErrorResponse, KeywordsRequest, KeywordsResponse, TagsRequest, TagsResponse,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::BlogPost;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

pub fn generation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(generate_keywords))
        .routes(routes!(generate_audience))
        .routes(routes!(generate_blog_post))
        .routes(routes!(generate_tags))
        .routes(routes!(generate_daily_post))
}

/// POST /api/generate-keywords
#[utoipa::path(
    post,
    path = "/generate-keywords",
    tag = GENERATION_TAG,
    request_body = KeywordsRequest,
    responses(
        (status = 200, description = "SEO keywords", body = KeywordsResponse),
        (status = 502, description = "No LLM provider answered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn generate_keywords(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<KeywordsRequest>,
) -> AppResult<Json<KeywordsResponse>> {
    let generated = state
        .services
        .content
        .keywords(&payload.topic, payload.count)
        .await?;
    Ok(Json(KeywordsResponse {
        keywords: generated.value,
        provider: generated.provider.to_string(),
    }))
}

/// POST /api/generate-audience
#[utoipa::path(
    post,
    path = "/generate-audience",
    tag = GENERATION_TAG,
    request_body = AudienceRequest,
    responses(
        (status = 200, description = "One-line audience description", body = AudienceResponse),
        (status = 502, description = "No LLM provider answered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn generate_audience(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AudienceRequest>,
) -> AppResult<Json<AudienceResponse>> {
    let generated = state.services.content.audience(&payload.topic).await?;
    Ok(Json(AudienceResponse {
        audience: generated.value,
        provider: generated.provider.to_string(),
    }))
}

/// POST /api/generate-blog-post
#[utoipa::path(
    post,
    path = "/generate-blog-post",
    tag = GENERATION_TAG,
    request_body = BlogPostRequest,
    responses(
        (status = 200, description = "Generated post, not stored", body = BlogPostResponse),
        (status = 502, description = "No LLM provider answered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn generate_blog_post(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<BlogPostRequest>,
) -> AppResult<Json<BlogPostResponse>> {
    let generated = state
        .services
        .content
        .blog_post(&payload.topic, &payload.keywords, payload.audience.as_deref())
        .await?;

    let post = generated.value;
    Ok(Json(BlogPostResponse {
        title: post.title,
        excerpt: post.excerpt,
        content: post.content,
        tags: post.tags,
        provider: generated.provider.to_string(),
    }))
}

/// POST /api/generate-tags
#[utoipa::path(
    post,
    path = "/generate-tags",
    tag = GENERATION_TAG,
    request_body = TagsRequest,
    responses(
        (status = 200, description = "Suggested tags", body = TagsResponse),
        (status = 502, description = "No LLM provider answered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn generate_tags(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TagsRequest>,
) -> AppResult<Json<TagsResponse>> {
    let generated = state
        .services
        .content
        .tags(&payload.title, &payload.content)
        .await?;
    Ok(Json(TagsResponse {
        tags: generated.value,
        provider: generated.provider.to_string(),
    }))
}

/// POST /api/cron-generate-daily-post - Draft today's post now (admin)
///
/// Same work as the scheduled job; without a topic the configured
/// rotation picks one.
#[utoipa::path(
    post,
    path = "/cron-generate-daily-post",
    tag = GENERATION_TAG,
    request_body = DailyPostRequest,
    responses(
        (status = 201, description = "Draft post created", body = BlogPost),
        (status = 400, description = "No topic available", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 502, description = "No LLM provider answered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn generate_daily_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<DailyPostRequest>,
) -> AppResult<(StatusCode, Json<BlogPost>)> {
    auth_user.require_admin()?;

    let post = state
        .services
        .content
        .daily_post(payload.topic, &state.settings.site.daily_topics)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}
