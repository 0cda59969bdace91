//! Request and response bodies of the text-generation endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct KeywordsRequest {
    #[validate(length(min = 2, max = 200, message = "Topic must be between 2 and 200 characters"))]
    #[schema(example = "local SEO for dentists")]
    pub topic: String,
    #[validate(range(min = 1, max = 50, message = "Count must be between 1 and 50"))]
    #[schema(example = 10)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
    #[schema(example = "groq")]
    pub provider: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AudienceRequest {
    #[validate(length(min = 2, max = 200, message = "Topic must be between 2 and 200 characters"))]
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AudienceResponse {
    pub audience: String,
    pub provider: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BlogPostRequest {
    #[validate(length(min = 2, max = 200, message = "Topic must be between 2 and 200 characters"))]
    pub topic: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 keywords"))]
    pub keywords: Vec<String>,
    #[validate(length(max = 500, message = "Audience must be at most 500 characters"))]
    pub audience: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlogPostResponse {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub provider: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TagsRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagsResponse {
    pub tags: Vec<String>,
    pub provider: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct DailyPostRequest {
    /// Defaults to today's topic from the rotation
    #[validate(length(min = 2, max = 200, message = "Topic must be between 2 and 200 characters"))]
    pub topic: Option<String>,
}
