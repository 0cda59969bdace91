//! Blog post DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::PaginationParams;
use crate::models::{PostStatus, UpdateBlogPost};
use crate::services::PostDraft;

#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
pub struct PostListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub page_size: u32,

    /// Admin listing only; the public listing is always `published`
    #[serde(default)]
    pub status: Option<PostStatus>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl PostListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[schema(example = "Ten local SEO wins")]
    pub title: String,
    /// Derived from the title when omitted
    #[validate(length(max = 200, message = "Slug must be at most 200 characters"))]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: String,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub publish: bool,
}

impl CreatePostRequest {
    pub fn into_draft(self) -> PostDraft {
        PostDraft {
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            tags: self.tags,
            publish: self.publish,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Slug must be between 1 and 200 characters"))]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    pub fn into_update(self) -> UpdateBlogPost {
        UpdateBlogPost {
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            tags: self.tags,
            ..Default::default()
        }
    }
}
