//! Blog post service: drafting, publishing, likes.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    BlogPost, NewBlogPost, NewNotification, NotificationStatus, NotificationType, PostStatus,
    TARGET_POST, UpdateBlogPost, slugify,
};
use crate::repositories::PostRepository;
use crate::services::NotificationService;

/// Attempts at `<slug>-2`, `<slug>-3`, ... before giving up
const MAX_SLUG_SUFFIX: u32 = 50;

/// Input for a new post
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub publish: bool,
}

/// Who triggered an action, for notification attribution
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: i32,
    pub name: String,
}

#[derive(Clone)]
pub struct PostService {
    repo: PostRepository,
    notifications: NotificationService,
}

impl PostService {
    pub fn new(repo: PostRepository, notifications: NotificationService) -> Self {
        Self {
            repo,
            notifications,
        }
    }

    pub async fn get(&self, id: i32) -> AppResult<BlogPost> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("blog_post", id))
    }

    /// Public lookup; drafts are reported as missing.
    pub async fn get_published(&self, slug: &str) -> AppResult<BlogPost> {
        self.repo
            .find_by_slug(slug)
            .await?
            .filter(BlogPost::is_published)
            .ok_or_else(|| AppError::NotFound {
                entity: "blog_post".to_string(),
                field: "slug".to_string(),
                value: slug.to_string(),
            })
    }

    pub async fn list(
        &self,
        status: Option<PostStatus>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BlogPost>, i64)> {
        self.repo.list(status, offset, limit).await
    }

    pub async fn create(&self, draft: PostDraft, author: Option<&Actor>) -> AppResult<BlogPost> {
        let base = draft
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&draft.title));
        let slug = self.unique_slug(&base).await?;

        let (status, published_at) = if draft.publish {
            (PostStatus::Published, Some(Utc::now()))
        } else {
            (PostStatus::Draft, None)
        };

        let post = self
            .repo
            .create(NewBlogPost {
                title: draft.title,
                slug,
                excerpt: draft.excerpt,
                content: draft.content,
                tags: normalize_tags(draft.tags),
                status,
                author_id: author.map(|a| a.id),
                published_at,
            })
            .await?;

        info!(post_id = post.id, slug = %post.slug, status = ?post.status, "Post created");
        if post.is_published() {
            self.announce_published(&post, author).await;
        }
        Ok(post)
    }

    pub async fn update(&self, id: i32, mut changes: UpdateBlogPost) -> AppResult<BlogPost> {
        let current = self.get(id).await?;

        if let Some(wanted) = changes.slug.take() {
            let wanted = slugify(&wanted);
            if wanted.is_empty() {
                return Err(AppError::Validation {
                    field: "slug".to_string(),
                    reason: "slug must contain at least one letter or digit".to_string(),
                });
            }
            if wanted != current.slug {
                changes.slug = Some(self.unique_slug(&wanted).await?);
            }
        }
        if let Some(tags) = changes.tags.take() {
            changes.tags = Some(normalize_tags(tags));
        }

        let post = self.repo.update(id, changes).await?;
        info!(post_id = id, "Post updated");
        Ok(post)
    }

    /// Publishes a draft and notifies the admin inbox.
    ///
    /// # Errors
    /// `Conflict` when the post is already published
    pub async fn publish(&self, id: i32, actor: Option<&Actor>) -> AppResult<BlogPost> {
        let current = self.get(id).await?;
        if current.is_published() {
            return Err(AppError::Conflict {
                message: format!("post {} is already published", id),
            });
        }

        let post = self
            .repo
            .update(
                id,
                UpdateBlogPost {
                    status: Some(PostStatus::Published),
                    published_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;

        info!(post_id = id, slug = %post.slug, "Post published");
        self.announce_published(&post, actor).await;
        Ok(post)
    }

    /// Increments the like counter and tells the author.
    pub async fn like(&self, id: i32, liker: Option<&Actor>) -> AppResult<BlogPost> {
        if !self.get(id).await?.is_published() {
            return Err(AppError::not_found("blog_post", id));
        }
        let post = self
            .repo
            .increment_likes(id)
            .await?
            .ok_or_else(|| AppError::not_found("blog_post", id))?;

        if let Some(author) = post.author_id {
            let who = liker.map(|a| a.name.as_str()).unwrap_or("Someone");
            let mut notice = NewNotification::new(
                NotificationType::Like,
                NotificationStatus::Unread,
                "New like",
                format!("{} liked your post \"{}\".", who, post.title),
            )
            .to_user(Some(author))
            .target(TARGET_POST, post.id);
            if let Some(actor) = liker {
                notice = notice.from_user(actor.id, actor.name.clone());
            }

            if let Err(err) = self.notifications.notify(notice).await {
                warn!(post_id = id, error = %err, "Failed to notify author about like");
            }
        }

        Ok(post)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found("blog_post", id));
        }
        info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// `(total, published)` post counts
    pub async fn counts(&self) -> AppResult<(i64, i64)> {
        self.repo.counts().await
    }

    async fn announce_published(&self, post: &BlogPost, actor: Option<&Actor>) {
        let mut notice = NewNotification::new(
            NotificationType::PostPublished,
            NotificationStatus::Unread,
            "Post published",
            format!("\"{}\" is now live.", post.title),
        )
        .target(TARGET_POST, post.id);
        if let Some(actor) = actor {
            notice = notice.from_user(actor.id, actor.name.clone());
        }

        if let Err(err) = self.notifications.notify(notice).await {
            warn!(post_id = post.id, error = %err, "Failed to announce published post");
        }
    }

    async fn unique_slug(&self, base: &str) -> AppResult<String> {
        let base = if base.is_empty() { "post" } else { base };
        if !self.repo.slug_exists(base).await? {
            return Ok(base.to_string());
        }
        for suffix in 2..=MAX_SLUG_SUFFIX {
            let candidate = format!("{}-{}", base, suffix);
            if !self.repo.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Duplicate {
            entity: "blog_post".to_string(),
            field: "slug".to_string(),
            value: base.to_string(),
        })
    }
}

/// Trims, lowercases and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " SEO ".to_string(),
            "#marketing".to_string(),
            "seo".to_string(),
            "".to_string(),
            "Content Strategy".to_string(),
        ];
        assert_eq!(
            normalize_tags(tags),
            vec!["seo", "marketing", "content strategy"]
        );
    }
}
