//! Comment submission and moderation queue.
//!
//! New comments start `pending` and raise a pending notification in the
//! admin inbox, written in the same transaction; approving or rejecting
//! that notification moderates the comment (see
//! `NotificationRepository::resolve`).

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    BlogPost, Comment, CommentStatus, NewComment, NewNotification, NotificationStatus,
    NotificationType, TARGET_COMMENT,
};
use crate::repositories::{CommentRepository, PostRepository};
use crate::services::NotificationService;
use crate::services::post_service::Actor;

/// Characters of the comment quoted in the notification message
const SNIPPET_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub author_name: String,
    pub content: String,
    pub parent_id: Option<i32>,
}

#[derive(Clone)]
pub struct CommentService {
    repo: CommentRepository,
    posts: PostRepository,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(
        repo: CommentRepository,
        posts: PostRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            repo,
            posts,
            notifications,
        }
    }

    /// Approved comments of a published post, oldest first.
    pub async fn list_approved(&self, post_id: i32) -> AppResult<Vec<Comment>> {
        self.published_post(post_id).await?;
        self.repo
            .list_for_post(post_id, CommentStatus::Approved)
            .await
    }

    /// Stores a comment or reply for moderation.
    pub async fn submit(
        &self,
        post_id: i32,
        draft: CommentDraft,
        actor: Option<&Actor>,
    ) -> AppResult<Comment> {
        let post = self.published_post(post_id).await?;

        if let Some(parent_id) = draft.parent_id {
            let parent = self
                .repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("comment", parent_id))?;
            if parent.post_id != post_id {
                return Err(AppError::Validation {
                    field: "parent_id".to_string(),
                    reason: "parent comment belongs to another post".to_string(),
                });
            }
        }

        let author_name = actor
            .map(|a| a.name.clone())
            .unwrap_or_else(|| draft.author_name.trim().to_string());

        let (comment, notification) = self
            .repo
            .create_with_notification(
                NewComment {
                    post_id,
                    user_id: actor.map(|a| a.id),
                    author_name,
                    content: draft.content,
                    parent_id: draft.parent_id,
                    status: CommentStatus::Pending,
                },
                move |comment| moderation_request(&post, comment),
            )
            .await?;

        info!(
            comment_id = comment.id,
            notification_id = notification.id,
            post_id,
            reply = comment.parent_id.is_some(),
            "Comment submitted for moderation"
        );
        self.notifications.announce_created(&notification);

        Ok(comment)
    }

    pub async fn pending_count(&self) -> AppResult<i64> {
        self.repo.count_with_status(CommentStatus::Pending).await
    }

    async fn published_post(&self, post_id: i32) -> AppResult<BlogPost> {
        self.posts
            .find_by_id(post_id)
            .await?
            .filter(BlogPost::is_published)
            .ok_or_else(|| AppError::not_found("blog_post", post_id))
    }
}

/// The pending admin-inbox notification raised for a new comment
fn moderation_request(post: &BlogPost, comment: &Comment) -> NewNotification {
    let (kind, title, verb) = match comment.parent_id {
        Some(_) => (NotificationType::Reply, "New reply", "replied on"),
        None => (NotificationType::Comment, "New comment", "commented on"),
    };

    let mut notice = NewNotification::new(
        kind,
        NotificationStatus::Pending,
        title,
        format!(
            "{} {} \"{}\": {}",
            comment.author_name,
            verb,
            post.title,
            snippet(&comment.content)
        ),
    )
    .target(TARGET_COMMENT, comment.id);

    notice = match comment.user_id {
        Some(uid) => notice.from_user(uid, comment.author_name.clone()),
        None => NewNotification {
            from_user_name: Some(comment.author_name.clone()),
            ..notice
        },
    };
    notice
}

fn snippet(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;
    use chrono::Utc;

    fn post() -> BlogPost {
        BlogPost {
            id: 3,
            title: "Local SEO".to_string(),
            slug: "local-seo".to_string(),
            excerpt: String::new(),
            content: String::new(),
            tags: Vec::new(),
            status: PostStatus::Published,
            author_id: Some(1),
            likes: 0,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(user_id: Option<i32>, parent_id: Option<i32>, content: &str) -> Comment {
        Comment {
            id: 11,
            post_id: 3,
            user_id,
            author_name: "Robin".to_string(),
            content: content.to_string(),
            parent_id,
            status: CommentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_comment_request_targets_the_comment() {
        let notice = moderation_request(&post(), &comment(Some(5), None, "Great read"));

        assert_eq!(notice.kind, NotificationType::Comment);
        assert_eq!(notice.effective_status(), NotificationStatus::Pending);
        assert!(!notice.is_read);
        assert_eq!(notice.user_id, None);
        assert_eq!(notice.from_user_id, Some(5));
        assert_eq!(notice.from_user_name.as_deref(), Some("Robin"));
        assert_eq!(notice.target_type.as_deref(), Some("comment"));
        assert_eq!(notice.target_id.as_deref(), Some("11"));
        assert_eq!(notice.message, "Robin commented on \"Local SEO\": Great read");
    }

    #[test]
    fn test_anonymous_reply() {
        let notice = moderation_request(&post(), &comment(None, Some(2), "Agreed"));

        assert_eq!(notice.kind, NotificationType::Reply);
        assert_eq!(notice.title, "New reply");
        assert_eq!(notice.from_user_id, None);
        assert_eq!(notice.from_user_name.as_deref(), Some("Robin"));
    }

    fn service_over(pool: &crate::db::AsyncDbPool) -> CommentService {
        use crate::repositories::NotificationRepository;
        CommentService::new(
            CommentRepository::new(pool.clone()),
            PostRepository::new(pool.clone()),
            NotificationService::new(NotificationRepository::new(pool.clone()), 16),
        )
    }

    fn draft(author_name: &str) -> CommentDraft {
        CommentDraft {
            author_name: author_name.to_string(),
            content: "Great read".to_string(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn test_submit_stores_comment_and_request_together() {
        use crate::db::testing::{create_published_post, test_pool};
        use crate::services::notifications::NotificationChange;

        let Some(pool) = test_pool().await else { return };
        let post = create_published_post(&pool).await;
        let service = service_over(&pool);
        let mut changes = service.notifications.subscribe();

        let comment = service.submit(post.id, draft("Robin"), None).await.unwrap();

        assert_eq!(comment.status, CommentStatus::Pending);
        let NotificationChange::Created { notification } = changes.try_recv().unwrap() else {
            panic!("expected a created event");
        };
        assert_eq!(notification.status, NotificationStatus::Pending);
        assert_eq!(notification.targets_comment(), Some(comment.id));

        let stored = service.notifications.get(notification.id).await.unwrap();
        assert_eq!(stored, notification);
    }

    #[tokio::test]
    async fn test_failed_request_insert_drops_the_comment() {
        use crate::db::testing::{REFUSED_MARKER, create_published_post, test_pool};

        let Some(pool) = test_pool().await else { return };
        let post = create_published_post(&pool).await;
        let service = service_over(&pool);
        let mut changes = service.notifications.subscribe();

        let result = service.submit(post.id, draft(REFUSED_MARKER), None).await;

        assert!(result.is_err());
        assert!(changes.try_recv().is_err());
        let pending = service
            .repo
            .list_for_post(post.id, CommentStatus::Pending)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_long_comment_is_shortened() {
        let long = "word ".repeat(40);
        let short = snippet(&long);
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= SNIPPET_CHARS + 3);
    }
}
