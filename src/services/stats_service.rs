use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::services::{CommentService, NotificationService, PostService, UserService};

/// Counters shown on the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SiteStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub users: i64,
    pub pending_comments: i64,
    /// Unread rows across every inbox
    pub unread_notifications: i64,
}

#[derive(Clone)]
pub struct StatsService {
    users: UserService,
    posts: PostService,
    comments: CommentService,
    notifications: NotificationService,
}

impl StatsService {
    pub fn new(
        users: UserService,
        posts: PostService,
        comments: CommentService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            notifications,
        }
    }

    pub async fn collect(&self) -> AppResult<SiteStats> {
        let ((total_posts, published_posts), users, pending_comments, unread_notifications) = tokio::try_join!(
            self.posts.counts(),
            self.users.count(),
            self.comments.pending_count(),
            self.notifications.unread_count(None),
        )?;

        Ok(SiteStats {
            total_posts,
            published_posts,
            users,
            pending_comments,
            unread_notifications,
        })
    }
}
