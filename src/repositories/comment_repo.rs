//! Comment repository.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::NotificationRepository;
use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{Comment, CommentStatus, NewComment, NewNotification, Notification};

#[derive(Clone)]
pub struct CommentRepository {
    pool: AsyncDbPool,
}

impl CommentRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Inserts a comment and the notification built from it in one
    /// transaction; neither row exists without the other.
    pub async fn create_with_notification<F>(
        &self,
        new_comment: NewComment,
        notification_for: F,
    ) -> Result<(Comment, Notification), AppError>
    where
        F: FnOnce(&Comment) -> NewNotification + Send + 'static,
    {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                use crate::schema::comments::dsl::*;

                let comment = diesel::insert_into(comments)
                    .values(&new_comment)
                    .returning(Comment::as_returning())
                    .get_result(conn)
                    .await?;
                let notification =
                    NotificationRepository::insert(conn, &notification_for(&comment)).await?;
                Ok((comment, notification))
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn find_by_id(&self, comment_id: i32) -> Result<Option<Comment>, AppError> {
        use crate::schema::comments::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        comments
            .find(comment_id)
            .select(Comment::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Comments of a post in one moderation state, oldest first so that
    /// threads read top to bottom.
    pub async fn list_for_post(
        &self,
        for_post: i32,
        wanted: CommentStatus,
    ) -> Result<Vec<Comment>, AppError> {
        use crate::schema::comments::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        comments
            .filter(post_id.eq(for_post))
            .filter(status.eq(wanted))
            .order(created_at.asc())
            .select(Comment::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn count_with_status(&self, wanted: CommentStatus) -> Result<i64, AppError> {
        use crate::schema::comments::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        comments
            .filter(status.eq(wanted))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
