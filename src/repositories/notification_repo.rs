//! Notification repository.
//!
//! Every query takes a scope: `Some(user_id)` narrows to the rows addressed
//! to that user, `None` covers the whole admin inbox.

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Nullable};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::AppError;
use crate::models::{
    CommentStatus, Decision, NewNotification, Notification, NotificationRow, NotificationStatus,
    decision_notice,
};
use crate::schema::notifications;

type RowPredicate =
    Box<dyn BoxableExpression<notifications::table, Pg, SqlType = Nullable<Bool>>>;

/// Rows that read as `unread`: explicit status, or no status and not read
fn unread() -> RowPredicate {
    use crate::schema::notifications::dsl::*;
    Box::new(
        status
            .eq(NotificationStatus::Unread)
            .or(status.is_null().and(is_read.eq(false)).nullable()),
    )
}

fn in_scope(scope: Option<i32>) -> RowPredicate {
    match scope {
        Some(uid) => Box::new(notifications::user_id.eq(uid)),
        None => Box::new(diesel::dsl::sql::<Nullable<Bool>>("TRUE")),
    }
}

fn scoped(scope: Option<i32>) -> notifications::BoxedQuery<'static, Pg> {
    notifications::table.into_boxed().filter(in_scope(scope))
}

/// Result of an approve/reject decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// The original notification in its new state
    pub original: Notification,
    /// Notice sent back to the requester, when there was one to address
    pub response: Option<Notification>,
    /// Id of the comment whose moderation status followed the decision
    pub moderated_comment: Option<i32>,
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: AsyncDbPool,
}

impl NotificationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewNotification) -> Result<Notification, AppError> {
        let mut conn = get_connection(&self.pool).await?;
        Self::insert(&mut conn, &new).await
    }

    pub async fn find_by_id(&self, notification_id: i64) -> Result<Option<Notification>, AppError> {
        let mut conn = get_connection(&self.pool).await?;
        Self::find(&mut conn, notification_id).await
    }

    /// Every row in scope, newest first.
    pub async fn list_all(&self, scope: Option<i32>) -> Result<Vec<Notification>, AppError> {
        use crate::schema::notifications::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let rows = scoped(scope)
            .order((created_at.desc(), id.desc()))
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// One page of rows in scope, newest first, with the total count.
    pub async fn list_page(
        &self,
        scope: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        use crate::schema::notifications::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let total = scoped(scope).count().get_result::<i64>(&mut conn).await?;
        let rows = scoped(scope)
            .order((created_at.desc(), id.desc()))
            .offset(offset)
            .limit(limit)
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await?;

        Ok((rows.into_iter().map(Notification::from).collect(), total))
    }

    /// Server-side unread count.
    pub async fn unread_count(&self, scope: Option<i32>) -> Result<i64, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        scoped(scope)
            .filter(unread())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Moves one notification `unread -> read`.
    ///
    /// # Errors
    /// `NotFound` if the row is missing or outside the scope, `Conflict` if
    /// it is not unread
    pub async fn mark_read(
        &self,
        notification_id: i64,
        scope: Option<i32>,
    ) -> Result<Notification, AppError> {
        use crate::schema::notifications::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let updated = diesel::update(
            notifications
                .filter(id.eq(notification_id))
                .filter(in_scope(scope))
                .filter(unread()),
        )
        .set((status.eq(NotificationStatus::Read), is_read.eq(true)))
        .returning(NotificationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

        if let Some(row) = updated {
            return Ok(row.into());
        }

        let current = Self::find(&mut conn, notification_id)
            .await?
            .filter(|n| scope.is_none() || n.user_id == scope)
            .ok_or_else(|| AppError::not_found("notification", notification_id))?;
        Err(Self::transition_conflict(&current, NotificationStatus::Read))
    }

    /// Marks every unread row in scope as read.
    ///
    /// # Returns
    /// The number of rows changed
    pub async fn mark_all_read(&self, scope: Option<i32>) -> Result<usize, AppError> {
        use crate::schema::notifications::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        let affected = diesel::update(notifications.filter(in_scope(scope)).filter(unread()))
            .set((status.eq(NotificationStatus::Read), is_read.eq(true)))
            .execute(&mut conn)
            .await?;

        Ok(affected)
    }

    /// Applies an approve/reject decision in one transaction.
    ///
    /// The original only changes if it is still `pending`; the requester
    /// notice and the comment moderation are written in the same
    /// transaction, so a failure leaves the original pending.
    ///
    /// # Errors
    /// `NotFound` for a missing id, `Conflict` when the notification was
    /// already resolved
    pub async fn resolve(
        &self,
        notification_id: i64,
        decision: Decision,
    ) -> Result<Resolution, AppError> {
        let mut conn = get_connection(&self.pool).await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                use crate::schema::notifications::dsl::*;

                let claimed = diesel::update(
                    notifications
                        .filter(id.eq(notification_id))
                        .filter(status.eq(NotificationStatus::Pending)),
                )
                .set((status.eq(decision.status()), is_read.eq(true)))
                .returning(NotificationRow::as_returning())
                .get_result(conn)
                .await
                .optional()?;

                let original: Notification = match claimed {
                    Some(row) => row.into(),
                    None => {
                        let current = Self::find(conn, notification_id)
                            .await?
                            .ok_or_else(|| AppError::not_found("notification", notification_id))?;
                        return Err(Self::transition_conflict(&current, decision.status()));
                    }
                };

                let response = match decision_notice(&original, &decision) {
                    Some(notice) => Some(Self::insert(conn, &notice).await?),
                    None => None,
                };

                let moderated_comment = match original.targets_comment() {
                    Some(comment_id) => {
                        use crate::schema::comments;
                        diesel::update(comments::table.find(comment_id))
                            .set(comments::status.eq(CommentStatus::from(&decision)))
                            .execute(conn)
                            .await?;
                        Some(comment_id)
                    }
                    None => None,
                };

                Ok(Resolution {
                    original,
                    response,
                    moderated_comment,
                })
            }
            .scope_boxed()
        })
        .await
    }

    /// Hard delete, returns the number of affected rows (0 or 1)
    pub async fn delete(&self, notification_id: i64) -> Result<usize, AppError> {
        use crate::schema::notifications::dsl::*;
        let mut conn = get_connection(&self.pool).await?;

        diesel::delete(notifications.filter(id.eq(notification_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Inserts on a caller's connection, so it can join their transaction.
    pub(crate) async fn insert(
        conn: &mut AsyncPgConnection,
        new: &NewNotification,
    ) -> Result<Notification, AppError> {
        diesel::insert_into(notifications::table)
            .values(new)
            .returning(NotificationRow::as_returning())
            .get_result(conn)
            .await
            .map(Notification::from)
            .map_err(AppError::from)
    }

    async fn find(
        conn: &mut AsyncPgConnection,
        notification_id: i64,
    ) -> Result<Option<Notification>, AppError> {
        notifications::table
            .find(notification_id)
            .select(NotificationRow::as_select())
            .first(conn)
            .await
            .optional()
            .map(|row| row.map(Notification::from))
            .map_err(AppError::from)
    }

    fn transition_conflict(current: &Notification, wanted: NotificationStatus) -> AppError {
        AppError::Conflict {
            message: format!(
                "notification {} is {}, cannot become {}",
                current.id, current.status, wanted
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{
        REFUSED_MARKER, create_published_post, create_user, test_pool, unique,
    };
    use crate::models::{NewComment, NotificationType, User};
    use crate::repositories::CommentRepository;

    async fn pending_request(repo: &NotificationRepository, requester: &User) -> Notification {
        repo.create(
            NewNotification::new(
                NotificationType::PostEditRequest,
                NotificationStatus::Pending,
                unique("Edit request"),
                "Please review my changes",
            )
            .from_user(requester.id, requester.username.clone()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_resolve_conflicts_and_one_notice_is_sent() {
        let Some(pool) = test_pool().await else { return };
        let repo = NotificationRepository::new(pool.clone());
        let requester = create_user(&pool).await;
        let request = pending_request(&repo, &requester).await;

        let (approved, rejected) = tokio::join!(
            repo.resolve(request.id, Decision::Approve),
            repo.resolve(request.id, Decision::Reject { comment: None }),
        );

        let (winner, loser) = match (approved, rejected) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            other => panic!("expected exactly one resolve to succeed: {:?}", other),
        };
        assert!(matches!(loser, AppError::Conflict { .. }));
        assert!(winner.original.status.is_terminal());
        assert!(winner.original.is_read);

        let again = repo.resolve(request.id, Decision::Approve).await;
        assert!(matches!(again, Err(AppError::Conflict { .. })));

        let notices = repo.list_all(Some(requester.id)).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(Some(&notices[0]), winner.response.as_ref());
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_is_not_found() {
        let Some(pool) = test_pool().await else { return };
        let repo = NotificationRepository::new(pool);

        let result = repo.resolve(i64::MAX, Decision::Approve).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_notice_leaves_request_and_comment_pending() {
        let Some(pool) = test_pool().await else { return };
        let repo = NotificationRepository::new(pool.clone());
        let comments = CommentRepository::new(pool.clone());
        let requester = create_user(&pool).await;
        let post = create_published_post(&pool).await;

        let (comment, request) = comments
            .create_with_notification(
                NewComment {
                    post_id: post.id,
                    user_id: Some(requester.id),
                    author_name: requester.username.clone(),
                    content: "Great read".to_string(),
                    parent_id: None,
                    status: CommentStatus::Pending,
                },
                {
                    let requester = requester.clone();
                    move |comment| {
                        NewNotification::new(
                            NotificationType::Comment,
                            NotificationStatus::Pending,
                            "New comment",
                            "Great read",
                        )
                        .target(crate::models::TARGET_COMMENT, comment.id)
                        .from_user(requester.id, requester.username.clone())
                    }
                },
            )
            .await
            .unwrap();

        let result = repo
            .resolve(
                request.id,
                Decision::Reject {
                    comment: Some(REFUSED_MARKER.to_string()),
                },
            )
            .await;
        assert!(result.is_err());

        let stored = repo.find_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::Pending);
        assert!(!stored.is_read);
        let stored_comment = comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored_comment.status, CommentStatus::Pending);
        assert!(repo.list_all(Some(requester.id)).await.unwrap().is_empty());

        let resolution = repo.resolve(request.id, Decision::Approve).await.unwrap();
        assert_eq!(resolution.moderated_comment, Some(comment.id));
        let stored_comment = comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored_comment.status, CommentStatus::Approved);
    }
}
