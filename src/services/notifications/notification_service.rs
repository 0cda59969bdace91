//! Database-backed notification service.
//!
//! Wraps [`NotificationRepository`] and publishes a [`NotificationChange`]
//! on a broadcast channel after every successful write. The SSE endpoint and
//! in-process feeds subscribe to that channel.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::store::{NotificationChange, NotificationStore};
use crate::error::{AppError, AppResult};
use crate::models::{Decision, NewNotification, Notification};
use crate::repositories::{NotificationRepository, Resolution};

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    changes: broadcast::Sender<NotificationChange>,
}

impl NotificationService {
    /// Creates the service with a change channel of `capacity` events.
    pub fn new(repo: NotificationRepository, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self { repo, changes }
    }

    /// Subscribes to change events. Slow receivers see `Lagged` and are
    /// expected to re-fetch.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: NotificationChange) {
        let event = change.name();
        // No receivers is fine
        let receivers = self.changes.send(change).unwrap_or(0);
        debug!(event, receivers, "Published notification change");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get(&self, id: i64) -> AppResult<Notification> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("notification", id))
    }

    /// One page of the scope, newest first, with the total row count
    pub async fn list_page(
        &self,
        scope: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Notification>, i64)> {
        self.repo.list_page(scope, offset, limit).await
    }

    pub async fn list_all(&self, scope: Option<i32>) -> AppResult<Vec<Notification>> {
        self.repo.list_all(scope).await
    }

    pub async fn unread_count(&self, scope: Option<i32>) -> AppResult<i64> {
        self.repo.unread_count(scope).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Stores a notification and announces it.
    pub async fn notify(&self, new: NewNotification) -> AppResult<Notification> {
        let created = self.repo.create(new).await?;
        self.announce_created(&created);
        Ok(created)
    }

    /// Announces a notification another repository wrote in its own
    /// transaction. Call after the commit.
    pub fn announce_created(&self, created: &Notification) {
        info!(
            notification_id = created.id,
            kind = %created.kind,
            user_id = ?created.user_id,
            "Notification created"
        );
        self.publish(NotificationChange::Created {
            notification: created.clone(),
        });
    }

    pub async fn mark_read(&self, id: i64, scope: Option<i32>) -> AppResult<Notification> {
        let updated = self.repo.mark_read(id, scope).await?;
        self.publish(NotificationChange::Updated {
            notification: updated.clone(),
        });
        Ok(updated)
    }

    pub async fn mark_all_read(&self, scope: Option<i32>) -> AppResult<usize> {
        let changed = self.repo.mark_all_read(scope).await?;
        if changed > 0 {
            self.publish(NotificationChange::AllRead { user_id: scope });
        }
        debug!(user_id = ?scope, changed, "Marked notifications as read");
        Ok(changed)
    }

    pub async fn approve(&self, id: i64) -> AppResult<Resolution> {
        self.resolve_decision(id, Decision::Approve).await
    }

    pub async fn reject(&self, id: i64, comment: Option<String>) -> AppResult<Resolution> {
        self.resolve_decision(id, Decision::Reject { comment }).await
    }

    async fn resolve_decision(&self, id: i64, decision: Decision) -> AppResult<Resolution> {
        let resolution = self.repo.resolve(id, decision).await?;

        info!(
            notification_id = id,
            status = %resolution.original.status,
            requester = ?resolution.original.from_user_id,
            moderated_comment = ?resolution.moderated_comment,
            "Notification resolved"
        );

        self.publish(NotificationChange::Updated {
            notification: resolution.original.clone(),
        });
        if let Some(response) = &resolution.response {
            self.publish(NotificationChange::Created {
                notification: response.clone(),
            });
        }
        Ok(resolution)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let existing = self.get(id).await?;
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found("notification", id));
        }
        info!(notification_id = id, "Notification deleted");
        self.publish(NotificationChange::Deleted {
            id,
            user_id: existing.user_id,
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for NotificationService {
    async fn fetch(&self, scope: Option<i32>) -> AppResult<Vec<Notification>> {
        self.list_all(scope).await
    }

    async fn unread_count(&self, scope: Option<i32>) -> AppResult<i64> {
        NotificationService::unread_count(self, scope).await
    }

    async fn mark_read(&self, id: i64, scope: Option<i32>) -> AppResult<Notification> {
        NotificationService::mark_read(self, id, scope).await
    }

    async fn mark_all_read(&self, scope: Option<i32>) -> AppResult<usize> {
        NotificationService::mark_all_read(self, scope).await
    }

    async fn resolve(&self, id: i64, decision: Decision) -> AppResult<Resolution> {
        self.resolve_decision(id, decision).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        NotificationService::delete(self, id).await
    }

    async fn add(&self, notification: NewNotification) -> AppResult<Notification> {
        self.notify(notification).await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<NotificationChange>> {
        Some(NotificationService::subscribe(self))
    }

    fn name(&self) -> &'static str {
        "database"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::lazy_pool;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let service = NotificationService::new(NotificationRepository::new(lazy_pool()), 8);
        let mut first = service.subscribe();
        let mut second = NotificationStore::subscribe(&service).unwrap();

        service.publish(NotificationChange::AllRead { user_id: Some(3) });

        assert_eq!(
            first.recv().await.unwrap(),
            NotificationChange::AllRead { user_id: Some(3) }
        );
        assert_eq!(second.recv().await.unwrap().name(), "all_read");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let service = NotificationService::new(NotificationRepository::new(lazy_pool()), 8);
        service.publish(NotificationChange::Deleted { id: 1, user_id: None });
        assert_eq!(service.changes.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let service = NotificationService::new(NotificationRepository::new(lazy_pool()), 2);
        let mut rx = service.subscribe();
        for id in 0..5 {
            service.publish(NotificationChange::Deleted { id, user_id: None });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
    }
}
