//! Storage abstraction the notification feed runs against.
//!
//! Implemented by the database-backed [`NotificationService`] and by the
//! HTTP client of the REST API, [`ApiNotificationStore`].
//!
//! [`NotificationService`]: super::NotificationService
//! [`ApiNotificationStore`]: crate::external::ApiNotificationStore

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::models::{Decision, NewNotification, Notification};
use crate::repositories::Resolution;

/// Change event published after every successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationChange {
    Created { notification: Notification },
    Updated { notification: Notification },
    Deleted { id: i64, user_id: Option<i32> },
    /// Every unread row in the scope became read
    AllRead { user_id: Option<i32> },
}

impl NotificationChange {
    /// Whether a subscriber watching `scope` should see this event.
    ///
    /// The admin inbox (`None`) sees everything.
    pub fn concerns(&self, scope: Option<i32>) -> bool {
        let Some(uid) = scope else {
            return true;
        };
        match self {
            NotificationChange::Created { notification }
            | NotificationChange::Updated { notification } => notification.user_id == Some(uid),
            NotificationChange::Deleted { user_id, .. } => *user_id == Some(uid),
            NotificationChange::AllRead { user_id } => user_id.is_none() || *user_id == Some(uid),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotificationChange::Created { .. } => "created",
            NotificationChange::Updated { .. } => "updated",
            NotificationChange::Deleted { .. } => "deleted",
            NotificationChange::AllRead { .. } => "all_read",
        }
    }
}

/// Remote notification table, scoped by user id (`None` = admin inbox).
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Every notification in scope, newest first
    async fn fetch(&self, scope: Option<i32>) -> AppResult<Vec<Notification>>;

    async fn unread_count(&self, scope: Option<i32>) -> AppResult<i64>;

    async fn mark_read(&self, id: i64, scope: Option<i32>) -> AppResult<Notification>;

    async fn mark_all_read(&self, scope: Option<i32>) -> AppResult<usize>;

    /// Approve or reject a pending notification
    async fn resolve(&self, id: i64, decision: Decision) -> AppResult<Resolution>;

    async fn delete(&self, id: i64) -> AppResult<()>;

    async fn add(&self, notification: NewNotification) -> AppResult<Notification>;

    /// Real-time change events, for stores that can push them
    fn subscribe(&self) -> Option<broadcast::Receiver<NotificationChange>> {
        None
    }

    /// Store name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationStatus, NotificationType};
    use chrono::Utc;

    fn notification(user_id: Option<i32>) -> Notification {
        Notification {
            id: 1,
            kind: NotificationType::Like,
            title: "New like".to_string(),
            message: "Someone liked your post".to_string(),
            created_at: Utc::now(),
            status: NotificationStatus::Unread,
            from_user_id: None,
            from_user_name: None,
            target_id: None,
            target_type: None,
            comment: None,
            user_id,
        }
    }

    #[test]
    fn test_admin_scope_sees_everything() {
        let change = NotificationChange::Created {
            notification: notification(Some(4)),
        };
        assert!(change.concerns(None));
    }

    #[test]
    fn test_user_scope_filters_other_users() {
        let mine = NotificationChange::Updated {
            notification: notification(Some(4)),
        };
        let theirs = NotificationChange::Deleted {
            id: 3,
            user_id: Some(5),
        };
        assert!(mine.concerns(Some(4)));
        assert!(!theirs.concerns(Some(4)));
        assert!(NotificationChange::AllRead { user_id: None }.concerns(Some(4)));
    }

    #[test]
    fn test_event_tag() {
        let json = serde_json::to_value(NotificationChange::Deleted {
            id: 3,
            user_id: None,
        })
        .unwrap();
        assert_eq!(json["event"], "deleted");
        assert_eq!(json["id"], 3);
    }
}
