//! Notification DTOs, shared by the REST handlers and `ApiNotificationStore`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::{PaginationMeta, PaginationParams};
use crate::models::{NewNotification, Notification, NotificationStatus, NotificationType};

/// Query for `GET /api/notifications`
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams, Validate)]
pub struct NotificationQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub page_size: u32,

    /// Admins only: narrow the inbox to one user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl NotificationQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

/// Optional inbox selector for the count, read-all and stream endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
pub struct ScopeQuery {
    /// Admins only: restrict to one user's inbox
    #[serde(default)]
    pub user_id: Option<i32>,
}

/// One page of notifications plus the unread count of the whole scope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<Notification>,
    pub pagination: PaginationMeta,
    #[schema(example = 3)]
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    #[schema(example = 3)]
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    /// Rows that moved from unread to read
    #[schema(example = 5)]
    pub updated: usize,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct RejectRequest {
    /// Reason passed on to the requester
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of `POST /api/notifications`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub message: String,
    /// Defaults to `unread`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NotificationStatus>,
    /// Recipient; absent for the admin inbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CreateNotificationRequest {
    pub fn into_new_notification(self) -> NewNotification {
        let status = self.status.unwrap_or(NotificationStatus::Unread);
        NewNotification {
            user_id: self.user_id,
            from_user_id: self.from_user_id,
            from_user_name: self.from_user_name,
            target_id: self.target_id,
            target_type: self.target_type,
            comment: self.comment,
            ..NewNotification::new(self.kind, status, self.title, self.message)
        }
    }
}

impl From<&NewNotification> for CreateNotificationRequest {
    fn from(new: &NewNotification) -> Self {
        Self {
            kind: new.kind,
            title: new.title.clone(),
            message: new.message.clone(),
            status: Some(new.effective_status()),
            user_id: new.user_id,
            from_user_id: new.from_user_id,
            from_user_name: new.from_user_name.clone(),
            target_type: new.target_type.clone(),
            target_id: new.target_id.clone(),
            comment: new.comment.clone(),
        }
    }
}
