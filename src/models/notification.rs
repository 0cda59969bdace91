//! Notification models.
//!
//! `type` and `status` are stored as text columns and mapped onto the enums
//! below through manual `ToSql`/`FromSql` impls. The local [`Notification`]
//! shape is derived from a raw [`NotificationRow`]: the `status` column wins,
//! and a row without one reads as `read`/`unread` from `is_read`.

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;
use utoipa::ToSchema;

/// Generates the string mapping, `FromStr`, `Display` and text column
/// conversions for a fieldless enum.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Unrecognized {}: {}", $label, other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl diesel::query_builder::QueryId for $name {
            type QueryId = $name;
            const HAS_STATIC_QUERY_ID: bool = false;
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(serialize::IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(
                bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
            ) -> deserialize::Result<Self> {
                let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                s.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

// ============================================================================
// Enums
// ============================================================================

/// What a notification is about
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Comment,
    Reply,
    Like,
    CommentApproval,
    PostPublished,
    PostUpdated,
    PostEditRequest,
    Approval,
    Rejection,
    UserRegistered,
    Mention,
    AiGenerated,
    System,
}

text_enum!(NotificationType, "notification type", {
    Comment => "comment",
    Reply => "reply",
    Like => "like",
    CommentApproval => "comment_approval",
    PostPublished => "post_published",
    PostUpdated => "post_updated",
    PostEditRequest => "post_edit_request",
    Approval => "approval",
    Rejection => "rejection",
    UserRegistered => "user_registered",
    Mention => "mention",
    AiGenerated => "ai_generated",
    System => "system",
});

/// Lifecycle state of a notification.
///
/// Informational notices move `unread -> read`; requests move
/// `pending -> approved | rejected`. Nothing else is allowed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Approved,
    Rejected,
    Unread,
    Read,
}

text_enum!(NotificationStatus, "notification status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Unread => "unread",
    Read => "read",
});

impl NotificationStatus {
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (Unread, Read) | (Pending, Approved) | (Pending, Rejected)
        )
    }

    /// Value stored in the `is_read` column alongside this status
    pub fn is_read_flag(self) -> bool {
        !matches!(self, NotificationStatus::Unread | NotificationStatus::Pending)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NotificationStatus::Read | NotificationStatus::Approved | NotificationStatus::Rejected
        )
    }
}

/// Outcome of an approve/reject decision on a pending notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject { comment: Option<String> },
}

impl Decision {
    pub fn status(&self) -> NotificationStatus {
        match self {
            Decision::Approve => NotificationStatus::Approved,
            Decision::Reject { .. } => NotificationStatus::Rejected,
        }
    }

    pub fn response_type(&self) -> NotificationType {
        match self {
            Decision::Approve => NotificationType::Approval,
            Decision::Reject { .. } => NotificationType::Rejection,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Decision::Approve => None,
            Decision::Reject { comment } => comment.as_deref(),
        }
    }
}

// ============================================================================
// Row & Domain Models
// ============================================================================

/// Raw `notifications` row as stored
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: i64,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub status: Option<NotificationStatus>,
    pub is_read: bool,
    pub user_id: Option<i32>,
    pub from_user_id: Option<i32>,
    pub from_user_name: Option<String>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Notification as seen by clients and the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from_user_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<i32>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        let status = row.status.unwrap_or(if row.is_read {
            NotificationStatus::Read
        } else {
            NotificationStatus::Unread
        });

        Self {
            id: row.id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            created_at: row.created_at,
            status,
            from_user_id: row.from_user_id,
            from_user_name: row.from_user_name,
            target_id: row.target_id,
            target_type: row.target_type,
            comment: row.comment,
            user_id: row.user_id,
        }
    }
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }

    /// Whether the notification points at a comment awaiting moderation
    pub fn targets_comment(&self) -> Option<i32> {
        match (self.target_type.as_deref(), self.target_id.as_deref()) {
            (Some(TARGET_COMMENT), Some(id)) => id.parse().ok(),
            _ => None,
        }
    }
}

pub const TARGET_COMMENT: &str = "comment";
pub const TARGET_POST: &str = "post";

/// Insert model for the `notifications` table
#[derive(Debug, Insertable, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub status: Option<NotificationStatus>,
    pub is_read: bool,
    pub user_id: Option<i32>,
    pub from_user_id: Option<i32>,
    pub from_user_name: Option<String>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub comment: Option<String>,
}

impl NewNotification {
    /// A notification in the given status with `is_read` kept consistent
    pub fn new(
        kind: NotificationType,
        status: NotificationStatus,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            status: Some(status),
            is_read: status.is_read_flag(),
            user_id: None,
            from_user_id: None,
            from_user_name: None,
            target_id: None,
            target_type: None,
            comment: None,
        }
    }

    pub fn to_user(mut self, user_id: Option<i32>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn from_user(mut self, id: i32, name: impl Into<String>) -> Self {
        self.from_user_id = Some(id);
        self.from_user_name = Some(name.into());
        self
    }

    pub fn target(mut self, target_type: &str, target_id: impl ToString) -> Self {
        self.target_type = Some(target_type.to_string());
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// The status this row will read as once stored
    pub fn effective_status(&self) -> NotificationStatus {
        self.status.unwrap_or(if self.is_read {
            NotificationStatus::Read
        } else {
            NotificationStatus::Unread
        })
    }
}

/// Builds the notice sent back to the requester after a decision.
///
/// Returns `None` when the original has no `from_user_id` to address.
pub fn decision_notice(original: &Notification, decision: &Decision) -> Option<NewNotification> {
    let requester = original.from_user_id?;

    let (title, verb) = match decision {
        Decision::Approve => ("Request approved", "approved"),
        Decision::Reject { .. } => ("Request rejected", "rejected"),
    };
    let message = format!("Your request \"{}\" has been {}.", original.title, verb);

    let mut notice = NewNotification::new(
        decision.response_type(),
        NotificationStatus::Unread,
        title,
        message,
    )
    .to_user(Some(requester))
    .with_comment(decision.comment().map(str::to_string));

    if let (Some(target_type), Some(target_id)) = (&original.target_type, &original.target_id) {
        notice = notice.target(target_type, target_id);
    }

    Some(notice)
}
