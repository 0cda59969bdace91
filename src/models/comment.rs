use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Decision;

/// Moderation state of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, ToSchema, Default)]
#[db_enum(existing_type_path = "crate::schema::sql_types::CommentStatus")]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl From<&Decision> for CommentStatus {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Approve => CommentStatus::Approved,
            Decision::Reject { .. } => CommentStatus::Rejected,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: Option<i32>,
    pub author_name: String,
    pub content: String,
    /// Set for replies
    pub parent_id: Option<i32>,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub post_id: i32,
    pub user_id: Option<i32>,
    pub author_name: String,
    pub content: String,
    pub parent_id: Option<i32>,
    pub status: CommentStatus,
}
