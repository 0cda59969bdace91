//! Comment DTOs.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::services::CommentDraft;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCommentRequest {
    /// Display name; ignored for signed-in users
    #[serde(default)]
    #[validate(length(max = 80, message = "Name must be at most 80 characters"))]
    #[schema(example = "Sam")]
    pub author_name: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Comment must be between 1 and 5000 characters"))]
    pub content: String,
    /// Comment being replied to
    #[serde(default)]
    pub parent_id: Option<i32>,
}

impl CreateCommentRequest {
    pub fn into_draft(self) -> CommentDraft {
        CommentDraft {
            author_name: self
                .author_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            content: self.content,
            parent_id: self.parent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_name_becomes_anonymous() {
        let request: CreateCommentRequest =
            serde_json::from_value(json!({ "author_name": "  ", "content": "Nice" })).unwrap();
        assert_eq!(request.into_draft().author_name, "Anonymous");
    }
}
