use regex::Regex;
use std::sync::LazyLock;

/// Tables owned by this service, longest first so that prefixes such as
/// `blog_posts` win over a naive split at the first underscore.
const KNOWN_TABLES: &[&str] = &["notifications", "blog_posts", "comments", "users"];

/// Matches `Key (field)=(value)` in PostgreSQL DETAIL lines
static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid regex"));
static COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"column "([^"]+)""#).expect("valid regex"));
static RELATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:table|relation) "([^"]+)""#).expect("valid regex"));

/// Extracts entity/field/value triples from PostgreSQL constraint messages.
pub struct ConstraintParser;

impl ConstraintParser {
    /// Parses a unique violation such as `blog_posts_slug_key`.
    ///
    /// # Returns
    /// `(entity, field, value)` when the constraint or message can be read
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let value = Self::extract_key_value(message).map(|(_, v)| v);

        if let Some((entity, field)) = constraint_name.and_then(Self::split_constraint) {
            return Some((entity, field, value.unwrap_or_else(|| "duplicate_value".into())));
        }

        let (field, value) = Self::extract_key_value(message)?;
        let entity = Self::extract_relation(message).unwrap_or_else(|| "resource".into());
        Some((entity, field, value))
    }

    /// Parses a not-null violation into `(entity, field)`.
    pub fn parse_not_null_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = COLUMN.captures(message)?.get(1)?.as_str().to_string();
        let entity = Self::extract_relation(message)
            .or_else(|| constraint_name.and_then(Self::split_constraint).map(|(e, _)| e))
            .unwrap_or_else(|| "resource".into());
        Some((entity, field))
    }

    /// Parses a foreign key violation such as `comments_post_id_fkey`.
    ///
    /// # Returns
    /// `(entity, field, referenced_value)`
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        if let Some((entity, field)) = constraint_name.and_then(Self::split_constraint) {
            let value = Self::extract_key_value(message)
                .map(|(_, v)| v)
                .unwrap_or_else(|| "invalid_reference".into());
            return Some((entity, field, value));
        }

        let (field, value) = Self::extract_key_value(message)?;
        let entity = Self::extract_relation(message).unwrap_or_else(|| "resource".into());
        Some((entity, field, value))
    }

    /// Parses a check violation into `(entity, field)`.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        constraint_name.and_then(Self::split_constraint).or_else(|| {
            let entity = Self::extract_relation(message)?;
            Some((entity, "unknown".into()))
        })
    }

    /// Splits `<table>_<column>_<suffix>` using the known table list and
    /// the PostgreSQL default suffixes (`key`, `fkey`, `check`, `pkey`).
    pub(crate) fn split_constraint(constraint: &str) -> Option<(String, String)> {
        let body = ["_fkey", "_pkey", "_key", "_check"]
            .iter()
            .find_map(|suffix| constraint.strip_suffix(suffix))
            .unwrap_or(constraint);

        let (table, column) = KNOWN_TABLES
            .iter()
            .find_map(|t| {
                body.strip_prefix(t)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| (t.to_string(), rest.to_string()))
            })
            .or_else(|| {
                let (t, c) = body.split_once('_')?;
                Some((t.to_string(), c.to_string()))
            })?;

        (!column.is_empty()).then_some((table, column))
    }

    fn extract_key_value(message: &str) -> Option<(String, String)> {
        let caps = KEY_VALUE.captures(message)?;
        Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
    }

    fn extract_relation(message: &str) -> Option<String> {
        Some(RELATION.captures(message)?.get(1)?.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_constraint_handles_multi_word_tables() {
        assert_eq!(
            ConstraintParser::split_constraint("blog_posts_slug_key"),
            Some(("blog_posts".to_string(), "slug".to_string()))
        );
        assert_eq!(
            ConstraintParser::split_constraint("comments_post_id_fkey"),
            Some(("comments".to_string(), "post_id".to_string()))
        );
        assert_eq!(
            ConstraintParser::split_constraint("users_email_key"),
            Some(("users".to_string(), "email".to_string()))
        );
    }

    #[test]
    fn test_split_constraint_falls_back_to_first_underscore() {
        assert_eq!(
            ConstraintParser::split_constraint("tags_name_key"),
            Some(("tags".to_string(), "name".to_string()))
        );
        assert_eq!(ConstraintParser::split_constraint("plain"), None);
    }

    #[test]
    fn test_parse_unique_violation() {
        let message = "duplicate key value violates unique constraint \"blog_posts_slug_key\"\nDETAIL: Key (slug)=(hello-world) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, Some("blog_posts_slug_key"));
        assert_eq!(
            result,
            Some((
                "blog_posts".to_string(),
                "slug".to_string(),
                "hello-world".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_unique_violation_without_constraint() {
        let message = "duplicate key value violates unique constraint on table \"users\"\nDETAIL: Key (username)=(sam) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, None);
        assert_eq!(
            result,
            Some(("users".to_string(), "username".to_string(), "sam".to_string()))
        );
    }

    #[test]
    fn test_parse_not_null_violation() {
        let message = "null value in column \"title\" of relation \"notifications\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message, None);
        assert_eq!(
            result,
            Some(("notifications".to_string(), "title".to_string()))
        );
    }

    #[test]
    fn test_parse_foreign_key_violation() {
        let message = "insert or update on table \"comments\" violates foreign key constraint \"comments_post_id_fkey\"\nDETAIL: Key (post_id)=(999) is not present in table \"blog_posts\".";
        let result =
            ConstraintParser::parse_foreign_key_violation(message, Some("comments_post_id_fkey"));
        assert_eq!(
            result,
            Some(("comments".to_string(), "post_id".to_string(), "999".to_string()))
        );
    }

    #[test]
    fn test_parse_check_violation() {
        let message = "new row for relation \"blog_posts\" violates check constraint \"blog_posts_likes_check\"";
        let result = ConstraintParser::parse_check_violation(message, Some("blog_posts_likes_check"));
        assert_eq!(result, Some(("blog_posts".to_string(), "likes".to_string())));
    }
}
