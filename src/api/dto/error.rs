//! Error response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::error::ValidationFieldError;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "NOT_FOUND",
    "message": "notification with id=42 was not found",
    "request_id": "3f1c2b1e-8d0e-4a7f-9a51-1a2b3c4d5e6f"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    pub fn not_found_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new(
            "NOT_FOUND",
            &format!("{} with {}={} was not found", entity, field, value),
        )
        .with_details(json!({ "entity": entity, "field": field, "value": value }))
    }

    pub fn duplicate_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new(
            "DUPLICATE_ENTRY",
            &format!("{} with {}={} already exists", entity, field, value),
        )
        .with_details(json!({ "entity": entity, "field": field, "value": value }))
    }

    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::new("VALIDATION_ERROR", &format!("Validation failed for {}", field))
            .with_details(json!({ "fields": [{ "field": field, "message": reason }] }))
    }

    pub fn validation_errors(errors: &[ValidationFieldError]) -> Self {
        let fields: Vec<Value> = errors
            .iter()
            .map(|e| json!({ "field": e.field, "message": e.message }))
            .collect();
        Self::new("VALIDATION_ERROR", "Request validation failed")
            .with_details(json!({ "fields": fields }))
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_skipped() {
        let json = serde_json::to_value(ErrorResponse::new("CONFLICT", "taken")).unwrap();
        assert_eq!(json, json!({ "code": "CONFLICT", "message": "taken" }));
    }

    #[test]
    fn test_validation_errors_list_every_field() {
        let response = ErrorResponse::validation_errors(&[
            ValidationFieldError {
                field: "title".to_string(),
                message: "too long".to_string(),
            },
            ValidationFieldError {
                field: "topic".to_string(),
                message: "required".to_string(),
            },
        ])
        .with_request_id("req-1");

        let details = response.details.unwrap();
        assert_eq!(details["fields"][1]["field"], "topic");
        assert_eq!(response.request_id.as_deref(), Some("req-1"));
    }
}
