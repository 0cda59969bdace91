//! [`NotificationStore`] over the REST API of a running server.
//!
//! Used by the `watch` command. It has no change stream, so feeds over it
//! rely on polling and explicit wake-ups.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::dto::{
    CreateNotificationRequest, ErrorResponse, MarkAllReadResponse, NotificationListResponse,
    RejectRequest, UnreadCountResponse,
};
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;
use crate::models::{Decision, NewNotification, Notification};
use crate::repositories::Resolution;
use crate::services::notifications::NotificationStore;

/// Page size used when fetching a whole scope
const FETCH_PAGE_SIZE: u32 = 100;

pub struct ApiNotificationStore {
    base_url: String,
    token: String,
}

impl ApiNotificationStore {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        HTTP_CLIENT
            .request(method, format!("{}/api/notifications{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<reqwest::Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| AppError::upstream("api", format!("request failed: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::upstream("api", format!("invalid JSON: {}", e)))
    }
}

fn user_filter(scope: Option<i32>, separator: &str) -> String {
    scope
        .map(|uid| format!("{}user_id={}", separator, uid))
        .unwrap_or_default()
}

/// Maps an error response back onto the matching [`AppError`] variant.
fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized { message },
        StatusCode::FORBIDDEN => AppError::Forbidden { message },
        StatusCode::NOT_FOUND => AppError::NotFound {
            entity: "notification".to_string(),
            field: "request".to_string(),
            value: message,
        },
        StatusCode::CONFLICT => AppError::Conflict { message },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::BadRequest { message }
        }
        _ => AppError::upstream("api", format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl NotificationStore for ApiNotificationStore {
    async fn fetch(&self, scope: Option<i32>) -> AppResult<Vec<Notification>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let query = format!(
                "?page={}&page_size={}{}",
                page,
                FETCH_PAGE_SIZE,
                user_filter(scope, "&")
            );
            let resp: NotificationListResponse =
                self.send_json(self.request(Method::GET, &query)).await?;

            all.extend(resp.data);
            if !resp.pagination.has_next {
                break;
            }
            page += 1;
        }

        debug!(count = all.len(), "Fetched notifications over the API");
        Ok(all)
    }

    async fn unread_count(&self, scope: Option<i32>) -> AppResult<i64> {
        let path = format!("/unread-count{}", user_filter(scope, "?"));
        let resp: UnreadCountResponse = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(resp.unread_count)
    }

    async fn mark_read(&self, id: i64, _scope: Option<i32>) -> AppResult<Notification> {
        self.send_json(self.request(Method::PATCH, &format!("/{}/read", id)))
            .await
    }

    async fn mark_all_read(&self, scope: Option<i32>) -> AppResult<usize> {
        let path = format!("/read-all{}", user_filter(scope, "?"));
        let resp: MarkAllReadResponse = self.send_json(self.request(Method::POST, &path)).await?;
        Ok(resp.updated)
    }

    async fn resolve(&self, id: i64, decision: Decision) -> AppResult<Resolution> {
        let request = match decision {
            Decision::Approve => self.request(Method::POST, &format!("/{}/approve", id)),
            Decision::Reject { comment } => self
                .request(Method::POST, &format!("/{}/reject", id))
                .json(&RejectRequest { comment }),
        };
        self.send_json(request).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.send(self.request(Method::DELETE, &format!("/{}", id)))
            .await
            .map(|_| ())
    }

    async fn add(&self, notification: NewNotification) -> AppResult<Notification> {
        let body = CreateNotificationRequest::from(&notification);
        self.send_json(self.request(Method::POST, "").json(&body))
            .await
    }

    fn name(&self) -> &'static str {
        "api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationStatus;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification_json(id: i64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "comment",
            "title": format!("Notification {}", id),
            "message": "body",
            "createdAt": "2025-06-01T10:00:00Z",
            "status": status,
            "fromUserId": 8
        })
    }

    fn page(items: Vec<serde_json::Value>, page: u32, has_next: bool) -> serde_json::Value {
        json!({
            "data": items,
            "pagination": {
                "page": page,
                "page_size": 100,
                "total_items": 150,
                "total_pages": 2,
                "has_next": has_next,
                "has_prev": page > 1
            },
            "unread_count": 1
        })
    }

    #[tokio::test]
    async fn test_fetch_walks_every_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .and(query_param("page", "1"))
            .and(bearer_token("tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![notification_json(2, "unread")], 1, true)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/notifications"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![notification_json(1, "read")], 2, false)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = ApiNotificationStore::new(server.uri(), "tok");
        let all = store.fetch(None).await.unwrap();

        let ids: Vec<i64> = all.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(all[0].status, NotificationStatus::Unread);
    }

    #[tokio::test]
    async fn test_reject_sends_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/5/reject"))
            .and(body_json(json!({"comment": "Off topic"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "original": notification_json(5, "rejected"),
                "response": null,
                "moderatedComment": 31
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = ApiNotificationStore::new(server.uri(), "tok");
        let resolution = store
            .resolve(
                5,
                Decision::Reject {
                    comment: Some("Off topic".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(resolution.original.status, NotificationStatus::Rejected);
        assert_eq!(resolution.moderated_comment, Some(31));
    }

    #[tokio::test]
    async fn test_conflict_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notifications/5/approve"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "CONFLICT",
                "message": "notification 5 is approved, cannot become approved"
            })))
            .mount(&server)
            .await;

        let store = ApiNotificationStore::new(server.uri(), "tok");
        match store.resolve(5, Decision::Approve).await {
            Err(AppError::Conflict { message }) => assert!(message.contains("cannot become")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_status_error_without_json_body() {
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "<html>"),
            AppError::Upstream { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            AppError::Unauthorized { .. }
        ));
    }
}
