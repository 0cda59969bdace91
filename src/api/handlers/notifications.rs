//! Notification inbox, approve/reject workflow and the change stream.

use std::convert::Infallible;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use validator::Validate;

use crate::api::doc::NOTIFICATION_TAG;
use crate::api::dto::{
    CreateNotificationRequest, MarkAllReadResponse, NotificationListResponse, NotificationQuery,
    PaginationMeta, RejectRequest, ScopeQuery, UnreadCountResponse,
};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::repositories::Resolution;
use crate::services::notifications::NotificationChange;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Routes under `/api/notifications`; all of them need a bearer token.
pub fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_notifications, create_notification))
        .routes(routes!(unread_count))
        .routes(routes!(stream_changes))
        .routes(routes!(mark_all_read))
        .routes(routes!(mark_read))
        .routes(routes!(approve))
        .routes(routes!(reject))
        .routes(routes!(delete_notification))
}

/// Inbox a caller may look at.
///
/// Admins see every row unless they narrow to one user; everyone else is
/// pinned to their own inbox.
fn resolve_scope(user: &AuthUser, requested: Option<i32>) -> AppResult<Option<i32>> {
    if user.is_admin() {
        return Ok(requested);
    }
    match requested {
        Some(uid) if uid != user.user_id => Err(AppError::forbidden(
            "Cannot access another user's notifications",
        )),
        _ => Ok(Some(user.user_id)),
    }
}

/// GET /api/notifications - List notifications, newest first
#[utoipa::path(
    get,
    path = "/",
    tag = NOTIFICATION_TAG,
    params(NotificationQuery),
    responses(
        (status = 200, description = "One page of notifications", body = NotificationListResponse),
        (status = 403, description = "Another user's inbox was requested")
    ),
    security(("bearerAuth" = []))
)]
async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<NotificationQuery>,
) -> AppResult<Json<NotificationListResponse>> {
    let scope = resolve_scope(&auth_user, query.user_id)?;
    let params = query.pagination();
    let notifications = &state.services.notifications;

    let ((data, total), unread_count) = tokio::try_join!(
        notifications.list_page(scope, params.offset(), params.limit()),
        notifications.unread_count(scope),
    )?;

    Ok(Json(NotificationListResponse {
        data,
        pagination: PaginationMeta::new(&params, total.max(0) as u64),
        unread_count,
    }))
}

/// POST /api/notifications - Add a notification (admin)
#[utoipa::path(
    post,
    path = "/",
    tag = NOTIFICATION_TAG,
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearerAuth" = []))
)]
async fn create_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    auth_user.require_admin()?;

    let notification = state
        .services
        .notifications
        .notify(payload.into_new_notification())
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// GET /api/notifications/unread-count
#[utoipa::path(
    get,
    path = "/unread-count",
    tag = NOTIFICATION_TAG,
    params(ScopeQuery),
    responses(
        (status = 200, description = "Unread notifications in scope", body = UnreadCountResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn unread_count(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ScopeQuery>,
) -> AppResult<Json<UnreadCountResponse>> {
    let scope = resolve_scope(&auth_user, query.user_id)?;
    let unread_count = state.services.notifications.unread_count(scope).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

/// GET /api/notifications/stream - Server-Sent Events of inbox changes
///
/// Each event is named after the change (`created`, `updated`, `deleted`,
/// `all_read`) and carries it as JSON. A `resync` event means events were
/// dropped and the client should re-fetch.
#[utoipa::path(
    get,
    path = "/stream",
    tag = NOTIFICATION_TAG,
    params(ScopeQuery),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = NotificationChange)
    ),
    security(("bearerAuth" = []))
)]
async fn stream_changes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ScopeQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let scope = resolve_scope(&auth_user, query.user_id)?;
    let rx = state.services.notifications.subscribe();
    debug!(user_id = auth_user.user_id, scope = ?scope, "Notification stream opened");

    let stream = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) if change.concerns(scope) => return Some((Ok(change_event(&change)), rx)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification stream lagged");
                    let event = Event::default().event("resync").data(skipped.to_string());
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn change_event(change: &NotificationChange) -> Event {
    let event = Event::default().event(change.name());
    match serde_json::to_string(change) {
        Ok(json) => event.data(json),
        Err(err) => {
            warn!(error = %err, "Failed to encode notification change");
            Event::default().event("resync").data("0")
        }
    }
}

/// POST /api/notifications/read-all - Mark every unread notification in scope as read
#[utoipa::path(
    post,
    path = "/read-all",
    tag = NOTIFICATION_TAG,
    params(ScopeQuery),
    responses(
        (status = 200, description = "Notifications marked as read", body = MarkAllReadResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(query): ValidatedQuery<ScopeQuery>,
) -> AppResult<Json<MarkAllReadResponse>> {
    let scope = resolve_scope(&auth_user, query.user_id)?;
    let updated = state.services.notifications.mark_all_read(scope).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// PATCH /api/notifications/{id}/read
#[utoipa::path(
    patch,
    path = "/{id}/read",
    tag = NOTIFICATION_TAG,
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Not found in the caller's inbox")
    ),
    security(("bearerAuth" = []))
)]
async fn mark_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Notification>> {
    let notification = state
        .services
        .notifications
        .mark_read(id, auth_user.scope())
        .await?;
    Ok(Json(notification))
}

/// POST /api/notifications/{id}/approve - Approve a pending request (admin)
#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = NOTIFICATION_TAG,
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Request approved", body = Resolution),
        (status = 404, description = "Notification not found"),
        (status = 409, description = "Notification is not pending")
    ),
    security(("bearerAuth" = []))
)]
async fn approve(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Resolution>> {
    auth_user.require_admin()?;
    let resolution = state.services.notifications.approve(id).await?;
    Ok(Json(resolution))
}

/// POST /api/notifications/{id}/reject - Reject a pending request (admin)
#[utoipa::path(
    post,
    path = "/{id}/reject",
    tag = NOTIFICATION_TAG,
    params(("id" = i64, Path, description = "Notification ID")),
    request_body(content = RejectRequest, description = "Optional reason", content_type = "application/json"),
    responses(
        (status = 200, description = "Request rejected", body = Resolution),
        (status = 404, description = "Notification not found"),
        (status = 409, description = "Notification is not pending")
    ),
    security(("bearerAuth" = []))
)]
async fn reject(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<Resolution>> {
    auth_user.require_admin()?;
    let comment = reject_comment(&body)?;
    let resolution = state.services.notifications.reject(id, comment).await?;
    Ok(Json(resolution))
}

/// The reject body is optional; a blank comment counts as none.
fn reject_comment(body: &[u8]) -> AppResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: RejectRequest = serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid reject body: {}", e),
    })?;
    request.validate()?;
    Ok(request.comment.filter(|c| !c.trim().is_empty()))
}

/// DELETE /api/notifications/{id} (admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = NOTIFICATION_TAG,
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearerAuth" = []))
)]
async fn delete_notification(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    auth_user.require_admin()?;
    state.services.notifications.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: 7,
            email: "u@example.com".to_string(),
            username: "u".to_string(),
            role,
        }
    }

    #[test]
    fn test_reject_body_is_optional() {
        assert_eq!(reject_comment(b"").unwrap(), None);
        assert_eq!(reject_comment(br#"{"comment": "  "}"#).unwrap(), None);
        assert_eq!(
            reject_comment(br#"{"comment": "Off topic"}"#).unwrap(),
            Some("Off topic".to_string())
        );
        assert!(matches!(
            reject_comment(b"not json"),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_admin_scope_follows_request() {
        let admin = user(UserRole::Admin);
        assert_eq!(resolve_scope(&admin, None).unwrap(), None);
        assert_eq!(resolve_scope(&admin, Some(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_user_scope_is_pinned_to_self() {
        let member = user(UserRole::User);
        assert_eq!(resolve_scope(&member, None).unwrap(), Some(7));
        assert_eq!(resolve_scope(&member, Some(7)).unwrap(), Some(7));
        assert!(matches!(
            resolve_scope(&member, Some(3)),
            Err(AppError::Forbidden { .. })
        ));
    }
}
