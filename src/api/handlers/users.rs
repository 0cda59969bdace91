//! User management handlers (admin).

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{PagedResponse, PaginationParams, UpdateRoleRequest, UserResponse};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Creates user-related routes.
///
/// Routes:
/// - GET /            - List users
/// - PUT /{id}/role   - Change a user's role
/// - DELETE /{id}     - Delete a user
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(update_role))
        .routes(routes!(delete_user))
}

/// GET /api/users - List users
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated list of users", body = PagedResponse<UserResponse>),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearerAuth" = []))
)]
async fn list_users(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Json<PagedResponse<UserResponse>>> {
    auth_user.require_admin()?;

    let (users, total) = state
        .services
        .users
        .list_users(params.offset(), params.limit())
        .await?;
    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PagedResponse::new(data, &params, total)))
}

/// PUT /api/users/{id}/role - Change a user's role
#[utoipa::path(
    put,
    path = "/{id}/role",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
async fn update_role(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    auth_user.require_admin()?;
    if id == auth_user.user_id {
        return Err(AppError::BadRequest {
            message: "Administrators cannot change their own role".to_string(),
        });
    }

    let user = state.services.users.set_role(id, payload.role).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id} - Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    auth_user.require_admin()?;
    if id == auth_user.user_id {
        return Err(AppError::BadRequest {
            message: "Administrators cannot delete themselves".to_string(),
        });
    }

    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
