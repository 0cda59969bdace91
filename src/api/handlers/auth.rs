//! Authentication handlers for login and token management.

use axum::{Json, extract::State, http::StatusCode};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::AUTH_TAG;
use crate::api::dto::{
    AuthResponse, ErrorResponse, LoginRequest, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest,
};
use crate::error::AppResult;
use crate::models::User;
use crate::state::AppState;
use crate::utils::jwt::{generate_token_pair, validate_refresh_token};
use crate::utils::validate::ValidatedJson;

/// Creates the authentication routes
///
/// # Routes
/// - `POST /login` - Authenticate user and get tokens
/// - `POST /register` - Register new user and get tokens
/// - `POST /refresh` - Refresh access token using refresh token
pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(register))
        .routes(routes!(refresh_token))
}

fn auth_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let (access_token, refresh_token) = generate_token_pair(&user, &state.jwt_config)?;
    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

/// POST /api/auth/login - Authenticate user
///
/// Accepts an email address or a username, returns JWT tokens.
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = state
        .services
        .users
        .authenticate(&payload.login, &payload.password)
        .await?;

    Ok(Json(auth_response(&state, user)?))
}

/// POST /api/auth/register - Register new user
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = state
        .services
        .users
        .register(payload.username, payload.email, payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

/// POST /api/auth/refresh - Refresh access token
///
/// Validates the refresh token and issues a new token pair. The role is
/// re-read from the database so promotions take effect.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = AUTH_TAG,
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens refreshed successfully", body = RefreshTokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<Json<RefreshTokenResponse>> {
    let claims = validate_refresh_token(&payload.refresh_token, &state.jwt_config.secret)?;
    let user = state.services.users.get_user(claims.user_id()?).await?;

    let (access_token, refresh_token) = generate_token_pair(&user, &state.jwt_config)?;
    Ok(Json(RefreshTokenResponse {
        access_token,
        refresh_token,
    }))
}
