//! Router configuration for the API.
//!
//! Route groups are registered on `OpenApiRouter`s so the OpenAPI document
//! is collected from the handlers' `#[utoipa::path]` attributes, then split
//! into the axum router and the document served by Swagger UI.

use axum::http::HeaderValue;
use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiDoc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    auth_middleware, global_error_handler, logging_middleware, optional_auth_middleware,
    request_id_middleware,
};
use crate::state::AppState;

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Every route group with its auth layer, plus the collected document.
///
/// # Routes
/// - `/health`, `/sitemap.xml` - public
/// - `/api/auth` - public
/// - `/api/posts` - public, caller identified when a token is sent
/// - `/api/me`, `/api/users`, `/api/notifications`, `/api/admin`,
///   `/api/generate-*` - bearer token required
fn api_router(state: &AppState) -> (Router<AppState>, OpenApiDoc) {
    let protected = OpenApiRouter::new()
        .nest("/me", handlers::me::me_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/notifications", handlers::notifications::notification_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .merge(handlers::generation::generation_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let posts = handlers::posts::post_routes()
        .merge(handlers::comments::comment_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let api = OpenApiRouter::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/posts", posts)
        .merge(protected);

    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::health::health_routes())
        .merge(handlers::sitemap::sitemap_routes())
        .nest("/api", api)
        .split_for_parts()
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first:
/// 1. CORS and compression
/// 2. Request ID - generates/propagates request IDs
/// 3. Global error handler - normalizes error bodies, adds the request ID
/// 4. Logging - one span per request carrying the request ID
pub fn create_router(state: AppState) -> Router {
    let (router, openapi) = api_router(&state);
    let cors = cors_layer(&state.settings.server.cors_allowed_origins);

    router
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Empty `origins` allows any origin; unparsable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::lazy_pool;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(lazy_pool(), Settings::default())
    }

    #[tokio::test]
    async fn test_openapi_lists_every_group() {
        let (_, openapi) = api_router(&state());
        let paths: Vec<&str> = openapi.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/health",
            "/sitemap.xml",
            "/api/auth/login",
            "/api/posts/slug/{slug}",
            "/api/posts/{id}/comments",
            "/api/notifications/stream",
            "/api/notifications/{id}/approve",
            "/api/admin/stats",
            "/api/generate-keywords",
            "/api/cron-generate-daily-post",
        ] {
            assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
        }
    }

    #[tokio::test]
    async fn test_liveness_is_public() {
        let response = create_router(state())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        for uri in ["/api/me", "/api/notifications/unread-count", "/api/admin/stats"] {
            let response = create_router(state())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[test]
    fn test_cors_skips_invalid_origins() {
        // Builds without panicking on a header value with a newline.
        let _ = cors_layer(&["https://agency.example".to_string(), "bad\norigin".to_string()]);
    }
}
