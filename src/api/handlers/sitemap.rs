//! `GET /sitemap.xml`

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::SITEMAP_TAG;
use crate::error::AppResult;
use crate::state::AppState;

pub fn sitemap_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(sitemap))
}

/// GET /sitemap.xml - Static pages plus every published post
#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = SITEMAP_TAG,
    responses(
        (status = 200, description = "XML sitemap", content_type = "application/xml", body = String)
    )
)]
async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let xml = state.services.sitemap.generate().await?;
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    ))
}
