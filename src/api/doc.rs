use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const AUTH_TAG: &str = "Auth";
pub const USER_TAG: &str = "User";
pub const HEALTH_TAG: &str = "Health";
pub const NOTIFICATION_TAG: &str = "Notifications";
pub const POST_TAG: &str = "Posts";
pub const COMMENT_TAG: &str = "Comments";
pub const GENERATION_TAG: &str = "Generation";
pub const ADMIN_TAG: &str = "Admin";
pub const SITEMAP_TAG: &str = "Sitemap";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agency",
        description = "Content, notification and AI-generation API of the agency website",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::services::notifications::NotificationChange,
        )
    ),
    tags(
        (name = AUTH_TAG, description = "Authentication endpoints"),
        (name = USER_TAG, description = "Current user and user management"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = NOTIFICATION_TAG, description = "Notification inbox, moderation workflow and change stream"),
        (name = POST_TAG, description = "Blog posts"),
        (name = COMMENT_TAG, description = "Post comments"),
        (name = GENERATION_TAG, description = "LLM-backed content generation"),
        (name = ADMIN_TAG, description = "Administration endpoints"),
        (name = SITEMAP_TAG, description = "XML sitemap"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer Token Authentication"))
                        .build(),
                ),
            )
        }
    }
}
