use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// The suggestion moderation surface. `create_router` wraps this whole router in
/// the admin gate, so a caller without the admin claim is redirected to `/`
/// before any handler runs or any suggestion is fetched.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /suggestions/{id}
        // Server-rendered moderation page: gallery plus pre-filled product form.
        .route("/suggestions/{id}", get(handlers::view_suggestion))
        // POST /suggestions/{id}/approve
        // Form submit. Forwards the coerced product data to the approval endpoint.
        .route(
            "/suggestions/{id}/approve",
            post(handlers::approve_suggestion),
        )
        // POST /suggestions/{id}/reject
        // Asks the suggestions API to delete the suggestion.
        .route("/suggestions/{id}/reject", post(handlers::reject_suggestion))
        // GET /suggestions/{id}/images
        // JSON list of fresh download URLs, for refreshing expired gallery links.
        .route("/suggestions/{id}/images", get(handlers::suggestion_images))
}
