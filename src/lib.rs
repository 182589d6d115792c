use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod errors;
pub mod gallery;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod view;

// Routing segregated by access level (Public, Admin).
pub mod routes;
use auth::AdminUser;
use routes::{admin, public};

// --- Public Re-exports ---

pub use auth::{IdentityState, JwtVerifier};
pub use config::AppConfig;
pub use repository::{HttpSuggestionRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for the moderation routes and the shared wire schemas,
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::view_suggestion,
        handlers::approve_suggestion,
        handlers::reject_suggestion,
        handlers::suggestion_images,
    ),
    components(
        schemas(
            models::Suggestion, models::Author, models::ApprovalForm, models::ApprovalRequest,
            models::RejectRequest, models::FieldErrors, models::DownloadUrl,
            models::ImageUrlsResponse,
        )
    ),
    tags(
        (name = "product-admin", description = "Product suggestion moderation")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single immutable container of every injected dependency, shared by all
/// requests. The identity verifier, repository and storage are trait objects so
/// nothing in the request path reaches for a global client.
#[derive(Clone)]
pub struct AppState {
    /// Suggestions API access (fetch, approve, delete).
    pub repo: RepositoryState,
    /// Photo storage and download URL presigning.
    pub storage: StorageState,
    /// Identity token verification for the admin gate.
    pub identity: IdentityState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// admin_gate
///
/// Middleware in front of every admin route. Extracting `AdminUser` runs the
/// access gate; a caller without the admin claim gets the `/` redirect and the
/// handler (and therefore any data fetch) never runs.
async fn admin_gate(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_gate)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, uri and the `x-request-id`, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
