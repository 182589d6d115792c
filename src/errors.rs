use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::repository::RepositoryError;
use crate::view::{self, NotFoundPage};

/// AppError
///
/// Handler-level failures. Each maps to one HTTP answer; details are logged,
/// never shown.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("suggestion {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("image resolution failed: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(id) => {
                tracing::info!(suggestion_id = %id, "suggestion not found");
                match view::render(NotFoundPage::for_suggestion(&id)) {
                    Ok(page) => (StatusCode::NOT_FOUND, page).into_response(),
                    Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
                }
            }
            AppError::Repository(e) => {
                tracing::error!(error = %e, "suggestions API failure");
                (
                    StatusCode::BAD_GATEWAY,
                    Html("The suggestions service is unavailable."),
                )
                    .into_response()
            }
            AppError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::BAD_GATEWAY, "Images could not be resolved").into_response()
            }
            AppError::Template(e) => {
                tracing::error!(error = %e, "template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
