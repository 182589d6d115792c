use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::AdminUser,
    errors::AppError,
    gallery::ImageResolver,
    models::{ApprovalForm, FieldErrors, ImageUrlsResponse, RejectRequest, Suggestion},
    view::{self, ProductFormView, SUGGESTIONS_PATH, SuggestionPage},
};

/// Fetches the suggestion or turns a miss into `AppError::NotFound`.
async fn load_suggestion(state: &AppState, id: &str) -> Result<Suggestion, AppError> {
    state
        .repo
        .get_suggestion(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

/// Renders the full page: gallery resolved, form and errors as given.
async fn render_page(
    state: &AppState,
    suggestion: &Suggestion,
    form: ProductFormView,
    errors: &FieldErrors,
) -> Result<axum::response::Html<String>, AppError> {
    let mut gallery = ImageResolver::new(state.storage.clone()).spawn(suggestion.photos.clone());
    let images = gallery.settled().await;
    view::render(SuggestionPage::new(suggestion, images, form, errors))
}

/// Re-renders the page after a failed action, keeping the admin on it.
async fn render_failure(
    state: &AppState,
    suggestion: &Suggestion,
    form: ProductFormView,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let page = render_page(state, suggestion, form, &errors).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

/// view_suggestion
///
/// [Admin Route] The moderation page for one suggestion. Loads the record,
/// resolves its photos concurrently and renders the gallery plus the product form
/// pre-filled from the suggestion.
#[utoipa::path(
    get,
    path = "/suggestions/{id}",
    params(("id" = String, Path, description = "Suggestion ID")),
    responses(
        (status = 200, description = "Moderation page (HTML)"),
        (status = 302, description = "Caller is not an admin, redirected to /"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn view_suggestion(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let suggestion = load_suggestion(&state, &id).await?;
    tracing::debug!(suggestion_id = %id, admin = %admin.id, photos = suggestion.photos.len(), "rendering suggestion");

    let page = render_page(
        &state,
        &suggestion,
        ProductFormView::initial(&suggestion),
        &FieldErrors::initial(),
    )
    .await?;
    Ok(page.into_response())
}

/// approve_suggestion
///
/// [Admin Route] Submits the product form. Numeric fields are coerced here; on
/// success the admin is sent back to the suggestions list, otherwise the page is
/// shown again with the returned field errors and the values they typed.
#[utoipa::path(
    post,
    path = "/suggestions/{id}/approve",
    params(("id" = String, Path, description = "Suggestion ID")),
    request_body(content = ApprovalForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Approved, redirected to /suggestions"),
        (status = 422, description = "Approval refused, page re-rendered with field errors")
    )
)]
pub async fn approve_suggestion(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ApprovalForm>,
) -> Result<Response, AppError> {
    let outcome = match form.to_request(&id) {
        Ok(request) => state
            .repo
            .approve(&request)
            .await
            .map_err(|e| {
                tracing::warn!(suggestion_id = %id, error = %e, "approve failed");
                e.into_field_errors()
            }),
        Err(errors) => Err(errors),
    };

    match outcome {
        Ok(()) => {
            tracing::info!(suggestion_id = %id, admin = %admin.id, "suggestion approved");
            Ok(Redirect::to(SUGGESTIONS_PATH).into_response())
        }
        Err(errors) => {
            let suggestion = load_suggestion(&state, &id).await?;
            render_failure(&state, &suggestion, ProductFormView::from_submission(&form), errors)
                .await
        }
    }
}

/// reject_suggestion
///
/// [Admin Route] Deletes the suggestion through the suggestions API.
#[utoipa::path(
    post,
    path = "/suggestions/{id}/reject",
    params(("id" = String, Path, description = "Suggestion ID")),
    responses(
        (status = 303, description = "Rejected, redirected to /suggestions"),
        (status = 422, description = "Delete refused, page re-rendered with errors")
    )
)]
pub async fn reject_suggestion(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let request = RejectRequest { id: id.clone() };

    match state.repo.reject(&request).await {
        Ok(()) => {
            tracing::info!(suggestion_id = %id, admin = %admin.id, "suggestion rejected");
            Ok(Redirect::to(SUGGESTIONS_PATH).into_response())
        }
        Err(e) => {
            tracing::warn!(suggestion_id = %id, error = %e, "reject failed");
            let suggestion = load_suggestion(&state, &id).await?;
            let form = ProductFormView::initial(&suggestion);
            render_failure(&state, &suggestion, form, e.into_field_errors()).await
        }
    }
}

/// suggestion_images
///
/// [Admin Route] Fresh download URLs for the suggestion's photos, in photo order.
/// Lets an open page replace links that have expired.
#[utoipa::path(
    get,
    path = "/suggestions/{id}/images",
    params(("id" = String, Path, description = "Suggestion ID")),
    responses(
        (status = 200, description = "Ordered download URLs", body = ImageUrlsResponse),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Storage failure")
    )
)]
pub async fn suggestion_images(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageUrlsResponse>, AppError> {
    let suggestion = load_suggestion(&state, &id).await?;
    let urls = ImageResolver::new(state.storage.clone())
        .resolve_all(&suggestion.photos)
        .await?;
    Ok(Json(ImageUrlsResponse { urls }))
}
