mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use common::{StubOutcome, StubRepository, admin_cookie, app, create_token};
use product_admin::{
    models::{FieldErrors, ImageUrlsResponse, RejectRequest},
    storage::MockStorageService,
};
use std::sync::Arc;
use tower::util::ServiceExt;

const APPROVE_BODY: &str = "name=Oat+Milk&price=12.50&ingredientsList=Oats%0AWater\
&barcodeFormat=EAN_13&barcode=5012345678900&manufacturingLocation=Sweden\
&packagingLocation=&transportWeight=3&companyRating=4&packagingRating=5&overallRating=5";

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

// --- Access gate ---

#[tokio::test]
async fn test_missing_cookie_redirects_without_data() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(get("/suggestions/abc123", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("/"));
    assert!(body_text(response).await.is_empty());
    assert!(repo.fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_admin_token_redirects() {
    let repo = Arc::new(StubRepository::default());
    let cookie = format!("token={}", create_token(false, 3600));

    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(get("/suggestions/abc123", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("/"));
    assert!(repo.fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_admin_token_redirects() {
    let repo = Arc::new(StubRepository::default());
    let cookie = format!("token={}", create_token(true, -3600));

    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(get("/suggestions/abc123", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(repo.fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_verification_error_redirects_like_non_admin() {
    let repo = Arc::new(StubRepository::default());
    let mut state = common::test_state(repo.clone(), MockStorageService::new());
    state.identity = Arc::new(common::UnavailableVerifier);

    let response = product_admin::create_router(state)
        .oneshot(get("/suggestions/abc123", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("/"));
    assert!(body_text(response).await.is_empty());
    assert!(repo.fetches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_admin_cannot_approve_or_reject() {
    let repo = Arc::new(StubRepository::default());
    let cookie = format!("token={}", create_token(false, 3600));

    let approve = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form("/suggestions/abc123/approve", Some(&cookie), APPROVE_BODY))
        .await
        .unwrap();
    let reject = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form("/suggestions/abc123/reject", Some(&cookie), ""))
        .await
        .unwrap();

    assert_eq!(approve.status(), StatusCode::FOUND);
    assert_eq!(reject.status(), StatusCode::FOUND);
    assert!(repo.approvals.lock().unwrap().is_empty());
    assert!(repo.rejections.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app(Arc::new(StubRepository::default()), MockStorageService::new())
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

// --- Page rendering ---

#[tokio::test]
async fn test_admin_sees_page_for_requested_suggestion() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(get("/suggestions/abc123", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*repo.fetches.lock().unwrap(), vec!["abc123".to_string()]);

    let html = body_text(response).await;
    assert!(html.contains("<title>Jane Doe: EAN_13-5012345678900</title>"));
    assert!(html.contains(r#"href="/suggestions""#));
    assert!(html.contains("View Suggestion"));
    assert!(html.contains(r#"action="/suggestions/abc123/reject""#));
    assert!(html.contains(r#"action="/suggestions/abc123/approve""#));
    assert!(html.contains("Add Suggestion"));

    // Gallery in photo order.
    let front = html
        .find("mock-bucket/suggestions/abc123/front.jpg?signature=fake")
        .expect("front photo rendered");
    let back = html
        .find("mock-bucket/suggestions/abc123/back.jpg?signature=fake")
        .expect("back photo rendered");
    assert!(front < back);

    // Pre-filled form.
    assert!(html.contains(r#"name="price" type="text" value="12.5""#));
    assert!(html.contains(r#"name="barcodeFormat" type="text" value="EAN_13""#));
    assert!(html.contains(r#"name="barcode" type="text" value="5012345678900""#));
    assert!(html.contains(r#"name="transportWeight" type="text" value="5""#));
    assert!(html.contains(r#"name="overallRating" type="number" value="5""#));
    assert!(html.contains(r#"name="name" type="text" value="""#));
}

#[tokio::test]
async fn test_unknown_suggestion_is_not_found() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo, MockStorageService::new())
        .oneshot(get("/suggestions/missing", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("Suggestion not found"));
    assert!(!html.contains("Add Suggestion"));
}

#[tokio::test]
async fn test_storage_failure_renders_notice_instead_of_spinner() {
    let repo = Arc::new(StubRepository::default());
    let storage = MockStorageService::failing_on(&["suggestions/abc123/back.jpg"]);

    let response = app(repo, storage)
        .oneshot(get("/suggestions/abc123", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("could not be loaded"));
    assert!(!html.contains("spinner-border"));
    assert!(html.contains("Add Suggestion"));
}

#[tokio::test]
async fn test_images_endpoint_returns_ordered_urls() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo, MockStorageService::new())
        .oneshot(get("/suggestions/abc123/images", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: ImageUrlsResponse = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body.urls.len(), 2);
    assert!(body.urls[0].url.contains("front.jpg"));
    assert!(body.urls[1].url.contains("back.jpg"));
}

#[tokio::test]
async fn test_images_endpoint_storage_failure_is_bad_gateway() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo, MockStorageService::new_failing())
        .oneshot(get("/suggestions/abc123/images", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// --- Approve ---

#[tokio::test]
async fn test_approve_posts_coerced_payload_and_redirects() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form(
            "/suggestions/abc123/approve",
            Some(&admin_cookie()),
            APPROVE_BODY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/suggestions"));

    let approvals = repo.approvals.lock().unwrap();
    assert_eq!(approvals.len(), 1);
    let request = &approvals[0];
    assert_eq!(request.id, "abc123");
    assert_eq!(request.name, "Oat Milk");
    assert_eq!(request.price, 12.5);
    assert_eq!(request.transport_weight, 3.0);
    assert_eq!(
        (request.company_rating, request.packaging_rating, request.overall_rating),
        (4, 5, 5)
    );
    assert_eq!(request.ingredients_list, vec!["Oats", "Water"]);
    assert_eq!(request.manufacturing_location.as_deref(), Some("Sweden"));
    assert_eq!(request.packaging_location, None);
}

#[tokio::test]
async fn test_approve_failure_shows_returned_errors_and_keeps_page() {
    let mut errors = FieldErrors::default();
    errors.insert("name", "Name is already taken");
    errors.0.insert("price".to_string(), None);
    let repo = Arc::new(StubRepository {
        approve_outcome: StubOutcome::Rejected(errors),
        ..StubRepository::default()
    });

    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form(
            "/suggestions/abc123/approve",
            Some(&admin_cookie()),
            APPROVE_BODY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(location(&response), None);

    let html = body_text(response).await;
    assert!(html.contains("Name is already taken"));
    // What the admin typed is kept.
    assert!(html.contains(r#"name="name" type="text" value="Oat Milk""#));
    assert!(html.contains(r#"name="companyRating" type="number" value="4""#));
    // Gallery still rendered.
    assert!(html.contains("front.jpg?signature=fake"));
    assert_eq!(repo.approvals.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_approve_with_unparseable_number_is_not_sent() {
    let repo = Arc::new(StubRepository::default());
    let body = APPROVE_BODY.replace("price=12.50", "price=twelve");

    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form("/suggestions/abc123/approve", Some(&admin_cookie()), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Must be a number"));
    assert!(repo.approvals.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_with_malformed_error_body_shows_general_message() {
    let repo = Arc::new(StubRepository {
        approve_outcome: StubOutcome::Unexpected(500, String::new()),
        ..StubRepository::default()
    });

    let response = app(repo, MockStorageService::new())
        .oneshot(post_form(
            "/suggestions/abc123/approve",
            Some(&admin_cookie()),
            APPROVE_BODY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("alert-danger"));
    assert!(html.contains("status 500"));
}

// --- Reject ---

#[tokio::test]
async fn test_reject_posts_id_and_redirects() {
    let repo = Arc::new(StubRepository::default());
    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(post_form("/suggestions/abc123/reject", Some(&admin_cookie()), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/suggestions"));
    assert_eq!(
        *repo.rejections.lock().unwrap(),
        vec![RejectRequest {
            id: "abc123".to_string()
        }]
    );
}

#[tokio::test]
async fn test_reject_failure_keeps_page_with_error() {
    let repo = Arc::new(StubRepository {
        reject_outcome: StubOutcome::Rejected(FieldErrors::general("Suggestion is locked")),
        ..StubRepository::default()
    });

    let response = app(repo, MockStorageService::new())
        .oneshot(post_form("/suggestions/abc123/reject", Some(&admin_cookie()), ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(location(&response), None);
    let html = body_text(response).await;
    assert!(html.contains("Suggestion is locked"));
    assert!(html.contains("Add Suggestion"));
}

#[tokio::test]
async fn test_all_null_error_body_still_shows_a_message() {
    let mut errors = FieldErrors::default();
    errors.0.insert("name".to_string(), None);
    let repo = Arc::new(StubRepository {
        approve_outcome: StubOutcome::Rejected(errors),
        ..StubRepository::default()
    });

    let response = app(repo, MockStorageService::new())
        .oneshot(post_form(
            "/suggestions/abc123/approve",
            Some(&admin_cookie()),
            APPROVE_BODY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("alert-danger"));
    assert!(html.contains("refused the request"));
}

// --- Links built from the suggestion id ---

#[tokio::test]
async fn test_id_with_path_separators_stays_one_segment_in_links() {
    let suggestion = product_admin::models::Suggestion {
        id: "x/../victim".to_string(),
        ..common::sample_suggestion()
    };
    let repo = Arc::new(StubRepository {
        suggestion: Some(suggestion),
        ..StubRepository::default()
    });

    let response = app(repo.clone(), MockStorageService::new())
        .oneshot(get("/suggestions/x%2F..%2Fvictim", Some(&admin_cookie())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*repo.fetches.lock().unwrap(), vec!["x/../victim".to_string()]);

    let html = body_text(response).await;
    assert!(html.contains(r#"action="/suggestions/x%2F..%2Fvictim/reject""#));
    assert!(html.contains(r#"action="/suggestions/x%2F..%2Fvictim/approve""#));
    assert!(!html.contains("x/../victim/"));
}

#[test]
fn test_suggestion_href_encodes_reserved_characters() {
    use product_admin::view::suggestion_href;

    assert_eq!(suggestion_href("abc123", None), "/suggestions/abc123");
    assert_eq!(
        suggestion_href("abc123", Some("reject")),
        "/suggestions/abc123/reject"
    );
    assert_eq!(
        suggestion_href("a?b#c", Some("approve")),
        "/suggestions/a%3Fb%23c/approve"
    );
}

// --- API documentation ---

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app(Arc::new(StubRepository::default()), MockStorageService::new())
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();

    let approve = &doc["paths"]["/suggestions/{id}/approve"]["post"];
    assert!(approve["requestBody"]["content"]["application/x-www-form-urlencoded"].is_object());
    assert!(doc["paths"]["/suggestions/{id}/reject"]["post"].is_object());
    assert!(doc["components"]["schemas"]["ApprovalForm"].is_object());
}
