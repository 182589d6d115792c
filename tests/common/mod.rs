#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use product_admin::{
    AppConfig, AppState,
    auth::{Claims, IdentityVerifier, VerifyError},
    create_router,
    models::{ApprovalRequest, Author, FieldErrors, RejectRequest, Suggestion},
    repository::{ActionError, RepositoryError, SuggestionRepository},
    storage::MockStorageService,
};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- Tokens ---

pub fn create_token(admin: bool, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: "user-1".to_string(),
        iat: now as usize,
        exp: (now + exp_offset) as usize,
        admin,
        name: Some("Ada Admin".to_string()),
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

pub fn admin_cookie() -> String {
    format!("token={}", create_token(true, 3600))
}

// --- Fixtures ---

pub fn sample_suggestion() -> Suggestion {
    Suggestion {
        id: "abc123".to_string(),
        author: Author {
            full_name: "Jane Doe".to_string(),
        },
        price: 12.5,
        format: "EAN_13".to_string(),
        code: "5012345678900".to_string(),
        photos: vec![
            "suggestions/abc123/front.jpg".to_string(),
            "suggestions/abc123/back.jpg".to_string(),
        ],
    }
}

// --- Stub repository ---

/// Canned answer for approve/reject.
#[derive(Clone)]
pub enum StubOutcome {
    Success,
    Rejected(FieldErrors),
    Unexpected(u16, String),
}

impl StubOutcome {
    fn into_result(self) -> Result<(), ActionError> {
        match self {
            StubOutcome::Success => Ok(()),
            StubOutcome::Rejected(errors) => Err(ActionError::Rejected(errors)),
            StubOutcome::Unexpected(status, body) => Err(ActionError::Unexpected { status, body }),
        }
    }
}

pub struct StubRepository {
    pub suggestion: Option<Suggestion>,
    pub approve_outcome: StubOutcome,
    pub reject_outcome: StubOutcome,
    pub fetches: Mutex<Vec<String>>,
    pub approvals: Mutex<Vec<ApprovalRequest>>,
    pub rejections: Mutex<Vec<RejectRequest>>,
}

impl Default for StubRepository {
    fn default() -> Self {
        Self {
            suggestion: Some(sample_suggestion()),
            approve_outcome: StubOutcome::Success,
            reject_outcome: StubOutcome::Success,
            fetches: Mutex::new(vec![]),
            approvals: Mutex::new(vec![]),
            rejections: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SuggestionRepository for StubRepository {
    async fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, RepositoryError> {
        self.fetches.lock().unwrap().push(id.to_string());
        Ok(self.suggestion.clone().filter(|s| s.id == id))
    }

    async fn approve(&self, request: &ApprovalRequest) -> Result<(), ActionError> {
        self.approvals.lock().unwrap().push(request.clone());
        self.approve_outcome.clone().into_result()
    }

    async fn reject(&self, request: &RejectRequest) -> Result<(), ActionError> {
        self.rejections.lock().unwrap().push(request.clone());
        self.reject_outcome.clone().into_result()
    }
}

// --- Identity stand-ins ---

/// A verifier whose backing service is down.
pub struct UnavailableVerifier;

#[async_trait]
impl IdentityVerifier for UnavailableVerifier {
    async fn verify(&self, _token: &str) -> Result<Claims, VerifyError> {
        Err(VerifyError::Unavailable("connection refused".to_string()))
    }
}

// --- App assembly ---

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_state(repo: Arc<StubRepository>, storage: MockStorageService) -> AppState {
    let config = test_config();
    AppState {
        repo,
        storage: Arc::new(storage),
        identity: Arc::new(product_admin::JwtVerifier::new(&config.jwt_secret)),
        config,
    }
}

pub fn app(repo: Arc<StubRepository>, storage: MockStorageService) -> axum::Router {
    create_router(test_state(repo, storage))
}
