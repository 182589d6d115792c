use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{ApprovalRequest, FORM_ERROR_KEY, FieldErrors, RejectRequest, Suggestion};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("suggestions API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("suggestions API answered {status}")]
    Upstream { status: u16 },
    #[error("invalid suggestions API url: {0}")]
    InvalidUrl(String),
    #[error("suggestions API returned a malformed record: {0}")]
    Decode(#[from] serde_json::Error),
}

/// ActionError
///
/// Failure of an approve or reject call.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Non-2xx with a well-formed field-error body, kept exactly as received.
    #[error("suggestions API rejected the request")]
    Rejected(FieldErrors),
    /// Non-2xx with any other body, including none.
    #[error("suggestions API answered {status} with an unexpected body")]
    Unexpected { status: u16, body: String },
    #[error("suggestions API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ActionError {
    /// The error state to show on the page.
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            ActionError::Rejected(errors) if errors.has_messages() => errors,
            // A well-formed body with only nulls would otherwise show nothing.
            ActionError::Rejected(mut errors) => {
                errors.insert(
                    FORM_ERROR_KEY,
                    "The suggestions service refused the request. Please try again.",
                );
                errors
            }
            ActionError::Unexpected { status, .. } => FieldErrors::general(format!(
                "The suggestions service refused the request (status {status}). Please try again."
            )),
            ActionError::Transport(_) => FieldErrors::general(
                "The suggestions service could not be reached. Please try again.",
            ),
        }
    }
}

/// SuggestionRepository
///
/// Contract for everything this service asks of the suggestions backend. Handlers
/// hold it as `Arc<dyn SuggestionRepository>` and never know whether they talk to
/// HTTP or to a test stub.
#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    /// Single-item fetch. `Ok(None)` when the id does not resolve.
    async fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, RepositoryError>;

    /// Converts the suggestion into a product record.
    async fn approve(&self, request: &ApprovalRequest) -> Result<(), ActionError>;

    /// Deletes the suggestion.
    async fn reject(&self, request: &RejectRequest) -> Result<(), ActionError>;
}

/// RepositoryState
///
/// Shared handle to the repository inside `AppState`.
pub type RepositoryState = Arc<dyn SuggestionRepository>;

/// HttpSuggestionRepository
///
/// `SuggestionRepository` backed by the suggestions REST API.
pub struct HttpSuggestionRepository {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSuggestionRepository {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Posts `body` to a moderation endpoint and classifies the answer.
    async fn post_action<T: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), ActionError> {
        let response = self
            .authorized(self.client.post(self.endpoint(path)))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match FieldErrors::parse(&body) {
            Some(errors) => Err(ActionError::Rejected(errors)),
            None => Err(ActionError::Unexpected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl SuggestionRepository for HttpSuggestionRepository {
    async fn get_suggestion(&self, id: &str) -> Result<Option<Suggestion>, RepositoryError> {
        let mut url = reqwest::Url::parse(&self.endpoint("suggestions"))
            .map_err(|e| RepositoryError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RepositoryError::InvalidUrl(self.base_url.clone()))?
            .push(id);

        let response = self.authorized(self.client.get(url)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.bytes().await?;
                Ok(Some(serde_json::from_slice::<Suggestion>(&body)?))
            }
            status => Err(RepositoryError::Upstream {
                status: status.as_u16(),
            }),
        }
    }

    async fn approve(&self, request: &ApprovalRequest) -> Result<(), ActionError> {
        self.post_action("suggestions/approve", request).await
    }

    async fn reject(&self, request: &RejectRequest) -> Result<(), ActionError> {
        self.post_action("suggestions/delete", request).await
    }
}
