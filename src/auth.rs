use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;

/// Claims
///
/// Payload of the identity token carried in the auth cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity provider's user id.
    pub sub: String,
    /// Expiration time, seconds since the epoch. Always validated.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
    /// The admin claim. Absent means not an admin.
    #[serde(default)]
    pub admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// AdminUser
///
/// Resolved identity of a caller holding the admin claim.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminUser {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,
    #[error("token rejected: {0}")]
    Rejected(String),
    /// The verifier itself could not answer.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// IdentityVerifier
///
/// Checks an identity token and returns its claims. Injected through the app
/// state so tests and alternative identity providers can stand in.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

/// IdentityState
///
/// Shared handle to the verifier inside `AppState`.
pub type IdentityState = Arc<dyn IdentityVerifier>;

/// JwtVerifier
///
/// HS256 verification against a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(VerifyError::Expired),
                _ => Err(VerifyError::Rejected(e.to_string())),
            },
        }
    }
}

/// Why a caller was turned away without a verification error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    InvalidToken,
    NotAdmin,
}

/// Verification
///
/// Outcome of the access gate. Only `Authorized` lets a request through; the
/// other two differ in how they are logged, never in the response.
#[derive(Debug)]
pub enum Verification {
    Authorized(AdminUser),
    Unauthorized(DenyReason),
    VerificationError(VerifyError),
}

/// authorize
///
/// Reads the auth cookie named `cookie_name` from `headers` and asks `verifier`
/// whether it carries the admin claim.
pub async fn authorize(
    headers: &HeaderMap,
    cookie_name: &str,
    verifier: &dyn IdentityVerifier,
) -> Verification {
    let jar = CookieJar::from_headers(headers);
    let Some(token) = jar
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
    else {
        return Verification::Unauthorized(DenyReason::MissingToken);
    };

    match verifier.verify(&token).await {
        Ok(claims) if claims.admin => Verification::Authorized(AdminUser {
            id: claims.sub,
            name: claims.name,
        }),
        Ok(_) => Verification::Unauthorized(DenyReason::NotAdmin),
        Err(VerifyError::Expired | VerifyError::Rejected(_)) => {
            Verification::Unauthorized(DenyReason::InvalidToken)
        }
        Err(e) => Verification::VerificationError(e),
    }
}

/// AuthRedirect
///
/// Rejection for every non-admin caller: a non-permanent redirect to the public
/// landing route, with no page data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
    }
}

/// AdminUser Extractor Implementation
///
/// Runs the access gate for the request. The resolved identity is cached in the
/// request extensions, so the gate middleware and the handler share one
/// verification.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    IdentityState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<AdminUser>() {
            return Ok(admin.clone());
        }

        let verifier = IdentityState::from_ref(state);
        let config = AppConfig::from_ref(state);

        match authorize(&parts.headers, &config.auth_cookie, verifier.as_ref()).await {
            Verification::Authorized(admin) => {
                parts.extensions.insert(admin.clone());
                Ok(admin)
            }
            Verification::Unauthorized(reason) => {
                tracing::debug!(?reason, uri = %parts.uri, "admin gate denied request");
                Err(AuthRedirect)
            }
            Verification::VerificationError(e) => {
                tracing::warn!(error = %e, uri = %parts.uri, "identity verification failed, denying");
                Err(AuthRedirect)
            }
        }
    }
}
