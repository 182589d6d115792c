use std::env;
use std::time::Duration;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers pull it out of `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls logging format and local conveniences.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the suggestions API (fetch, approve, delete).
    pub api_base_url: String,
    // Optional bearer key sent on every suggestions API call.
    pub api_key: Option<String>,
    // Name of the cookie carrying the identity token.
    pub auth_cookie: String,
    // Secret used to verify identity tokens.
    pub jwt_secret: String,
    // S3-compatible storage endpoint URL (MinIO locally).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket holding suggestion photos.
    pub s3_bucket: String,
    // Lifetime of a presigned download URL.
    pub download_url_ttl: Duration,
    // Upper bound for any single call to the suggestions API.
    pub upstream_timeout: Duration,
}

/// Env
///
/// Runtime context: `Local` runs against MinIO with pretty logs,
/// `Production` requires every secret and logs JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "product_admin=debug,tower_http=info";

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 900;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            api_base_url: "http://localhost:4000/api".to_string(),
            api_key: None,
            auth_cookie: "token".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "suggestions-test".to_string(),
            download_url_ttl: Duration::from_secs(DEFAULT_DOWNLOAD_URL_TTL_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and fails fast.
    ///
    /// # Panics
    /// Panics if a variable required for the current environment is missing or
    /// malformed, so the server never starts half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let auth_cookie = env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "token".to_string());
        let api_key = env::var("SUGGESTIONS_API_KEY").ok().filter(|key| !key.is_empty());
        let download_url_ttl =
            Duration::from_secs(secs_var("DOWNLOAD_URL_TTL_SECS", DEFAULT_DOWNLOAD_URL_TTL_SECS));
        let upstream_timeout =
            Duration::from_secs(secs_var("UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS));

        match env {
            Env::Local => Self {
                env: Env::Local,
                bind_addr,
                api_base_url: env::var("SUGGESTIONS_API_URL")
                    .unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
                api_key,
                auth_cookie,
                jwt_secret: env::var("AUTH_JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                // Dockerized MinIO defaults.
                s3_endpoint: env::var("S3_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                s3_region: "us-east-1".to_string(),
                s3_key: "admin".to_string(),
                s3_secret: "password".to_string(),
                s3_bucket: env::var("S3_BUCKET_NAME")
                    .unwrap_or_else(|_| "suggestions".to_string()),
                download_url_ttl,
                upstream_timeout,
            },
            Env::Production => Self {
                env: Env::Production,
                bind_addr,
                api_base_url: env::var("SUGGESTIONS_API_URL")
                    .expect("FATAL: SUGGESTIONS_API_URL required in prod"),
                api_key,
                auth_cookie,
                jwt_secret: env::var("AUTH_JWT_SECRET")
                    .expect("FATAL: AUTH_JWT_SECRET must be set in production."),
                s3_endpoint: env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod"),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_key: env::var("S3_ACCESS_KEY").expect("FATAL: S3_ACCESS_KEY required in prod"),
                s3_secret: env::var("S3_SECRET_KEY")
                    .expect("FATAL: S3_SECRET_KEY required in prod"),
                s3_bucket: env::var("S3_BUCKET_NAME")
                    .unwrap_or_else(|_| "suggestions".to_string()),
                download_url_ttl,
                upstream_timeout,
            },
        }
    }
}

fn secs_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a whole number of seconds")),
        Err(_) => default,
    }
}
