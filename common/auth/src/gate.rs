use std::sync::Arc;

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::claims::ClaimSet;
use crate::config::{AuthConfig, RejectionHandler};
use crate::error::{AuthError, AuthResult};
use crate::jwks::{JwksFetcher, KeySet};
use crate::verifier::TokenVerifier;

/// A refused request: always 401, with a realm challenge.
pub struct Rejection {
    pub status: StatusCode,
    pub message: String,
    challenge: String,
    handler: RejectionHandler,
}

impl Rejection {
    fn new(config: &AuthConfig, error: &AuthError) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: error.to_string(),
            challenge: config.challenge(),
            handler: config.rejection.clone(),
        }
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl std::fmt::Debug for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejection")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = (self.handler)(self.status, &self.message);
        *response.status_mut() = self.status;
        if let Ok(value) = HeaderValue::from_str(&self.challenge) {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

/// Accept/reject decision for inbound requests. Built once, then shared
/// read-only across requests.
#[derive(Clone)]
pub struct RequestGate {
    config: Arc<AuthConfig>,
    verifier: TokenVerifier,
}

impl RequestGate {
    /// Downloads the pool's key set; no gate exists unless that succeeds.
    pub async fn connect(config: AuthConfig) -> AuthResult<Self> {
        let fetcher = JwksFetcher::new(config.jwks_url.clone(), config.fetch_timeout)?;
        let keys = fetcher.fetch().await?;
        info!(
            issuer = %config.issuer,
            region = %config.region,
            user_pool_id = %config.user_pool_id,
            keys = keys.len(),
            "JWT gate ready"
        );
        Ok(Self::with_key_set(config, keys))
    }

    pub fn with_key_set(config: AuthConfig, keys: KeySet) -> Self {
        let verifier = TokenVerifier::from_config(&config, keys);
        Self {
            config: Arc::new(config),
            verifier,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn key_set(&self) -> &KeySet {
        self.verifier.key_set()
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn extract_token<'a>(&self, headers: &'a HeaderMap) -> AuthResult<&'a str> {
        extract_token(headers, self.config.token_lookup.header_name())
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<ClaimSet> {
        let token = self.extract_token(headers)?;
        self.verifier.verify(token)
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<ClaimSet, Rejection> {
        self.authenticate(headers).map_err(|err| {
            warn!(error = %err, "JWT token rejected");
            Rejection::new(&self.config, &err)
        })
    }

    /// Runs exactly one of `proceed` (with the verified claims) or `reject`.
    pub fn handle<T, P, R>(&self, headers: &HeaderMap, proceed: P, reject: R) -> T
    where
        P: FnOnce(ClaimSet) -> T,
        R: FnOnce(Rejection) -> T,
    {
        match self.check(headers) {
            Ok(claims) => proceed(claims),
            Err(rejection) => reject(rejection),
        }
    }
}

/// Raw token from the named header. Absent, empty, or non-visible-ASCII
/// values all count as an empty header.
pub fn extract_token<'a>(headers: &'a HeaderMap, name: &str) -> AuthResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::AuthHeaderEmpty)
}
