use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, AuthResult, ErrorBody};
use crate::jwks::{jwks_url, DEFAULT_FETCH_TIMEOUT};

/// Header carrying the raw token unless configured otherwise.
pub const DEFAULT_TOKEN_HEADER: &str = "Authentication";
pub const DEFAULT_REALM: &str = "cognito jwt";

/// Builds the response body for a rejected request.
pub type RejectionHandler = Arc<dyn Fn(StatusCode, &str) -> Response + Send + Sync>;

/// Where the raw token is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    Header(String),
}

impl TokenLookup {
    /// Parses the `"<source>:<name>"` notation, e.g. `header:Authorization`.
    /// The name must be a valid HTTP header name.
    pub fn parse(spec: &str) -> AuthResult<Self> {
        let (source, name) = spec
            .split_once(':')
            .ok_or_else(|| AuthError::InvalidTokenLookup(spec.to_string()))?;
        let name = name.trim();
        match source.trim().to_ascii_lowercase().as_str() {
            "header" if HeaderName::from_bytes(name.as_bytes()).is_ok() => {
                Ok(TokenLookup::Header(name.to_string()))
            }
            _ => Err(AuthError::InvalidTokenLookup(spec.to_string())),
        }
    }

    pub fn header_name(&self) -> &str {
        match self {
            TokenLookup::Header(name) => name,
        }
    }
}

impl Default for TokenLookup {
    fn default() -> Self {
        TokenLookup::Header(DEFAULT_TOKEN_HEADER.to_string())
    }
}

/// Treatment of signature-valid tokens whose issuer is not a Cognito pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ForeignIssuers {
    /// Accept them without claim validation.
    #[default]
    AcceptAll,
    /// Accept only these exact issuers, without claim validation.
    Allow(Vec<String>),
    Reject,
}

impl ForeignIssuers {
    pub fn permits(&self, issuer: &str) -> bool {
        match self {
            ForeignIssuers::AcceptAll => true,
            ForeignIssuers::Allow(trusted) => trusted.iter().any(|value| value == issuer),
            ForeignIssuers::Reject => false,
        }
    }
}

/// Immutable settings for one gate instance.
#[derive(Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub region: String,
    pub user_pool_id: String,
    pub token_lookup: TokenLookup,
    pub fetch_timeout: Duration,
    pub realm: String,
    pub jwks_url: String,
    pub foreign_issuers: ForeignIssuers,
    pub clock: Arc<dyn Clock>,
    pub rejection: RejectionHandler,
}

impl AuthConfig {
    pub fn builder(
        issuer: impl Into<String>,
        user_pool_id: impl Into<String>,
        region: impl Into<String>,
    ) -> AuthConfigBuilder {
        AuthConfigBuilder::new(issuer, user_pool_id, region)
    }

    pub fn challenge(&self) -> String {
        format!("JWT realm={}", self.realm)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("token_lookup", &self.token_lookup)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("realm", &self.realm)
            .field("jwks_url", &self.jwks_url)
            .field("foreign_issuers", &self.foreign_issuers)
            .finish_non_exhaustive()
    }
}

pub fn default_rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(status, message))).into_response()
}

pub struct AuthConfigBuilder {
    issuer: String,
    user_pool_id: String,
    region: String,
    token_lookup: Option<String>,
    fetch_timeout: Option<Duration>,
    realm: Option<String>,
    jwks_url: Option<String>,
    foreign_issuers: ForeignIssuers,
    clock: Option<Arc<dyn Clock>>,
    rejection: Option<RejectionHandler>,
}

impl AuthConfigBuilder {
    fn new(
        issuer: impl Into<String>,
        user_pool_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            user_pool_id: user_pool_id.into(),
            region: region.into(),
            token_lookup: None,
            fetch_timeout: None,
            realm: None,
            jwks_url: None,
            foreign_issuers: ForeignIssuers::default(),
            clock: None,
            rejection: None,
        }
    }

    /// Token location in `"header:<name>"` form.
    pub fn token_lookup(mut self, spec: impl Into<String>) -> Self {
        self.token_lookup = Some(spec.into());
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Fetch keys from `url` instead of the pool's published location.
    pub fn jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    pub fn foreign_issuers(mut self, policy: ForeignIssuers) -> Self {
        self.foreign_issuers = policy;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn rejection<F>(mut self, handler: F) -> Self
    where
        F: Fn(StatusCode, &str) -> Response + Send + Sync + 'static,
    {
        self.rejection = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> AuthResult<AuthConfig> {
        let token_lookup = match self.token_lookup.as_deref().map(str::trim) {
            Some(spec) if !spec.is_empty() => TokenLookup::parse(spec)?,
            _ => TokenLookup::default(),
        };
        let fetch_timeout = self
            .fetch_timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_FETCH_TIMEOUT);
        let realm = self
            .realm
            .filter(|realm| !realm.is_empty())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());
        let jwks_url = self
            .jwks_url
            .unwrap_or_else(|| jwks_url(&self.region, &self.user_pool_id));

        Ok(AuthConfig {
            issuer: self.issuer,
            region: self.region,
            user_pool_id: self.user_pool_id,
            token_lookup,
            fetch_timeout,
            realm,
            jwks_url,
            foreign_issuers: self.foreign_issuers,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            rejection: self.rejection.unwrap_or_else(|| Arc::new(default_rejection)),
        })
    }
}
