use std::sync::Arc;

use tracing::debug;

use crate::claims::ClaimSet;
use crate::clock::Clock;
use crate::error::{AuthError, AuthResult};

/// Host fragment present in every Cognito issuer.
pub const PROVIDER_MARKER: &str = "cognito-idp";

pub fn cognito_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

/// Semantic checks for tokens minted by the configured user pool.
#[derive(Clone)]
pub struct ClaimValidator {
    expected_issuer: String,
    clock: Arc<dyn Clock>,
}

impl ClaimValidator {
    pub fn new(region: &str, user_pool_id: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            expected_issuer: cognito_issuer(region, user_pool_id),
            clock,
        }
    }

    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    /// Issuer, then `token_use`, then expiry; the first failure wins.
    pub fn validate(&self, claims: &ClaimSet) -> AuthResult<()> {
        if claims.issuer() != Some(self.expected_issuer.as_str()) {
            debug!(expected = %self.expected_issuer, "issuer mismatch");
            return Err(AuthError::IssuerMismatch {
                expected: self.expected_issuer.clone(),
            });
        }

        match claims.token_use() {
            Some("id") | Some("access") => {}
            _ => return Err(AuthError::InvalidTokenUse),
        }

        let now = self.clock.now().timestamp();
        match claims.expires_at_unix() {
            Some(exp) if exp > now => Ok(()),
            _ => Err(AuthError::TokenExpired),
        }
    }
}
