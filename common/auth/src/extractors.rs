use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::claims::ClaimSet;
use crate::gate::{Rejection, RequestGate};

/// Verified claims for the current request.
///
/// Uses the claims attached by [`require_auth`](crate::middleware::require_auth)
/// when the route is layered; otherwise verifies the request itself with the
/// gate held in state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: ClaimSet,
}

impl AuthContext {
    pub fn subject(&self) -> Option<&str> {
        self.claims.subject()
    }

    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<RequestGate>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<ClaimSet>() {
            return Ok(Self {
                claims: claims.clone(),
            });
        }

        let gate = Arc::<RequestGate>::from_ref(state);
        let claims = gate.check(&parts.headers)?;
        Ok(Self { claims })
    }
}
