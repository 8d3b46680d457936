use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::gate::RequestGate;

/// Route layer for `axum::middleware::from_fn_with_state`. Verified claims
/// are stored in the request extensions as a `ClaimSet`.
pub async fn require_auth(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.check(request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
