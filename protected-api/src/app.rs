use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use cognito_auth::{require_auth, AuthContext, ClaimSet, RequestGate};
use serde::Serialize;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<RequestGate>,
}

impl axum::extract::FromRef<AppState> for Arc<RequestGate> {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct Profile {
    subject: Option<String>,
    claims: ClaimSet,
}

async fn profile(auth: AuthContext) -> Json<Profile> {
    Json(Profile {
        subject: auth.subject().map(str::to_string),
        claims: auth.into_claims(),
    })
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(profile))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_auth,
        ));

    Router::new()
        .route("/healthz", get(health))
        .merge(protected)
        .with_state(state)
}
