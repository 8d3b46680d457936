use std::sync::Arc;

use axum::body::Body;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{Request, StatusCode};
use cognito_auth::{AuthConfig, KeySet, RequestGate};
use http_body_util::BodyExt;
use protected_api::{build_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> axum::Router {
    let config = AuthConfig::builder("cognito", "some_user_id_pool", "some_region")
        .realm("protected-api")
        .build()
        .expect("config");
    let gate = RequestGate::with_key_set(config, KeySet::default());
    build_router(AppState {
        gate: Arc::new(gate),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_requires_token() {
    let response = app()
        .oneshot(Request::builder().uri("/me").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(WWW_AUTHENTICATE).expect("challenge"),
        "JWT realm=protected-api"
    );
    let body = body_json(response).await;
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], "auth header empty");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authentication", "definitely-not-a-jwt")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("malformed token")));
}
