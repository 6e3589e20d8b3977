#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use partyroom_back::{
    build_router, config::AppConfig, dao::room_store::memory::MemoryRoomStore, state::AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.password.scrypt_log_n = 4;
    config
}

pub async fn app_with(config: AppConfig) -> Router {
    let state = AppState::with_store(config, Arc::new(MemoryRoomStore::new())).await;
    build_router(state)
}

pub async fn app() -> Router {
    app_with(test_config()).await
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}
