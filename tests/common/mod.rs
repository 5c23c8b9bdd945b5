#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use contactbook::api;
use contactbook::config::Config;
use contactbook::db;
use contactbook::infrastructure::AppState;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

// Helper to create a test app state
pub async fn setup_test_state(config: Config) -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    AppState::new(db, config)
}

// Router with rate limiting switched off, for functional tests
pub async fn setup_app() -> Router {
    let config = Config {
        rate_limit_enabled: false,
        ..Config::default()
    };
    api::api_router(setup_test_state(config).await)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// Helper to register a user and return a bearer token for them
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({
            "username": email.split('@').next().unwrap(),
            "email": email,
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

pub fn contact_payload(first_name: &str, email: &str, birthday: &str) -> Value {
    json!({
        "first_name": first_name,
        "last_name": "Smith",
        "email": email,
        "phone": "555-0100",
        "birthday": birthday,
        "additional_data": "met at the conference"
    })
}

pub async fn create_contact(app: &Router, token: &str, payload: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/contacts/", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}
