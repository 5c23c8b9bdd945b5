mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use contactbook::api;
use contactbook::config::Config;
use contactbook::db;
use contactbook::infrastructure::rate_limit::{RateLimiter, RateWindow};
use contactbook::infrastructure::AppState;
use common::{contact_payload, register_and_login, send, setup_test_state};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

fn limited_config() -> Config {
    Config {
        rate_limit_enabled: true,
        rate_limiter_times: 10,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_eleventh_request_is_rejected() {
    let app = api::api_router(setup_test_state(limited_config()).await);

    for i in 0..10 {
        let (status, _) = send(&app, Method::GET, "/contacts/", None, None).await;
        // Passes the limiter, then fails authentication
        assert_eq!(status, StatusCode::UNAUTHORIZED, "request {}", i + 1);
    }

    let request = Request::builder()
        .uri("/contacts/")
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get(header::RETRY_AFTER).unwrap(),
        "60"
    );

    // Other routes keep their own counters
    let (status, _) = send(&app, Method::GET, "/contacts/birthdays/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Health is never limited
    for _ in 0..15 {
        let (status, _) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rejected_request_never_reaches_handler() {
    let app = api::api_router(setup_test_state(limited_config()).await);
    let token = register_and_login(&app, "ann@example.com").await;

    for i in 0..12 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/contacts/",
            Some(token.as_str()),
            Some(contact_payload(
                &format!("C{}", i),
                &format!("c{}@example.com", i),
                "1990-04-02",
            )),
        )
        .await;
        let expected = if i < 10 {
            StatusCode::CREATED
        } else {
            StatusCode::TOO_MANY_REQUESTS
        };
        assert_eq!(status, expected, "request {}", i + 1);
    }

    let (status, list) = send(&app, Method::GET, "/contacts/", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_clients_counted_separately() {
    let app = api::api_router(setup_test_state(limited_config()).await);

    let request = |client: &str| {
        Request::builder()
            .uri("/contacts/")
            .method(Method::GET)
            .header("x-forwarded-for", client)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..10 {
        let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app.clone().oneshot(request("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(request("10.0.0.2, 10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Records every key it is asked about and denies everything.
#[derive(Default)]
struct DenyAll {
    calls: AtomicUsize,
}

impl RateLimiter for DenyAll {
    fn check_and_increment(&self, key: &str, window: RateWindow) -> bool {
        assert!(key.ends_with("GET /contacts/:id"), "unexpected key {}", key);
        assert_eq!(window.times, 10);
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[tokio::test]
async fn test_injected_limiter_is_consulted() {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let limiter = Arc::new(DenyAll::default());
    let state = AppState::with_rate_limiter(db, limited_config(), limiter.clone());
    let app = api::api_router(state);

    let (status, body) = send(&app, Method::GET, "/contacts/1", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests");
    assert_eq!(limiter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_limiter_lets_everything_through() {
    let config = Config {
        rate_limit_enabled: false,
        ..Config::default()
    };
    let app = api::api_router(setup_test_state(config).await);

    for _ in 0..20 {
        let (status, _) = send(&app, Method::GET, "/contacts/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
